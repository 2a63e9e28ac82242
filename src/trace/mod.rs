pub mod logger;
#[allow(clippy::module_inception)]
pub mod trace;
