pub mod handlers;
pub mod replayer;
pub mod scheduler;
