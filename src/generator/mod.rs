pub mod answer_generator;
pub mod backend;
