pub mod answer_model;
pub mod classifier;
pub mod error;
pub mod form_model;
pub mod normalize;
