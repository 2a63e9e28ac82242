pub mod cli;
pub mod dom;
pub mod extract;
pub mod form;
pub mod generator;
pub mod replay;
pub mod screen;
pub mod session;
pub mod trace;

pub use dom::document::Document;
pub use extract::extractor::{Extractor, extract};
pub use form::answer_model::{Answer, AnswerValue, OptionRef};
pub use form::error::FormError;
pub use form::form_model::{FormOption, FormSnapshot, Question, QuestionType};
pub use replay::replayer::{ReplayConfig, Replayer, replay};
pub use session::pipeline::FormPilot;
