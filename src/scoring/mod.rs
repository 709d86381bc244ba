pub mod config;
pub mod engine;
pub mod predicate;
pub mod result;
pub mod validation;

pub use config::*;
pub use engine::score;
pub use predicate::{Pattern, Predicate};
pub use result::{CategoryScore, GradeResult, ScoreEntry, Status};
pub use validation::validate_rubric;
