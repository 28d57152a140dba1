pub mod error;
pub mod logger;
pub mod progress;
pub mod prompt;
pub mod style;
pub mod table;
pub mod validation;
