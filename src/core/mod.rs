pub mod api;
pub mod commands;
pub mod download;
pub mod installer;

pub use crate::domain::model::{DownloadReport, S3Location};
pub use crate::domain::ports::{DatasetStore, Prompter};
pub use crate::utils::error::Result;
