pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{settings::Settings, Cli, Command};
pub use core::{api::ApiClient, commands::Sbx, download::DatasetDownloader};
pub use utils::error::{Result, SbxError};
