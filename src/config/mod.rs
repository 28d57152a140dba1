pub mod credentials;
pub mod s3;
pub mod settings;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Parser)]
#[command(name = "sbx")]
#[command(about = "A CLI for interacting with the SBX Robotics API", version)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Subcommand)]
pub enum Command {
    /// log into SBX, getting user and company info
    Login,
    /// show information about current login
    Account,
    /// project related commands
    #[command(subcommand)]
    Project(ProjectCommand),
    /// generator related commands
    #[command(subcommand)]
    Generator(GeneratorCommand),
    /// dataset related commands
    #[command(subcommand)]
    Dataset(DatasetCommand),
    /// dataset job related commands
    #[command(subcommand)]
    Job(JobCommand),
}

#[derive(Debug, Clone, Serialize, Subcommand)]
pub enum ProjectCommand {
    /// list user projects
    List,
    /// show detailed info about a project
    Info { project_id: String },
}

#[derive(Debug, Clone, Serialize, Subcommand)]
pub enum GeneratorCommand {
    /// list all generators attached to a project
    List { project_id: String },
    /// show detailed info about a particular generator
    Info { generator_id: String },
}

#[derive(Debug, Clone, Serialize, Subcommand)]
pub enum DatasetCommand {
    /// list all datasets belonging to a project
    List { project_id: String },
    /// show detailed info about a dataset
    Info { dataset_id: String },
    /// download a dataset locally to a specified location
    Download(DownloadArgs),
}

#[derive(Debug, Clone, Serialize, Args)]
pub struct DownloadArgs {
    pub dataset_id: String,

    pub download_dir: String,

    #[arg(
        short,
        long,
        help = "download the smaller sample with 100 images instead of the full dataset"
    )]
    pub sample: bool,
}

#[derive(Debug, Clone, Serialize, Subcommand)]
pub enum JobCommand {
    /// list current running and completed dataset jobs
    List { project_id: Option<String> },
    /// show detailed info about a dataset job
    Info { job_id: String },
}
