use clap::Parser;
use sbx::utils::prompt::StdinPrompter;
use sbx::utils::style::sbx_style;
use sbx::utils::{logger, validation::Validate};
use sbx::{Cli, Sbx, Settings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI args: {:?}", cli);

    let settings = match Settings::from_env().and_then(|s| s.validate().map(|()| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("{}", sbx_style(&e.user_friendly_message()));
            eprintln!("{}", sbx_style(&e.recovery_suggestion()));
            std::process::exit(e.exit_code());
        }
    };

    if settings.dev_mode {
        println!(
            "Running SBX CLI in dev mode. No SSL verification will be used. `export SBX_DEV=` to test for prod"
        );
    }

    let result = match Sbx::new(settings) {
        Ok(app) => app.execute(&cli.command, &StdinPrompter).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            tracing::error!(
                "Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("{}", sbx_style(&e.user_friendly_message()));
            eprintln!("{}", sbx_style(&e.recovery_suggestion()));
            std::process::exit(e.exit_code());
        }
    }
}
