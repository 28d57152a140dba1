use clap::Parser;
use sbx::core::installer;
use sbx::utils::logger;

/// Reinstall the sbx binaries from this source tree.
#[derive(Parser)]
#[command(name = "sbx-dev-install", version)]
struct Args {}

fn main() {
    let _args = Args::parse();
    logger::init_cli_logger(false);

    match installer::install() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
