use anyhow::Result;
use clap::Parser;
use log::{error, info};
use meetprep::calendar::CalendarError;
use meetprep::cli::Cli;
use meetprep::env_manager;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_file = env_manager::load_env_file();
    meetprep::init_logger(env_manager::log_level(cli.verbose));
    env_manager::log_env_file(&env_file);

    info!("Starting meetprep in {:?} mode", cli.mode());

    if let Err(e) = meetprep::run(cli).await {
        if matches!(e.downcast_ref::<CalendarError>(), Some(CalendarError::NoSources)) {
            println!("Error: Set CALENDARS environment variable");
        }
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
