pub mod briefing;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod contacts;
pub mod env_manager;
pub mod state;
pub mod web_search;

use anyhow::Result;
use chrono::Local;
use log::*;

/// Run one invocation of the selected mode.
pub async fn run(cli: cli::Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    debug!("Configured environment variables: {:?}", env_manager::present_vars());

    let now = cli.now.unwrap_or_else(|| Local::now().naive_local());
    info!("Reference time {}", now.format("%Y-%m-%d %H:%M:%S"));

    let contacts = contacts::CrmDirectory::new(&config.crm_path);
    let preview_count = config.notify.preview_count;
    let ctx = commands::CommandContext::new(config, now, cli.research)?;
    let upcoming = ctx.load_upcoming().await?;

    match cli.mode() {
        cli::Mode::Check => commands::check::run(&upcoming, preview_count),
        cli::Mode::Next => commands::next::run(&ctx, &upcoming, &contacts).await,
        cli::Mode::Auto => commands::auto::run(&ctx, &upcoming, &contacts).await?,
    }
    Ok(())
}

pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

// Re-export commonly used types
pub use calendar::{Attendee, Event, EventStart, RelevantEvent};
pub use config::Config;
pub use state::{FileLedger, LedgerKey, MemoryLedger, NotificationLedger};
