use crate::briefing::generate_briefing;
use crate::calendar::{within_window, RelevantEvent};
use crate::commands::CommandContext;
use crate::config::NotifyConfig;
use crate::contacts::ContactStore;
use crate::state::{FileLedger, LedgerError, LedgerKey, LedgerLock, NotificationLedger};
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use log::{debug, info};

/// Start times eligible for auto briefing: `[now + lead, now + lead + span]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoWindow {
    pub lead: Duration,
    pub span: Duration,
}

impl Default for AutoWindow {
    fn default() -> Self {
        Self { lead: Duration::minutes(30), span: Duration::minutes(30) }
    }
}

impl From<&NotifyConfig> for AutoWindow {
    fn from(config: &NotifyConfig) -> Self {
        Self {
            lead: Duration::minutes(config.lead_minutes.max(0)),
            span: Duration::minutes(config.window_minutes.max(0)),
        }
    }
}

impl AutoWindow {
    pub fn label(&self) -> String {
        format!("{}-{}", self.lead.num_minutes(), (self.lead + self.span).num_minutes())
    }
}

/// Pick the first in-window meeting not yet in the ledger and mark it.
///
/// The mark is persisted before the caller emits anything, so a crash can
/// lose a briefing but never repeat one.
pub fn select_and_mark<'a, L: NotificationLedger + ?Sized>(
    upcoming: &'a [RelevantEvent],
    now: NaiveDateTime,
    window: &AutoWindow,
    ledger: &mut L,
) -> Result<Option<&'a RelevantEvent>, LedgerError> {
    for relevant in within_window(upcoming, now, window.lead, window.span) {
        let key = LedgerKey::new(relevant.event.uid(), relevant.start);
        if ledger.has_notified(&key) {
            debug!("Already briefed {}", key);
            continue;
        }
        ledger.mark_notified(&key)?;
        info!("Briefing {}", key);
        return Ok(Some(relevant));
    }
    Ok(None)
}

/// The `--auto` output for one run. Any ledger failure is an error and
/// nothing is rendered.
pub async fn render(ctx: &CommandContext, upcoming: &[RelevantEvent], contacts: &dyn ContactStore) -> Result<String> {
    let state_file = &ctx.config.state_file;
    let _lock = LedgerLock::acquire(state_file).context("Cannot guarantee at-most-once briefing")?;
    let mut ledger = FileLedger::open(state_file).context("Cannot guarantee at-most-once briefing")?;
    let window = AutoWindow::from(&ctx.config.notify);

    match select_and_mark(upcoming, ctx.now, &window, &mut ledger)? {
        Some(relevant) => {
            let research = ctx.gather_research(&relevant.attendees, contacts).await;
            Ok(generate_briefing(relevant, contacts, &research))
        }
        None => Ok(format!("No meetings in the {} minute window.", window.label())),
    }
}

pub async fn run(ctx: &CommandContext, upcoming: &[RelevantEvent], contacts: &dyn ContactStore) -> Result<()> {
    println!("{}", render(ctx, upcoming, contacts).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Attendee, Event, Property};
    use crate::config::Config;
    use crate::contacts::Contact;
    use crate::state::MemoryLedger;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct NoContacts;

    impl ContactStore for NoContacts {
        fn lookup(&self, _email: &str) -> Option<Contact> {
            None
        }
    }

    fn context(state_file: &Path) -> CommandContext {
        let config = Config { state_file: state_file.to_path_buf(), ..Config::default() };
        CommandContext::new(config, now(), false).unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn relevant(uid: &str, minutes_from_now: i64) -> RelevantEvent {
        RelevantEvent {
            start: now() + Duration::minutes(minutes_from_now),
            event: vec![Property::new("UID", uid)].into_iter().collect::<Event>(),
            attendees: vec![
                Attendee { email: "a@example.com".to_string(), name: None },
                Attendee { email: "b@example.com".to_string(), name: None },
            ],
        }
    }

    #[test]
    fn test_picks_first_unbriefed_in_window() -> Result<(), LedgerError> {
        let upcoming = vec![relevant("soon", 10), relevant("first", 35), relevant("second", 50), relevant("later", 90)];
        let mut ledger = MemoryLedger::new();
        let window = AutoWindow::default();

        let picked = select_and_mark(&upcoming, now(), &window, &mut ledger)?;
        assert_eq!(picked.and_then(|r| r.event.uid()), Some("first"));

        let picked = select_and_mark(&upcoming, now(), &window, &mut ledger)?;
        assert_eq!(picked.and_then(|r| r.event.uid()), Some("second"));

        assert!(select_and_mark(&upcoming, now(), &window, &mut ledger)?.is_none());
        assert_eq!(
            ledger.entries(),
            &["first_2024-01-15T09:35:00".to_string(), "second_2024-01-15T09:50:00".to_string()]
        );
        Ok(())
    }

    #[test]
    fn test_rescheduled_occurrence_is_new() -> Result<(), LedgerError> {
        let mut ledger = MemoryLedger::new();
        let window = AutoWindow::default();

        assert!(select_and_mark(&[relevant("weekly", 40)], now(), &window, &mut ledger)?.is_some());
        assert!(select_and_mark(&[relevant("weekly", 40)], now(), &window, &mut ledger)?.is_none());
        assert!(select_and_mark(&[relevant("weekly", 45)], now(), &window, &mut ledger)?.is_some());
        Ok(())
    }

    #[test]
    fn test_window_from_config() {
        let window = AutoWindow::from(&NotifyConfig { lead_minutes: 10, window_minutes: 5, preview_count: 1 });
        assert_eq!(window.label(), "10-15");
        assert_eq!(AutoWindow::default().label(), "30-60");
    }

    #[tokio::test]
    async fn test_render_briefs_then_reports_empty_window() {
        let temp_dir = tempdir().unwrap();
        let ctx = context(&temp_dir.path().join("state.json"));
        let upcoming = vec![relevant("sync", 45)];

        let first = render(&ctx, &upcoming, &NoContacts).await.unwrap();
        assert!(first.starts_with("📋 Meeting Briefing: Meeting"));

        let second = render(&ctx, &upcoming, &NoContacts).await.unwrap();
        assert_eq!(second, "No meetings in the 30-60 minute window.");
    }

    #[tokio::test]
    async fn test_corrupt_ledger_aborts_without_briefing() {
        let temp_dir = tempdir().unwrap();
        let state_file = temp_dir.path().join("state.json");
        fs::write(&state_file, "{not json").unwrap();
        let ctx = context(&state_file);

        let result = render(&ctx, &[relevant("sync", 45)], &NoContacts).await;
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<LedgerError>(), Some(LedgerError::Corrupt(_, _))));
        assert_eq!(fs::read_to_string(&state_file).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_held_lock_aborts_without_marking() {
        let temp_dir = tempdir().unwrap();
        let state_file = temp_dir.path().join("state.json");
        let ctx = context(&state_file);
        let _held = LedgerLock::acquire(&state_file).unwrap();

        let result = render(&ctx, &[relevant("sync", 45)], &NoContacts).await;
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<LedgerError>(), Some(LedgerError::Locked(_, _))));
        assert!(!state_file.exists());
    }
}
