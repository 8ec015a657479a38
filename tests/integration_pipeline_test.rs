use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use meetprep::briefing::generate_briefing;
use meetprep::calendar::{collect_events, filter_upcoming, CalendarSource};
use meetprep::commands::auto::{select_and_mark, AutoWindow};
use meetprep::contacts::CrmDirectory;
use meetprep::state::{FileLedger, LedgerLock};
use meetprep::NotificationLedger;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn reference_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

fn ics(start: NaiveDateTime) -> String {
    format!(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:sync-42@example.com\r\n\
SUMMARY:Partnership sync\r\n\
LOCATION:Zoom\r\n\
DTSTART:{}Z\r\n\
ORGANIZER;CN=Ann Lee:mailto:ann@example.com\r\n\
ATTENDEE;CN=Ann Lee;ROLE=CHAIR:mailto:ann@example.com\r\n\
ATTENDEE;CN=Bo Park;RSVP=TRUE:MAILTO:Bo.Park@Partner.IO\r\n\
ATTENDEE;CUTYPE=INDIVIDUAL;CN=\"Cruz, Dee\":mailto:dee@\r\n \
partner.io\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        start.format("%Y%m%dT%H%M%S")
    )
}

const ALL_DAY_ICS: &str = "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
UID:offsite@example.com\n\
SUMMARY:Offsite\n\
DTSTART;VALUE=DATE:20240603\n\
ATTENDEE:mailto:a@example.com\n\
ATTENDEE:mailto:b@example.com\n\
ATTENDEE:mailto:c@example.com\n\
END:VEVENT\n\
END:VCALENDAR\n";

fn auto_once(sources: &[CalendarSource], ledger_path: &Path, crm: &CrmDirectory) -> Result<Option<String>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let collected = runtime.block_on(collect_events(sources, &reqwest::Client::new()));
    assert!(collected.warnings.is_empty());

    let upcoming = filter_upcoming(&collected.events, reference_now());
    let _lock = LedgerLock::acquire(ledger_path)?;
    let mut ledger = FileLedger::open(ledger_path)?;
    let picked = select_and_mark(&upcoming, reference_now(), &AutoWindow::default(), &mut ledger)?;
    Ok(picked.map(|relevant| generate_briefing(relevant, crm, &[])))
}

#[test]
fn test_auto_notify_briefs_each_occurrence_once() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let timed_path = temp_dir.path().join("work.ics");
    let all_day_path = temp_dir.path().join("team.ics");
    fs::write(&timed_path, ics(reference_now() + Duration::minutes(45)))?;
    fs::write(&all_day_path, ALL_DAY_ICS)?;

    let crm_dir = temp_dir.path().join("crm");
    fs::create_dir_all(&crm_dir)?;
    fs::write(
        crm_dir.join("partner.json"),
        r#"[{"email": "bo.park@partner.io", "company": "Partner IO", "title": "VP Sales"}]"#,
    )?;
    let crm = CrmDirectory::new(&crm_dir);

    let sources = vec![CalendarSource::Local(timed_path), CalendarSource::Local(all_day_path)];
    let ledger_path = temp_dir.path().join("state").join(".prep_state.json");

    let first = auto_once(&sources, &ledger_path, &crm)?;
    let expected = "📋 Meeting Briefing: Partnership sync\n\
📍 Zoom\n\
⏰ 09:45 AM on Jun 03\n\
\n\
👥 Attendees:\n\
• Ann Lee (ann@example.com) - example.com\n\
• Bo Park (bo.park@partner.io) - VP Sales @ Partner IO\n\
• Cruz, Dee (dee@partner.io) - partner.io";
    assert_eq!(first.as_deref(), Some(expected));

    let persisted: serde_json::Value = serde_json::from_str(&fs::read_to_string(&ledger_path)?)?;
    assert_eq!(persisted, serde_json::json!({"briefed": ["sync-42@example.com_2024-06-03T09:45:00"]}));

    let second = auto_once(&sources, &ledger_path, &crm)?;
    assert_eq!(second, None);
    assert_eq!(FileLedger::open(&ledger_path)?.entries().len(), 1);
    Ok(())
}

#[test]
fn test_meeting_outside_window_is_not_marked() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("work.ics");
    fs::write(&path, ics(reference_now() + Duration::minutes(90)))?;
    let crm = CrmDirectory::new(temp_dir.path().join("no-crm"));
    let ledger_path = temp_dir.path().join("state.json");

    assert_eq!(auto_once(&[CalendarSource::Local(path)], &ledger_path, &crm)?, None);
    assert!(!ledger_path.exists());

    let ledger = FileLedger::open(&ledger_path)?;
    assert!(ledger.entries().is_empty());
    Ok(())
}

#[test]
fn test_filter_is_deterministic_across_calls() {
    let text = ics(reference_now() + Duration::minutes(45)) + ALL_DAY_ICS;
    let events = meetprep::calendar::parse_calendar(&text);
    assert_eq!(events.len(), 2);

    let first = filter_upcoming(&events, reference_now());
    let second = filter_upcoming(&events, reference_now());
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert_eq!(first[0].attendees.len(), 3);
    assert!(!NotificationLedger::has_notified(
        &meetprep::MemoryLedger::new(),
        &meetprep::LedgerKey::new(first[0].event.uid(), first[0].start)
    ));
}
