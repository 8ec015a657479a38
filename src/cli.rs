use chrono::NaiveDateTime;
use clap::{ArgAction, ArgGroup, Parser};
use std::path::PathBuf;

/// meetprep - briefings for your upcoming meetings
#[derive(Debug, Parser)]
#[command(name = "meetprep")]
#[command(about = "Meeting prep briefings from your calendar feeds", long_about = None)]
#[command(version)]
#[command(group(ArgGroup::new("mode").required(true).args(["check", "next", "auto"])))]
pub struct Cli {
    /// List upcoming meetings with attendees
    #[arg(long)]
    pub check: bool,

    /// Brief the next meeting
    #[arg(long)]
    pub next: bool,

    /// Brief a meeting starting in 30-60 minutes, at most once per meeting
    #[arg(long)]
    pub auto: bool,

    /// Add web search results about attendees to the briefing
    #[arg(long)]
    pub research: bool,

    /// Reference time instead of the local clock (YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Next,
    Auto,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.check {
            Mode::Check
        } else if self.next {
            Mode::Next
        } else {
            Mode::Auto
        }
    }
}

fn parse_now(value: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| match crate::calendar::decode(value) {
            Ok(crate::calendar::EventStart::Timed(dt)) => Some(dt),
            _ => None,
        })
        .ok_or_else(|| format!("invalid time '{}', expected YYYY-MM-DDTHH:MM[:SS]", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_modes_are_exclusive() {
        assert_eq!(Cli::try_parse_from(["meetprep", "--check"]).unwrap().mode(), Mode::Check);
        assert_eq!(Cli::try_parse_from(["meetprep", "--next"]).unwrap().mode(), Mode::Next);
        assert_eq!(Cli::try_parse_from(["meetprep", "--auto"]).unwrap().mode(), Mode::Auto);
        assert!(Cli::try_parse_from(["meetprep", "--check", "--auto"]).is_err());
        assert!(Cli::try_parse_from(["meetprep"]).is_err());
    }

    #[test]
    fn test_now_override() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(14, 30, 0).unwrap();
        for value in ["2024-01-15T14:30:00", "2024-01-15T14:30", "2024-01-15 14:30", "20240115T143000Z"] {
            let cli = Cli::try_parse_from(["meetprep", "--auto", "--now", value]).unwrap();
            assert_eq!(cli.now, Some(expected), "{}", value);
        }
        assert!(Cli::try_parse_from(["meetprep", "--auto", "--now", "20240115"]).is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["meetprep", "--next", "-vv", "--research"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.research);
    }
}
