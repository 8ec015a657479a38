use crate::briefing::preview_line;
use crate::calendar::RelevantEvent;

/// The `--check` listing: a count line, then up to `limit` previews.
pub fn render(upcoming: &[RelevantEvent], limit: usize) -> String {
    let mut output = format!("Found {} upcoming meetings with attendees:\n", upcoming.len());
    for relevant in upcoming.iter().take(limit) {
        output.push('\n');
        output.push_str(&preview_line(relevant));
    }
    output
}

pub fn run(upcoming: &[RelevantEvent], limit: usize) {
    println!("{}", render(upcoming, limit));
}
