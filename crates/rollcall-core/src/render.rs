//! Status message formatting.
//!
//! Pure functions from roster/journal state to the Telegram-HTML text shown
//! in the canonical status message. No side effects, no I/O.

use crate::journal::ActionEntry;
use crate::roster::{Participant, Roster};

/// Heading used when no custom title is set.
pub const DEFAULT_TITLE: &str = "Session sign-up";

fn push_list(out: &mut String, entries: &[Participant], roster: &Roster, empty_line: &str) {
    if entries.is_empty() {
        out.push_str(empty_line);
        out.push('\n');
        return;
    }
    for (idx, entry) in entries.iter().enumerate() {
        if roster.is_paid(entry.id) {
            out.push_str(&format!("{}. {} ✅\n", idx + 1, entry.name));
        } else {
            out.push_str(&format!("{}. {}\n", idx + 1, entry.name));
        }
    }
}

/// Render the roster as the canonical status message.
pub fn render(roster: &Roster) -> String {
    let title = roster.title().unwrap_or(DEFAULT_TITLE);
    let mut out = format!("📋 <b>{title}</b>\n\n");

    out.push_str("👥 Signed up:\n");
    push_list(&mut out, roster.participants(), roster, "No one has signed up yet.");

    out.push_str("\n🕒 Waitlist:\n");
    push_list(&mut out, roster.waitlist(), roster, "The waitlist is empty.");

    out
}

/// Render the action journal chronologically.
pub fn render_journal(entries: &[ActionEntry]) -> String {
    if entries.is_empty() {
        return "📊 <b>Action log</b>\n\nNo recorded actions.".to_string();
    }

    let mut out = "📊 <b>Action log</b>\n\n".to_string();
    for entry in entries {
        out.push_str(&format!(
            "[{}] {} ({}): {}\n",
            entry.timestamp, entry.user_name, entry.user_id, entry.action
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::UserId;

    #[test]
    fn empty_roster_shows_placeholders() {
        let text = render(&Roster::new());
        assert!(text.contains(DEFAULT_TITLE));
        assert!(text.contains("No one has signed up yet."));
        assert!(text.contains("The waitlist is empty."));
    }

    #[test]
    fn paid_participant_gets_checkmark() {
        let mut roster = Roster::new();
        roster.signup(UserId(1), "A");
        roster.signup(UserId(2), "B");
        roster.mark_paid(UserId(1));

        let text = render(&roster);
        assert!(text.contains("1. A ✅\n"));
        assert!(text.contains("2. B\n"));
        assert!(!text.contains("2. B ✅"));
    }

    #[test]
    fn custom_title_replaces_default() {
        let mut roster = Roster::new();
        roster.set_title("Thursday football");
        let text = render(&roster);
        assert!(text.contains("<b>Thursday football</b>"));
        assert!(!text.contains(DEFAULT_TITLE));
    }

    #[test]
    fn waitlist_entries_are_enumerated_and_marked() {
        let mut roster = Roster::new();
        roster.maybe(UserId(5), "W");
        roster.mark_paid(UserId(5));
        let text = render(&roster);
        assert!(text.contains("1. W ✅\n"));
    }

    #[test]
    fn empty_journal_shows_placeholder() {
        let text = render_journal(&[]);
        assert!(text.contains("No recorded actions."));
    }

    #[test]
    fn journal_lines_are_chronological() {
        let entries = vec![
            ActionEntry::new("2025-06-01 10:00:00", 1, "A", "Signed up"),
            ActionEntry::new("2025-06-01 11:00:00", 2, "B", "Added to waitlist"),
        ];
        let text = render_journal(&entries);
        let first = text.find("Signed up").unwrap();
        let second = text.find("Added to waitlist").unwrap();
        assert!(first < second);
        assert!(text.contains("[2025-06-01 10:00:00] A (1): Signed up"));
    }
}
