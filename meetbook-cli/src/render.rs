//! Colored terminal rendering for meetbook types.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use meetbook_core::calendar::{DayCell, MonthGrid};
use meetbook_core::editor::{EditorFields, SaveOutcome};
use meetbook_core::meeting::{MeetingDetail, MeetingTemplate};
use meetbook_core::query::CalendarMeeting;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// Cell width in the month grid, excluding the separator.
const CELL_WIDTH: usize = 10;

impl Render for CalendarMeeting {
    fn render(&self) -> String {
        format!("{} {} {}", format_time(self), self.title, self.id.dimmed())
    }
}

impl Render for MonthGrid {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        let heading = self.month.from.format("%B %Y").to_string();
        lines.push(format!("{}", heading.bold()));

        let header: Vec<String> = [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ]
        .into_iter()
        .map(|day| colorize_weekday(day, &format!("{:<CELL_WIDTH$}", day.to_string())))
        .collect();
        lines.push(header.join(" "));

        for week in self.weeks() {
            let days: Vec<String> = week.iter().map(render_day_number).collect();
            lines.push(days.join(" "));

            let counts: Vec<String> = week.iter().map(render_day_summary).collect();
            lines.push(counts.join(" "));
        }

        lines.join("\n")
    }
}

fn render_day_number(cell: &DayCell) -> String {
    let label = format!("{:<CELL_WIDTH$}", cell.date.day());
    if !cell.in_month {
        return label.dimmed().to_string();
    }
    if cell.date == chrono::Local::now().date_naive() {
        return label.reversed().to_string();
    }
    colorize_weekday(cell.date.weekday(), &label)
}

fn render_day_summary(cell: &DayCell) -> String {
    let summary = match cell.meetings.as_slice() {
        [] => String::new(),
        [only] => truncate(&only.title, CELL_WIDTH),
        many => format!("{} mtgs", many.len()),
    };
    let summary = format!("{:<CELL_WIDTH$}", summary);

    if cell.in_month {
        summary.cyan().to_string()
    } else {
        summary.dimmed().to_string()
    }
}

/// Sundays red, Saturdays blue.
fn colorize_weekday(day: Weekday, text: &str) -> String {
    match day {
        Weekday::Sun => text.red().to_string(),
        Weekday::Sat => text.blue().to_string(),
        _ => text.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

impl Render for MeetingDetail {
    fn render(&self) -> String {
        let mut lines = vec![
            format!("{}", self.title.bold()),
            format!("  {}  {}", "When:".dimmed(), format_span(self.all_day, &self.start, &self.end)),
        ];

        let participants = self.participants_display();
        if !participants.is_empty() {
            lines.push(format!("  {}  {}", "Who:".dimmed(), participants));
        }
        if let Some(teams) = self.teams_display() {
            lines.push(format!("  {} {}", "Team:".dimmed(), teams));
        }
        if let Some(creator) = &self.creator_nickname {
            lines.push(format!("  {}   {}", "By:".dimmed(), creator));
        }

        let version = self
            .meeting_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".into());
        lines.push(format!("  {}  {}", "Id:".dimmed(), self.public_id.dimmed()));
        lines.push(format!("  {} {}", "Ver:".dimmed(), version.dimmed()));

        if let Some(notes) = self.note_content.as_deref().filter(|n| !n.trim().is_empty()) {
            lines.push(String::new());
            lines.extend(notes.lines().map(|l| format!("  {}", l)));
        }

        lines.join("\n")
    }
}

impl Render for EditorFields {
    fn render(&self) -> String {
        let mut lines = vec![
            format!("{}", self.title_or_default().bold()),
            format!("  {}  {}", "When:".dimmed(), format_span(self.all_day, &self.start, &self.end)),
        ];

        if let Some(team) = &self.team {
            lines.push(format!("  {} {}", "Team:".dimmed(), team));
        }
        if !self.meta.location.is_empty() {
            lines.push(format!("  {} {}", "Where:".dimmed(), self.meta.location));
        }
        for link in &self.meta.links {
            lines.push(format!("  {}  {}", "Link:".dimmed(), link.underline()));
        }
        if !self.meta.notes.trim().is_empty() {
            lines.push(String::new());
            lines.extend(self.meta.notes.lines().map(|l| format!("  {}", l)));
        }

        lines.join("\n")
    }
}

impl Render for SaveOutcome {
    fn render(&self) -> String {
        match self {
            SaveOutcome::Updated { version } => match version {
                Some(v) => format!("{} Saved (version {})", "✓".green(), v),
                None => format!("{} Saved", "✓".green()),
            },
            SaveOutcome::Created { public_id } => {
                format!("{} Created {}", "+".green(), public_id)
            }
            SaveOutcome::ConflictReloaded { .. } => format!(
                "{} Someone else changed this meeting. Your edit was discarded and the latest version reloaded.",
                "!".yellow()
            ),
            SaveOutcome::Skipped => format!("{} A create is already in progress", "~".yellow()),
        }
    }
}

impl Render for MeetingTemplate {
    fn render(&self) -> String {
        let mut lines = vec![format!("{} {}", self.title.bold(), format!("({})", self.id).dimmed())];
        for column in &self.columns {
            let label = match &column.badge_class {
                Some(badge) => format!("{} {}", column.label, format!("[{}]", badge).dimmed()),
                None => column.label.clone(),
            };
            lines.push(format!("  {:<12} {}", column.key, label));
        }
        lines.join("\n")
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate) -> String {
    let today = chrono::Local::now().date_naive();

    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Start time of a meeting (e.g. "  15:00" or "all-day")
pub fn format_time(meeting: &CalendarMeeting) -> String {
    if meeting.all_day {
        "all-day".to_string()
    } else {
        format!("{:>7}", meeting.start.format("%H:%M"))
    }
}

fn format_span(all_day: bool, start: &NaiveDateTime, end: &NaiveDateTime) -> String {
    if all_day {
        if start.date() == end.date() {
            format!("{} (all day)", start.format("%a %b %-d"))
        } else {
            format!("{} – {} (all day)", start.format("%a %b %-d"), end.format("%a %b %-d"))
        }
    } else if start.date() == end.date() {
        format!("{} {}–{}", start.format("%a %b %-d"), start.format("%H:%M"), end.format("%H:%M"))
    } else {
        format!("{} – {}", start.format("%a %b %-d %H:%M"), end.format("%a %b %-d %H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_titles_are_truncated_to_the_cell() {
        assert_eq!(truncate("Standup", 10), "Standup");
        assert_eq!(truncate("Quarterly planning", 10), "Quarterly…");
        assert_eq!(truncate("Quarterly planning", 10).chars().count(), 10);
    }

    #[test]
    fn same_day_span() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let start = day.and_hms_opt(9, 0, 0).unwrap();
        let end = day.and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(format_span(false, &start, &end), "Fri Mar 1 09:00–09:30");
        assert_eq!(format_span(true, &start, &end), "Fri Mar 1 (all day)");
    }
}
