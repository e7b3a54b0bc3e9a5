#[cfg(test)]
#[path = "notes_export_test.rs"]
mod tests;

use std::fmt::Display;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

use crate::{
    config::constants::DEFAULT_NOTE_TITLE,
    models::{Note, NoteCategory},
};

/// Categories in the order they appear in an export.
const SECTION_ORDER: [NoteCategory; 5] = [
    NoteCategory::Work,
    NoteCategory::Study,
    NoteCategory::Personal,
    NoteCategory::Ideas,
    NoteCategory::Other,
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The calendar days an export covers, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPeriod {
    Day(NaiveDate),
    /// Monday to Sunday.
    Week { start: NaiveDate, end: NaiveDate },
}

impl ExportPeriod {
    pub fn day(date: NaiveDate) -> Self {
        ExportPeriod::Day(date)
    }

    /// The Monday-to-Sunday week holding `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let start = date - Days::new(date.weekday().num_days_from_monday() as u64);
        ExportPeriod::Week {
            start,
            end: start + Days::new(6),
        }
    }

    pub fn start(&self) -> NaiveDate {
        match self {
            ExportPeriod::Day(date) => *date,
            ExportPeriod::Week { start, .. } => *start,
        }
    }

    pub fn end(&self) -> NaiveDate {
        match self {
            ExportPeriod::Day(date) => *date,
            ExportPeriod::Week { end, .. } => *end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start() <= date && date <= self.end()
    }

    pub fn file_name(&self) -> String {
        match self {
            ExportPeriod::Day(date) => format!("notes-{}.md", date),
            ExportPeriod::Week { start, end } => format!(
                "notes-week-{:02}-{}_{}.md",
                start.iso_week().week(),
                start,
                end
            ),
        }
    }

    fn heading(&self) -> String {
        match self {
            ExportPeriod::Day(date) => format!("Daily notes for {}", date),
            ExportPeriod::Week { start, end } => {
                format!("Weekly notes summary ({} to {})", start, end)
            }
        }
    }

    fn scope(&self) -> &'static str {
        match self {
            ExportPeriod::Day(_) => "today",
            ExportPeriod::Week { .. } => "this week",
        }
    }
}

/// Notes created inside `period` (days read in `tz`), oldest first.
pub fn notes_in_period<'a, Tz: TimeZone>(
    notes: &'a [Note],
    period: &ExportPeriod,
    tz: &Tz,
) -> Vec<&'a Note> {
    let mut selected = notes
        .iter()
        .filter(|n| period.contains(n.created_at.with_timezone(tz).date_naive()))
        .collect::<Vec<_>>();
    selected.sort_by_key(|n| n.created_at);
    selected
}

pub fn category_title(category: NoteCategory) -> &'static str {
    match category {
        NoteCategory::Work => "Work notes",
        NoteCategory::Study => "Study notes",
        NoteCategory::Personal => "Personal notes",
        NoteCategory::Ideas => "Ideas",
        NoteCategory::Other => "Other notes",
    }
}

/// Renders the notes of `period` as a Markdown report: an overview, one
/// section per category and an export footer. `notes` may hold notes from
/// any date, only the ones inside the period are rendered.
pub fn render_markdown<Tz>(
    notes: &[Note],
    period: &ExportPeriod,
    tz: &Tz,
    exported_at: DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let notes = notes_in_period(notes, period, tz);
    let mut md = String::new();

    if notes.is_empty() {
        md.push_str(&format!(
            "# {}\n\n> No notes were recorded {}\n",
            period.heading(),
            period.scope()
        ));
        return md;
    }

    md.push_str(&format!("# {}\n\n", period.heading()));
    write_overview(&mut md, &notes);

    for category in SECTION_ORDER {
        let section = notes
            .iter()
            .filter(|n| n.category == category)
            .collect::<Vec<_>>();
        if section.is_empty() {
            continue;
        }

        md.push_str(&format!(
            "## {} ({})\n\n",
            category_title(category),
            section.len()
        ));
        for (i, note) in section.iter().enumerate() {
            write_note(&mut md, i + 1, note, tz);
        }
    }

    md.push_str(&format!(
        "## Export\n\n- **Exported at**: {}\n- **Range**: notes created {}\n- **Format**: Markdown\n\n\
         > Paste this into any AI assistant to draft a daily or weekly report.\n",
        exported_at.format(TIME_FORMAT),
        period.scope()
    ));
    md
}

fn write_overview(md: &mut String, notes: &[&Note]) {
    let distribution = SECTION_ORDER
        .iter()
        .filter_map(|c| {
            let count = notes.iter().filter(|n| n.category == *c).count();
            (count > 0).then(|| format!("{} {}", category_title(*c), count))
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut tags: Vec<&str> = vec![];
    for tag in notes.iter().flat_map(|n| n.tags.iter()) {
        if !tags.contains(&tag.as_str()) {
            tags.push(tag);
        }
    }
    let tags = if tags.is_empty() {
        "none".to_string()
    } else {
        tags.join(", ")
    };

    let favorites = notes.iter().filter(|n| n.is_favorite).count();

    md.push_str(&format!(
        "## Overview\n\n- **Total**: {} notes\n- **By category**: {}\n- **Tags**: {}\n- **Favorites**: {}\n\n",
        notes.len(),
        distribution,
        tags,
        favorites
    ));
}

fn write_note<Tz>(md: &mut String, index: usize, note: &Note, tz: &Tz)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let title = match note.title.trim() {
        "" => DEFAULT_NOTE_TITLE,
        title => title,
    };
    let star = if note.is_favorite { " ⭐" } else { "" };
    md.push_str(&format!("### {}. {}{}\n\n", index, title, star));

    let created = note.created_at.with_timezone(tz).format(TIME_FORMAT);
    md.push_str(&format!("**Created**: {}", created));
    if note.updated_at != note.created_at {
        let updated = note.updated_at.with_timezone(tz).format(TIME_FORMAT);
        md.push_str(&format!(" (updated {})", updated));
    }
    md.push_str("\n\n");

    if !note.tags.is_empty() {
        let tags = note
            .tags
            .iter()
            .map(|t| format!("`{}`", t))
            .collect::<Vec<_>>()
            .join(" ");
        md.push_str(&format!("**Tags**: {}\n\n", tags));
    }

    let content = note
        .content
        .trim()
        .lines()
        .map(|line| if line.trim().is_empty() { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n");
    if content.is_empty() {
        md.push_str("*No content*\n\n");
    } else {
        md.push_str(&format!("{}\n\n", content));
    }
    md.push_str("---\n\n");
}
