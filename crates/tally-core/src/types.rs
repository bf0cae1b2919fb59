use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, Month, Weekday};

/// A sentence-like segment of the meeting text.
///
/// `start` and `end` are byte offsets into the original text and bound the
/// trimmed `text`, so `&source[start..end] == text`. Entity spans handed to
/// the extraction entry points count characters instead; they are converted
/// to byte offsets before any clause is compared with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub index: usize,
}

/// Kind of an externally recognized entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Person,
    Date,
}

/// A named entity recognized by an entity source.
///
/// `start..end` is a half-open range of character (Unicode scalar value)
/// indices into the text, the convention NER services use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub kind: EntityKind,
    pub start: usize,
    pub end: usize,
}

impl EntitySpan {
    pub fn person(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            kind: EntityKind::Person,
            start,
            end,
        }
    }

    pub fn date(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            kind: EntityKind::Date,
            start,
            end,
        }
    }

    /// Half-open range intersection with `start..end`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Which extraction route produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Pattern,
    Fallback,
}

/// A partially filled, possibly duplicate action item awaiting linking and merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub task: String,
    pub assignee: Option<String>,
    pub deadline_phrase: Option<String>,
    pub clause_index: usize,
    pub source: CandidateSource,
    pub confidence: f32,
    /// Byte range of the task phrase in the original text.
    pub task_start: usize,
    pub task_end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

/// Lifecycle of an action item. Extraction only ever creates `Pending`;
/// later transitions belong to whoever persists the items, and the other
/// variants exist so their stored statuses deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
}

/// A normalized deadline.
///
/// Weekdays stay symbolic because the engine has no notion of "today";
/// the caller resolves them to a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Deadline {
    Weekday(Weekday),
    Date(Date),
    NextWeek,
    InDays(u32),
    EndOfMonth,
    Phrase(String),
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deadline::Weekday(day) => f.write_str(weekday_name(*day)),
            Deadline::Date(date) => write!(
                f,
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            ),
            Deadline::NextWeek => f.write_str("NEXT_WEEK"),
            Deadline::InDays(n) => write!(f, "IN_N_DAYS({n})"),
            Deadline::EndOfMonth => f.write_str("END_OF_MONTH"),
            Deadline::Phrase(phrase) => f.write_str(phrase),
        }
    }
}

impl From<Deadline> for String {
    fn from(value: Deadline) -> Self {
        value.to_string()
    }
}

impl From<String> for Deadline {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NEXT_WEEK" => return Deadline::NextWeek,
            "END_OF_MONTH" => return Deadline::EndOfMonth,
            _ => {}
        }
        if let Some(n) = value
            .strip_prefix("IN_N_DAYS(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|n| n.parse().ok())
        {
            return Deadline::InDays(n);
        }
        if let Some(day) = weekday_from_name(&value) {
            return Deadline::Weekday(day);
        }
        if let Some(date) = parse_iso_date(&value) {
            return Deadline::Date(date);
        }
        Deadline::Phrase(value)
    }
}

/// The final, deduplicated, classified task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    pub assigned_to: Option<String>,
    pub deadline: Option<Deadline>,
    pub priority: Priority,
    pub status: ActionStatus,
}

pub(crate) fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

/// Full or three-letter weekday name, any case.
pub(crate) fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Monday),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tuesday),
        "wednesday" | "wed" => Some(Weekday::Wednesday),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thursday),
        "friday" | "fri" => Some(Weekday::Friday),
        "saturday" | "sat" => Some(Weekday::Saturday),
        "sunday" | "sun" => Some(Weekday::Sunday),
        _ => None,
    }
}

/// Builds a real calendar date, rejecting things like February 30.
pub(crate) fn calendar_date(year: i32, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

pub(crate) fn parse_iso_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    if parts.next().is_some() || year.len() != 4 {
        return None;
    }
    calendar_date(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_half_open() {
        let span = EntitySpan::person("John", 0, 4);
        assert!(span.overlaps(3, 10));
        assert!(!span.overlaps(4, 10));
        assert!(!EntitySpan::date("Friday", 10, 16).overlaps(0, 10));
    }

    #[test]
    fn deadline_tokens_render() {
        assert_eq!(Deadline::Weekday(Weekday::Friday).to_string(), "Friday");
        assert_eq!(Deadline::InDays(2).to_string(), "IN_N_DAYS(2)");
        assert_eq!(Deadline::NextWeek.to_string(), "NEXT_WEEK");
        let date = calendar_date(2025, 3, 7).unwrap();
        assert_eq!(Deadline::Date(date).to_string(), "2025-03-07");
    }

    #[test]
    fn deadline_parses_its_own_tokens() {
        assert_eq!(Deadline::from("IN_N_DAYS(14)".to_string()), Deadline::InDays(14));
        assert_eq!(Deadline::from("END_OF_MONTH".to_string()), Deadline::EndOfMonth);
        assert_eq!(
            Deadline::from("Tuesday".to_string()),
            Deadline::Weekday(Weekday::Tuesday)
        );
        assert_eq!(
            Deadline::from("after the offsite".to_string()),
            Deadline::Phrase("after the offsite".to_string())
        );
    }

    #[test]
    fn invalid_iso_dates_are_rejected() {
        assert!(parse_iso_date("2025-02-30").is_none());
        assert!(parse_iso_date("25-02-03").is_none());
        assert!(parse_iso_date("2024-02-29").is_some());
    }

    #[test]
    fn action_item_serializes_with_lowercase_enums() {
        let item = ActionItem {
            task: "ship it".to_string(),
            assigned_to: Some("Sarah".to_string()),
            deadline: Some(Deadline::EndOfMonth),
            priority: Priority::High,
            status: ActionStatus::Pending,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"priority\":\"high\""));
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"deadline\":\"END_OF_MONTH\""));

        let back: ActionItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn stored_statuses_deserialize() {
        let statuses: Vec<ActionStatus> =
            serde_json::from_str(r#"["pending","in_progress","completed"]"#).unwrap();
        assert_eq!(
            statuses,
            vec![
                ActionStatus::Pending,
                ActionStatus::InProgress,
                ActionStatus::Completed
            ]
        );
    }

    #[test]
    fn entity_kind_uses_uppercase_tags() {
        let span: EntitySpan =
            serde_json::from_str(r#"{"text":"Mary","kind":"PERSON","start":3,"end":7}"#).unwrap();
        assert_eq!(span, EntitySpan::person("Mary", 3, 7));
    }
}
