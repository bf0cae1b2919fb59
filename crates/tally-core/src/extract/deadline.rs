use super::{collapse_whitespace, tidy_phrase};
use crate::types::{Deadline, calendar_date, parse_iso_date, weekday_from_name};
use once_cell::sync::Lazy;
use regex::Regex;

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?i)(?P<month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(?P<day>\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(?P<year>\d{4}))?$",
    )
    .expect("month-day pattern must compile")
});

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<day>\d{1,2})/(?P<month>\d{1,2})(?:/(?P<year>\d{4}))?$")
        .expect("day/month pattern must compile")
});

static ISO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("iso pattern must compile"));

static IN_N: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:with)?in\s+(?P<count>\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten)\s+(?P<unit>days?|weeks?)$")
        .expect("relative duration pattern must compile")
});

/// Normalizes a free-text deadline phrase.
///
/// Weekdays stay symbolic, explicit dates become ISO only when a year makes
/// them unambiguous, relative cues map to `NEXT_WEEK` / `IN_N_DAYS(n)` /
/// `END_OF_MONTH`, and anything else is kept verbatim. Absent or blank input
/// stays absent.
pub fn normalize_deadline(phrase: Option<&str>) -> Option<Deadline> {
    let phrase = tidy_phrase(phrase?);
    if phrase.is_empty() {
        return None;
    }
    let lower = phrase.to_lowercase();

    let normalized = weekday(&lower)
        .or_else(|| explicit_date(&phrase))
        .or_else(|| relative(&lower));
    Some(normalized.unwrap_or(Deadline::Phrase(phrase)))
}

fn weekday(lower: &str) -> Option<Deadline> {
    let name = ["on ", "this ", "coming ", "the "]
        .iter()
        .fold(lower, |rest, prefix| rest.strip_prefix(prefix).unwrap_or(rest));
    weekday_from_name(name).map(Deadline::Weekday)
}

/// `Some` whenever the phrase looks like a date; ambiguous or impossible
/// dates come back as the original phrase rather than a guess.
fn explicit_date(phrase: &str) -> Option<Deadline> {
    let verbatim = || Deadline::Phrase(phrase.to_string());

    if ISO.is_match(phrase) {
        return Some(parse_iso_date(phrase).map_or_else(verbatim, Deadline::Date));
    }

    if let Some(caps) = MONTH_DAY.captures(phrase) {
        let month = month_number(&caps["month"]);
        let day = caps["day"].parse::<u8>().ok();
        let year = caps.name("year").and_then(|y| y.as_str().parse::<i32>().ok());
        return Some(resolve(year, month, day).map_or_else(verbatim, Deadline::Date));
    }

    if let Some(caps) = DAY_MONTH.captures(phrase) {
        let day = caps["day"].parse::<u8>().ok();
        let month = caps["month"].parse::<u8>().ok();
        let year = caps.name("year").and_then(|y| y.as_str().parse::<i32>().ok());
        return Some(resolve(year, month, day).map_or_else(verbatim, Deadline::Date));
    }

    None
}

fn resolve(year: Option<i32>, month: Option<u8>, day: Option<u8>) -> Option<time::Date> {
    calendar_date(year?, month?, day?)
}

fn month_number(name: &str) -> Option<u8> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn relative(lower: &str) -> Option<Deadline> {
    let lower = collapse_whitespace(lower);
    let lower = lower.strip_prefix("the ").unwrap_or(&lower);
    match lower {
        "next week" => return Some(Deadline::NextWeek),
        "end of month" | "end of the month" | "eom" => return Some(Deadline::EndOfMonth),
        "tomorrow" => return Some(Deadline::InDays(1)),
        _ => {}
    }

    let caps = IN_N.captures(lower)?;
    let count = count_value(&caps["count"])?;
    let days = if caps["unit"].starts_with("week") {
        count.checked_mul(7)?
    } else {
        count
    };
    Some(Deadline::InDays(days))
}

fn count_value(word: &str) -> Option<u32> {
    let value = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => return digits.parse().ok(),
    };
    Some(value)
}
