use crate::EntityError;
use crate::offsets::CharOffsets;
use crate::types::{EntityKind, EntitySpan};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Supplies PERSON and DATE spans for a meeting text.
///
/// Called once per extraction, before any clause is processed. Failures are
/// the only retry-eligible errors in the pipeline.
pub trait EntitySource: Send {
    fn name(&self) -> &'static str;
    fn recognize_entities(&mut self, text: &str) -> Result<Vec<EntitySpan>, EntityError>;
}

/// Recognizes nothing. Extraction still works from surface patterns alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntities;

impl EntitySource for NoEntities {
    fn name(&self) -> &'static str {
        "none"
    }

    fn recognize_entities(&mut self, _text: &str) -> Result<Vec<EntitySpan>, EntityError> {
        Ok(Vec::new())
    }
}

/// Spans resolved elsewhere (an NER service, a fixture file) and handed in as-is.
#[derive(Debug, Clone, Default)]
pub struct StaticEntities {
    spans: Vec<EntitySpan>,
}

impl StaticEntities {
    pub fn new(spans: Vec<EntitySpan>) -> Self {
        Self { spans }
    }
}

impl EntitySource for StaticEntities {
    fn name(&self) -> &'static str {
        "static"
    }

    fn recognize_entities(&mut self, _text: &str) -> Result<Vec<EntitySpan>, EntityError> {
        Ok(self.spans.clone())
    }
}

static DATE_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|next\s+week|tomorrow|end\s+of\s+(?:the\s+)?month|(?:with)?in\s+(?:\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten)\s+(?:days?|weeks?)|(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?|\d{4}-\d{1,2}-\d{1,2}|\d{1,2}/\d{1,2}(?:/\d{4})?)\b",
    )
    .expect("date cue pattern must compile")
});

/// Deterministic recognizer for a known participant roster.
///
/// Reported offsets are character indices, like any other source.
/// Tags whole-word, case-insensitive mentions of each participant (and of a
/// participant's first name when no one else shares it) as PERSON with the
/// roster spelling as canonical text. Optionally tags common date phrases.
#[derive(Debug, Clone)]
pub struct RosterEntities {
    people: Option<Regex>,
    canonical: HashMap<String, String>,
    detect_dates: bool,
}

impl RosterEntities {
    pub fn new(participants: &[String], detect_dates: bool) -> Result<Self, EntityError> {
        let canonical = roster_aliases(participants);
        let people = if canonical.is_empty() {
            None
        } else {
            let mut aliases: Vec<&String> = canonical.keys().collect();
            // Longest first so "Anna Lee" wins over "Anna".
            aliases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation = aliases
                .iter()
                .map(|alias| regex::escape(alias).replace(' ', r"\s+"))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{alternation})\b");
            Some(Regex::new(&pattern).map_err(|e| EntityError::Unavailable(e.to_string()))?)
        };
        Ok(Self {
            people,
            canonical,
            detect_dates,
        })
    }
}

impl EntitySource for RosterEntities {
    fn name(&self) -> &'static str {
        "roster"
    }

    fn recognize_entities(&mut self, text: &str) -> Result<Vec<EntitySpan>, EntityError> {
        let offsets = CharOffsets::new(text);
        let chars = |found: &regex::Match<'_>| {
            (offsets.to_char(found.start()), offsets.to_char(found.end()))
        };

        let mut spans = Vec::new();
        if let Some(people) = &self.people {
            for found in people.find_iter(text) {
                let key = alias_key(found.as_str());
                let canonical = self
                    .canonical
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| found.as_str().to_string());
                let (start, end) = chars(&found);
                spans.push(EntitySpan::person(canonical, start, end));
            }
        }
        if self.detect_dates {
            for found in DATE_CUES.find_iter(text) {
                let (start, end) = chars(&found);
                spans.push(EntitySpan::date(found.as_str(), start, end));
            }
        }
        spans.sort_by_key(|span| (span.start, span.end));
        Ok(spans)
    }
}

/// Lower-cased alias -> roster spelling. First names shared by two
/// participants are dropped as ambiguous.
fn roster_aliases(participants: &[String]) -> HashMap<String, String> {
    let mut canonical = HashMap::new();
    let mut first_names: HashMap<String, Option<String>> = HashMap::new();

    for participant in participants {
        let name = participant.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            continue;
        }
        canonical.insert(alias_key(&name), name.clone());
        if let Some((first, _)) = name.split_once(' ') {
            first_names
                .entry(alias_key(first))
                .and_modify(|owner| {
                    if owner.as_deref() != Some(name.as_str()) {
                        *owner = None;
                    }
                })
                .or_insert_with(|| Some(name.clone()));
        }
    }

    for (first, owner) in first_names {
        if let Some(owner) = owner {
            canonical.entry(first).or_insert(owner);
        }
    }
    canonical
}

fn alias_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
