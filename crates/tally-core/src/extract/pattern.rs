use super::{tidy_phrase, tidy_task};
use crate::types::{Candidate, CandidateSource, Clause, EntityKind, EntitySpan};
use log::trace;
use once_cell::sync::Lazy;
use regex::{Captures, Match, Regex};

/// One or two capitalized tokens. Entity spans override what this captures.
const NAME: &str = r"\b(?P<name>\p{Lu}[\p{L}'’\-]*(?:\s+\p{Lu}[\p{L}'’\-]*)?)";

/// Surface rules in evaluation order; the first rule that produces a
/// candidate for a clause wins. Named groups carry the capture roles:
/// `name` (assignee), `task`, `deadline`.
static RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    [
        (
            RuleKind::CommitmentWithDeadline,
            0.9,
            r"<NAME>\s+(?i:will)\s+(?P<task>.+?)\s+(?i:by)\s+(?P<deadline>.+)$",
        ),
        (
            RuleKind::Commitment,
            0.8,
            r"<NAME>\s+(?i:will)\s+(?P<task>.+)$",
        ),
        (
            RuleKind::Obligation,
            0.75,
            r"<NAME>\s+(?i:needs?\s+to|ha(?:s|ve)\s+to|should|must)\s+(?P<task>.+?)(?:\s+(?i:by)\s+(?P<deadline>.+))?$",
        ),
        (
            RuleKind::Assignment,
            0.7,
            r"\b(?i:action\s+items?|to-?do|task|assign(?:ed)?)\s*:\s*<NAME>\s+[-–—]\s+(?P<task>.+)$",
        ),
        (
            RuleKind::Imperative,
            0.6,
            r"\b(?i:action(?:\s+items?)?|to-?do)\s*:\s*(?P<task>.+)$",
        ),
    ]
    .into_iter()
    .map(|(kind, confidence, pattern)| PatternRule {
        kind,
        confidence,
        regex: Regex::new(&pattern.replace("<NAME>", NAME)).expect("pattern rule must compile"),
    })
    .collect()
});

/// Words that open a sentence without being part of the subject.
const LEADING_WORDS: &[&str] = &[
    "then", "so", "and", "but", "also", "next", "now", "okay", "ok", "finally", "first", "second",
    "third", "plus", "meanwhile", "additionally", "afterwards", "later", "hopefully", "maybe",
    "perhaps", "yes", "no", "well", "sure", "great", "today", "tomorrow", "monday", "tuesday",
    "wednesday", "thursday", "friday", "saturday", "sunday", "january", "february", "march",
    "july", "september", "october", "november", "december", "afterward", "lastly",
];

/// Subjects that commit someone without naming them; the linker may fill the assignee.
const PRONOUNS: &[&str] = &[
    "i", "we", "you", "they", "he", "she", "someone", "somebody", "everyone", "everybody",
    "team",
];

/// Subjects that never carry a commitment ("It will rain").
const NON_AGENTS: &[&str] = &[
    "it", "this", "that", "there", "these", "those", "which", "what", "nothing", "everything",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `<Name> will <task> by <deadline>`
    CommitmentWithDeadline,
    /// `<Name> will <task>`
    Commitment,
    /// `<Name> needs to|has to|should|must <task> [by <deadline>]`
    Obligation,
    /// `Action item|TODO|Task|Assign: <Name> - <task>`
    Assignment,
    /// `Action|TODO: <task>`
    Imperative,
}

struct PatternRule {
    kind: RuleKind,
    confidence: f32,
    regex: Regex,
}

enum Subject {
    Named(String),
    Unnamed,
    NotAnAgent,
}

/// Runs the rule table against a clause; `None` sends the clause to the fallback path.
pub(crate) fn match_clause(clause: &Clause<'_>, entities: &[EntitySpan]) -> Option<Candidate> {
    RULES.iter().find_map(|rule| rule.apply(clause, entities))
}

impl PatternRule {
    fn apply(&self, clause: &Clause<'_>, entities: &[EntitySpan]) -> Option<Candidate> {
        self.regex
            .captures_iter(clause.text)
            .find_map(|caps| self.candidate(&caps, clause, entities))
    }

    fn candidate(
        &self,
        caps: &Captures<'_>,
        clause: &Clause<'_>,
        entities: &[EntitySpan],
    ) -> Option<Candidate> {
        let task_match = caps.name("task")?;
        let task = tidy_task(task_match.as_str());
        if task.is_empty() {
            return None;
        }

        let assignee = match caps.name("name") {
            Some(name) => match resolve_subject(clause, name, entities) {
                Subject::Named(name) => Some(name),
                Subject::Unnamed => None,
                Subject::NotAnAgent => return None,
            },
            None => None,
        };
        let deadline_phrase = caps
            .name("deadline")
            .map(|m| tidy_phrase(m.as_str()))
            .filter(|phrase| !phrase.is_empty());

        trace!(
            "event=pattern_hit module=extract rule={:?} clause={}",
            self.kind, clause.index
        );

        Some(Candidate {
            task,
            assignee,
            deadline_phrase,
            clause_index: clause.index,
            source: CandidateSource::Pattern,
            confidence: self.confidence,
            task_start: clause.start + task_match.start(),
            task_end: clause.start + task_match.end(),
        })
    }
}

fn resolve_subject(clause: &Clause<'_>, name: Match<'_>, entities: &[EntitySpan]) -> Subject {
    let start = clause.start + name.start();
    let end = clause.start + name.end();
    if let Some(person) = entities
        .iter()
        .filter(|span| span.kind == EntityKind::Person && span.overlaps(start, end))
        .filter(|span| !span.text.trim().is_empty())
        .min_by_key(|span| span.start)
    {
        return Subject::Named(person.text.trim().to_string());
    }

    let tokens: Vec<&str> = name
        .as_str()
        .split_whitespace()
        .skip_while(|token| is_one_of(token, LEADING_WORDS))
        .collect();
    match tokens.first() {
        None => Subject::NotAnAgent,
        Some(first) if is_one_of(first, NON_AGENTS) => Subject::NotAnAgent,
        Some(first) if is_one_of(first, PRONOUNS) => Subject::Unnamed,
        Some(_) => Subject::Named(tokens.join(" ")),
    }
}

fn is_one_of(token: &str, words: &[&str]) -> bool {
    let lower = token.to_lowercase();
    words.iter().any(|word| *word == lower)
}
