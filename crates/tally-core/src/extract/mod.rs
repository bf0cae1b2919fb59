//! Action item extraction pipeline.
//!
//! segment -> pattern rules -> fallback -> entity linking -> merge.
//! Every stage is a plain function over the clauses and entity spans of one
//! meeting; nothing is shared between calls, so separate meetings can be
//! extracted in parallel without coordination.

pub mod deadline;
mod link;
mod merge;
mod pattern;
pub mod priority;

pub use deadline::normalize_deadline;
pub use pattern::RuleKind;
pub use priority::classify_priority;

use crate::ExtractError;
use crate::entities::EntitySource;
use crate::offsets::CharOffsets;
use crate::segment::segment;
use crate::types::{ActionItem, Candidate, Clause, EntitySpan};
use log::{debug, warn};

const DEFAULT_MIN_TASK_CHARS: usize = 6;

/// Tunables for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Candidates whose task has fewer characters than this are dropped as noise.
    pub min_task_chars: usize,
    /// Truncates the final ordered list. `None` keeps everything.
    pub max_items: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_task_chars: DEFAULT_MIN_TASK_CHARS,
            max_items: None,
        }
    }
}

/// Extracts action items with default options.
///
/// An empty text or an empty entity list is not an error; the only errors
/// are internal-consistency faults such as entity offsets outside the text.
pub fn extract_action_items(
    text: &str,
    entities: &[EntitySpan],
) -> Result<Vec<ActionItem>, ExtractError> {
    extract_action_items_with(text, entities, &ExtractOptions::default())
}

pub fn extract_action_items_with(
    text: &str,
    entities: &[EntitySpan],
    options: &ExtractOptions,
) -> Result<Vec<ActionItem>, ExtractError> {
    let spans = to_byte_spans(text, entities)?;

    let clauses: Vec<Clause<'_>> = segment(text).collect();
    let mut candidates = propose_candidates(&clauses, &spans);
    candidates.retain(|candidate| candidate.task.chars().count() >= options.min_task_chars);
    let proposed = candidates.len();

    link::link_candidates(&mut candidates, &clauses, &spans).inspect_err(|err| {
        warn!("event=extract module=extract status=fault error={err}");
    })?;
    let mut items = merge::merge_candidates(candidates, clauses.len()).inspect_err(|err| {
        warn!("event=extract module=extract status=fault error={err}");
    })?;
    if let Some(max) = options.max_items {
        items.truncate(max);
    }

    debug!(
        "event=extract module=extract status=ok clauses={} entities={} candidates={} items={}",
        clauses.len(),
        entities.len(),
        proposed,
        items.len()
    );
    Ok(items)
}

/// Makes the single entity-source call for `text`, then extracts.
pub fn extract_with_source(
    text: &str,
    source: &mut dyn EntitySource,
    options: &ExtractOptions,
) -> Result<Vec<ActionItem>, ExtractError> {
    let entities = source.recognize_entities(text).inspect_err(|err| {
        warn!(
            "event=recognize_entities module=extract status=error source={} error={err}",
            source.name()
        );
    })?;
    debug!(
        "event=recognize_entities module=extract status=ok source={} spans={}",
        source.name(),
        entities.len()
    );
    extract_action_items_with(text, &entities, options)
}

/// Pattern candidates first; clauses no rule matched go to the fallback path.
fn propose_candidates(clauses: &[Clause<'_>], entities: &[EntitySpan]) -> Vec<Candidate> {
    clauses
        .iter()
        .filter_map(|clause| {
            pattern::match_clause(clause, entities)
                .or_else(|| link::fallback_candidate(clause, entities))
        })
        .collect()
}

/// Checks caller-supplied character offsets and rewrites them as byte
/// offsets, which is what clauses and the later stages slice with.
fn to_byte_spans(text: &str, entities: &[EntitySpan]) -> Result<Vec<EntitySpan>, ExtractError> {
    if entities.is_empty() {
        return Ok(Vec::new());
    }
    let offsets = CharOffsets::new(text);
    entities
        .iter()
        .map(|span| {
            if span.start > span.end {
                return Err(ExtractError::InvertedEntitySpan {
                    start: span.start,
                    end: span.end,
                });
            }
            match (offsets.to_byte(span.start), offsets.to_byte(span.end)) {
                (Some(start), Some(end)) => Ok(EntitySpan {
                    start,
                    end,
                    ..span.clone()
                }),
                _ => Err(ExtractError::EntityOutOfBounds {
                    start: span.start,
                    end: span.end,
                    len: offsets.char_len(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|fault| {
            warn!("event=extract module=extract status=fault error={fault}");
        })
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased, whitespace-collapsed task used for duplicate detection.
pub(crate) fn normalize_task(task: &str) -> String {
    collapse_whitespace(task).to_lowercase()
}

/// Whitespace-collapsed phrase without trailing punctuation.
pub(crate) fn tidy_phrase(raw: &str) -> String {
    collapse_whitespace(raw)
        .trim_end_matches(is_trailing_punct)
        .trim_end()
        .to_string()
}

/// Task text without connective lead words (`to`, `that`, `will`),
/// stray leading separators, or trailing punctuation.
pub(crate) fn tidy_task(raw: &str) -> String {
    const LEAD_WORDS: [&str; 3] = ["to", "that", "will"];

    let collapsed = collapse_whitespace(raw);
    let mut rest = collapsed.as_str();
    loop {
        rest = rest.trim_start_matches(is_leading_separator).trim_start();
        match rest.split_once(' ') {
            Some((word, tail)) if LEAD_WORDS.iter().any(|lead| lead.eq_ignore_ascii_case(word)) => {
                rest = tail;
            }
            _ => break,
        }
    }
    tidy_phrase(rest)
}

fn is_trailing_punct(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | ',' | ';' | ':')
}

fn is_leading_separator(ch: char) -> bool {
    matches!(ch, ',' | ';' | ':' | '-' | '–' | '—')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    #[test]
    fn tidy_task_strips_connectives_and_punctuation() {
        assert_eq!(tidy_task("to send the deck."), "send the deck");
        assert_eq!(tidy_task(" , will   to follow up!!"), "follow up");
        assert_eq!(tidy_task("That covers it"), "covers it");
        assert_eq!(tidy_task("to"), "to");
        assert_eq!(tidy_task("  "), "");
    }

    #[test]
    fn tidy_phrase_keeps_inner_punctuation() {
        assert_eq!(tidy_phrase("March 3, 2026."), "March 3, 2026");
    }

    #[test]
    fn normalize_task_is_case_and_space_insensitive() {
        assert_eq!(normalize_task("  Send\tthe  Report "), "send the report");
    }

    #[test]
    fn short_tasks_are_dropped() {
        let items = extract_action_items("Kim will go.", &[]).unwrap();
        assert!(items.is_empty());

        let options = ExtractOptions {
            min_task_chars: 1,
            max_items: None,
        };
        let items = extract_action_items_with("Kim will go.", &[], &options).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn max_items_truncates_in_order() {
        let text = "Ana will draft the plan. Ben will review the plan. Cy will sign the plan.";
        let options = ExtractOptions {
            max_items: Some(2),
            ..ExtractOptions::default()
        };
        let items = extract_action_items_with(text, &[], &options).unwrap();
        let owners: Vec<_> = items.iter().filter_map(|i| i.assigned_to.as_deref()).collect();
        assert_eq!(owners, vec!["Ana", "Ben"]);
    }

    #[test]
    fn entity_validation_rejects_bad_offsets() {
        let text = "Zoë will call";
        let past_end = [EntitySpan::person("x", 0, 14)];
        assert!(matches!(
            extract_action_items(text, &past_end),
            Err(ExtractError::EntityOutOfBounds { len: 13, .. })
        ));

        let inverted = [EntitySpan {
            text: "x".into(),
            kind: EntityKind::Date,
            start: 5,
            end: 2,
        }];
        assert!(matches!(
            extract_action_items(text, &inverted),
            Err(ExtractError::InvertedEntitySpan { .. })
        ));
    }

    #[test]
    fn entity_offsets_count_characters_not_bytes() {
        // 13 characters, 14 bytes.
        let text = "Zoë will call";
        let spans = to_byte_spans(text, &[EntitySpan::person("Zoë", 0, 3)]).unwrap();
        assert_eq!((spans[0].start, spans[0].end), (0, 4));
        assert_eq!(&text[spans[0].start..spans[0].end], "Zoë");

        let at_end = to_byte_spans(text, &[EntitySpan::date("", 13, 13)]).unwrap();
        assert_eq!(at_end[0].start, text.len());
    }

    #[test]
    fn names_after_multibyte_text_are_linked() {
        let text = "Café budget → José. TODO: reconcile the receipts";
        let entities = [EntitySpan::person("José", 14, 18)];
        let items = extract_action_items(text, &entities).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task, "reconcile the receipts");
        assert_eq!(items[0].assigned_to.as_deref(), Some("José"));
    }
}
