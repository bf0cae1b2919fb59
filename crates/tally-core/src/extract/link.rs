use super::tidy_task;
use crate::ExtractError;
use crate::types::{Candidate, CandidateSource, Clause, EntityKind, EntitySpan};
use log::trace;

const FALLBACK_CONFIDENCE: f32 = 0.4;

/// Closed set of task-like cues that let the fallback path fire.
const CUE_WORDS: [&str; 4] = ["will", "to", "plan", "responsible"];

/// Lower-confidence candidate for a clause no pattern rule matched.
///
/// Fires only when the clause overlaps a PERSON span and contains a cue word.
/// The task is the clause with every person name cut out; the assignee is
/// left for `link_candidates` to fill.
pub(crate) fn fallback_candidate(clause: &Clause<'_>, entities: &[EntitySpan]) -> Option<Candidate> {
    let mut persons: Vec<&EntitySpan> = persons_in(clause, entities).collect();
    if persons.is_empty() || !has_cue(clause.text) {
        return None;
    }
    persons.sort_by_key(|span| span.start);

    let task = tidy_task(&strip_spans(clause, &persons));
    if task.is_empty() {
        return None;
    }

    trace!(
        "event=fallback_hit module=extract clause={} persons={}",
        clause.index,
        persons.len()
    );

    Some(Candidate {
        task,
        assignee: None,
        deadline_phrase: None,
        clause_index: clause.index,
        source: CandidateSource::Fallback,
        confidence: FALLBACK_CONFIDENCE,
        task_start: clause.start,
        task_end: clause.end,
    })
}

/// Fills missing assignees and deadline phrases from nearby entity spans.
///
/// Assignees come from PERSON spans in the candidate's clause, else the
/// clause immediately before it (never after). Among several, the span
/// closest to the task phrase wins, earliest offset on ties. Deadlines come
/// from DATE spans in the same clause only, first by offset.
///
/// The one-clause look-back is a narrow heuristic and the likeliest source
/// of wrong assignees; keep it at one clause.
///
/// Spans here carry byte offsets, already converted from character indices.
pub(crate) fn link_candidates(
    candidates: &mut [Candidate],
    clauses: &[Clause<'_>],
    entities: &[EntitySpan],
) -> Result<(), ExtractError> {
    for candidate in candidates.iter_mut() {
        let clause = clauses
            .get(candidate.clause_index)
            .ok_or(ExtractError::DanglingClause {
                index: candidate.clause_index,
                clauses: clauses.len(),
            })?;

        if candidate.assignee.is_none() {
            let preceding = candidate
                .clause_index
                .checked_sub(1)
                .and_then(|index| clauses.get(index));
            candidate.assignee = nearest_person(candidate, clause, entities)
                .or_else(|| preceding.and_then(|prev| nearest_person(candidate, prev, entities)))
                .map(|span| span.text.trim().to_string());
        }

        if candidate.deadline_phrase.is_none() {
            candidate.deadline_phrase = entities
                .iter()
                .filter(|span| span.kind == EntityKind::Date && span.overlaps(clause.start, clause.end))
                .filter(|span| !span.text.trim().is_empty())
                .min_by_key(|span| span.start)
                .map(|span| span.text.trim().to_string());
        }
    }
    Ok(())
}

fn persons_in<'e>(
    clause: &Clause<'_>,
    entities: &'e [EntitySpan],
) -> impl Iterator<Item = &'e EntitySpan> {
    let (start, end) = (clause.start, clause.end);
    entities
        .iter()
        .filter(move |span| span.kind == EntityKind::Person && span.overlaps(start, end))
}

fn nearest_person<'e>(
    candidate: &Candidate,
    clause: &Clause<'_>,
    entities: &'e [EntitySpan],
) -> Option<&'e EntitySpan> {
    persons_in(clause, entities)
        .filter(|span| !span.text.trim().is_empty())
        .min_by_key(|span| {
            (
                distance(span, candidate.task_start, candidate.task_end),
                span.start,
            )
        })
}

/// Byte gap between a span and the task phrase; zero when they overlap.
fn distance(span: &EntitySpan, task_start: usize, task_end: usize) -> usize {
    if span.end <= task_start {
        task_start - span.end
    } else if span.start >= task_end {
        span.start - task_end
    } else {
        0
    }
}

fn has_cue(text: &str) -> bool {
    text.split(|ch: char| !ch.is_alphanumeric())
        .any(|word| CUE_WORDS.iter().any(|cue| cue.eq_ignore_ascii_case(word)))
}

/// Clause text with the given spans (sorted by start, clipped to the clause) removed.
fn strip_spans(clause: &Clause<'_>, spans: &[&EntitySpan]) -> String {
    let mut out = String::with_capacity(clause.text.len());
    let mut cursor = 0;
    for span in spans {
        let start = span.start.max(clause.start) - clause.start;
        let end = span.end.min(clause.end) - clause.start;
        if start > cursor {
            out.push_str(&clause.text[cursor..start]);
        }
        cursor = cursor.max(end);
    }
    if cursor < clause.text.len() {
        out.push_str(&clause.text[cursor..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;

    fn candidate(task: &str, clause_index: usize, span: (usize, usize)) -> Candidate {
        Candidate {
            task: task.to_string(),
            assignee: None,
            deadline_phrase: None,
            clause_index,
            source: CandidateSource::Pattern,
            confidence: 0.6,
            task_start: span.0,
            task_end: span.1,
        }
    }

    #[test]
    fn fallback_needs_person_and_cue() {
        let text = "Sarah is responsible for the vendor contract";
        let clause = segment(text).next().unwrap();
        let entities = [EntitySpan::person("Sarah", 0, 5)];

        let found = fallback_candidate(&clause, &entities).unwrap();
        assert_eq!(found.task, "is responsible for the vendor contract");
        assert_eq!(found.source, CandidateSource::Fallback);
        assert_eq!(found.confidence, 0.4);
        assert!(found.assignee.is_none());

        assert!(fallback_candidate(&clause, &[]).is_none());

        let no_cue = "Sarah joined late";
        let clause = segment(no_cue).next().unwrap();
        assert!(fallback_candidate(&clause, &entities).is_none());
    }

    #[test]
    fn fallback_strips_leading_cue_after_name() {
        let text = "john will send the report";
        let clause = segment(text).next().unwrap();
        let entities = [EntitySpan::person("john", 0, 4)];
        let found = fallback_candidate(&clause, &entities).unwrap();
        assert_eq!(found.task, "send the report");
    }

    #[test]
    fn cue_must_be_a_whole_word() {
        assert!(has_cue("we plan the launch"));
        assert!(!has_cue("the willow tree"));
        assert!(!has_cue("a planned outage"));
    }

    #[test]
    fn assignee_from_same_clause() {
        let text = "Let Omar handle the invoices";
        let clauses: Vec<_> = segment(text).collect();
        let entities = [EntitySpan::person("Omar", 4, 8)];
        let mut candidates = [candidate("handle the invoices", 0, (9, 28))];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert_eq!(candidates[0].assignee.as_deref(), Some("Omar"));
    }

    #[test]
    fn assignee_looks_back_one_clause_only() {
        // Most likely source of false positives: the name may belong to a different topic.
        let text = "Next, the financial report. We will own it. Then more";
        let clauses: Vec<_> = segment(text).collect();
        let entities = [EntitySpan::person("John", 0, 4)];

        let mut candidates = [candidate("own it", 1, (36, 42))];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert_eq!(candidates[0].assignee.as_deref(), Some("John"));

        let mut candidates = [candidate("more", 2, (49, 53))];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert!(candidates[0].assignee.is_none());
    }

    #[test]
    fn assignee_never_looks_ahead() {
        let text = "Finish the slides. Dana agreed";
        let clauses: Vec<_> = segment(text).collect();
        let entities = [EntitySpan::person("Dana", 19, 23)];
        let mut candidates = [candidate("Finish the slides", 0, (0, 17))];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert!(candidates[0].assignee.is_none());
    }

    #[test]
    fn closest_person_wins_then_earliest() {
        let text = "Ann and Bo said to fix CI";
        let clauses: Vec<_> = segment(text).collect();
        let entities = [
            EntitySpan::person("Ann", 0, 3),
            EntitySpan::person("Bo", 8, 10),
        ];
        let mut candidates = [candidate("fix CI", 0, (19, 25))];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert_eq!(candidates[0].assignee.as_deref(), Some("Bo"));

        // Equidistant: earliest offset.
        let entities = [
            EntitySpan::person("Left", 0, 2),
            EntitySpan::person("Right", 8, 10),
        ];
        let mut candidates = [candidate("x", 0, (4, 6))];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert_eq!(candidates[0].assignee.as_deref(), Some("Left"));
    }

    #[test]
    fn deadline_from_same_clause_only() {
        let text = "Due Friday. Lee will merge the branch on Monday or Tuesday";
        let clauses: Vec<_> = segment(text).collect();
        let entities = [
            EntitySpan::date("Friday", 4, 10),
            EntitySpan::date("Tuesday", 51, 58),
            EntitySpan::date("Monday", 41, 47),
        ];
        let mut candidates = [candidate("merge the branch", 1, (21, 37))];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert_eq!(candidates[0].deadline_phrase.as_deref(), Some("Monday"));
    }

    #[test]
    fn existing_fields_are_not_overwritten() {
        let text = "Kai will ping legal by Friday";
        let clauses: Vec<_> = segment(text).collect();
        let entities = [
            EntitySpan::person("Kai", 0, 3),
            EntitySpan::date("Friday", 23, 29),
        ];
        let mut filled = candidate("ping legal", 0, (9, 19));
        filled.assignee = Some("Kai Moreno".to_string());
        filled.deadline_phrase = Some("Friday noon".to_string());
        let mut candidates = [filled];
        link_candidates(&mut candidates, &clauses, &entities).unwrap();
        assert_eq!(candidates[0].assignee.as_deref(), Some("Kai Moreno"));
        assert_eq!(candidates[0].deadline_phrase.as_deref(), Some("Friday noon"));
    }

    #[test]
    fn dangling_clause_is_a_fault() {
        let clauses: Vec<_> = segment("only one").collect();
        let mut candidates = [candidate("ghost task", 5, (0, 1))];
        let err = link_candidates(&mut candidates, &clauses, &[]).unwrap_err();
        assert!(matches!(err, ExtractError::DanglingClause { index: 5, clauses: 1 }));
    }
}
