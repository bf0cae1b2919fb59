use super::deadline::normalize_deadline;
use super::normalize_task;
use super::priority::classify_priority;
use crate::ExtractError;
use crate::types::{ActionItem, ActionStatus, Candidate};
use std::cmp::Ordering;

struct Keyed {
    key: String,
    candidate: Candidate,
}

/// Collapses duplicate candidates into action items.
///
/// Two candidates are duplicates when they come from the same clause or when
/// their normalized tasks are equal or prefix-related. Of a duplicate pair
/// the higher confidence survives, then the one with an assignee, then the
/// earlier clause. Survivors keep clause order; priority and deadline are
/// computed on survivors only.
pub(crate) fn merge_candidates(
    candidates: Vec<Candidate>,
    clause_count: usize,
) -> Result<Vec<ActionItem>, ExtractError> {
    let mut survivors: Vec<Keyed> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if candidate.clause_index >= clause_count {
            return Err(ExtractError::DanglingClause {
                index: candidate.clause_index,
                clauses: clause_count,
            });
        }
        let incoming = Keyed {
            key: normalize_task(&candidate.task),
            candidate,
        };

        let beaten = survivors
            .iter()
            .any(|kept| is_duplicate(kept, &incoming) && outranks(&kept.candidate, &incoming.candidate));
        if beaten {
            continue;
        }
        survivors.retain(|kept| !is_duplicate(kept, &incoming));
        survivors.push(incoming);
    }

    survivors.sort_by_key(|kept| kept.candidate.clause_index);
    Ok(survivors
        .into_iter()
        .map(|kept| into_action_item(kept.candidate))
        .collect())
}

fn is_duplicate(a: &Keyed, b: &Keyed) -> bool {
    a.candidate.clause_index == b.candidate.clause_index
        || a.key == b.key
        || a.key.starts_with(&b.key)
        || b.key.starts_with(&a.key)
}

/// Whether `kept` wins over `challenger`.
fn outranks(kept: &Candidate, challenger: &Candidate) -> bool {
    let order = kept
        .confidence
        .total_cmp(&challenger.confidence)
        .then_with(|| kept.assignee.is_some().cmp(&challenger.assignee.is_some()))
        .then_with(|| challenger.clause_index.cmp(&kept.clause_index));
    order != Ordering::Less
}

fn into_action_item(candidate: Candidate) -> ActionItem {
    ActionItem {
        priority: classify_priority(&candidate.task),
        deadline: normalize_deadline(candidate.deadline_phrase.as_deref()),
        assigned_to: candidate.assignee.filter(|name| !name.trim().is_empty()),
        task: candidate.task,
        status: ActionStatus::Pending,
    }
}
