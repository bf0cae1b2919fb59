use super::collapse_whitespace;
use crate::types::Priority;

const HIGH_KEYWORDS: [&str; 5] = ["urgent", "asap", "critical", "immediately", "emergency"];
const LOW_KEYWORDS: [&str; 6] = [
    "when possible",
    "low priority",
    "eventually",
    "no rush",
    "optional",
    "nice to have",
];

/// Keyword scan over the task text. HIGH evidence beats LOW; anything else is MEDIUM.
pub fn classify_priority(task: &str) -> Priority {
    let normalized = collapse_whitespace(task).to_lowercase();
    if HIGH_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
        Priority::High
    } else if LOW_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
        Priority::Low
    } else {
        Priority::Medium
    }
}
