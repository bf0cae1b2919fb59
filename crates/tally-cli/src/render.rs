use tally_core::ActionItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("format must be text or json (got {other})")),
        }
    }
}

pub fn render(items: &[ActionItem], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(items),
        OutputFormat::Text => Ok(render_text(items)),
    }
}

/// One line per item: `[priority] task (owner, due deadline)`.
fn render_text(items: &[ActionItem]) -> String {
    if items.is_empty() {
        return "no action items found".to_string();
    }

    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. [{}] {}", index + 1, item.priority, item.task));
        let mut details = Vec::new();
        if let Some(owner) = &item.assigned_to {
            details.push(format!("owner: {owner}"));
        }
        if let Some(deadline) = &item.deadline {
            details.push(format!("due: {deadline}"));
        }
        if !details.is_empty() {
            out.push_str(&format!(" ({})", details.join(", ")));
        }
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{ActionStatus, Deadline, Priority};

    fn item(task: &str, owner: Option<&str>, deadline: Option<Deadline>) -> ActionItem {
        ActionItem {
            task: task.to_string(),
            assigned_to: owner.map(str::to_string),
            deadline,
            priority: Priority::Medium,
            status: ActionStatus::Pending,
        }
    }

    #[test]
    fn parse_format_is_case_insensitive() {
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text").unwrap(), OutputFormat::Text);
        assert!(OutputFormat::parse("csv").is_err());
    }

    #[test]
    fn text_lists_owner_and_deadline_when_present() {
        let items = vec![
            item(
                "prepare the financial report",
                Some("John"),
                Some(Deadline::from("Friday".to_string())),
            ),
            item("schedule a follow-up call", None, None),
        ];
        let text = render(&items, OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "1. [medium] prepare the financial report (owner: John, due: Friday)\n\
             2. [medium] schedule a follow-up call"
        );
    }

    #[test]
    fn text_reports_empty_result() {
        assert_eq!(
            render(&[], OutputFormat::Text).unwrap(),
            "no action items found"
        );
    }

    #[test]
    fn json_uses_normalized_field_values() {
        let items = vec![item("book flights", Some("Mina"), Some(Deadline::InDays(2)))];
        let json = render(&items, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["assigned_to"], "Mina");
        assert_eq!(value[0]["deadline"], "IN_N_DAYS(2)");
        assert_eq!(value[0]["priority"], "medium");
        assert_eq!(value[0]["status"], "pending");
    }
}
