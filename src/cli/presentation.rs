//! CLI presentation: text and json formatters for diff results.

use crate::diff::{ChangeStatus, DiffResult, SubtreeChange};
use crate::error::ApiError;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_diff_text(result: &DiffResult, subtrees: Option<&[SubtreeChange]>, color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Previous root: {}", result.previous_root));
    lines.push(format!("Current root:  {}", result.current_root));

    if !result.has_changes {
        lines.push(String::new());
        lines.push("No changes".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    for (path, status) in result.iter() {
        lines.push(status_line(path, status, color));
    }

    if let Some(subtrees) = subtrees {
        lines.push(String::new());
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Subtree", "Status"]);
        for change in subtrees {
            let label = if change.path.is_empty() { "." } else { change.path.as_str() };
            table.add_row(vec![label.to_string(), change.status.to_string()]);
        }
        lines.push(table.to_string());
    }

    lines.push(String::new());
    lines.push(format!(
        "{} changed, {} added, {} removed, {} unchanged",
        result.changed.len(),
        result.added.len(),
        result.removed.len(),
        result.unchanged_count
    ));
    lines.join("\n")
}

fn status_line(path: &str, status: ChangeStatus, color: bool) -> String {
    let line = match status {
        ChangeStatus::Added => format!("+ {}", path),
        ChangeStatus::Removed => format!("- {}", path),
        ChangeStatus::Changed => format!("~ {}", path),
    };
    if !color {
        return line;
    }
    match status {
        ChangeStatus::Added => line.green().to_string(),
        ChangeStatus::Removed => line.red().to_string(),
        ChangeStatus::Changed => line.yellow().to_string(),
    }
}

pub fn format_diff_json(
    result: &DiffResult,
    subtrees: Option<&[SubtreeChange]>,
) -> Result<String, ApiError> {
    let mut value = serde_json::to_value(result)
        .map_err(|e| ApiError::OutputError(format!("Failed to serialize diff: {}", e)))?;
    if let (Some(subtrees), Some(object)) = (subtrees, value.as_object_mut()) {
        let subtrees = serde_json::to_value(subtrees)
            .map_err(|e| ApiError::OutputError(format!("Failed to serialize subtrees: {}", e)))?;
        object.insert("subtrees".to_string(), subtrees);
    }
    serde_json::to_string_pretty(&value)
        .map_err(|e| ApiError::OutputError(format!("Failed to serialize diff: {}", e)))
}
