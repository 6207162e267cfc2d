//! Plain-text rendering of command results

use crate::config::{Entry, ValueSource, mask};
use crate::project::ProjectStatus;

/// Render store entries as aligned `key  =  value` lines
///
/// Values are masked when `mask_keep` is given. Environment overrides are
/// tagged so users can tell why a value differs from the store.
pub fn render_entries(entries: &[Entry], mask_keep: Option<usize>) -> String {
    if entries.is_empty() {
        return "No config set yet.".to_string();
    }

    let width = entries.iter().map(|e| e.key.chars().count()).max().unwrap_or(0);
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let value = match mask_keep {
                Some(keep) => mask(&entry.value, keep),
                None => entry.value.clone(),
            };
            let mut line = format!("{:<width$}  =  {}", entry.key, value);
            if entry.source == ValueSource::Environment {
                line.push_str("  (env)");
            }
            line
        })
        .collect();
    lines.join("\n")
}

/// Render a project status summary
pub fn render_status(status: &ProjectStatus) -> String {
    let meta = &status.metadata;
    let mut lines = vec![
        format!("Project: {} ({})", meta.name, meta.id),
        format!("Root:    {}", status.root.display()),
        format!("Created: {}", meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Version: {} (schema {})", meta.tool_version, meta.schema_version),
    ];
    lines.extend(status.dirs.iter().map(|dir| {
        let mark = if dir.present { "OK" } else { "MISSING" };
        format!(" - {:<8}: {}", dir.name, mark)
    }));
    lines.join("\n")
}
