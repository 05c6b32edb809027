//! # Capability Table
//!
//! Renders provider summaries for documentation.

use super::ProviderSummary;
use crate::provider::CapabilityName;
use std::fmt::Write;

/// Markdown table with one row per provider and one column per capability
#[must_use]
pub fn markdown_table(summaries: &[ProviderSummary]) -> String {
    let mut out = String::from("| Provider | Stability | Maintenance | API |");
    for name in CapabilityName::ALL {
        let _ = write!(out, " {name} |");
    }
    out.push('\n');

    out.push_str("|---|---|---|---|");
    out.push_str(&"---|".repeat(CapabilityName::ALL.len()));
    out.push('\n');

    for summary in summaries {
        let _ = write!(
            out,
            "| {} | {} | {} | {} |",
            summary.name, summary.stability, summary.maintenance_status, summary.api_capabilities
        );
        for name in CapabilityName::ALL {
            let mark = if summary.capabilities.iter().any(|c| c.name == name) {
                " x |"
            } else {
                "   |"
            };
            out.push_str(mark);
        }
        out.push('\n');
    }
    out
}

/// Multi-line description of one provider
#[must_use]
pub fn describe(summary: &ProviderSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:         {}", summary.name);
    let _ = writeln!(out, "Stability:    {}", summary.stability);
    let _ = writeln!(out, "Maintenance:  {}", summary.maintenance_status);
    let _ = writeln!(out, "API:          {}", summary.api_capabilities);
    if !summary.comment.is_empty() {
        let _ = writeln!(out, "Comment:      {}", summary.comment);
    }
    let _ = writeln!(out, "Capabilities:");
    for capability in &summary.capabilities {
        if capability.notes.is_empty() {
            let _ = writeln!(out, "  - {}", capability.name);
        } else {
            let _ = writeln!(out, "  - {} ({})", capability.name, capability.notes);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ApiCapabilities, Capability, MaintenanceStatus, Stability};

    fn summary() -> ProviderSummary {
        ProviderSummary {
            name: "Vault".to_string(),
            stability: Stability::Beta,
            maintenance_status: MaintenanceStatus::Maintained,
            api_capabilities: ApiCapabilities::ReadOnly,
            capabilities: vec![
                Capability::new(CapabilityName::GetSecret),
                Capability::with_notes(CapabilityName::FindByTag, "KV v2 only"),
            ],
            comment: String::new(),
        }
    }

    #[test]
    fn test_markdown_table_marks_capabilities() {
        let table = markdown_table(&[summary()]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("| Provider | Stability | Maintenance | API | GetSecret |"));
        assert!(lines[2].starts_with("| Vault | beta | Maintained | ReadOnly | x |"));
        assert_eq!(lines[2].matches(" x |").count(), 2);
    }

    #[test]
    fn test_describe_includes_notes() {
        let text = describe(&summary());
        assert!(text.contains("Stability:    beta"));
        assert!(text.contains("  - FindByTag (KV v2 only)"));
    }
}
