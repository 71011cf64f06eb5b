//! Result line printed by compiled command harnesses.

use serde::{Deserialize, Serialize};

/// Prefix of the single stderr line a harness prints after running a body.
pub const REPORT_PREFIX: &str = "tarn-result: ";

/// Outcome a harness reports for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub command: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Parse a stderr line, returning `None` for ordinary output.
    pub fn parse_line(line: &str) -> Option<Self> {
        let payload = line.trim_end().strip_prefix(REPORT_PREFIX)?;
        serde_json::from_str(payload).ok()
    }

    pub fn to_line(&self) -> String {
        // Serializing three plain fields cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{REPORT_PREFIX}{json}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_report() {
        let line = r#"tarn-result: {"command":"deploy","ok":false,"error":"no target"}"#;
        let report = Report::parse_line(line).unwrap();
        assert!(!report.ok);
        assert_eq!(report.error.as_deref(), Some("no target"));
    }

    #[test]
    fn test_ordinary_lines_are_not_reports() {
        assert!(Report::parse_line("warning: unused variable").is_none());
        assert!(Report::parse_line("tarn-result: not json").is_none());
    }

    #[test]
    fn test_line_round_trips() {
        let report = Report {
            command: "build".into(),
            ok: true,
            error: None,
        };
        assert_eq!(Report::parse_line(&report.to_line()), Some(report));
    }
}
