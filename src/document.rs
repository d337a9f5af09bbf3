//! Normalization of ticket records into embeddable documents.

use crate::corpus::TicketRecord;
use crate::error::{Error, Result};

/// Substituted for a missing `resolution_summary`.
const FIX_FALLBACK: &str = "See code";

/// A ticket rendered as a single text blob, ready for embedding and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDocument {
    pub id: String,
    pub text: String,
}

/// Render a ticket record into the canonical document text.
///
/// Deterministic: the same record always yields the same `{id, text}`. A
/// missing resolution summary falls back to a fixed placeholder; missing
/// required fields (`ticket_id`, `issue_subject`, `diff`) are a validation
/// error since the document would be meaningless as a match.
pub fn format_ticket(record: &TicketRecord) -> Result<FormattedDocument> {
    if record.ticket_id.trim().is_empty() {
        return Err(Error::Validation("missing ticket_id".to_string()));
    }
    if record.issue_subject.trim().is_empty() {
        return Err(Error::Validation(format!(
            "ticket {}: missing issue_subject",
            record.ticket_id
        )));
    }
    if record.git_commit.diff.trim().is_empty() {
        return Err(Error::Validation(format!(
            "ticket {}: missing diff",
            record.ticket_id
        )));
    }

    let fix = record
        .resolution_summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(FIX_FALLBACK);

    Ok(FormattedDocument {
        id: record.ticket_id.clone(),
        text: format!(
            "ISSUE: {}\nFIX: {}\nCODE: {}",
            record.issue_subject, fix, record.git_commit.diff
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::GitCommit;

    fn record(summary: Option<&str>) -> TicketRecord {
        TicketRecord {
            ticket_id: "PG-2024-002".to_string(),
            issue_subject: "division by zero".to_string(),
            resolution_summary: summary.map(|s| s.to_string()),
            git_commit: GitCommit {
                diff: "+ NULLIF(val,0)".to_string(),
            },
        }
    }

    #[test]
    fn formats_with_summary() {
        let doc = format_ticket(&record(Some("guard the divisor"))).unwrap();
        assert_eq!(doc.id, "PG-2024-002");
        assert_eq!(
            doc.text,
            "ISSUE: division by zero\nFIX: guard the divisor\nCODE: + NULLIF(val,0)"
        );
    }

    #[test]
    fn missing_summary_uses_fallback() {
        let doc = format_ticket(&record(None)).unwrap();
        assert!(doc.text.contains("FIX: See code"));
    }

    #[test]
    fn blank_summary_uses_fallback() {
        let doc = format_ticket(&record(Some("  "))).unwrap();
        assert!(doc.text.contains("FIX: See code"));
    }

    #[test]
    fn deterministic() {
        let r = record(Some("guard the divisor"));
        assert_eq!(format_ticket(&r).unwrap(), format_ticket(&r).unwrap());
    }

    #[test]
    fn missing_required_fields_fail() {
        let mut r = record(None);
        r.issue_subject = String::new();
        assert!(matches!(format_ticket(&r), Err(Error::Validation(_))));

        let mut r = record(None);
        r.git_commit.diff = "   ".to_string();
        assert!(matches!(format_ticket(&r), Err(Error::Validation(_))));

        let mut r = record(None);
        r.ticket_id = String::new();
        assert!(matches!(format_ticket(&r), Err(Error::Validation(_))));
    }
}
