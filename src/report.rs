//! Markdown incident report rendering.
//!
//! Purely a formatting function: no I/O, deterministic for a given query,
//! match list, and timestamp. The caller supplies the generation time so the
//! output is reproducible in tests.

use chrono::{DateTime, Utc};

use crate::store::MatchResult;

/// Render the incident report for a query and its retrieved matches.
///
/// Produces a header with the generation timestamp and the query, then one
/// section per match. A match without a ticket id is labeled with a
/// synthetic `Ref-00{i}` index. An empty match list still yields a valid
/// document with zero match sections.
pub fn render_report(query: &str, matches: &[MatchResult], generated_at: DateTime<Utc>) -> String {
    let timestamp = generated_at.format("%Y-%m-%d %H:%M");

    let mut md = format!(
        "# Incident Report\n**Date:** {timestamp}\n**Issue:** {query}\n\n---\n\n## Retrieved Matches\n"
    );

    for (i, m) in matches.iter().enumerate() {
        let fallback = format!("Ref-00{}", i + 1);
        let id = m.document_id.as_deref().unwrap_or(&fallback);
        md.push_str(&format!("### Match #{} (ID: {})\n", i + 1, id));
        md.push_str(&format!("```yaml\n{}\n```\n", m.text));
        md.push_str("\n---\n");
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap()
    }

    fn m(id: Option<&str>, text: &str) -> MatchResult {
        MatchResult {
            document_id: id.map(|s| s.to_string()),
            text: text.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn empty_matches_still_valid_document() {
        let md = render_report("division by zero error", &[], ts());
        assert!(md.contains("# Incident Report"));
        assert!(md.contains("**Date:** 2024-06-01 14:30"));
        assert!(md.contains("**Issue:** division by zero error"));
        assert!(!md.contains("### Match"));
    }

    #[test]
    fn one_section_per_match() {
        let matches = vec![
            m(Some("PG-2024-002"), "ISSUE: division by zero"),
            m(Some("PG-2024-007"), "ISSUE: lock timeout"),
            m(Some("PG-2024-009"), "ISSUE: oom on sort"),
        ];
        let md = render_report("q", &matches, ts());
        assert_eq!(md.matches("### Match #").count(), 3);
        assert!(md.contains("### Match #1 (ID: PG-2024-002)"));
        assert!(md.contains("### Match #3 (ID: PG-2024-009)"));
    }

    #[test]
    fn missing_id_uses_ref_fallback_in_input_order() {
        let matches = vec![m(None, "first"), m(None, "second")];
        let md = render_report("q", &matches, ts());
        assert!(md.contains("### Match #1 (ID: Ref-001)"));
        assert!(md.contains("### Match #2 (ID: Ref-002)"));
    }

    #[test]
    fn raw_text_in_fenced_block() {
        let matches = vec![m(
            Some("PG-2024-002"),
            "ISSUE: division by zero\nFIX: See code\nCODE: + NULLIF(val,0)",
        )];
        let md = render_report("q", &matches, ts());
        assert!(md.contains("```yaml\nISSUE: division by zero\nFIX: See code\nCODE: + NULLIF(val,0)\n```"));
    }

    #[test]
    fn deterministic_for_fixed_timestamp() {
        let matches = vec![m(Some("PG-2024-002"), "ISSUE: division by zero")];
        assert_eq!(
            render_report("q", &matches, ts()),
            render_report("q", &matches, ts())
        );
    }
}
