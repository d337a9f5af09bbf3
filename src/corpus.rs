//! Ticket corpus loading.
//!
//! The corpus is a flat JSON file of historical resolved tickets. A missing
//! file is tolerated: a single placeholder record is seeded so the rest of
//! the system stays exercisable, and a warning is logged so a misconfigured
//! path is not silently mistaken for an empty corpus. An unreadable or
//! unparseable file is a hard error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A historical resolved ticket, as stored in the corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRecord {
    pub ticket_id: String,
    pub issue_subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_summary: Option<String>,
    pub git_commit: GitCommit,
}

/// The code change associated with a resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommit {
    pub diff: String,
}

/// The record seeded when the corpus file does not exist yet.
pub fn placeholder_record() -> TicketRecord {
    TicketRecord {
        ticket_id: "PG-2024-002".to_string(),
        issue_subject: "division by zero".to_string(),
        resolution_summary: None,
        git_commit: GitCommit {
            diff: "+ NULLIF(val,0)".to_string(),
        },
    }
}

/// Load all ticket records from the corpus file.
///
/// If the file does not exist, writes a one-record placeholder corpus to the
/// path and returns it, logging a warning. Any other failure (permissions,
/// malformed JSON) is returned as an error rather than masked as "no data".
pub fn load_corpus(path: &Path) -> Result<Vec<TicketRecord>> {
    if let Some(records) = load_corpus_if_present(path)? {
        return Ok(records);
    }

    tracing::warn!(
        path = %path.display(),
        "corpus file not found; seeding placeholder record"
    );
    let records = vec![placeholder_record()];
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| Error::Corpus(format!("failed to serialize placeholder corpus: {e}")))?;
    std::fs::write(path, json).map_err(|e| {
        Error::Corpus(format!(
            "failed to seed corpus file {}: {e}",
            path.display()
        ))
    })?;
    Ok(records)
}

/// Load ticket records without seeding: `Ok(None)` when the corpus file does
/// not exist. Used by dry runs, which must not write to the filesystem.
pub fn load_corpus_if_present(path: &Path) -> Result<Option<Vec<TicketRecord>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Corpus(format!(
            "failed to read corpus file {}: {e}",
            path.display()
        ))
    })?;

    let records: Vec<TicketRecord> = serde_json::from_str(&content).map_err(|e| {
        Error::Validation(format!(
            "corpus file {} is not valid ticket JSON: {e}",
            path.display()
        ))
    })?;

    Ok(Some(records))
}
