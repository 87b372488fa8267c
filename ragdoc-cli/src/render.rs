//! Plain-text rendering of pipeline results.

use std::fmt::Write as _;

use ragdoc_rag::{DocumentStatus, IngestReport, QueryOutcome};

/// Characters of each retrieved chunk shown with `--show-context`.
pub const PREVIEW_CHARS: usize = 300;

pub fn ingest_report(report: &IngestReport) -> String {
    let mut out = String::new();
    for document in &report.documents {
        match &document.status {
            DocumentStatus::Ingested(outcome) if outcome.is_complete() => {
                let _ = writeln!(out, "{}: {} chunks created", document.name, outcome.chunk_count);
            }
            DocumentStatus::Ingested(outcome) => {
                let _ = writeln!(
                    out,
                    "{}: {} chunks created, {} stored, {} failed",
                    document.name,
                    outcome.chunk_count,
                    outcome.stored,
                    outcome.failures.len()
                );
            }
            DocumentStatus::Skipped { reason } => {
                let _ = writeln!(out, "{}: skipped ({reason})", document.name);
            }
            DocumentStatus::Failed { error } => {
                let _ = writeln!(out, "{}: failed ({error})", document.name);
            }
        }
    }
    out.push_str(&report.summary());
    out
}

pub fn query_outcome(outcome: &QueryOutcome, show_context: bool) -> String {
    let mut out = String::new();
    match outcome.answer() {
        Some(answer) => out.push_str(answer),
        None => out.push_str(outcome.status()),
    }

    if show_context {
        if let Some(result) = outcome.matches() {
            out.push_str("\n\nRetrieved context:");
            for (rank, m) in result.matches.iter().enumerate() {
                let _ = write!(
                    out,
                    "\n\n[{}] {} (score {:.3})\n{}",
                    rank + 1,
                    m.metadata.source,
                    m.score,
                    m.preview(PREVIEW_CHARS)
                );
            }
        }
    }
    out
}
