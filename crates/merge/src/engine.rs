use crate::config::MergeConfig;
use crate::dedupe::dedupe;
use crate::error::MergeError;
use crate::group::OutputDocument;
use crate::model::{RawRow, Record};
use crate::summary::{compute_summary, RunSummary};

#[derive(Debug)]
pub struct MergeOutput {
    pub document: OutputDocument,
    pub summary: RunSummary,
}

/// Run the merge-and-group pipeline over parsed rows.
///
/// Stops at the first malformed row, duplicate ID or unusable name; nothing
/// here touches the filesystem.
pub fn run(config: &MergeConfig, rows: Vec<RawRow>) -> Result<MergeOutput, MergeError> {
    let input_rows = rows.len();
    let records = rows
        .into_iter()
        .map(|row| Record::from_row(row.fields, row.line))
        .collect::<Result<Vec<_>, _>>()?;

    let canonical = dedupe(records, config.address.match_mode)?;
    let document = OutputDocument::build(canonical)?;
    let summary = compute_summary(input_rows, &document);

    log::debug!(
        "{} row(s) -> {} canonical record(s) in {} partition(s)",
        summary.input_rows,
        summary.canonical_records,
        summary.partitions
    );

    Ok(MergeOutput { document, summary })
}
