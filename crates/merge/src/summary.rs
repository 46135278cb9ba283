use serde::Serialize;

use crate::group::OutputDocument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input_rows: usize,
    pub canonical_records: usize,
    /// Rows folded into another record.
    pub merged_records: usize,
    pub partitions: usize,
    /// One per partition plus the combined document.
    pub files: usize,
}

/// Compute summary statistics for a built document.
pub fn compute_summary(input_rows: usize, document: &OutputDocument) -> RunSummary {
    let canonical_records = document.record_count();
    let merged_records = document
        .partitions()
        .iter()
        .flat_map(|p| &p.records)
        .map(|r| r.merged_sequence_ids.len())
        .sum();

    RunSummary {
        input_rows,
        canonical_records,
        merged_records,
        partitions: document.partitions().len(),
        files: document.partitions().len() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AddressMatch;
    use crate::dedupe::dedupe;
    use crate::model::{Record, CITY, COUNTRY, GROUP, SEQUENCE_ID, STREET, ZIP};

    fn record(id: &str, group: &str, street: &str) -> Record {
        let fields = [
            (SEQUENCE_ID, id),
            (GROUP, group),
            (COUNTRY, "Japan"),
            (STREET, street),
            (CITY, "Tokyo"),
            (ZIP, "100"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Record::from_row(fields, 2).unwrap()
    }

    #[test]
    fn summary_counts() {
        let records = vec![
            record("1", "A", "Main St"),
            record("2", "A", "Main St"),
            record("3", "A", "Main St"),
            record("4", "B", "Oak St"),
        ];
        let canonical = dedupe(records, AddressMatch::Exact).unwrap();
        let doc = OutputDocument::build(canonical).unwrap();
        let summary = compute_summary(4, &doc);

        assert_eq!(summary.input_rows, 4);
        assert_eq!(summary.canonical_records, 2);
        assert_eq!(summary.merged_records, 2);
        assert_eq!(summary.partitions, 2);
        assert_eq!(summary.files, 3);
        assert_eq!(summary.canonical_records + summary.merged_records, summary.input_rows);
    }
}
