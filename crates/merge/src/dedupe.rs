use std::collections::{BTreeMap, HashMap};

use crate::config::AddressMatch;
use crate::error::MergeError;
use crate::model::{AddressKey, Record, SequenceId};

/// Fail if any sequence ID occurs more than once, regardless of address.
///
/// Reports the earliest offending pair in input order.
pub fn check_unique_ids(records: &[Record]) -> Result<(), MergeError> {
    let mut seen: HashMap<&SequenceId, usize> = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(&first_line) = seen.get(&record.sequence_id) {
            return Err(MergeError::DuplicateSequenceId {
                sequence_id: record.sequence_id.to_string(),
                first_line,
                second_line: record.line,
            });
        }
        seen.insert(&record.sequence_id, record.line);
    }
    Ok(())
}

/// Collapse records into one canonical record per distinct address key.
///
/// Each bucket folds into its lowest-ID record. The result is sorted by
/// sequence ID and does not depend on input order.
pub fn dedupe(records: Vec<Record>, mode: AddressMatch) -> Result<Vec<Record>, MergeError> {
    check_unique_ids(&records)?;

    let mut index: BTreeMap<AddressKey, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        index.entry(record.address_key_for(mode)).or_default().push(i);
    }
    log::debug!("{} records, {} distinct addresses", records.len(), index.len());

    let mut canonical = Vec::with_capacity(index.len());
    for mut members in index.into_values() {
        members.sort_by(|&a, &b| records[a].sequence_id.cmp(&records[b].sequence_id));

        let Some((&head, rest)) = members.split_first() else {
            continue;
        };
        let mut winner = records[head].clone();
        for &i in rest {
            winner = winner.merge_under(&records[i], mode)?;
        }

        if !winner.merged_sequence_ids.is_empty() {
            log::info!(
                "Merging IDs {} into record {}",
                join_ids(&winner.merged_sequence_ids),
                winner.sequence_id
            );
        }
        canonical.push(winner);
    }

    canonical.sort_by(|a, b| a.sequence_id.cmp(&b.sequence_id));
    Ok(canonical)
}

fn join_ids(ids: &[SequenceId]) -> String {
    let parts: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CITY, COUNTRY, GROUP, SEQUENCE_ID, STREET, ZIP};

    fn record(id: &str, street: &str, line: usize) -> Record {
        let fields = [
            (SEQUENCE_ID, id),
            (GROUP, "A"),
            (COUNTRY, "Japan"),
            (STREET, street),
            (CITY, "Tokyo"),
            (ZIP, "100"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Record::from_row(fields, line).unwrap()
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.sequence_id.as_str()).collect()
    }

    fn merged(record: &Record) -> Vec<&str> {
        record.merged_sequence_ids.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn singleton_has_no_merged_ids() {
        let out = dedupe(vec![record("1", "Main St", 2)], AddressMatch::Exact).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].merged_sequence_ids.is_empty());
    }

    #[test]
    fn collapses_to_lowest_id() {
        let rows = vec![
            record("30", "Main St", 2),
            record("4", "Main St", 3),
            record("12", "Main St", 4),
            record("7", "Oak St", 5),
        ];
        let out = dedupe(rows, AddressMatch::Exact).unwrap();
        assert_eq!(ids(&out), vec!["4", "7"]);
        assert_eq!(merged(&out[0]), vec!["12", "30"]);
        assert!(out[1].merged_sequence_ids.is_empty());
    }

    #[test]
    fn canonical_keeps_winner_fields() {
        let mut high = record("9", "Main St", 2);
        high.extra.insert("NAME".into(), "high".into());
        let mut low = record("3", "Main St", 3);
        low.extra.insert("NAME".into(), "low".into());
        let out = dedupe(vec![high, low], AddressMatch::Exact).unwrap();
        assert_eq!(out[0].extra["NAME"], "low");
        assert_eq!(out[0].line, 3);
    }

    #[test]
    fn duplicate_id_across_addresses_fails() {
        let rows = vec![record("5", "Main St", 2), record("5", "Oak St", 3)];
        match dedupe(rows, AddressMatch::Exact) {
            Err(MergeError::DuplicateSequenceId { sequence_id, first_line, second_line }) => {
                assert_eq!(sequence_id, "5");
                assert_eq!((first_line, second_line), (2, 3));
            }
            other => panic!("expected DuplicateSequenceId, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_id_same_address_fails() {
        let rows = vec![record("5", "Main St", 2), record("5", "Main St", 3)];
        assert!(matches!(
            dedupe(rows, AddressMatch::Exact),
            Err(MergeError::DuplicateSequenceId { .. })
        ));
    }

    #[test]
    fn normalized_mode_merges_spelling_variants() {
        let rows = vec![record("2", "MAIN ST", 2), record("1", "main  st", 3)];
        let exact = dedupe(rows.clone(), AddressMatch::Exact).unwrap();
        assert_eq!(exact.len(), 2);

        let normalized = dedupe(rows, AddressMatch::Normalized).unwrap();
        assert_eq!(ids(&normalized), vec!["1"]);
        assert_eq!(normalized[0].street, "main  st");
        assert_eq!(merged(&normalized[0]), vec!["2"]);
    }

    #[test]
    fn non_numeric_ids_use_string_order() {
        let rows = vec![
            record("b-2", "Main St", 2),
            record("a-10", "Main St", 3),
            record("17", "Main St", 4),
        ];
        let out = dedupe(rows, AddressMatch::Exact).unwrap();
        assert_eq!(ids(&out), vec!["17"]);
        assert_eq!(merged(&out[0]), vec!["a-10", "b-2"]);
    }

    #[test]
    fn empty_input() {
        assert!(dedupe(Vec::new(), AddressMatch::Exact).unwrap().is_empty());
    }
}
