use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::MergeError;
use crate::model::Record;
use crate::naming::partition_file_name;

/// Partition key = (group, country).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub group: String,
    pub country: String,
}

/// Canonical records sharing one (group, country) pair, ascending by ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub key: PartitionKey,
    pub file_name: String,
    pub records: Vec<Record>,
}

/// Renders as `{sequence_id: record}` in partition order.
impl Serialize for Partition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(record.sequence_id.as_str(), record)?;
        }
        map.end()
    }
}

/// All partitions, ordered by (group, country). Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDocument {
    partitions: Vec<Partition>,
}

impl OutputDocument {
    /// Group canonical records by (group, country), sort each partition by
    /// ID and name its export file. Every name is validated here so that a
    /// bad value aborts before anything is written.
    pub fn build(canonical: Vec<Record>) -> Result<Self, MergeError> {
        let mut index: BTreeMap<PartitionKey, Vec<Record>> = BTreeMap::new();
        for record in canonical {
            let key = PartitionKey {
                group: record.group.clone(),
                country: record.country.clone(),
            };
            index.entry(key).or_default().push(record);
        }

        // Lowercased file name -> owning key, for case-insensitive filesystems.
        let mut claimed: HashMap<String, PartitionKey> = HashMap::with_capacity(index.len());
        let mut partitions = Vec::with_capacity(index.len());

        for (key, mut records) in index {
            let file_name = partition_file_name(&key.group, &key.country)?;
            if let Some(owner) = claimed.insert(file_name.to_lowercase(), key.clone()) {
                return Err(MergeError::InvalidNameComponent {
                    value: format!("{}/{}", key.group, key.country),
                    reason: format!(
                        "file name {file_name} collides with partition {}/{}",
                        owner.group, owner.country
                    ),
                });
            }

            records.sort_by(|a, b| a.sequence_id.cmp(&b.sequence_id));
            log::debug!(
                "partition {}/{}: {} record(s) -> {file_name}",
                key.group,
                key.country,
                records.len()
            );
            partitions.push(Partition {
                key,
                file_name,
                records,
            });
        }

        Ok(Self { partitions })
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    #[cfg(test)]
    pub fn partition(&self, group: &str, country: &str) -> Option<&Partition> {
        self.partitions
            .iter()
            .find(|p| p.key.group == group && p.key.country == country)
    }

    pub fn record_count(&self) -> usize {
        self.partitions.iter().map(|p| p.records.len()).sum()
    }

    /// group -> country -> partition
    pub fn nested(&self) -> BTreeMap<&str, BTreeMap<&str, &Partition>> {
        let mut nested: BTreeMap<&str, BTreeMap<&str, &Partition>> = BTreeMap::new();
        for p in &self.partitions {
            nested
                .entry(p.key.group.as_str())
                .or_default()
                .insert(p.key.country.as_str(), p);
        }
        nested
    }
}

impl Serialize for OutputDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.nested().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CITY, COUNTRY, GROUP, SEQUENCE_ID, STREET, ZIP};

    fn record(id: &str, group: &str, country: &str) -> Record {
        let fields = [
            (SEQUENCE_ID, id),
            (GROUP, group),
            (COUNTRY, country),
            (STREET, id),
            (CITY, "City"),
            (ZIP, "000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Record::from_row(fields, 2).unwrap()
    }

    fn partition_ids(p: &Partition) -> Vec<&str> {
        p.records.iter().map(|r| r.sequence_id.as_str()).collect()
    }

    #[test]
    fn groups_and_sorts() {
        let doc = OutputDocument::build(vec![
            record("10", "A", "Japan"),
            record("3", "B", "Japan"),
            record("2", "A", "Japan"),
            record("7", "A", "Peru"),
        ])
        .unwrap();

        assert_eq!(doc.partitions().len(), 3);
        assert_eq!(doc.record_count(), 4);

        let a_japan = doc.partition("A", "Japan").unwrap();
        assert_eq!(partition_ids(a_japan), vec!["2", "10"]);
        assert_eq!(a_japan.file_name, "A_Japan.json");
        assert_eq!(doc.partition("B", "Japan").unwrap().file_name, "B_Japan.json");
        assert!(doc.partition("B", "Peru").is_none());

        let keys: Vec<(&str, &str)> = doc
            .partitions()
            .iter()
            .map(|p| (p.key.group.as_str(), p.key.country.as_str()))
            .collect();
        assert_eq!(keys, vec![("A", "Japan"), ("A", "Peru"), ("B", "Japan")]);
    }

    #[test]
    fn nested_rendering_keeps_numeric_order() {
        let doc = OutputDocument::build(vec![
            record("10", "A", "Japan"),
            record("9", "A", "Japan"),
        ])
        .unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        let nine = json.find("\"9\":").unwrap();
        let ten = json.find("\"10\":").unwrap();
        assert!(nine < ten, "9 must render before 10: {json}");
        assert!(json.starts_with(r#"{"A":{"Japan":{"9":{"#));
    }

    #[test]
    fn partition_renders_as_subtree() {
        let doc = OutputDocument::build(vec![
            record("1", "A", "Japan"),
            record("2", "B", "Peru"),
        ])
        .unwrap();
        let whole = serde_json::to_value(&doc).unwrap();
        let part = serde_json::to_value(doc.partition("B", "Peru").unwrap()).unwrap();
        assert_eq!(whole["B"]["Peru"], part);
        assert_eq!(part["2"]["MERGED_SEQUENCE_IDS"], serde_json::json!([]));
    }

    #[test]
    fn empty_document_renders_empty_object() {
        let doc = OutputDocument::build(Vec::new()).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), "{}");
    }

    #[test]
    fn invalid_group_aborts() {
        let err = OutputDocument::build(vec![record("1", "", "Japan")]).unwrap_err();
        assert!(matches!(err, MergeError::InvalidNameComponent { .. }));
    }

    #[test]
    fn colliding_file_names_abort() {
        let err = OutputDocument::build(vec![
            record("1", "A B", "Japan"),
            record("2", "A/B", "Japan"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("collides"), "{err}");
    }

    #[test]
    fn case_only_collision_aborts() {
        let err = OutputDocument::build(vec![
            record("1", "a", "Japan"),
            record("2", "A", "Japan"),
        ])
        .unwrap_err();
        assert!(matches!(err, MergeError::InvalidNameComponent { .. }));
    }
}
