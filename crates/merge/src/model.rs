use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::AddressMatch;
use crate::error::MergeError;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const SEQUENCE_ID: &str = "SEQUENCE_ID";
pub const GROUP: &str = "GROUP";
pub const COUNTRY: &str = "COUNTRY";
pub const STREET: &str = "STREET";
pub const CITY: &str = "CITY";
pub const ZIP: &str = "ZIP";
pub const MERGED_SEQUENCE_IDS: &str = "MERGED_SEQUENCE_IDS";

/// Columns every input row must carry.
pub const REQUIRED_FIELDS: [&str; 6] = [SEQUENCE_ID, GROUP, COUNTRY, STREET, CITY, ZIP];

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One parsed input row: column name -> raw value, plus its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub fields: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Sequence ID
// ---------------------------------------------------------------------------

/// Source-supplied record identifier.
///
/// Ordering is numeric when both sides parse as integers, with distinct
/// spellings of the same number (`01` / `1`) ordered lexicographically.
/// Integers sort before non-integers; non-integers compare as strings.
/// Equality is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceId(String);

impl SequenceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<Integer<'_>> {
        Integer::parse(&self.0)
    }
}

/// An optionally signed run of ASCII digits, compared by value at any width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Integer<'a> {
    negative: bool,
    /// Magnitude without leading zeros; empty for zero.
    digits: &'a str,
}

impl<'a> Integer<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let (negative, unsigned) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };
        if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits = unsigned.trim_start_matches('0');
        Some(Self {
            negative: negative && !digits.is_empty(),
            digits,
        })
    }

    fn magnitude_cmp(&self, other: &Self) -> Ordering {
        self.digits
            .len()
            .cmp(&other.digits.len())
            .then_with(|| self.digits.cmp(other.digits))
    }
}

impl Ord for Integer<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, false) => self.magnitude_cmp(other),
            (true, true) => other.magnitude_cmp(self),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Integer<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SequenceId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SequenceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SequenceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Address key
// ---------------------------------------------------------------------------

/// The (street, city, zip, country) tuple records are merged on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressKey {
    pub street: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

impl AddressKey {
    fn normalized(self) -> Self {
        Self {
            street: normalize_component(&self.street),
            city: normalize_component(&self.city),
            zip: normalize_component(&self.zip),
            country: normalize_component(&self.country),
        }
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}/{:?}/{:?}", self.street, self.city, self.zip, self.country)
    }
}

fn normalize_component(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One input row, or the canonical record left after folding in its
/// address duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub sequence_id: SequenceId,
    pub group: String,
    pub country: String,
    pub street: String,
    pub city: String,
    pub zip: String,
    /// Columns outside the required set, passed through unchanged.
    pub extra: BTreeMap<String, String>,
    /// IDs absorbed by this record, ascending. Never contains `sequence_id`.
    pub merged_sequence_ids: Vec<SequenceId>,
    /// 1-based line in the input file. Diagnostics only.
    pub line: usize,
}

impl Record {
    /// Build a record from column name -> raw value. Empty values count as present.
    pub fn from_row(mut fields: BTreeMap<String, String>, line: usize) -> Result<Self, MergeError> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|name| !fields.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MergeError::MalformedRow { line, missing });
        }

        let mut take = |name: &str| fields.remove(name).unwrap_or_default();
        let sequence_id = SequenceId::new(take(SEQUENCE_ID));
        let group = take(GROUP);
        let country = take(COUNTRY);
        let street = take(STREET);
        let city = take(CITY);
        let zip = take(ZIP);

        Ok(Self {
            sequence_id,
            group,
            country,
            street,
            city,
            zip,
            extra: fields,
            merged_sequence_ids: Vec::new(),
            line,
        })
    }

    /// Exact address key, compared as given.
    pub fn address_key(&self) -> AddressKey {
        AddressKey {
            street: self.street.clone(),
            city: self.city.clone(),
            zip: self.zip.clone(),
            country: self.country.clone(),
        }
    }

    pub fn address_key_for(&self, mode: AddressMatch) -> AddressKey {
        match mode {
            AddressMatch::Exact => self.address_key(),
            AddressMatch::Normalized => self.address_key().normalized(),
        }
    }

    /// Merge two records with identical exact address keys.
    pub fn merge_with(&self, other: &Record) -> Result<Record, MergeError> {
        self.merge_under(other, AddressMatch::Exact)
    }

    /// Merge two records whose address keys agree under `mode`.
    ///
    /// The lower ID wins and keeps all of its fields; the loser's ID and
    /// everything either side already absorbed land in `merged_sequence_ids`.
    pub fn merge_under(&self, other: &Record, mode: AddressMatch) -> Result<Record, MergeError> {
        if self.address_key_for(mode) != other.address_key_for(mode) {
            return Err(MergeError::AddressMismatch {
                left: format!("{} ({})", self.sequence_id, self.address_key()),
                right: format!("{} ({})", other.sequence_id, other.address_key()),
            });
        }

        let (winner, loser) = match self.sequence_id.cmp(&other.sequence_id) {
            Ordering::Less => (self, other),
            Ordering::Greater => (other, self),
            Ordering::Equal => {
                return Err(MergeError::DuplicateSequenceId {
                    sequence_id: self.sequence_id.to_string(),
                    first_line: self.line.min(other.line),
                    second_line: self.line.max(other.line),
                });
            }
        };

        let merged: BTreeSet<SequenceId> = winner
            .merged_sequence_ids
            .iter()
            .chain(loser.merged_sequence_ids.iter())
            .chain(std::iter::once(&loser.sequence_id))
            .cloned()
            .collect();

        Ok(Record {
            merged_sequence_ids: merged.into_iter().collect(),
            ..winner.clone()
        })
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Renders every column plus `MERGED_SEQUENCE_IDS`, keys in sorted order.
/// Required columns win over a passthrough column of the same name.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum Field<'a> {
            Text(&'a str),
            Ids(&'a [SequenceId]),
        }

        let mut fields: BTreeMap<&str, Field<'_>> = self
            .extra
            .iter()
            .map(|(k, v)| (k.as_str(), Field::Text(v)))
            .collect();
        fields.insert(SEQUENCE_ID, Field::Text(self.sequence_id.as_str()));
        fields.insert(GROUP, Field::Text(&self.group));
        fields.insert(COUNTRY, Field::Text(&self.country));
        fields.insert(STREET, Field::Text(&self.street));
        fields.insert(CITY, Field::Text(&self.city));
        fields.insert(ZIP, Field::Text(&self.zip));
        fields.insert(MERGED_SEQUENCE_IDS, Field::Ids(&self.merged_sequence_ids));

        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (k, v) in &fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
