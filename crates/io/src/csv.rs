// Delimited input: decoding and row parsing

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use addrgroup_merge::{MergeError, RawRow};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read the input file and parse every row against its header.
pub fn read_rows(path: &Path, delimiter: u8) -> Result<Vec<RawRow>, MergeError> {
    let content = read_file_as_utf8(path)
        .map_err(|e| MergeError::Input(format!("cannot read {}: {e}", path.display())))?;
    parse_rows(&content, delimiter)
}

/// Read file and convert to UTF-8 if needed (handles BOM, Windows-1252, Latin-1)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }

    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    })
}

/// Parse delimited text with a header row into column name -> value rows.
///
/// Short rows keep only the columns they reach, so a missing field surfaces
/// later as a malformed row rather than a parse error.
pub fn parse_rows(content: &str, delimiter: u8) -> Result<Vec<RawRow>, MergeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| MergeError::Input(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(MergeError::Input("missing header row".into()));
    }
    check_duplicate_headers(&headers)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| MergeError::Input(e.to_string()))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);

        if record.len() > headers.len() {
            log::warn!(
                "line {line}: {} value(s) beyond the header ignored",
                record.len() - headers.len()
            );
        }

        let fields: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(RawRow { line, fields });
    }

    log::debug!("parsed {} row(s) with {} column(s)", rows.len(), headers.len());
    Ok(rows)
}

fn check_duplicate_headers(headers: &[String]) -> Result<(), MergeError> {
    let mut seen = HashSet::with_capacity(headers.len());
    for h in headers {
        if !seen.insert(h.as_str()) {
            return Err(MergeError::Input(format!("duplicate column {h:?} in header")));
        }
    }
    Ok(())
}
