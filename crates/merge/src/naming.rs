// File names for exported documents.

use crate::error::MergeError;

pub const JSON_EXT: &str = ".json";
pub const FINAL_DOCUMENT_NAME: &str = "final.json";

/// Longest sanitized component accepted, in bytes.
pub const MAX_COMPONENT_LEN: usize = 100;

/// Turn a GROUP/COUNTRY value into a file-name-safe component.
///
/// Alphanumerics, `-` and `_` are kept; everything else becomes `-`.
/// Values that are empty, have no alphanumeric character, or come out
/// longer than `MAX_COMPONENT_LEN` are rejected.
pub fn sanitize_component(value: &str) -> Result<String, MergeError> {
    let reject = |reason: &str| MergeError::InvalidNameComponent {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(reject("value is empty"));
    }
    if !value.chars().any(char::is_alphanumeric) {
        return Err(reject("value has no letters or digits"));
    }

    let sanitized: String = value
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();

    if sanitized.len() > MAX_COMPONENT_LEN {
        return Err(reject(&format!("longer than {MAX_COMPONENT_LEN} bytes")));
    }
    Ok(sanitized)
}

/// `<GROUP>_<COUNTRY>.json`
pub fn partition_file_name(group: &str, country: &str) -> Result<String, MergeError> {
    Ok(format!(
        "{}_{}{JSON_EXT}",
        sanitize_component(group)?,
        sanitize_component(country)?
    ))
}
