//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Trigger                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Success                                                    |
//! | 2    | CLI usage error (bad args; emitted by clap)                |
//! | 3    | Config file unreadable, unparsable or invalid              |
//! | 4    | Input file unreadable or not valid delimited text          |
//! | 5    | Row missing a required field                               |
//! | 6    | Duplicate SEQUENCE_ID                                      |
//! | 7    | Internal merge invariant violated                          |
//! | 8    | GROUP/COUNTRY value cannot form a safe, unique file name   |
//! | 9    | Output directory cannot be created                         |
//! | 10   | Writing an output document failed                          |

use addrgroup_merge::MergeError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

pub const EXIT_CONFIG: u8 = 3;
pub const EXIT_INPUT: u8 = 4;
pub const EXIT_MALFORMED_ROW: u8 = 5;
pub const EXIT_DUPLICATE_ID: u8 = 6;
pub const EXIT_INTERNAL: u8 = 7;
pub const EXIT_INVALID_NAME: u8 = 8;
pub const EXIT_OUTPUT_DIR: u8 = 9;
pub const EXIT_WRITE: u8 = 10;

/// Map an engine error to its exit code.
pub fn merge_exit_code(err: &MergeError) -> u8 {
    match err {
        MergeError::ConfigParse(_) | MergeError::ConfigValidation(_) => EXIT_CONFIG,
        MergeError::Input(_) => EXIT_INPUT,
        MergeError::MalformedRow { .. } => EXIT_MALFORMED_ROW,
        MergeError::DuplicateSequenceId { .. } => EXIT_DUPLICATE_ID,
        MergeError::AddressMismatch { .. } => EXIT_INTERNAL,
        MergeError::InvalidNameComponent { .. } => EXIT_INVALID_NAME,
        MergeError::OutputDirectory { .. } => EXIT_OUTPUT_DIR,
        MergeError::Io(_) => EXIT_WRITE,
    }
}
