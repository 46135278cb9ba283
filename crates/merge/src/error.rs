use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad delimiter, indent out of range, etc.).
    ConfigValidation(String),
    /// Input file unreadable or not valid delimited text.
    Input(String),
    /// A row is missing one or more required columns.
    MalformedRow { line: usize, missing: Vec<String> },
    /// Two input rows share a sequence ID.
    DuplicateSequenceId {
        sequence_id: String,
        first_line: usize,
        second_line: usize,
    },
    /// Merge attempted on records whose address keys differ.
    /// Only reachable through a partitioning defect.
    AddressMismatch { left: String, right: String },
    /// A group/country value cannot form a safe, unique file name.
    InvalidNameComponent { value: String, reason: String },
    /// Output directory cannot be created.
    OutputDirectory { path: PathBuf, message: String },
    /// IO error while writing an output document.
    Io(String),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Input(msg) => write!(f, "input error: {msg}"),
            Self::MalformedRow { line, missing } => {
                write!(f, "line {line}: missing required field(s) {}", missing.join(", "))
            }
            Self::DuplicateSequenceId {
                sequence_id,
                first_line,
                second_line,
            } => write!(
                f,
                "duplicate SEQUENCE_ID '{sequence_id}' on lines {first_line} and {second_line}"
            ),
            Self::AddressMismatch { left, right } => {
                write!(f, "internal error: cannot merge records {left} and {right}, addresses differ")
            }
            Self::InvalidNameComponent { value, reason } => {
                write!(f, "cannot build file name from {value:?}: {reason}")
            }
            Self::OutputDirectory { path, message } => {
                write!(f, "cannot create output directory {}: {message}", path.display())
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for MergeError {}
