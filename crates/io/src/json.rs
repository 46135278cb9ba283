// JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use addrgroup_merge::naming::FINAL_DOCUMENT_NAME;
use addrgroup_merge::{MergeError, OutputDocument};

/// Create the output directory (and parents) unless it already exists.
pub fn ensure_output_dir(dir: &Path) -> Result<(), MergeError> {
    let fail = |message: String| MergeError::OutputDirectory {
        path: dir.to_path_buf(),
        message,
    };

    if dir.exists() && !dir.is_dir() {
        return Err(fail("exists and is not a directory".into()));
    }
    std::fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))
}

/// Write a value as pretty JSON followed by a newline.
///
/// The file handle is dropped on every path; the explicit flush surfaces
/// write errors instead of losing them in `Drop`.
pub fn write_json<T: Serialize>(path: &Path, value: &T, indent: usize) -> Result<(), MergeError> {
    let io_err = |e: std::io::Error| MergeError::Io(format!("{}: {e}", path.display()));

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serialize_pretty(&mut writer, value, indent)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

/// Write one file per partition plus `final.json`. Returns paths with
/// `final.json` first, then partitions in document order.
///
/// Every document is staged as `<name>.tmp` before any target is replaced.
/// A failure while staging removes the staged files and leaves the directory
/// as it was; `final.json` is renamed into place last.
pub fn write_all(dir: &Path, document: &OutputDocument, indent: usize) -> Result<Vec<PathBuf>, MergeError> {
    ensure_output_dir(dir)?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(document.partitions().len() + 1);
    let result = stage_all(dir, document, indent, &mut staged);
    if let Err(e) = result {
        for (tmp, _) in &staged {
            let _ = std::fs::remove_file(tmp);
        }
        return Err(e);
    }

    for (tmp, path) in &staged {
        std::fs::rename(tmp, path).map_err(|e| MergeError::Io(format!("{}: {e}", path.display())))?;
    }

    let mut written: Vec<PathBuf> = staged.into_iter().map(|(_, path)| path).collect();
    written.rotate_right(1);
    Ok(written)
}

fn stage_all(
    dir: &Path,
    document: &OutputDocument,
    indent: usize,
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<(), MergeError> {
    for partition in document.partitions() {
        let path = dir.join(&partition.file_name);
        log::info!(
            "Writing group ({}, {}) records to {}",
            partition.key.group,
            partition.key.country,
            path.display()
        );
        stage_json(&path, partition, indent, staged)?;
    }

    let final_path = dir.join(FINAL_DOCUMENT_NAME);
    log::info!("Writing all records to {}", final_path.display());
    stage_json(&final_path, document, indent, staged)
}

fn stage_json<T: Serialize>(
    path: &Path,
    value: &T,
    indent: usize,
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<(), MergeError> {
    if path.is_dir() {
        return Err(MergeError::Io(format!("{}: is a directory", path.display())));
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = write_json(&tmp, value, indent);
    staged.push((tmp, path.to_path_buf()));
    result
}

fn serialize_pretty<W: Write, T: Serialize>(writer: W, value: &T, indent: usize) -> Result<(), MergeError> {
    let indent = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| MergeError::Io(format!("JSON serialization error: {e}")))
}
