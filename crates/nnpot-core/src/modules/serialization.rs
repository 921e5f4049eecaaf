use crate::domain::{NnpError, NnpResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Writes `content` verbatim; trainer files are newline-joined without a
/// trailing newline and must stay that way.
pub fn write_text_artifact(path: &Path, content: &str) -> NnpResult<()> {
    tracing::debug!(path = %path.display(), bytes = content.len(), "writing artifact");
    fs::write(path, content).map_err(|source| {
        NnpError::io_system(
            "IO.ARTIFACT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Reads a text artifact, transparently inflating `.gz` files.
pub fn read_text_artifact(path: &Path) -> NnpResult<String> {
    let read_error = |source: std::io::Error| {
        NnpError::io_system(
            "IO.ARTIFACT_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    };

    let is_gzip = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("gz"));

    let content = if is_gzip {
        let mut decoder = GzDecoder::new(File::open(path).map_err(read_error)?);
        let mut content = String::new();
        decoder.read_to_string(&mut content).map_err(read_error)?;
        content
    } else {
        fs::read_to_string(path).map_err(read_error)?
    };

    Ok(normalize_line_endings(&content))
}

/// Non-comment lines of a trainer table, paired with 1-based line numbers.
pub fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.contains('#') && !line.trim().is_empty())
}
