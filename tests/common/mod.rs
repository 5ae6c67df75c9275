//! Shared helpers for integration tests

use std::io::Write;
use tempfile::NamedTempFile;

/// Write TOML contents to a temporary file that lives as long as the handle
pub fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes())
        .expect("write temp config");
    file
}
