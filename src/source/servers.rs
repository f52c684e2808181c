//! The `regionservers` file: one host name per line.

use std::fs;
use std::io;
use std::path::Path;

/// Extract host names from server list text.
///
/// Lines whose first non-space character is `#` are comments. Blank lines
/// are skipped; surrounding whitespace is trimmed.
pub fn parse_server_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a server list file.
pub fn load_server_list(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_server_list(&content))
}
