use serde::de::DeserializeOwned;
use std::fs;

use crate::error::Result;

/// Parses a JSON file into a given type `T`.
///
/// This function reads a file from `file_path`, attempts to parse it
/// as JSON, and returns an instance of `T`.
///
/// Errors convert into `crate::error::Error` automatically via `#[from]`:
/// `Error::Io` if the file cannot be read, `Error::Deserialization` if the
/// JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    parse_payload(&data)
}

/// Parses an in-memory JSON payload into `T`. Reading the bytes (stdin, a
/// file, a socket) and deciding what to do with a parse failure is left to
/// the caller; this function only owns the JSON-to-struct boundary.
pub fn parse_payload<T: DeserializeOwned>(json: &str) -> Result<T> {
    let parsed: T = serde_json::from_str(json)?;
    Ok(parsed)
}
