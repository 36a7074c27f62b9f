//! CBOR persistence of vocabularies, matrices and partial results.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_cbor::to_vec(value)?)
}

pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_cbor::from_slice(bytes)?)
}

/// Write `value` to `path`, replacing any existing file.
pub fn save<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_cbor::to_writer(&mut writer, value)?;
    writer.flush()?;
    tracing::debug!(path = %path.as_ref().display(), "saved artifact");
    Ok(())
}

pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_cbor::from_reader(reader)?)
}
