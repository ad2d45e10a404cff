//! JSON file source
//!
//! Countries without a searchable registry ship their institutions as a JSON
//! array of records. The array is decoded element by element so a large file is
//! never held in memory at once.

use crate::output::{Institution, InstitutionSink};
use crate::FinderError;
use serde::de::{Deserializer as _, SeqAccess, Visitor};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Produces institutions from a JSON array file
#[derive(Debug, Clone)]
pub struct JsonInstitutionSource {
    path: PathBuf,
}

impl JsonInstitutionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sends every institution in the file to `sink`
    ///
    /// Returns the number of institutions sent. Records sent before a decoding
    /// error stay sent.
    pub fn produce(&self, sink: &dyn InstitutionSink) -> Result<usize, FinderError> {
        tracing::info!("Producing institutions from {}", self.path.display());

        let file = File::open(&self.path)?;
        produce_from_reader(file, &self.path.display().to_string(), sink)
    }
}

/// Streams a JSON array of institutions from `reader` into `sink`
///
/// # Arguments
///
/// * `reader` - Source of the JSON document
/// * `label` - Name of the source used in errors
/// * `sink` - Receiver of every decoded institution
pub fn produce_from_reader<R: Read>(
    reader: R,
    label: &str,
    sink: &dyn InstitutionSink,
) -> Result<usize, FinderError> {
    let mut reader = BufReader::new(reader);
    if !starts_with_array(&mut reader)? {
        return Err(FinderError::ContentNotArray {
            path: label.to_string(),
        });
    }

    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let count = deserializer.deserialize_seq(ForwardingVisitor { sink })?;
    deserializer.end()?;

    Ok(count)
}

/// Skips leading whitespace and reports whether the document opens an array
fn starts_with_array<R: BufRead>(reader: &mut R) -> std::io::Result<bool> {
    loop {
        let buffer = reader.fill_buf()?;
        if buffer.is_empty() {
            return Ok(false);
        }

        let whitespace = buffer
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        if whitespace < buffer.len() {
            let opens_array = buffer[whitespace] == b'[';
            reader.consume(whitespace);
            return Ok(opens_array);
        }

        let consumed = buffer.len();
        reader.consume(consumed);
    }
}

struct ForwardingVisitor<'a> {
    sink: &'a dyn InstitutionSink,
}

impl<'de, 'a> Visitor<'de> for ForwardingVisitor<'a> {
    type Value = usize;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of institutions")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while let Some(institution) = seq.next_element::<Institution>()? {
            self.sink.send(institution);
            count += 1;
        }
        Ok(count)
    }
}
