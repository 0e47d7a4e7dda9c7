//! Parsing of uploaded delimited files into cluster assignments.
//!
//! The header row names the columns. `iauname` becomes the record name and
//! `cluster` its cluster; other columns are ignored.

use crate::errors::UploadError;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

pub const NAME_COLUMN: &str = "iauname";
pub const CLUSTER_COLUMN: &str = "cluster";

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// A cluster number or label. Values parsed from files are always text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClusterValue {
    Number(i64),
    Text(String),
}

impl From<&str> for ClusterValue {
    fn from(value: &str) -> Self {
        ClusterValue::Text(value.to_string())
    }
}

impl From<i64> for ClusterValue {
    fn from(value: i64) -> Self {
        ClusterValue::Number(value)
    }
}

/// One row of an uploaded file. Absent fields are omitted from the JSON form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterValue>,
}

/// Picks the candidate delimiter occurring most often in the header line.
pub fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut best = (b',', 0);
    for delimiter in CANDIDATE_DELIMITERS {
        let count = header.bytes().filter(|b| *b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn field(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .filter(|value| !value.is_empty())
}

/// Parses file contents into assignments, one per non-blank row.
///
/// Short rows are kept with the missing fields absent.
pub fn parse_assignments(name: &str, data: &[u8]) -> Result<Vec<ClusterAssignment>, UploadError> {
    let text =
        std::str::from_utf8(data).map_err(|_| UploadError::Undecodable(name.to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let name_index = column(&headers, NAME_COLUMN);
    let cluster_index = column(&headers, CLUSTER_COLUMN);
    if name_index.is_none() || cluster_index.is_none() {
        tracing::warn!(file = name, headers = ?headers, "expected columns are missing");
    }

    let mut assignments = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        assignments.push(ClusterAssignment {
            name: field(&record, name_index).map(str::to_string),
            cluster: field(&record, cluster_index).map(ClusterValue::from),
        });
    }

    Ok(assignments)
}
