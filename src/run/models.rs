//! Persisted run shapes.

use std::fmt;
use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use super::record::RunRecord;

/// Store-generated identifier of an `algo_run` row.
///
/// New runs get theirs from the store through [RunRecord::begin]. Converting
/// from `i64` exists for looking up runs recorded elsewhere; it never attaches
/// an id to a [RunRecord].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(i64);

impl RunId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for RunId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `algo_run` row as read back from a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub run_id: RunId,
    pub name: String,
    pub environment: String,
    pub build: String,
    pub parameters: Map<String, Value>,
    pub start_time: DateTime<Utc>,
    /// `None` until the run is marked ended.
    pub end_time: Option<DateTime<Utc>>,
}

impl StoredRun {
    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    /// Rebuilds a started [RunRecord] so another process can close the run.
    pub fn into_record(self) -> RunRecord {
        RunRecord::started(
            self.name,
            self.environment,
            self.build,
            self.parameters,
            self.run_id,
        )
    }
}

/// Writes JSON with `", "` and `": "` separators and `\uXXXX` escapes for
/// non-ASCII text, so stored parameters read the same as rows written by
/// other producers of the `algo_run` table (Python's `json.dumps` defaults).
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Encodes parameters for the `parameters` column.
pub(crate) fn encode_parameters(
    parameters: &Map<String, Value>,
) -> Result<String, serde_json::Error> {
    let mut out = Vec::with_capacity(64);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedAsciiFormatter);
    parameters.serialize(&mut ser)?;
    String::from_utf8(out).map_err(serde::ser::Error::custom)
}

/// Decodes the `parameters` column.
pub(crate) fn decode_parameters(raw: &str) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_id_serializes_as_bare_integer() {
        let id = RunId::from(42);
        assert_eq!(serde_json::to_value(id).unwrap(), json!(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn decode_parameters_rejects_non_object_payloads() {
        assert!(decode_parameters("[1, 2]").is_err());
        assert!(decode_parameters("not json").is_err());
        let map = decode_parameters(r#"{"threshold": 0.8}"#).unwrap();
        assert_eq!(map.get("threshold"), Some(&json!(0.8)));
    }

    #[test]
    fn encode_parameters_uses_spaced_separators() {
        let map = decode_parameters(r#"{"threshold":0.8}"#).unwrap();
        assert_eq!(encode_parameters(&map).unwrap(), r#"{"threshold": 0.8}"#);

        let nested = json!({"lags": [1, 7, 28], "model": {"depth": 6, "on": true}, "x": null});
        let map = nested.as_object().cloned().unwrap();
        assert_eq!(
            encode_parameters(&map).unwrap(),
            r#"{"lags": [1, 7, 28], "model": {"depth": 6, "on": true}, "x": null}"#
        );
        assert_eq!(encode_parameters(&Map::new()).unwrap(), "{}");
    }

    #[test]
    fn encode_parameters_escapes_non_ascii_text() {
        let map = json!({"label": "caf\u{e9} \u{1f600}", "q": "a\"b"})
            .as_object()
            .cloned()
            .unwrap();
        let encoded = encode_parameters(&map).unwrap();
        assert_eq!(
            encoded,
            r#"{"label": "caf\u00e9 \ud83d\ude00", "q": "a\"b"}"#
        );
        assert_eq!(decode_parameters(&encoded).unwrap(), map);
    }

    #[test]
    fn into_record_keeps_store_assigned_id() {
        let stored = StoredRun {
            run_id: RunId::from(5),
            name: "fraud-detector".into(),
            environment: "prod".into(),
            build: "42".into(),
            parameters: Map::new(),
            start_time: Utc::now(),
            end_time: None,
        };
        assert!(!stored.is_ended());
        let record = stored.into_record();
        assert_eq!(record.run_id(), Some(RunId::from(5)));
        assert_eq!(record.name, "fraud-detector");
    }
}
