//! # Logging
//! Append-only observability sink. Each entry is one line of tab-separated fields:
//! timestamp, entry kind, source, key, and a payload that is either a plain message or a
//! JSON-encoded object. A small query interface filters entries by source and key and
//! returns the most recent N.
//!
//! Configuration is an explicit [`LogConfig`] carried by a [`Logger`] value and handed
//! to whatever needs to emit entries; there is no process-global logging state.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde_json::Value;

use crate::JsonMap;

const MULTILINE_OUTPUT_PREFIX: &str = "\n>>> ";

/// Kind of a log entry, as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEntryKind {
    Message,
    Object,
}

impl LogEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogEntryKind::Message => "MESSAGE",
            LogEntryKind::Object => "OBJECT",
        }
    }

    fn from_str(kind: &str) -> Option<Self> {
        match kind {
            "MESSAGE" => Some(LogEntryKind::Message),
            "OBJECT" => Some(LogEntryKind::Object),
            _ => None,
        }
    }
}

/// Payload of a log entry: a plain message or a structured object.
#[derive(Debug, Clone, PartialEq)]
pub enum LogPayload {
    Message(String),
    Object(JsonMap),
}

/// One timestamped log entry.
#[derive(Debug, Clone, PartialEq)]
#[readonly::make]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub source: String,
    pub key: String,
    pub payload: LogPayload,
}

impl LogEntry {
    pub fn message(source: impl Into<String>, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            source: source.into(),
            key: key.into(),
            payload: LogPayload::Message(message.into()),
        }
    }

    pub fn object(source: impl Into<String>, key: impl Into<String>, object: JsonMap) -> Self {
        Self {
            time: Utc::now(),
            source: source.into(),
            key: key.into(),
            payload: LogPayload::Object(object),
        }
    }

    pub fn kind(&self) -> LogEntryKind {
        match &self.payload {
            LogPayload::Message(_) => LogEntryKind::Message,
            LogPayload::Object(_) => LogEntryKind::Object,
        }
    }

    /// Serialize as one tab-separated line, without a trailing newline. Messages
    /// containing tabs or newlines will not survive a round trip; that is a reserved
    /// character limitation of the encoding.
    pub fn to_line(&self) -> String {
        let payload = match &self.payload {
            LogPayload::Message(message) => message.clone(),
            LogPayload::Object(object) => Value::Object(object.clone()).to_string(),
        };
        [
            self.time.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.kind().as_str().to_string(),
            self.source.clone(),
            self.key.clone(),
            payload,
        ]
        .join("\t")
    }

    /// Parse an entry back from one line of the log file.
    pub fn from_line(line: &str) -> Result<LogEntry> {
        let parts: Vec<&str> = line.trim_end_matches('\n').splitn(5, '\t').collect();
        if parts.len() != 5 {
            bail!("log line has {} tab-separated fields, expected 5", parts.len());
        }
        let time = DateTime::parse_from_rfc3339(parts[0])
            .with_context(|| format!("parsing log entry timestamp '{}'", parts[0]))?
            .with_timezone(&Utc);
        let kind = LogEntryKind::from_str(parts[1])
            .ok_or_else(|| anyhow::anyhow!("unknown log entry kind '{}'", parts[1]))?;
        let payload = match kind {
            LogEntryKind::Message => LogPayload::Message(parts[4].to_string()),
            LogEntryKind::Object => LogPayload::Object(
                serde_json::from_str(parts[4]).context("parsing log entry object payload")?,
            ),
        };
        Ok(LogEntry {
            time,
            source: parts[2].to_string(),
            key: parts[3].to_string(),
            payload,
        })
    }

    /// Multi-line human-readable rendering, used for console output in debug mode.
    pub fn pretty(&self) -> String {
        let mut entry_parts = vec![
            format!("Time: {}", self.time.to_rfc3339_opts(SecondsFormat::Micros, true)),
            format!("Source: {}", self.source),
            format!("Key: {}", self.key),
        ];
        match &self.payload {
            LogPayload::Message(message) => entry_parts.push(format!("Message: {}", message)),
            LogPayload::Object(object) => {
                let mut keys: Vec<&String> = object.keys().collect();
                keys.sort();
                for object_key in keys {
                    let value = match &object[object_key.as_str()] {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    if value.contains('\n') {
                        entry_parts.push(format!(
                            "{}:{}{}",
                            object_key,
                            MULTILINE_OUTPUT_PREFIX,
                            value.split('\n').collect::<Vec<_>>().join(MULTILINE_OUTPUT_PREFIX)
                        ));
                    } else {
                        entry_parts.push(format!("{}: {}", object_key, value));
                    }
                }
            }
        }
        entry_parts.join("\n")
    }
}

/// Configuration for a [`Logger`]: whether to echo entries to the console, and an
/// optional file the log is appended to.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub debug: bool,
    pub log_file_path: Option<PathBuf>,
}

/// Handle for emitting and querying log entries. Cheap to clone and pass around.
#[derive(Debug, Clone)]
pub struct Logger {
    config: LogConfig,
}

impl Logger {
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    /// A logger that emits nothing and answers queries with empty results.
    pub fn disabled() -> Self {
        Self::new(LogConfig::default())
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn message(&self, source: &str, key: &str, message: impl Into<String>) {
        self.emit(LogEntry::message(source, key, message));
    }

    pub fn object(&self, source: &str, key: &str, object: JsonMap) {
        self.emit(LogEntry::object(source, key, object));
    }

    /// Record an entry. Sink failures are warned about and swallowed; observability
    /// must not turn a successful mapping into a failed one.
    pub fn emit(&self, entry: LogEntry) {
        if self.config.debug {
            println!("{}\n", entry.pretty());
        }
        if let Some(path) = &self.config.log_file_path {
            if let Err(error) = append_line(path, &entry.to_line()) {
                warn!(
                    "failed to append log entry to '{}': {}",
                    path.display(),
                    error
                );
            }
        }
    }

    /// Select entries from the log, optionally filtered by source and key, most recent
    /// first unless `descending` is false, up to `limit` entries.
    pub fn select(
        &self,
        source: Option<&str>,
        key: Option<&str>,
        limit: Option<usize>,
        descending: bool,
    ) -> Result<Vec<LogEntry>> {
        let Some(path) = &self.config.log_file_path else {
            return Ok(Vec::new());
        };
        if limit == Some(0) {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading log file '{}'", path.display()))?;
        let mut entries = contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(LogEntry::from_line)
            .collect::<Result<Vec<LogEntry>>>()?;
        if descending {
            entries.reverse();
        }
        let mut selected: Vec<LogEntry> = entries
            .into_iter()
            .filter(|entry| source.map_or(true, |s| entry.source == s))
            .filter(|entry| key.map_or(true, |k| entry.key == k))
            .collect();
        if let Some(limit) = limit {
            selected.truncate(limit);
        }
        Ok(selected)
    }

    /// Distinct (source, key) pairs present in the log, sorted.
    pub fn sources_and_keys(&self) -> Result<Vec<(String, String)>> {
        let pairs: BTreeSet<(String, String)> = self
            .select(None, None, None, false)?
            .into_iter()
            .map(|entry| (entry.source.clone(), entry.key.clone()))
            .collect();
        Ok(pairs.into_iter().collect())
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

#[cfg(test)]
mod logging_tests {
    use serde_json::json;

    use super::{LogConfig, LogEntry, LogEntryKind, LogPayload, Logger};
    use crate::JsonMap;

    fn object(pairs: &[(&str, &str)]) -> JsonMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn test_message_line_round_trip() {
        let entry = LogEntry::message("Engine", "Startup", "ready");
        let reparsed = LogEntry::from_line(&entry.to_line()).unwrap();
        assert_eq!(reparsed, entry);
        assert_eq!(reparsed.kind(), LogEntryKind::Message);
    }

    #[test]
    fn test_object_line_round_trip() {
        let entry = LogEntry::object("Engine", "Completion", object(&[("Model", "scripted")]));
        let reparsed = LogEntry::from_line(&entry.to_line()).unwrap();
        assert_eq!(reparsed, entry);
        assert_eq!(reparsed.kind(), LogEntryKind::Object);
    }

    #[test]
    fn test_from_line_rejects_short_line() {
        assert!(LogEntry::from_line("only\tthree\tfields").is_err());
    }

    #[test]
    fn test_pretty_multiline_object_value() {
        let entry = LogEntry::object("Engine", "Completion", object(&[("Completion", "a\nb")]));
        let pretty = entry.pretty();
        assert!(pretty.contains("Completion:\n>>> a\n>>> b"));
    }

    #[test]
    fn test_select_filters_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let logger = Logger::new(LogConfig {
            debug: false,
            log_file_path: Some(path),
        });
        logger.message("Engine", "Completion", "first");
        logger.message("Engine", "Error", "second");
        logger.message("Loader", "Completion", "third");

        let engine_entries = logger.select(Some("Engine"), None, None, true).unwrap();
        assert_eq!(engine_entries.len(), 2);
        assert_eq!(
            engine_entries[0].payload,
            LogPayload::Message("second".to_string())
        );

        let limited = logger.select(None, Some("Completion"), Some(1), true).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].source, "Loader");

        assert_eq!(
            logger.sources_and_keys().unwrap(),
            vec![
                ("Engine".to_string(), "Completion".to_string()),
                ("Engine".to_string(), "Error".to_string()),
                ("Loader".to_string(), "Completion".to_string()),
            ]
        );
    }

    #[test]
    fn test_disabled_logger_selects_nothing() {
        let logger = Logger::disabled();
        logger.message("Engine", "Completion", "dropped");
        assert!(logger.select(None, None, None, true).unwrap().is_empty());
    }
}
