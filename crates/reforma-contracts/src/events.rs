use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::rooms::{RoomCategory, RoomVerdict};

/// Milestones of one analysis run, written one per line to `events.jsonl`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    AnalysisStarted {
        property_id: String,
        area_m2: f64,
        image_count: usize,
    },
    RoomClassified {
        room: RoomCategory,
        image_url: String,
        verdict: RoomVerdict,
    },
    RoomFailed {
        room: RoomCategory,
        reason: String,
    },
    FallbackUsed {
        reason: String,
    },
    ReportReady {
        total: String,
        confidence: String,
        classified_rooms: usize,
    },
}

/// Append-only event log for a single run.
///
/// Every line carries `type`, `run_id` and `ts`; the event fields follow.
#[derive(Debug, Clone)]
pub struct AnalysisEventLog {
    path: PathBuf,
    run_id: String,
}

impl AnalysisEventLog {
    pub fn new(path: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            run_id: run_id.into(),
        }
    }

    /// Log with a fresh random run id.
    pub fn with_random_run_id(path: impl Into<PathBuf>) -> Self {
        Self::new(path, uuid::Uuid::new_v4().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, event: &AnalysisEvent) -> anyhow::Result<Value> {
        let mut line = Map::new();
        line.insert("run_id".to_string(), Value::String(self.run_id.clone()));
        line.insert("ts".to_string(), Value::String(now_utc_iso()));
        if let Value::Object(fields) = serde_json::to_value(event)? {
            for (key, value) in fields {
                line.insert(key, value);
            }
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(serde_json::to_string(&line)?.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(line))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::rooms::{RoomCategory, RoomVerdict};

    use super::{AnalysisEvent, AnalysisEventLog};

    #[test]
    fn event_log_appends_typed_lines() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("run").join("events.jsonl");
        let log = AnalysisEventLog::new(&path, "run-1");

        log.emit(&AnalysisEvent::AnalysisStarted {
            property_id: "107442883".to_string(),
            area_m2: 80.0,
            image_count: 3,
        })?;
        log.emit(&AnalysisEvent::RoomClassified {
            room: RoomCategory::Bathroom,
            image_url: "https://img.example/1.jpg".to_string(),
            verdict: RoomVerdict::unknown("sin datos"),
        })?;

        let rows: Vec<Value> = std::fs::read_to_string(&path)?
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["type"], json!("analysis_started"));
        assert_eq!(rows[0]["run_id"], json!("run-1"));
        assert_eq!(rows[0]["image_count"], json!(3));
        assert_eq!(rows[1]["room"], json!("bathroom"));
        assert_eq!(rows[1]["verdict"]["needs_renovation"], json!("?"));
        assert!(rows[1].get("ts").and_then(Value::as_str).is_some());
        Ok(())
    }

    #[test]
    fn random_run_ids_differ() {
        let first = AnalysisEventLog::with_random_run_id("a.jsonl");
        let second = AnalysisEventLog::with_random_run_id("a.jsonl");
        assert_ne!(first.run_id(), second.run_id());
    }
}
