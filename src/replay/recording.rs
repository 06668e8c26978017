use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pose::{Landmark, PoseFrame};

/// One line of a pose recording. `t_ms` is relative to the first line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RecordedEvent {
    Frame {
        t_ms: u64,
        #[serde(default)]
        landmarks: Option<Vec<Landmark>>,
    },
    Pause {
        t_ms: u64,
    },
    Resume {
        t_ms: u64,
    },
    Restart {
        t_ms: u64,
    },
}

impl RecordedEvent {
    pub fn t_ms(&self) -> u64 {
        match self {
            RecordedEvent::Frame { t_ms, .. }
            | RecordedEvent::Pause { t_ms }
            | RecordedEvent::Resume { t_ms }
            | RecordedEvent::Restart { t_ms } => *t_ms,
        }
    }

    pub fn frame(&self) -> Option<Option<PoseFrame>> {
        match self {
            RecordedEvent::Frame { landmarks, .. } => {
                Some(landmarks.clone().map(PoseFrame::new))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    pub events: Vec<RecordedEvent>,
}

impl Recording {
    /// Parse JSON lines. Blank lines and lines starting with `#` are skipped.
    pub fn parse(reader: impl BufRead) -> Result<Self> {
        let mut events = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let event: RecordedEvent = serde_json::from_str(trimmed)
                .with_context(|| format!("invalid recording event on line {}", index + 1))?;
            events.push(event);
        }
        // Stable, so events sharing a timestamp keep their file order.
        events.sort_by_key(|event| event.t_ms());
        Ok(Self { events })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open recording {}", path.display()))?;
        Self::parse(BufReader::new(file))
    }

    pub fn frame_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, RecordedEvent::Frame { .. }))
            .count()
    }

    pub fn duration_ms(&self) -> u64 {
        self.events.last().map_or(0, RecordedEvent::t_ms)
    }
}
