//! The event context seam and a minimal event recorder.
//!
//! Flow mutations only ever need to append an id to one of two lists on the
//! event being built. [`EventContext`] is that contract; whatever owns the
//! real trace buffer implements it. [`TrackEvent`] implements it directly so
//! flows can be recorded, persisted as JSON lines, and fed to the analyzer.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};
use tracing::debug;

use flowtag_types::{FlowId, TrackEvent, TrackId};

use crate::flow::{FlowMutation, apply_all};

/// Errors that can occur when persisting or loading recorded events.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Reading or writing the underlying stream failed.
    #[error("trace I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// A line is not valid UTF-8.
    #[error("trace line {line} is not valid UTF-8")]
    Utf8 {
        /// One-based line number.
        line: usize,
    },

    /// A line could not be encoded or decoded as a [`TrackEvent`].
    #[error("invalid trace record on line {line}: {source}")]
    Serde {
        /// One-based line number (0 when writing).
        line: usize,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// The in-progress event a flow mutation writes into.
///
/// Both operations append to an ordered list owned by the current event.
/// Implementations must not deduplicate or reorder.
pub trait EventContext {
    /// Append `id` to the event's continuing-flow list.
    fn add_flow_id(&mut self, id: FlowId);

    /// Append `id` to the event's terminating-flow list.
    fn add_terminating_flow_id(&mut self, id: FlowId);
}

impl EventContext for TrackEvent {
    fn add_flow_id(&mut self, id: FlowId) {
        self.flow_ids.push(id);
    }

    fn add_terminating_flow_id(&mut self, id: FlowId) {
        self.terminating_flow_ids.push(id);
    }
}

// ---------------------------------------------------------------------------
// TraceRecorder
// ---------------------------------------------------------------------------

/// Collects the events emitted on one track.
///
/// A recorder is owned by a single thread; merge recordings from several
/// threads with [`TraceRecorder::merge`] before analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecorder {
    track: TrackId,
    events: Vec<TrackEvent>,
}

impl TraceRecorder {
    /// Create an empty recorder for `track`.
    pub const fn new(track: TrackId) -> Self {
        Self {
            track,
            events: Vec::new(),
        }
    }

    /// The track every event of this recorder is emitted on.
    pub const fn track(&self) -> TrackId {
        self.track
    }

    /// Emit an event stamped with the current time.
    pub fn emit<I>(&mut self, name: impl Into<String>, mutations: I)
    where
        I: IntoIterator<Item = FlowMutation>,
    {
        self.emit_at(name, Utc::now(), mutations);
    }

    /// Emit an event with an explicit timestamp.
    pub fn emit_at<I>(&mut self, name: impl Into<String>, timestamp: DateTime<Utc>, mutations: I)
    where
        I: IntoIterator<Item = FlowMutation>,
    {
        let mut event = TrackEvent::new(name, self.track, timestamp);
        apply_all(&mut event, mutations);
        self.events.push(event);
    }

    /// Events recorded so far, in emission order.
    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Consume the recorder and return its events.
    pub fn into_events(self) -> Vec<TrackEvent> {
        self.events
    }

    /// Concatenate the events of several recorders.
    ///
    /// The result keeps each recorder's emission order; cross-track ordering
    /// is left to the analyzer, which sorts by timestamp.
    pub fn merge(recorders: impl IntoIterator<Item = Self>) -> Vec<TrackEvent> {
        recorders
            .into_iter()
            .flat_map(Self::into_events)
            .collect()
    }

    /// Write the recorded events as JSON lines.
    pub fn write_json_lines<W: Write>(&self, writer: W) -> Result<(), RecordError> {
        write_json_lines(writer, &self.events)
    }
}

/// Write `events` to `writer`, one JSON object per line.
pub fn write_json_lines<W: Write>(mut writer: W, events: &[TrackEvent]) -> Result<(), RecordError> {
    for event in events {
        serde_json::to_writer(&mut writer, event)
            .map_err(|source| RecordError::Serde { line: 0, source })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read events written by [`write_json_lines`]. Blank lines are skipped.
pub fn read_json_lines<R: BufRead>(reader: R) -> Result<Vec<TrackEvent>, RecordError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let number = index.saturating_add(1);
        let line = line.map_err(|err| {
            if err.kind() == io::ErrorKind::InvalidData {
                RecordError::Utf8 { line: number }
            } else {
                RecordError::Io { source: err }
            }
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| RecordError::Serde {
            line: number,
            source,
        })?;
        events.push(event);
    }
    debug!(events = events.len(), "trace records loaded");
    Ok(events)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use flowtag_types::ProcessSalt;

    use super::*;
    use crate::flow::{Flow, TerminatingFlow};

    #[test]
    fn recorder_applies_mutations_in_order() {
        let mut recorder = TraceRecorder::new(TrackId::new(1, 1));
        recorder.emit(
            "send",
            [Flow::explicit(1), Flow::explicit(2), TerminatingFlow::explicit(3)],
        );
        let event = recorder.events().first().unwrap();
        assert_eq!(event.flow_ids, vec![FlowId::new(1), FlowId::new(2)]);
        assert_eq!(event.terminating_flow_ids, vec![FlowId::new(3)]);
        assert_eq!(event.track, TrackId::new(1, 1));
    }

    #[test]
    fn event_without_mutations_has_no_flows() {
        let mut recorder = TraceRecorder::new(TrackId::new(1, 1));
        recorder.emit("tick", []);
        assert!(recorder.events().first().unwrap().has_no_flows());
    }

    #[test]
    fn json_lines_reload_to_equal_events() {
        let salt = ProcessSalt::new(0xABCD);
        let mut recorder = TraceRecorder::new(TrackId::new(4, 2));
        recorder.emit("open", [Flow::process_scoped(1, salt)]);
        recorder.emit("close", [TerminatingFlow::process_scoped(1, salt)]);

        let mut buffer = Vec::new();
        recorder.write_json_lines(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert_eq!(text.lines().count(), 2);

        let loaded = read_json_lines(buffer.as_slice()).unwrap();
        assert_eq!(loaded, recorder.events());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "\n{\"name\":\"a\",\"track\":{\"pid\":1,\"tid\":1},\"timestamp\":\"2026-01-01T00:00:00Z\",\"flow_ids\":[5]}\n\n";
        let loaded = read_json_lines(text.as_bytes()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first().unwrap().flow_ids, vec![FlowId::new(5)]);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let text = "{\"name\":\"a\",\"track\":{\"pid\":1,\"tid\":1},\"timestamp\":\"2026-01-01T00:00:00Z\"}\nnot json\n";
        let err = read_json_lines(text.as_bytes()).unwrap_err();
        assert!(matches!(err, RecordError::Serde { line: 2, .. }));
    }

    #[test]
    fn invalid_utf8_reports_line_number() {
        let mut bytes = b"\n\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let err = read_json_lines(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, RecordError::Utf8 { line: 3 }));
    }

    #[test]
    fn merge_keeps_per_recorder_order() {
        let mut a = TraceRecorder::new(TrackId::new(1, 1));
        let mut b = TraceRecorder::new(TrackId::new(1, 2));
        a.emit("a1", []);
        a.emit("a2", []);
        b.emit("b1", []);
        let merged = TraceRecorder::merge([a, b]);
        let names: Vec<&str> = merged.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a1", "a2", "b1"]);
    }
}
