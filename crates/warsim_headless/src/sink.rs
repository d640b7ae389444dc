//! JSON-lines event output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use warsim_core::events::{Event, EventSink};

/// Writes each event as one line of JSON.
///
/// [`EventSink::record`] cannot fail, so the first write error is kept and
/// later events are dropped; [`JsonLinesSink::finish`] reports it.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    /// Events written so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_event(&mut self, event: &Event) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, event).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) a file.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn record(&mut self, event: &Event) {
        if self.error.is_some() {
            return;
        }
        match self.write_event(event) {
            Ok(()) => self.written += 1,
            Err(e) => {
                tracing::warn!(error = %e, seq = event.seq, "event sink failed");
                self.error = Some(e);
            }
        }
    }
}

/// Discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use warsim_core::events::EventKind;
    use warsim_core::factions::FactionId;

    fn event(seq: u64) -> Event {
        Event {
            turn: 1,
            seq,
            phase: None,
            kind: EventKind::OrdersTimedOut {
                faction: FactionId::Red,
            },
        }
    }

    #[test]
    fn test_one_line_per_event() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record(&event(0));
        sink.record(&event(1));
        assert_eq!(sink.written(), 2);

        let bytes = sink.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Event = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, event(1));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_error_is_reported() {
        let mut sink = JsonLinesSink::new(Broken);
        sink.record(&event(0));
        sink.record(&event(1));
        assert_eq!(sink.written(), 0);
        assert!(sink.finish().is_err());
    }

    #[test]
    fn test_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut sink = JsonLinesSink::create(&path).unwrap();
        sink.record(&event(0));
        sink.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }
}
