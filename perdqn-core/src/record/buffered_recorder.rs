use super::{Record, Recorder};

/// Buffered recorder.
///
/// Keeps every record in memory, e.g., per-episode statistics of a training run.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self {
            buf: Vec::default(),
        }
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record was written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}
