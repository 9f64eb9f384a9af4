//! Byte-level transfer progress. Purely presentational: nothing in the download
//! path reads these values back.

pub trait ProgressSink: Send + Sync {
    /// Start tracking one transfer. `total_bytes` is `None` when the server
    /// sends no usable `Content-Length`.
    fn begin(&self, title: &str, total_bytes: Option<u64>) -> Box<dyn TransferProgress>;
}

pub trait TransferProgress: Send {
    fn advance(&mut self, bytes: u64);
    fn finish(&mut self);
    fn abandon(&mut self) {}
}

/// Discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&self, _title: &str, _total_bytes: Option<u64>) -> Box<dyn TransferProgress> {
        Box::new(NoProgress)
    }
}

impl TransferProgress for NoProgress {
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self) {}
}
