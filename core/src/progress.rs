//! Upload progress reporting.
//!
//! Callers only ever observe integer percentages in `0..=100` that strictly increase,
//! regardless of how often or how out-of-order the transport reports bytes.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI16, AtomicU64, Ordering};

type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Cloneable progress sink handed to the transport.
#[derive(Clone)]
pub struct Progress {
    inner: Arc<Inner>,
}

struct Inner {
    // -1 until the first report.
    last: AtomicI16,
    sink: Box<ProgressFn>,
}

impl Progress {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                last: AtomicI16::new(-1),
                sink: Box::new(sink),
            }),
        }
    }

    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Reports a percentage. Values above 100 are clamped; values that do not exceed
    /// the last reported one are dropped.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100) as i16;
        let previous = self.inner.last.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            (self.inner.sink)(percent as u8);
        }
    }

    /// Marks the transfer as complete.
    pub fn finish(&self) {
        self.report(100);
    }

    /// Last reported percentage, if any.
    pub fn last(&self) -> Option<u8> {
        let last = self.inner.last.load(Ordering::SeqCst);
        (last >= 0).then_some(last as u8)
    }

    /// Starts a byte counter for a transfer of `total` bytes.
    pub fn bytes(&self, total: u64) -> ByteProgress {
        self.report(0);
        ByteProgress {
            sent: AtomicU64::new(0),
            total,
            progress: self.clone(),
        }
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress").field("last", &self.last()).finish()
    }
}

/// Converts bytes-sent into percentages. Shared between the streams of a multipart body.
#[derive(Debug)]
pub struct ByteProgress {
    sent: AtomicU64,
    total: u64,
    progress: Progress,
}

impl ByteProgress {
    pub fn advance(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.progress.report(percent_of(sent, self.total));
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) as u128 * 100) / total as u128) as u8
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recording() -> (Progress, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress = Progress::new(move |p| sink.lock().unwrap().push(p));
        (progress, seen)
    }

    #[test]
    fn reports_are_monotonic_and_clamped() {
        let (progress, seen) = recording();
        progress.report(10);
        progress.report(5);
        progress.report(10);
        progress.report(250);
        progress.report(99);
        assert_eq!(*seen.lock().unwrap(), vec![10, 100]);
        assert_eq!(progress.last(), Some(100));
    }

    #[test]
    fn byte_counter_derives_percentages() {
        let (progress, seen) = recording();
        let bytes = progress.bytes(400);
        bytes.advance(100);
        bytes.advance(1);
        bytes.advance(299);
        bytes.advance(50); // over-reporting never exceeds 100
        assert_eq!(*seen.lock().unwrap(), vec![0, 25, 100]);
        assert_eq!(bytes.sent(), 450);
    }

    #[test]
    fn empty_transfer_completes_immediately() {
        let (progress, seen) = recording();
        progress.bytes(0).advance(0);
        assert_eq!(*seen.lock().unwrap(), vec![0, 100]);
    }
}
