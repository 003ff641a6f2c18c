//! Monotonic progress reporting
//!
//! Callers observe one progress stream per `upload()` call even when the
//! pipeline restarts the session from byte zero after an auth abort. The
//! reporter keeps a high-water mark and suppresses any ratio at or below
//! it, so reported values never decrease and 1.0 is emitted exactly once,
//! on the successful session's final chunk.

/// Clamping progress reporter for one upload call.
#[derive(Debug)]
pub struct ProgressReporter {
    total_bytes: u64,
    high_water: f64,
}

impl ProgressReporter {
    /// Create a reporter for a payload of `total_bytes` (> 0; validated by
    /// the manager before any reporter exists).
    #[must_use]
    pub fn new(total_bytes: u64) -> Self {
        Self { total_bytes, high_water: 0.0 }
    }

    /// Record that `bytes_uploaded` bytes of the *current* session have
    /// been accepted, notifying the callback only when the overall ratio
    /// advances.
    pub fn advance<F: FnMut(f64)>(&mut self, bytes_uploaded: u64, notify: &mut F) {
        let ratio = bytes_uploaded as f64 / self.total_bytes as f64;
        if ratio > self.high_water {
            self.high_water = ratio;
            notify(ratio);
        }
    }

    /// The best ratio reported so far.
    #[must_use]
    pub fn high_water(&self) -> f64 {
        self.high_water
    }
}
