//! Shared stage lifecycle.
//!
//! Every pipeline stage (demuxer, filter, muxer) moves through the same
//! state machine: `Closed → Opened → Streaming → Draining → Closed`.
//! `Opened` covers format/stream/codec setup, `Streaming` processes one
//! unit at a time, `Draining` flushes buffered frames at end-of-input, and
//! the final `Closed` releases all library-owned contexts exactly once.

/// Lifecycle state of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// No contexts are held (initial and terminal state).
    Closed,
    /// Format, stream, and codec contexts are set up; no unit processed yet.
    Opened,
    /// Processing packets/frames one at a time.
    Streaming,
    /// End-of-input reached; flushing buffered frames.
    Draining,
}

impl StageState {
    /// Short lowercase name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            StageState::Closed => "closed",
            StageState::Opened => "opened",
            StageState::Streaming => "streaming",
            StageState::Draining => "draining",
        }
    }
}
