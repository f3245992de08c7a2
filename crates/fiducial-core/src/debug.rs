use crate::GrayImageView;

/// Receiver for the pipeline's per-stage diagnostics.
///
/// The detector calls [`log`](Self::log) at well-defined points with a text
/// message, a snapshot image, or both. Images are only valid for the
/// duration of the call; sinks that want to keep them must copy. All calls
/// happen on the thread running the detector.
pub trait DebugSink {
    /// Called once when the sink is attached to a detector.
    fn init(&mut self) {}

    fn log(&mut self, text: Option<&str>, image: Option<&GrayImageView<'_>>);
}
