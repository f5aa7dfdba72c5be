use anyhow::Result;

use crate::classify::Classification;

/// Classifier backend trait.
///
/// `pixels` is a tightly packed, row-major RGB8 buffer of `width * height`
/// pixels. Implementations must validate the buffer length against the
/// dimensions rather than trust the caller.
pub trait ClassifierBackend: Send {
    /// Backend identifier, used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// Classify a frame, returning top-k fine-grained labels with scores.
    fn classify(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Classification>;

    /// Optional warm-up hook, run once at startup before serving requests.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
