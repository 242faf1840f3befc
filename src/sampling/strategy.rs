use crate::errors::SamplingResult;

/// One way of turning a physical source into a raw sample.
///
/// `acquire` may block on hardware; the engine always calls it from the
/// blocking pool and never concurrently with itself.
pub trait AcquisitionStrategy: Send + 'static {
    type Sample: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    fn acquire(&mut self) -> SamplingResult<Self::Sample>;

    /// Hook up event sources before the first acquisition.
    fn attach(&mut self) -> SamplingResult<()> {
        Ok(())
    }

    /// Release event sources on cancellation.
    fn detach(&mut self) {}
}
