use crate::runtime::WaitGroup;

/// Barrier handle returned by [`crate::flush`]; resolves once every sink
/// worker has acknowledged the flush.
pub struct LogWaitGroup {
    pub inner: WaitGroup,
}

impl LogWaitGroup {
    pub fn new(inner: WaitGroup) -> Self {
        Self { inner }
    }

    /// Block until all sinks have flushed.
    pub fn wait(self) {
        self.inner.wait();
    }

    /// Close all sinks first, then wait for the barrier to release.
    pub fn exit_and_wait(self) {
        crate::roto_log::exit();
        self.inner.wait();
    }
}
