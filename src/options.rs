use crate::error::{Error, Result};

/// Knobs shared by stream producers and parallel operations.
///
/// `buffer` is the capacity of output channels created by an operation
/// (0 means rendezvous). `concurrency` caps how many calls to the user
/// function may run at once; it defaults to the available hardware
/// parallelism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    buffer: usize,
    concurrency: usize,
}

impl Options {
    pub fn new() -> Options {
        Options {
            buffer: 0,
            concurrency: default_concurrency(),
        }
    }

    pub fn buffer(mut self, size: usize) -> Options {
        self.buffer = size;
        self
    }

    /// Sets the maximum number of concurrent workers. 0 is rejected by
    /// [`validate`](Options::validate) when an operation starts.
    pub fn concurrency(mut self, n: usize) -> Options {
        self.concurrency = n;
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer
    }

    pub fn max_workers(&self) -> usize {
        self.concurrency
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency < 1 {
            return Err(Error::InvalidConcurrency(self.concurrency));
        }
        Ok(())
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
