/// Seam to the external realtime sync backend
/// The backend owns thread persistence; this side only asks and observes
use crate::{Comment, CreateThreadRequest, Result, Thread, ThreadId};

/// The one mutation path to the shared thread collection
///
/// An acknowledgment returns the authoritative record with the
/// backend-assigned id and creation timestamp. A failed call leaves all
/// local state untouched so the caller can resubmit; no retry happens here.
pub trait SyncBackend {
    fn create_thread(&mut self, request: CreateThreadRequest) -> Result<Thread>;
}

/// In-memory reference backend for local use and tests
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    threads: Vec<Thread>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Threads the backend has acknowledged, in creation order
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }
}

impl SyncBackend for InMemoryBackend {
    fn create_thread(&mut self, request: CreateThreadRequest) -> Result<Thread> {
        let thread = Thread {
            id: ThreadId::new(),
            created_at: chrono::Utc::now(),
            metadata: request.metadata,
            comments: vec![Comment { body: request.body }],
        };

        self.threads.push(thread.clone());
        Ok(thread)
    }
}
