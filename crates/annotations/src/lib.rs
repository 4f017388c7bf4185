/// Highlight-anchored comment threads for a collaboratively edited document
/// Keeps highlight marks, thread lifecycle, and viewer presence in sync
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod highlight;
pub use highlight::*;

mod composer;
pub use composer::*;

mod thread;
pub use thread::*;

mod ordering;
pub use ordering::*;

mod events;
pub use events::*;

mod engine;
pub use engine::*;

mod backend;
pub use backend::*;

mod presence;
pub use presence::*;

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("selection is empty or missing")]
    InvalidSelection,

    #[error("a composer session is already open")]
    ComposerAlreadyOpen,

    #[error("no composer session is open")]
    ComposerNotOpen,

    #[error("highlight not found: {0}")]
    HighlightNotFound(String),

    #[error("highlight already complete: {0}")]
    HighlightAlreadyComplete(String),

    #[error("thread persistence failed: {0}")]
    ThreadPersistence(String),
}

pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Identifier of a highlight mark anchored in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightId(pub uuid::Uuid);

impl HighlightId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for HighlightId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a discussion thread owned by the sync backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub uuid::Uuid);

impl ThreadId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a live connection to the sync backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);
