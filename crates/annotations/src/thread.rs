/// Thread data model mirrored from the external realtime backend
/// The backend owns the collection; this side only requests mutations and
/// applies the streamed updates in receipt order
use serde::{Deserialize, Serialize};

use crate::{HighlightId, HighlightStore, ThreadId};

/// Metadata linking a thread to its highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    pub resolved: bool,
    pub highlight_id: HighlightId,
}

/// A single comment; the body is opaque rich text owned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub body: serde_json::Value,
}

/// A discussion thread anchored to a highlight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub metadata: ThreadMetadata,
    pub comments: Vec<Comment>,
}

/// Request sent to the backend to persist a new thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateThreadRequest {
    pub body: serde_json::Value,
    pub metadata: ThreadMetadata,
}

/// Update streamed from the backend after it applied a mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ThreadEvent {
    #[serde(rename = "thread_created")]
    Created { thread: Thread },

    #[serde(rename = "thread_metadata")]
    MetadataChanged {
        id: ThreadId,
        metadata: ThreadMetadata,
    },

    #[serde(rename = "thread_deleted")]
    Deleted { id: ThreadId },
}

/// Local read model of the backend-owned thread collection
///
/// Events apply in receipt order with no reordering or coalescing; display
/// ordering is imposed separately at render time.
#[derive(Debug, Clone, Default)]
pub struct ThreadMirror {
    threads: Vec<Thread>,
}

impl ThreadMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one streamed event; returns the removed thread on deletion
    pub fn apply(&mut self, event: ThreadEvent) -> Option<Thread> {
        match event {
            ThreadEvent::Created { thread } => {
                // A locally echoed create may arrive again from the stream
                if let Some(existing) = self.threads.iter_mut().find(|t| t.id == thread.id) {
                    *existing = thread;
                } else {
                    self.threads.push(thread);
                }
                None
            }

            ThreadEvent::MetadataChanged { id, metadata } => {
                if let Some(thread) = self.threads.iter_mut().find(|t| t.id == id) {
                    thread.metadata = metadata;
                }
                None
            }

            ThreadEvent::Deleted { id } => {
                let position = self.threads.iter().position(|t| t.id == id)?;
                Some(self.threads.remove(position))
            }
        }
    }

    pub fn get(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// All threads in receipt order, orphaned or not
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    /// Threads whose highlight still exists in the store
    ///
    /// Orphaned threads (mark removed out of band) are excluded from
    /// anchored rendering but stay in the flat list above.
    pub fn anchored<'a>(&'a self, store: &HighlightStore) -> Vec<&'a Thread> {
        self.threads
            .iter()
            .filter(|t| store.contains(t.metadata.highlight_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SelectionSnapshot;

    fn thread(highlight_id: HighlightId) -> Thread {
        Thread {
            id: ThreadId::new(),
            created_at: chrono::Utc::now(),
            metadata: ThreadMetadata {
                resolved: false,
                highlight_id,
            },
            comments: vec![Comment {
                body: serde_json::json!({ "text": "first" }),
            }],
        }
    }

    #[test]
    fn test_apply_created_and_deleted() {
        let mut mirror = ThreadMirror::new();
        let t = thread(HighlightId::new());
        let id = t.id;

        mirror.apply(ThreadEvent::Created { thread: t });
        assert_eq!(mirror.len(), 1);

        let removed = mirror.apply(ThreadEvent::Deleted { id });
        assert_eq!(removed.map(|t| t.id), Some(id));
        assert!(mirror.is_empty());

        // Deleting an unknown thread is a no-op
        assert!(mirror.apply(ThreadEvent::Deleted { id }).is_none());
    }

    #[test]
    fn test_created_replaces_local_echo() {
        let mut mirror = ThreadMirror::new();
        let mut t = thread(HighlightId::new());
        let id = t.id;

        mirror.apply(ThreadEvent::Created { thread: t.clone() });

        // The stream's copy carries more comments than the local echo
        t.comments.push(Comment {
            body: serde_json::json!({ "text": "reply" }),
        });
        mirror.apply(ThreadEvent::Created { thread: t });

        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror.get(id).unwrap().comments.len(), 2);
    }

    #[test]
    fn test_metadata_changed() {
        let mut mirror = ThreadMirror::new();
        let t = thread(HighlightId::new());
        let id = t.id;
        let highlight_id = t.metadata.highlight_id;

        mirror.apply(ThreadEvent::Created { thread: t });
        mirror.apply(ThreadEvent::MetadataChanged {
            id,
            metadata: ThreadMetadata {
                resolved: true,
                highlight_id,
            },
        });

        assert!(mirror.get(id).unwrap().metadata.resolved);
    }

    #[test]
    fn test_anchored_filters_orphans() {
        let mut store = HighlightStore::new();
        let anchored_id = store
            .start_highlight(SelectionSnapshot::new(0, 5, "<p>a</p>"))
            .unwrap();
        store.complete_highlight(anchored_id).unwrap();

        let mut mirror = ThreadMirror::new();
        let kept = thread(anchored_id);
        let orphan = thread(HighlightId::new());
        let kept_id = kept.id;

        mirror.apply(ThreadEvent::Created { thread: kept });
        mirror.apply(ThreadEvent::Created { thread: orphan });

        let anchored = mirror.anchored(&store);
        assert_eq!(anchored.len(), 1);
        assert_eq!(anchored[0].id, kept_id);

        // The flat list still carries both
        assert_eq!(mirror.len(), 2);
    }
}
