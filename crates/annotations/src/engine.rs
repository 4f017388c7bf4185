/// Thread binder: bridges the highlight lifecycle and the thread lifecycle
/// One engine per open document; initialized idle, torn down on drop
use tracing::{debug, warn};

use crate::{
    cancel_composer, close_composer, handle_focus_out, open_composer, AnnotationError,
    ComposerPhase, DismissalOrigin, HighlightEvents, HighlightId, HighlightStore, Result,
    SelectionSnapshot, Subscription, SubscriptionId, SyncBackend, Thread, ThreadEvent,
    ThreadMetadata, ThreadMirror, CreateThreadRequest, ThreadId, sorted_for_display,
};

/// Context object owning all process-local comment state for a document
///
/// The store and composer fields are exclusively local; only the mirror
/// reflects shared state, and it changes solely through backend events.
#[derive(Debug, Default)]
pub struct CommentEngine {
    store: HighlightStore,
    events: HighlightEvents,
    mirror: ThreadMirror,
}

impl CommentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &HighlightStore {
        &self.store
    }

    pub fn mirror(&self) -> &ThreadMirror {
        &self.mirror
    }

    pub fn composer_phase(&self) -> ComposerPhase {
        self.store.composer_phase()
    }

    /// Begin composing a comment over the current selection
    ///
    /// Creates the pending mark and opens the composer. Rejected when the
    /// selection is empty or another session is already composing.
    pub fn start_comment(&mut self, selection: SelectionSnapshot) -> Result<HighlightId> {
        open_composer(&mut self.store, selection)
    }

    /// Submit the composed comment as a new thread
    ///
    /// Dispatches the creation request; on acknowledgment the pending mark
    /// flips to complete, the transient fields clear, and the composer
    /// closes. On failure everything stays as it was, so resubmitting with
    /// the same session is the retry path.
    pub fn submit_comment(
        &mut self,
        body: serde_json::Value,
        backend: &mut impl SyncBackend,
    ) -> Result<ThreadId> {
        let highlight_id = match self.store.composer_phase() {
            ComposerPhase::Composing { highlight_id } => highlight_id,
            ComposerPhase::Idle => return Err(AnnotationError::ComposerNotOpen),
        };

        let request = CreateThreadRequest {
            body,
            metadata: ThreadMetadata {
                resolved: false,
                highlight_id,
            },
        };

        let thread = backend.create_thread(request).map_err(|e| {
            warn!("thread creation not acknowledged: {}", e);
            e
        })?;

        self.store.complete_highlight(highlight_id)?;
        close_composer(&mut self.store);

        debug!("thread {} bound to highlight {}", thread.id.0, highlight_id.0);

        // Local echo; the backend stream will deliver the same record again
        let thread_id = thread.id;
        self.mirror.apply(ThreadEvent::Created { thread });

        Ok(thread_id)
    }

    /// Forward a composer focus-loss to the state machine
    pub fn composer_focus_out(&mut self, origin: DismissalOrigin) -> bool {
        handle_focus_out(&mut self.store, origin)
    }

    /// A thread was deleted from the list by the local user
    ///
    /// Unconditionally removes the bound highlight, clearing the active id
    /// as a side effect when it pointed there.
    pub fn handle_thread_deleted(&mut self, thread: &Thread) {
        self.store.remove_highlight(thread.metadata.highlight_id);
        self.mirror.apply(ThreadEvent::Deleted { id: thread.id });
        debug!(
            "thread {} deleted, highlight {} removed",
            thread.id.0, thread.metadata.highlight_id.0
        );
    }

    /// Apply one update streamed from the backend, in receipt order
    ///
    /// A remote deletion also removes the bound highlight from the local
    /// document so the two sides cannot drift.
    pub fn apply_remote_event(&mut self, event: ThreadEvent) {
        let removed = self.mirror.apply(event);
        if let Some(thread) = removed {
            self.store.remove_highlight(thread.metadata.highlight_id);
        }
    }

    /// The highlight's mark was removed from the document out of band
    /// (for example by another participant's edit)
    ///
    /// If the open composer session was bound to it, the session is forced
    /// idle and discarded; a creation request already sent is not cancelled.
    pub fn handle_remote_highlight_removed(&mut self, id: HighlightId) {
        if self.store.composer_phase() == (ComposerPhase::Composing { highlight_id: id }) {
            warn!("highlight {} removed while composing, discarding session", id.0);
            cancel_composer(&mut self.store);
        } else {
            self.store.remove_highlight(id);
        }
    }

    /// A rendered highlight mark was clicked
    ///
    /// Stale ids (mark deleted concurrently) clear the active highlight
    /// instead of activating; valid ids become active and are broadcast.
    pub fn activate_highlight(&mut self, id: HighlightId) {
        if !self.store.contains(id) {
            warn!("activation of stale highlight {}", id.0);
            self.store.clear_active();
            return;
        }

        self.store.set_active(id);
        self.events.publish(id);
    }

    /// Read-only quoted excerpt for display above a thread
    pub fn highlight_quote(&self, id: HighlightId) -> Option<String> {
        self.store.content(id)
    }

    pub fn subscribe_activations(&mut self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe_activations(&mut self, id: SubscriptionId) {
        self.events.unsubscribe(id);
    }

    /// Thread list in display order, recomputed from the mirror
    pub fn sorted_threads(&self) -> Vec<Thread> {
        sorted_for_display(self.mirror.threads())
    }

    /// Threads still anchored to an existing mark
    pub fn anchored_threads(&self) -> Vec<&Thread> {
        self.mirror.anchored(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryBackend, MarkState};

    fn selection() -> SelectionSnapshot {
        SelectionSnapshot::new(3, 17, "<p>take a look</p>")
    }

    fn body() -> serde_json::Value {
        serde_json::json!({ "text": "what about this?" })
    }

    #[test]
    fn test_submit_completes_and_closes() {
        let mut engine = CommentEngine::new();
        let mut backend = InMemoryBackend::new();

        let highlight_id = engine.start_comment(selection()).unwrap();
        let thread_id = engine.submit_comment(body(), &mut backend).unwrap();

        assert_eq!(engine.store().mark_state(highlight_id), Some(MarkState::Complete));
        assert_eq!(engine.composer_phase(), ComposerPhase::Idle);
        assert_eq!(engine.store().current_highlight_id(), None);
        assert!(engine.store().previous_highlight_selection().is_none());
        assert_eq!(engine.mirror().get(thread_id).unwrap().metadata.highlight_id, highlight_id);
    }

    #[test]
    fn test_submit_without_session() {
        let mut engine = CommentEngine::new();
        let mut backend = InMemoryBackend::new();

        let result = engine.submit_comment(body(), &mut backend);
        assert!(matches!(result, Err(AnnotationError::ComposerNotOpen)));
    }

    #[test]
    fn test_delete_thread_removes_highlight() {
        let mut engine = CommentEngine::new();
        let mut backend = InMemoryBackend::new();

        let highlight_id = engine.start_comment(selection()).unwrap();
        let thread_id = engine.submit_comment(body(), &mut backend).unwrap();

        let thread = engine.mirror().get(thread_id).unwrap().clone();
        engine.handle_thread_deleted(&thread);

        assert!(!engine.store().contains(highlight_id));
        assert!(engine.mirror().is_empty());
    }

    #[test]
    fn test_remote_deletion_removes_highlight() {
        let mut engine = CommentEngine::new();
        let mut backend = InMemoryBackend::new();

        let highlight_id = engine.start_comment(selection()).unwrap();
        let thread_id = engine.submit_comment(body(), &mut backend).unwrap();
        engine.activate_highlight(highlight_id);

        engine.apply_remote_event(ThreadEvent::Deleted { id: thread_id });

        assert!(!engine.store().contains(highlight_id));
        assert_eq!(engine.store().active_highlight_id(), None);
    }

    #[test]
    fn test_delete_while_composing_goes_idle() {
        let mut engine = CommentEngine::new();

        let highlight_id = engine.start_comment(selection()).unwrap();
        let thread = Thread {
            id: ThreadId::new(),
            created_at: chrono::Utc::now(),
            metadata: ThreadMetadata {
                resolved: false,
                highlight_id,
            },
            comments: vec![],
        };

        // Deleting a thread bound to the composing mark discards the session
        engine.handle_thread_deleted(&thread);

        assert!(!engine.store().contains(highlight_id));
        assert_eq!(engine.composer_phase(), ComposerPhase::Idle);
        assert!(!engine.store().show_composer());
        assert_eq!(engine.store().current_highlight_id(), None);

        // A new session opens without needing a manual focus-out first
        engine.start_comment(selection()).unwrap();
    }

    #[test]
    fn test_remote_delete_while_composing_goes_idle() {
        let mut engine = CommentEngine::new();

        let highlight_id = engine.start_comment(selection()).unwrap();
        let thread = Thread {
            id: ThreadId::new(),
            created_at: chrono::Utc::now(),
            metadata: ThreadMetadata {
                resolved: false,
                highlight_id,
            },
            comments: vec![],
        };

        engine.apply_remote_event(ThreadEvent::Created {
            thread: thread.clone(),
        });
        engine.apply_remote_event(ThreadEvent::Deleted { id: thread.id });

        assert!(!engine.store().contains(highlight_id));
        assert_eq!(engine.composer_phase(), ComposerPhase::Idle);
        assert!(!engine.store().show_composer());
    }

    #[test]
    fn test_remote_highlight_removal_discards_session() {
        let mut engine = CommentEngine::new();

        let highlight_id = engine.start_comment(selection()).unwrap();
        engine.handle_remote_highlight_removed(highlight_id);

        assert_eq!(engine.composer_phase(), ComposerPhase::Idle);
        assert!(!engine.store().contains(highlight_id));
        assert!(!engine.store().show_composer());
    }

    #[test]
    fn test_stale_activation_clears_active() {
        let mut engine = CommentEngine::new();
        let mut backend = InMemoryBackend::new();

        let live = engine.start_comment(selection()).unwrap();
        engine.submit_comment(body(), &mut backend).unwrap();
        engine.activate_highlight(live);
        assert_eq!(engine.store().active_highlight_id(), Some(live));

        engine.activate_highlight(HighlightId::new());
        assert_eq!(engine.store().active_highlight_id(), None);
    }

    #[test]
    fn test_stale_activation_publishes_nothing() {
        let mut engine = CommentEngine::new();
        let mut sub = engine.subscribe_activations();

        engine.activate_highlight(HighlightId::new());
        assert_eq!(sub.drain(), vec![]);
    }

    #[test]
    fn test_highlight_quote() {
        let mut engine = CommentEngine::new();

        let highlight_id = engine.start_comment(selection()).unwrap();
        assert_eq!(
            engine.highlight_quote(highlight_id).as_deref(),
            Some("<p>take a look</p>")
        );
        assert_eq!(engine.highlight_quote(HighlightId::new()), None);
    }
}
