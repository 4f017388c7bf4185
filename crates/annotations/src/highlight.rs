/// Highlight mark state embedded in the document model
/// Tracks pending/complete marks plus the transient composition fields
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::{AnnotationError, HighlightId, Result};

/// Lifecycle state of a highlight mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkState {
    Pending,
    Complete,
}

/// Snapshot of the document selection a highlight was created from
///
/// The document engine owns the live range anchor; this core keeps the
/// offsets and the serialized (sanitized) fragment taken when composition
/// began, which is what thread quotes render from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub from: usize,
    pub to: usize,
    pub content: String,
}

impl SelectionSnapshot {
    pub fn new(from: usize, to: usize, content: impl Into<String>) -> Self {
        Self {
            from,
            to,
            content: content.into(),
        }
    }

    /// An empty or inverted range cannot anchor a highlight
    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}

/// A highlight mark bound to a document range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightMark {
    pub id: HighlightId,
    pub state: MarkState,
    pub selection: SelectionSnapshot,
}

/// Process-local highlight state for one open document
///
/// Replaces ambient editor storage with an explicit context object: the mark
/// map plus the transient fields the composer and activation paths share.
/// Never mutated by remote events directly; all mutation goes through the
/// methods below and is observable by the very next render.
#[derive(Debug, Default)]
pub struct HighlightStore {
    marks: HashMap<HighlightId, HighlightMark>,
    current_highlight_id: Option<HighlightId>,
    active_highlight_id: Option<HighlightId>,
    show_composer: bool,
    previous_highlight_selection: Option<SelectionSnapshot>,
}

impl HighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending mark for a non-empty selection
    ///
    /// At most one pending mark may exist per client; a second start while
    /// one is pending is rejected. `open_composer` is the entry point that
    /// pairs the mark with a composer session.
    pub fn start_highlight(&mut self, selection: SelectionSnapshot) -> Result<HighlightId> {
        if selection.is_empty() {
            return Err(AnnotationError::InvalidSelection);
        }
        if self.current_highlight_id.is_some() || self.pending_count() > 0 {
            return Err(AnnotationError::ComposerAlreadyOpen);
        }

        let id = HighlightId::new();
        self.marks.insert(
            id,
            HighlightMark {
                id,
                state: MarkState::Pending,
                selection,
            },
        );

        debug!("created pending highlight {}", id.0);
        Ok(id)
    }

    /// Transition a pending mark to complete once its thread exists
    pub fn complete_highlight(&mut self, id: HighlightId) -> Result<()> {
        let mark = self
            .marks
            .get_mut(&id)
            .ok_or_else(|| AnnotationError::HighlightNotFound(id.0.to_string()))?;

        if mark.state == MarkState::Complete {
            return Err(AnnotationError::HighlightAlreadyComplete(id.0.to_string()));
        }

        mark.state = MarkState::Complete;
        debug!("completed highlight {}", id.0);
        Ok(())
    }

    /// Remove a mark from the document regardless of state
    ///
    /// Idempotent: removing an id that does not exist is a no-op. Clears
    /// `active_highlight_id` when it points at the removed mark so the
    /// active reference never dangles, and discards an open composer
    /// session bound to the removed mark so the composer cannot stay
    /// composing over a mark that no longer exists.
    pub fn remove_highlight(&mut self, id: HighlightId) {
        if self.marks.remove(&id).is_some() {
            debug!("removed highlight {}", id.0);
        }

        if self.active_highlight_id == Some(id) {
            self.active_highlight_id = None;
        }

        if self.current_highlight_id == Some(id) {
            self.current_highlight_id = None;
            self.show_composer = false;
            self.previous_highlight_selection = None;
        }
    }

    /// Serialized fragment for quoting above a thread
    ///
    /// Read-only; `None` when the mark no longer exists.
    pub fn content(&self, id: HighlightId) -> Option<String> {
        self.marks.get(&id).map(|mark| mark.selection.content.clone())
    }

    pub fn contains(&self, id: HighlightId) -> bool {
        self.marks.contains_key(&id)
    }

    pub fn mark_state(&self, id: HighlightId) -> Option<MarkState> {
        self.marks.get(&id).map(|mark| mark.state)
    }

    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    /// Number of marks still pending (at most one per client)
    pub fn pending_count(&self) -> usize {
        self.marks
            .values()
            .filter(|mark| mark.state == MarkState::Pending)
            .count()
    }

    pub fn current_highlight_id(&self) -> Option<HighlightId> {
        self.current_highlight_id
    }

    pub fn active_highlight_id(&self) -> Option<HighlightId> {
        self.active_highlight_id
    }

    pub fn show_composer(&self) -> bool {
        self.show_composer
    }

    pub fn previous_highlight_selection(&self) -> Option<&SelectionSnapshot> {
        self.previous_highlight_selection.as_ref()
    }

    pub fn set_active(&mut self, id: HighlightId) {
        self.active_highlight_id = Some(id);
    }

    pub fn clear_active(&mut self) {
        self.active_highlight_id = None;
    }

    pub(crate) fn set_current(&mut self, id: Option<HighlightId>) {
        self.current_highlight_id = id;
    }

    pub(crate) fn set_show_composer(&mut self, show: bool) {
        self.show_composer = show;
    }

    pub(crate) fn set_previous_selection(&mut self, selection: Option<SelectionSnapshot>) {
        self.previous_highlight_selection = selection;
    }
}
