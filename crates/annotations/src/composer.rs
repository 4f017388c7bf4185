/// Composer lifecycle state machine
/// Governs when the comment composer is shown, submitted, or dismissed
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AnnotationError, HighlightId, HighlightStore, Result, SelectionSnapshot};

/// Current phase of the composer for one document
///
/// At most one session may be composing at a time; the phase is derived
/// from the store's transient fields so it can never drift from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerPhase {
    Idle,
    Composing { highlight_id: HighlightId },
}

/// Where a dismissal event originated relative to the composer's own region
///
/// Focus loss caused by interaction inside the composer (an embedded emoji
/// picker, for example) must not cancel the session. Callers perform the
/// hit test and report the origin explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalOrigin {
    WithinComposer,
    OutsideComposer,
}

impl HighlightStore {
    pub fn composer_phase(&self) -> ComposerPhase {
        match self.current_highlight_id() {
            Some(highlight_id) => ComposerPhase::Composing { highlight_id },
            None => ComposerPhase::Idle,
        }
    }
}

/// Open a composer session over a non-empty selection
///
/// Creates the pending mark and records the selection snapshot so it can be
/// restored or discarded on cancel. Rejected while another session is open.
pub fn open_composer(
    store: &mut HighlightStore,
    selection: SelectionSnapshot,
) -> Result<HighlightId> {
    if let ComposerPhase::Composing { .. } = store.composer_phase() {
        return Err(AnnotationError::ComposerAlreadyOpen);
    }

    let id = store.start_highlight(selection.clone())?;
    store.set_current(Some(id));
    store.set_previous_selection(Some(selection));
    store.set_show_composer(true);

    debug!("composer opened for highlight {}", id.0);
    Ok(id)
}

/// Close the composer after a successful submission
///
/// The mark survives (now complete); only the transient fields clear.
pub fn close_composer(store: &mut HighlightStore) {
    store.set_current(None);
    store.set_previous_selection(None);
    store.set_show_composer(false);
}

/// Abandon the open session and remove its pending mark
pub fn cancel_composer(store: &mut HighlightStore) {
    if let ComposerPhase::Composing { highlight_id } = store.composer_phase() {
        store.remove_highlight(highlight_id);
        store.set_current(None);
        store.set_show_composer(false);
        debug!("composer cancelled, highlight {} discarded", highlight_id.0);
    }
}

/// React to the composer losing focus
///
/// An outside origin cancels the session; an inside origin is suppressed
/// and the session stays composing. Returns whether a dismissal happened.
pub fn handle_focus_out(store: &mut HighlightStore, origin: DismissalOrigin) -> bool {
    match origin {
        DismissalOrigin::WithinComposer => false,
        DismissalOrigin::OutsideComposer => {
            let composing = matches!(store.composer_phase(), ComposerPhase::Composing { .. });
            if composing {
                cancel_composer(store);
            }
            composing
        }
    }
}
