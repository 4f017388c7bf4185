/// Viewer presence projection for the avatar stack
/// Pure mapping from raw presence payloads to render-ready viewer records
use serde::{Deserialize, Serialize};

use crate::ConnectionId;

/// Activity state of a participant in a media review session
///
/// Closed enumeration: payloads carrying an unknown or missing state decode
/// to `Paused` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PresenceState {
    Playing,
    #[default]
    Paused,
}

impl From<String> for PresenceState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "playing" => PresenceState::Playing,
            _ => PresenceState::Paused,
        }
    }
}

/// Identity set by the authentication endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Transient per-connection presence payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresencePayload {
    #[serde(default)]
    pub state: PresenceState,
}

/// One participant as delivered by the realtime backend's live query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub info: ParticipantInfo,
    pub presence: PresencePayload,
}

/// Render-ready viewer entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub connection_id: ConnectionId,
    pub name: String,
    pub avatar: Option<String>,
    pub state: PresenceState,
    pub is_local: bool,
}

/// The single projection used for remote and local participants alike
pub fn project(participant: &Participant, is_local: bool) -> Viewer {
    Viewer {
        connection_id: participant.connection_id,
        name: participant.info.name.clone(),
        avatar: participant.info.avatar.clone(),
        state: participant.presence.state,
        is_local,
    }
}

/// Full roster in render order: remote participants as delivered, then the
/// local user last so the stack can offset them visually
pub fn viewer_roster(others: &[Participant], local: Option<&Participant>) -> Vec<Viewer> {
    let mut roster: Vec<Viewer> = others.iter().map(|p| project(p, false)).collect();

    if let Some(local) = local {
        roster.push(project(local, true));
    }

    roster
}
