use serde::Serialize;

use crate::domain::BeatSpec;

/// A saved carrier configuration. Storage belongs to a `SessionRepository`;
/// the playback engine never sees sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub label: Option<String>,
    pub beat: BeatSpec,
}

impl Session {
    pub fn new(id: impl Into<String>, label: Option<String>, beat: BeatSpec) -> Self {
        Self {
            id: id.into(),
            label,
            beat,
        }
    }
}
