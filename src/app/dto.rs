use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Preset;
use crate::models::Session;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub left_hz: f64,
    pub right_hz: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionFromPresetRequest {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub preset_name: String,
}

/// A stored session flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub label: Option<String>,
    pub left_hz: f64,
    pub right_hz: f64,
    pub beat_hz: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            label: session.label.clone(),
            left_hz: session.beat.left().hz(),
            right_hz: session.beat.right().hz(),
            beat_hz: session.beat.beat_frequency(),
            created_at: session.beat.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDto {
    pub name: String,
    pub left_hz: f64,
    pub right_hz: f64,
}

impl From<&Preset> for PresetDto {
    fn from(preset: &Preset) -> Self {
        Self {
            name: preset.name().to_string(),
            left_hz: preset.left().hz(),
            right_hz: preset.right().hz(),
        }
    }
}
