use anyhow::{Context, Result};

use crate::domain::{find_preset, BeatSpec};
use crate::models::Session;
use crate::log_info;

use super::dto::{CreateSessionFromPresetRequest, CreateSessionRequest, SessionResponse};
use super::ports::SessionRepository;

const ENABLE_LOGS: bool = true;

/// Validates the carriers and stores the session, replacing any existing one
/// with the same id.
pub async fn create_session<R: SessionRepository>(
    repo: &R,
    req: CreateSessionRequest,
) -> Result<SessionResponse> {
    let beat = BeatSpec::from_hz(req.left_hz, req.right_hz)?;
    store(repo, Session::new(req.id, req.label, beat)).await
}

/// Stores a preset's carriers under `req.id`, labelled with the preset name
/// unless a label is given.
pub async fn create_session_from_preset<R: SessionRepository>(
    repo: &R,
    req: CreateSessionFromPresetRequest,
) -> Result<SessionResponse> {
    let preset = find_preset(&req.preset_name)?;
    let beat = preset.beat()?;
    let label = req.label.unwrap_or_else(|| preset.name().to_string());
    store(repo, Session::new(req.id, Some(label), beat)).await
}

async fn store<R: SessionRepository>(repo: &R, session: Session) -> Result<SessionResponse> {
    repo.save(&session)
        .await
        .with_context(|| format!("failed to save session {}", session.id))?;
    log_info!(
        "Saved session {} ({} Hz beat)",
        session.id,
        session.beat.beat_frequency()
    );
    Ok(SessionResponse::from(&session))
}

pub async fn list_sessions<R: SessionRepository>(repo: &R) -> Result<Vec<SessionResponse>> {
    let sessions = repo.list().await.context("failed to list sessions")?;
    Ok(sessions.iter().map(SessionResponse::from).collect())
}

pub async fn find_session<R: SessionRepository>(
    repo: &R,
    id: &str,
) -> Result<Option<SessionResponse>> {
    let session = repo
        .find_by_id(id)
        .await
        .with_context(|| format!("failed to load session {id}"))?;
    Ok(session.as_ref().map(SessionResponse::from))
}

/// Returns `false` if no session had this id.
pub async fn delete_session<R: SessionRepository>(repo: &R, id: &str) -> Result<bool> {
    repo.delete(id)
        .await
        .with_context(|| format!("failed to delete session {id}"))
}

pub async fn clear_sessions<R: SessionRepository>(repo: &R) -> Result<()> {
    repo.clear().await.context("failed to clear sessions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemorySessionRepository;
    use crate::error::SimbeatError;

    fn request(id: &str, left_hz: f64, right_hz: f64) -> CreateSessionRequest {
        CreateSessionRequest {
            id: id.to_string(),
            label: None,
            left_hz,
            right_hz,
        }
    }

    #[tokio::test]
    async fn create_reports_beat_and_stored_timestamp() {
        let repo = InMemorySessionRepository::new();
        let response = create_session(&repo, request("s1", 440.0, 445.0))
            .await
            .unwrap();
        assert_eq!(response.beat_hz, 5.0);

        let stored = repo.find_by_id("s1").await.unwrap().unwrap();
        assert_eq!(response.created_at, stored.beat.created_at());
    }

    #[tokio::test]
    async fn invalid_pair_is_not_stored() {
        let repo = InMemorySessionRepository::new();
        let err = create_session(&repo, request("s1", 440.0, 500.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimbeatError>(),
            Some(SimbeatError::BeatOutOfRange { .. })
        ));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_preset_is_reported_by_name() {
        let repo = InMemorySessionRepository::new();
        let err = create_session_from_preset(
            &repo,
            CreateSessionFromPresetRequest {
                id: "p".to_string(),
                label: None,
                preset_name: "Nonexistent".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SimbeatError>(),
            Some(&SimbeatError::PresetNotFound("Nonexistent".to_string()))
        );
    }

    #[tokio::test]
    async fn explicit_label_overrides_preset_name() {
        let repo = InMemorySessionRepository::new();
        let response = create_session_from_preset(
            &repo,
            CreateSessionFromPresetRequest {
                id: "p".to_string(),
                label: Some("evening".to_string()),
                preset_name: "Sleep (2 Hz)".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.label.as_deref(), Some("evening"));
        assert_eq!(response.beat_hz, 2.0);
    }
}
