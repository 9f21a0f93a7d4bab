//! Ownership and client-binding checks run before any session operation.

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::game_store::GameStore,
    error::ServiceError,
    state::{identity::UserId, session::GameSession},
};

/// Load a session and check that `user` owns it.
pub async fn load_owned(
    store: &dyn GameStore,
    session_id: Uuid,
    user: UserId,
) -> Result<GameSession, ServiceError> {
    let session: GameSession = store
        .find_session(session_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game session `{session_id}` not found")))?
        .into();

    if session.user_id != user {
        warn!(%session_id, user_id = %user, "session accessed by a foreign user");
        return Err(ServiceError::Forbidden);
    }
    Ok(session)
}

/// Load a session for a mutating call: it must belong to `user` and carry the
/// client session id handed out at start.
///
/// Owner and nonce mismatches produce the same error so callers cannot probe
/// which one failed.
pub async fn validate(
    store: &dyn GameStore,
    session_id: Uuid,
    user: UserId,
    client_session_id: &str,
) -> Result<GameSession, ServiceError> {
    let session = load_owned(store, session_id, user).await?;
    if session.client_session_id != client_session_id {
        warn!(%session_id, user_id = %user, "client session id mismatch");
        return Err(ServiceError::Forbidden);
    }
    Ok(session)
}
