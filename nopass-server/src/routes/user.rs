//! Own-profile endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tower_cookies::Cookies;

use crate::email::MailSender;
use crate::error::VaultError;
use crate::state::AppState;
use crate::store::{SessionStore, VaultStore};

use super::session::resolve_session_identity;
use super::PublicIdentity;

/// GET /api/user
pub async fn get_user<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
) -> Result<Json<PublicIdentity>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let identity = resolve_session_identity(&state, &cookies)?;
    Ok(Json(PublicIdentity::from(&identity)))
}
