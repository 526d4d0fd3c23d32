use crate::auth::jwt::JwtCodec;
use crate::db::PrincipalStore;
use crate::types::{AppError, AuthenticatedIdentity, Result};
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// What the gate did for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No bearer credential; the request continues without an identity.
    Anonymous,
    /// A new identity was placed in the request extensions.
    Authenticated,
    /// An identity was already present and was left untouched.
    AlreadyAuthenticated,
}

/// Reads the bearer value from the `Authorization` header.
///
/// Returns `None` when the header is absent, blank, not valid text, or uses
/// another scheme. A bare `Bearer` scheme with nothing after it yields
/// `Some("")` so that it is rejected as blank rather than let through.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if value.trim().is_empty() {
        return None;
    }
    if value.trim_end() == BEARER_PREFIX.trim_end() {
        return Some("");
    }
    value.strip_prefix(BEARER_PREFIX)
}

/// Turns the request's bearer credential into an [`AuthenticatedIdentity`].
///
/// At most one identity is established per request: if `extensions` already
/// holds one it is kept and the principal store is not consulted again.
pub async fn establish_identity(
    codec: &JwtCodec,
    principals: &dyn PrincipalStore,
    headers: &HeaderMap,
    extensions: &mut Extensions,
) -> Result<GateOutcome> {
    let Some(token) = bearer_token(headers) else {
        return Ok(GateOutcome::Anonymous);
    };

    if token.trim().is_empty() {
        warn!("blank bearer credential");
        return Err(AppError::BlankCredential);
    }

    codec.check_well_formed(token).inspect_err(|_| {
        warn!("malformed bearer credential");
    })?;
    let name = codec.verify(token).inspect_err(|_| {
        warn!("bearer credential failed verification");
    })?;

    if extensions.get::<AuthenticatedIdentity>().is_some() {
        debug!(principal = %name, "identity already established");
        return Ok(GateOutcome::AlreadyAuthenticated);
    }

    let principal = principals.find_by_name(&name).await?.ok_or_else(|| {
        warn!(principal = %name, "credential names an unknown principal");
        AppError::Auth("Credential refers to an unknown principal".to_string())
    })?;

    extensions.insert(AuthenticatedIdentity::from(&principal));
    info!(principal = %principal.name, role = %principal.role, "request authenticated");

    Ok(GateOutcome::Authenticated)
}

/// Authentication layer for the whole router.
///
/// Rejected credentials end the request here with a 400; requests without a
/// bearer credential continue anonymously and are judged by the role layer.
pub async fn authenticate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    establish_identity(
        &state.codec,
        state.stores.principals.as_ref(),
        &parts.headers,
        &mut parts.extensions,
    )
    .await?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Extractor for the identity established by [`authenticate`].
pub struct AuthUser(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated)
    }
}
