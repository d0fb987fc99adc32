use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use meterline_core::{AppError, PrincipalIdentity};
use tower_sessions::Session;

use crate::error::ApiResult;
use crate::state::AppState;

/// Session key under which the authentication layer stores the principal.
pub const SESSION_PRINCIPAL_KEY: &str = "principal_identity";

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<PrincipalIdentity>(SESSION_PRINCIPAL_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if headers
            .get("sec-fetch-site")
            .is_some_and(|fetch_site| fetch_site == HeaderValue::from_static("cross-site"))
        {
            return Err(AppError::Forbidden("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !origin_is_allowed(state.frontend_url.as_str(), origin, referer) {
            return Err(AppError::Forbidden("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn origin_is_allowed(allowed_origin: &str, origin: &str, referer: &str) -> bool {
    origin == allowed_origin || (!referer.is_empty() && referer.starts_with(allowed_origin))
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::{is_state_changing_method, origin_is_allowed};

    #[test]
    fn only_mutations_need_same_origin() {
        assert!(is_state_changing_method(&Method::PUT));
        assert!(is_state_changing_method(&Method::DELETE));
        assert!(!is_state_changing_method(&Method::GET));
        assert!(!is_state_changing_method(&Method::OPTIONS));
    }

    #[test]
    fn origin_or_referer_must_match_frontend() {
        let frontend = "http://localhost:3000";

        assert!(origin_is_allowed(frontend, frontend, ""));
        assert!(origin_is_allowed(
            frontend,
            "",
            "http://localhost:3000/organization/members"
        ));
        assert!(!origin_is_allowed(frontend, "https://evil.example", ""));
        assert!(!origin_is_allowed(frontend, "", ""));
    }
}
