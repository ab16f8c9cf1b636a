use crate::{
    AppState,
    api::models::users::Identity,
    auth::token::AccessClaims,
    db::CredentialStore,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Who is making the request, if anyone.
///
/// Extracting this never fails for a missing or non-Bearer `Authorization` header; the request
/// is then anonymous and both fields are `None`. A Bearer header that is present but unusable
/// is rejected.
#[derive(Debug, Clone, Default)]
pub struct AuthenticatedContext {
    pub identity: Option<Identity>,
    pub claims: Option<AccessClaims>,
}

impl AuthenticatedContext {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// An authenticated identity. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

/// Extract the Bearer token from the Authorization header
/// Returns:
/// - Ok(None): no header, an empty header, or a scheme other than Bearer
/// - Ok(Some(token)): exactly one ASCII token follows the Bearer scheme
/// - Err(MalformedHeader): Bearer with zero or several tokens, or a token that is not ASCII
fn bearer_token(parts: &Parts) -> Result<Option<&str>> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    // Other schemes may carry arbitrary bytes; they are none of our business
    let mut words = value
        .as_bytes()
        .split(|b| b.is_ascii_whitespace())
        .filter(|word| !word.is_empty());
    let Some(scheme) = words.next() else {
        return Ok(None);
    };
    if !scheme.eq_ignore_ascii_case(b"bearer") {
        trace!(scheme = %String::from_utf8_lossy(scheme), "Ignoring non-Bearer Authorization scheme");
        return Ok(None);
    }

    match (words.next(), words.next()) {
        (Some(token), None) if token.is_ascii() => std::str::from_utf8(token).map(Some).map_err(|_| Error::MalformedHeader),
        _ => Err(Error::MalformedHeader),
    }
}

/// Authenticate with a Bearer access token if one is present
/// Returns:
/// - None: No Bearer token in the request
/// - Some(Ok(..)): Token verified and its subject still exists
/// - Some(Err(error)): Header malformed, token rejected, or subject gone
#[instrument(skip_all)]
async fn try_bearer_auth(parts: &Parts, state: &AppState) -> Option<Result<(Identity, AccessClaims)>> {
    let token = match bearer_token(parts) {
        Ok(Some(token)) => token,
        Ok(None) => return None,
        Err(e) => return Some(Err(e)),
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(reason) => {
            debug!(%reason, "Access token rejected");
            return Some(Err(Error::Unauthenticated {
                message: Some("Invalid or expired token".to_string()),
            }));
        }
    };

    match state.store.get_identity(claims.sub).await {
        Ok(Some(identity)) => Some(Ok((identity, claims))),
        Ok(None) => {
            debug!(user_id = claims.sub, "Access token subject no longer exists");
            Some(Err(Error::Unauthenticated {
                message: Some("Invalid or expired token".to_string()),
            }))
        }
        Err(e) => Some(Err(Error::Database(e))),
    }
}

impl FromRequestParts<AppState> for AuthenticatedContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_bearer_auth(parts, state).await {
            Some(Ok((identity, claims))) => {
                trace!(user_id = identity.id, "Authenticated request");
                Ok(AuthenticatedContext {
                    identity: Some(identity),
                    claims: Some(claims),
                })
            }
            Some(Err(e)) => Err(e),
            None => Ok(AuthenticatedContext::default()),
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let context = AuthenticatedContext::from_request_parts(parts, state).await?;
        context
            .identity
            .map(CurrentUser)
            .ok_or(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::Role,
        auth::token::TokenKind,
        test_utils::{create_test_educator, create_test_state},
    };
    use axum::http::{HeaderValue, Request};
    use chrono::Utc;
    use sqlx::PgPool;

    fn parts_with_authorization(value: Option<HeaderValue>) -> Parts {
        let mut builder = Request::builder().uri("http://localhost/me");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    fn parts_with(value: &str) -> Parts {
        parts_with_authorization(Some(HeaderValue::from_str(value).unwrap()))
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with_authorization(None)).unwrap(), None);
        assert_eq!(bearer_token(&parts_with("")).unwrap(), None);
        assert_eq!(bearer_token(&parts_with("Basic dXNlcjpwYXNz")).unwrap(), None);
        assert_eq!(bearer_token(&parts_with("Bearer abc.def.ghi")).unwrap(), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts_with("bEaReR   abc")).unwrap(), Some("abc"));

        assert!(matches!(bearer_token(&parts_with("Bearer")), Err(Error::MalformedHeader)));
        assert!(matches!(bearer_token(&parts_with("Bearer a b")), Err(Error::MalformedHeader)));
    }

    #[test]
    fn test_non_ascii_bearer_token_is_malformed() {
        let value = HeaderValue::from_bytes(b"Bearer caf\xc3\xa9").unwrap();
        assert!(matches!(
            bearer_token(&parts_with_authorization(Some(value))),
            Err(Error::MalformedHeader)
        ));
    }

    #[test]
    fn test_non_ascii_other_scheme_is_ignored() {
        for raw in [&b"Basic caf\xc3\xa9"[..], b"Digest \xff\xfe", b"caf\xc3\xa9 token"] {
            let value = HeaderValue::from_bytes(raw).unwrap();
            assert_eq!(bearer_token(&parts_with_authorization(Some(value))).unwrap(), None);
        }
    }

    #[sqlx::test]
    async fn test_anonymous_request_yields_empty_context(pool: PgPool) {
        let state = create_test_state(pool);

        let non_ascii = HeaderValue::from_bytes(b"Basic caf\xc3\xa9").unwrap();
        for mut parts in [
            parts_with_authorization(None),
            parts_with("Basic abc"),
            parts_with_authorization(Some(non_ascii)),
        ] {
            let context = AuthenticatedContext::from_request_parts(&mut parts, &state).await.unwrap();
            assert!(!context.is_authenticated());
            assert!(context.claims.is_none());
        }
    }

    #[sqlx::test]
    async fn test_valid_token_resolves_identity(pool: PgPool) {
        let state = create_test_state(pool);
        let identity = create_test_educator(&state, "ada").await;
        let token = state.tokens.issue(&identity).unwrap();

        let mut parts = parts_with(&format!("Bearer {token}"));
        let context = AuthenticatedContext::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(context.identity.as_ref(), Some(&identity));
        assert_eq!(context.claims.unwrap().sub, identity.id);

        let mut parts = parts_with(&format!("Bearer {token}"));
        let CurrentUser(current) = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current, identity);
    }

    #[sqlx::test]
    async fn test_rejected_tokens_are_unauthenticated(pool: PgPool) {
        let state = create_test_state(pool);
        let identity = create_test_educator(&state, "ada").await;

        let expired = state
            .tokens
            .sign(&AccessClaims {
                sub: identity.id,
                email: identity.email.clone(),
                role: Role::Educator,
                exp: Utc::now().timestamp() - 1,
                kind: TokenKind::Access,
            })
            .unwrap();

        for token in ["garbage", expired.as_str()] {
            let mut parts = parts_with(&format!("Bearer {token}"));
            let err = AuthenticatedContext::from_request_parts(&mut parts, &state).await.unwrap_err();
            match err {
                Error::Unauthenticated { message } => assert_eq!(message.as_deref(), Some("Invalid or expired token")),
                other => panic!("expected Unauthenticated, got {other:?}"),
            }
        }
    }

    #[sqlx::test]
    async fn test_deleted_subject_is_unauthenticated(pool: PgPool) {
        let state = create_test_state(pool);
        let identity = create_test_educator(&state, "ada").await;
        let token = state.tokens.issue(&identity).unwrap();
        state.store.delete_identity(identity.id).await.unwrap();

        let mut parts = parts_with(&format!("Bearer {token}"));
        let err = AuthenticatedContext::from_request_parts(&mut parts, &state).await.unwrap_err();

        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[sqlx::test]
    async fn test_current_user_requires_identity(pool: PgPool) {
        let state = create_test_state(pool);

        let mut parts = parts_with_authorization(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();

        assert!(matches!(err, Error::Unauthenticated { message: None }));
    }
}
