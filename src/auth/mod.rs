//! Authentication and identity module
//!
//! Resolves the acting user from an optional JWT bearer token. When identity is
//! disabled in configuration, every request runs as an anonymous session.

mod jwt;
mod middleware;

pub use jwt::{decode_token, Claims};
#[cfg(test)]
pub use jwt::create_token;
pub use middleware::identity_middleware;

/// Source of the currently authenticated actor
pub trait IdentityResolver: Send + Sync {
    /// `None` when identity is disabled or nobody is logged in
    fn current_user_id(&self) -> Option<i32>;
}

/// Per-request identity, inserted into request extensions by the middleware
#[derive(Debug, Clone, Default)]
pub struct Session {
    claims: Option<Claims>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { claims: None }
    }

    pub fn authenticated(claims: Claims) -> Self {
        Self { claims: Some(claims) }
    }
}

impl IdentityResolver for Session {
    fn current_user_id(&self) -> Option<i32> {
        self.claims.as_ref().map(|c| c.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session_has_no_user() {
        assert_eq!(Session::anonymous().current_user_id(), None);
    }

    #[test]
    fn test_authenticated_session_resolves_subject() {
        let token = create_token(42, "ana@example.com", "secret").unwrap();
        let claims = decode_token(&token, "secret").unwrap();

        let session = Session::authenticated(claims);
        assert_eq!(session.current_user_id(), Some(42));
    }
}
