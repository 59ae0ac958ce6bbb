use crate::error::CusteioError;

/// Verified identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub uid: String,
}

/// Context attached to each trigger invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub auth: Option<AuthToken>,
}

impl CallContext {
    pub fn authenticated(uid: impl Into<String>) -> Self {
        Self {
            auth: Some(AuthToken { uid: uid.into() }),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Reject calls without an identity. Any identity is accepted.
pub fn require_auth(ctx: &CallContext) -> Result<&AuthToken, CusteioError> {
    ctx.auth.as_ref().ok_or(CusteioError::Unauthenticated)
}
