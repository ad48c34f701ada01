use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{AuthError, Principal, PrincipalStore, Role, TokenService, guard};

/// Turns a bearer string into a live principal.
///
/// Every call re-verifies the token and reloads the principal; nothing is
/// cached. A token for a principal deleted after issuance resolves to
/// `NotFound` until it expires.
pub struct PrincipalResolver {
    tokens: Arc<TokenService>,
    store: Arc<dyn PrincipalStore>,
}

impl PrincipalResolver {
    #[must_use]
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn PrincipalStore>) -> Self {
        Self { tokens, store }
    }

    pub async fn resolve_current(
        &self,
        token: &str,
        required_role: Option<Role>,
    ) -> Result<Principal, AuthError> {
        self.resolve_current_at(token, required_role, Utc::now())
            .await
    }

    pub async fn resolve_current_at(
        &self,
        token: &str,
        required_role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let identity = self.tokens.parse_at(token, now)?;

        let principal = self
            .store
            .find_principal_by_id(identity.role, identity.id)
            .await?
            .ok_or_else(|| AuthError::not_found(identity.role.label()))?;

        if let Some(role) = required_role {
            guard::require_role(&principal, role)?;
        }

        Ok(principal)
    }
}
