//! Ownership and role checks.
//!
//! Existence is always decided before ownership: a missing resource is
//! `NotFound` for every caller, owner or not.

use super::{AuthError, Principal, Role};

/// A resource owned by a single user.
pub trait Owned {
    fn owner_id(&self) -> i32;
}

/// Owned resources always belong to the `users` family, so an admin never
/// passes this check even when the numeric ids coincide.
pub fn authorize_owner(principal: &Principal, owner_id: i32) -> Result<(), AuthError> {
    if principal.role != Role::User || principal.id != owner_id {
        tracing::warn!(
            principal_id = principal.id,
            role = principal.role.label(),
            owner_id,
            "Ownership check denied"
        );
        return Err(AuthError::Unauthorized);
    }
    Ok(())
}

/// Existence check followed by ownership check.
pub fn authorize_resource<R: Owned>(
    principal: &Principal,
    resource: Option<R>,
    label: &str,
) -> Result<R, AuthError> {
    let resource = resource.ok_or_else(|| AuthError::not_found(label))?;
    authorize_owner(principal, resource.owner_id())?;
    Ok(resource)
}

pub fn require_role(principal: &Principal, role: Role) -> Result<(), AuthError> {
    if principal.role != role {
        return Err(AuthError::Unauthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        owner: i32,
    }

    impl Owned for Post {
        fn owner_id(&self) -> i32 {
            self.owner
        }
    }

    fn principal(id: i32, role: Role) -> Principal {
        Principal {
            id,
            email: format!("p{id}@example.com"),
            username: format!("p{id}"),
            role,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        assert!(authorize_owner(&principal(3, Role::User), 3).is_ok());
    }

    #[test]
    fn test_other_user_is_denied() {
        for owner in [1, 2, 4, 100, -1] {
            assert!(matches!(
                authorize_owner(&principal(3, Role::User), owner),
                Err(AuthError::Unauthorized)
            ));
        }
    }

    #[test]
    fn test_admin_with_same_id_is_denied() {
        assert!(matches!(
            authorize_owner(&principal(3, Role::Admin), 3),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_missing_resource_is_not_found_before_ownership() {
        let result = authorize_resource::<Post>(&principal(3, Role::User), None, "Blog");
        assert!(matches!(result, Err(AuthError::NotFound(msg)) if msg == "Blog not found"));
    }

    #[test]
    fn test_existing_resource_checks_owner() {
        let mine = authorize_resource(&principal(3, Role::User), Some(Post { owner: 3 }), "Blog");
        assert!(mine.is_ok());

        let theirs = authorize_resource(&principal(3, Role::User), Some(Post { owner: 4 }), "Blog");
        assert!(matches!(theirs, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&principal(1, Role::Admin), Role::Admin).is_ok());
        assert!(matches!(
            require_role(&principal(1, Role::User), Role::Admin),
            Err(AuthError::Unauthorized)
        ));
    }
}
