//! Credential core: password hashing, bearer tokens, principal resolution and
//! ownership checks.
//!
//! Nothing in here knows about HTTP. Persistence is reached only through
//! [`PrincipalStore`].

mod error;
pub mod guard;
pub mod password;
pub mod principal;
pub mod resolver;
pub mod token;

pub use error::{AuthError, EMAIL_TAKEN, USERNAME_TAKEN};
pub use guard::{Owned, authorize_owner, authorize_resource, require_role};
pub use password::PasswordHasher;
pub use principal::{NewPrincipal, Principal, PrincipalStore, Role};
pub use resolver::PrincipalResolver;
pub use token::{Identity, TokenService, TokenSettings};
