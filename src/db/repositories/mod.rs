use sea_orm::DbErr;

use crate::auth::AuthError;

pub mod admin;
pub mod blog;
pub mod user;

/// Error mapper for account writes. A UNIQUE violation keeps its typed
/// `Conflict` so callers that lost a registration race still see it.
pub(crate) fn account_write_error(
    context: &'static str,
) -> impl FnOnce(DbErr) -> anyhow::Error {
    move |err| match AuthError::from_unique_violation(&err) {
        Some(conflict) => anyhow::Error::new(conflict),
        None => anyhow::Error::new(err).context(context),
    }
}
