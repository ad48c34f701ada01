use crate::auth::Role;
use crate::config::Config;
use crate::services::NewAccount;
use crate::state::SharedState;

pub async fn cmd_create_admin(
    config: Config,
    email: String,
    username: String,
    password: String,
) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;

    let admin = shared
        .account_service
        .register(
            Role::Admin,
            NewAccount {
                email,
                username,
                password,
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin: {e}"))?;

    println!("✓ Created admin '{}' (ID: {})", admin.username, admin.id);
    Ok(())
}
