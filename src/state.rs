use std::sync::Arc;

use crate::auth::{PasswordHasher, PrincipalResolver, PrincipalStore, TokenService, TokenSettings};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AccountService, BlogService, SeaOrmAccountService, SeaOrmBlogService};

/// Everything built once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub resolver: Arc<PrincipalResolver>,

    pub account_service: Arc<dyn AccountService>,

    pub blog_service: Arc<dyn BlogService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let settings = TokenSettings::from_config(&config.auth)?;
        let hasher = Arc::new(PasswordHasher::new(&config.security)?);

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = Arc::new(TokenService::new(&settings));
        let principals: Arc<dyn PrincipalStore> = Arc::new(store.clone());
        let resolver = Arc::new(PrincipalResolver::new(tokens.clone(), principals));

        let account_service: Arc<dyn AccountService> =
            Arc::new(SeaOrmAccountService::new(store.clone(), hasher.clone()));
        let blog_service: Arc<dyn BlogService> = Arc::new(SeaOrmBlogService::new(store.clone()));

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            resolver,
            account_service,
            blog_service,
        })
    }
}
