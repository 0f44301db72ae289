//! Service wiring: picks the store backend and builds the application services.

use std::sync::Arc;

use tracing::info;

use envios_auth::Hs256TokenIssuer;
use envios_infra::store::{
    InMemoryMessageStore, InMemoryShipmentStore, InMemoryUserStore, MessageStore, PostgresStore, ShipmentStore,
    UserStore,
};
use envios_infra::{AppConfig, NotificationDispatcher, ServiceError, ShipmentService, UserService};

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub shipments: ShipmentService,
    pub users: UserService,
    postgres: Option<PostgresStore>,
}

impl AppServices {
    fn assemble(
        shipments: Arc<dyn ShipmentStore>,
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        config: &AppConfig,
        postgres: Option<PostgresStore>,
    ) -> Self {
        let notifier = NotificationDispatcher::new(messages, config.tracking_base_url.clone());
        let issuer = Arc::new(Hs256TokenIssuer::new(config.jwt_secret.clone().into_bytes()));

        Self {
            shipments: ShipmentService::new(shipments, notifier),
            users: UserService::new(users, issuer, config.token_ttl()),
            postgres,
        }
    }

    pub fn in_memory(config: &AppConfig) -> Self {
        Self::assemble(
            Arc::new(InMemoryShipmentStore::new()),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            config,
            None,
        )
    }

    pub async fn postgres(database_url: &str, config: &AppConfig) -> Result<Self, ServiceError> {
        let store = PostgresStore::connect(database_url).await?;
        store.ensure_schema().await?;

        Ok(Self::assemble(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            config,
            Some(store),
        ))
    }

    pub async fn shutdown(&self) {
        if let Some(store) = &self.postgres {
            store.close().await;
        }
    }
}

/// Build services for `config` and make sure the bootstrap admin exists.
pub async fn build_services(config: &AppConfig) -> Result<Arc<AppServices>, ServiceError> {
    let services = match &config.database_url {
        Some(url) => {
            info!("using postgres stores");
            AppServices::postgres(url, config).await?
        }
        None => {
            info!("DATABASE_URL not set; using in-memory stores");
            AppServices::in_memory(config)
        }
    };

    services
        .users
        .bootstrap_admin(&config.bootstrap_admin_username, &config.bootstrap_admin_password)
        .await?;

    Ok(Arc::new(services))
}
