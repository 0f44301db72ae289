//! Infrastructure layer: stores, application services, export and config.

pub mod config;
pub mod error;
pub mod export;
pub mod notifier;
pub mod shipment_service;
pub mod store;
pub mod user_service;

pub use config::{AppConfig, ConfigError};
pub use error::ServiceError;
pub use export::ExportFile;
pub use notifier::NotificationDispatcher;
pub use shipment_service::ShipmentService;
pub use user_service::{Session, UserService};
