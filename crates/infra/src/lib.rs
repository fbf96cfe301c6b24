//! Infrastructure layer: storage, Postgres, migrations, delivery channels and
//! configuration.

pub mod config;
pub mod migrate;
pub mod notifications;
pub mod presence;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use migrate::{migrated_catalog, MigrationError, MigrationStatus, Migrator};
pub use notifications::{InMemoryMailer, InMemoryNotificationStore, LogMailer, PgDatabaseNotificationStore, SentMail};
pub use presence::{PgPresenceVerifier, StorePresenceVerifier};
pub use store::{InMemoryTableStore, Repository, StoreError, TableStore};
