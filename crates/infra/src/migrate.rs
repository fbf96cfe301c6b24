//! Runs schema migrations against Postgres.
//!
//! Applied migrations are recorded in a `migrations` table together with the
//! batch they ran in; `rollback` reverts the most recent batch.

use sqlx::{PgPool, Postgres, Row, Transaction};
use thiserror::Error;
use tracing::instrument;

use tradeerp_schema::{migrations, Migration, PostgresGrammar, SchemaCatalog, SchemaError};

const REPOSITORY_TABLE: &str = "migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration {0} was applied but is no longer defined")]
    Unknown(String),
}

/// Replay every migration in memory. Fails on the first invalid command.
pub fn migrated_catalog() -> Result<SchemaCatalog, SchemaError> {
    let mut catalog = SchemaCatalog::new();
    for migration in migrations::all() {
        catalog.apply_all(&migration.up())?;
    }
    Ok(catalog)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: &'static str,
    /// `None` while pending.
    pub batch: Option<i32>,
}

pub struct Migrator {
    pool: PgPool,
    migrations: Vec<Box<dyn Migration>>,
    grammar: PostgresGrammar,
}

impl Migrator {
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, migrations::all())
    }

    pub fn with_migrations(pool: PgPool, migrations: Vec<Box<dyn Migration>>) -> Self {
        Self {
            pool,
            migrations,
            grammar: PostgresGrammar,
        }
    }

    async fn ensure_repository(&self) -> Result<(), MigrationError> {
        sqlx::query(&format!(
            "create table if not exists \"{REPOSITORY_TABLE}\" (\
             \"id\" serial primary key, \
             \"migration\" varchar(255) not null unique, \
             \"batch\" integer not null)"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn applied(&self) -> Result<Vec<(String, i32)>, MigrationError> {
        let rows = sqlx::query(&format!(
            "select \"migration\", \"batch\" from \"{REPOSITORY_TABLE}\" order by \"id\""
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| Ok((r.try_get("migration")?, r.try_get("batch")?)))
            .collect()
    }

    async fn execute(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        commands: &[tradeerp_schema::SchemaCommand],
    ) -> Result<(), MigrationError> {
        for statement in self.grammar.compile_all(commands) {
            tracing::debug!(%statement, "executing");
            sqlx::query(&statement).execute(&mut **tx).await?;
        }
        Ok(())
    }

    /// Apply every pending migration as one batch. Returns the names applied.
    #[instrument(skip(self), err)]
    pub async fn run(&self) -> Result<Vec<&'static str>, MigrationError> {
        // Catch definition errors before touching the database.
        migrated_catalog()?;
        self.ensure_repository().await?;

        let applied = self.applied().await?;
        let pending: Vec<&dyn Migration> = self
            .migrations
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| !applied.iter().any(|(name, _)| name == m.name()))
            .collect();
        if pending.is_empty() {
            tracing::info!("nothing to migrate");
            return Ok(Vec::new());
        }

        let batch = applied.iter().map(|(_, b)| *b).max().unwrap_or(0) + 1;
        let mut tx = self.pool.begin().await?;
        for migration in &pending {
            self.execute(&mut tx, &migration.up()).await?;
            sqlx::query(&format!(
                "insert into \"{REPOSITORY_TABLE}\" (\"migration\", \"batch\") values ($1, $2)"
            ))
            .bind(migration.name())
            .bind(batch)
            .execute(&mut *tx)
            .await?;
            tracing::info!(migration = migration.name(), batch, "migrated");
        }
        tx.commit().await?;

        Ok(pending.iter().map(|m| m.name()).collect())
    }

    /// Revert the last batch, newest migration first.
    #[instrument(skip(self), err)]
    pub async fn rollback(&self) -> Result<Vec<&'static str>, MigrationError> {
        self.ensure_repository().await?;
        let applied = self.applied().await?;
        let Some(last) = applied.iter().map(|(_, b)| *b).max() else {
            tracing::info!("nothing to roll back");
            return Ok(Vec::new());
        };

        let mut reverted = Vec::new();
        let mut tx = self.pool.begin().await?;
        for (name, _) in applied.iter().rev().filter(|(_, b)| *b == last) {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.name() == name)
                .ok_or_else(|| MigrationError::Unknown(name.clone()))?;
            self.execute(&mut tx, &migration.down()).await?;
            sqlx::query(&format!("delete from \"{REPOSITORY_TABLE}\" where \"migration\" = $1"))
                .bind(name)
                .execute(&mut *tx)
                .await?;
            tracing::info!(migration = migration.name(), batch = last, "rolled back");
            reverted.push(migration.name());
        }
        tx.commit().await?;
        Ok(reverted)
    }

    pub async fn status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        self.ensure_repository().await?;
        let applied = self.applied().await?;
        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                name: m.name(),
                batch: applied.iter().find(|(n, _)| n == m.name()).map(|(_, b)| *b),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_full_migration_set_replays_cleanly() {
        let catalog = migrated_catalog().unwrap();
        assert!(catalog.has_table("provider_insurances"));
        assert!(catalog.table("provider_insurances").unwrap().has_column("verified_by"));
    }
}
