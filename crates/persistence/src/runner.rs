//! Migration runner: applies pending migrations in order, refusing to run
//! one whose declared dependencies are not yet satisfied, and recording
//! each application in `schema_migrations`.

use std::collections::HashSet;
use std::time::Instant;

use sqlx::{PgPool, Row};

use crate::error::PersistenceError;
use crate::migration::{Migration, MIGRATIONS};

pub struct MigrationRunner<'a> {
    pool: &'a PgPool,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Applies every migration in `MIGRATIONS` not yet recorded in
    /// `schema_migrations`, in ascending order. Stops at the first
    /// migration whose dependencies aren't satisfied rather than
    /// skipping ahead.
    pub async fn apply_pending(&self) -> Result<Vec<i64>, PersistenceError> {
        self.ensure_ledger_table().await?;

        let mut applied = self.applied_numbers().await?;
        let mut newly_applied = Vec::new();

        for migration in MIGRATIONS {
            if applied.contains(&migration.number) {
                self.verify_checksum(migration).await?;
                continue;
            }

            for dep in migration.depends_on {
                if !applied.contains(dep) {
                    return Err(PersistenceError::UnsatisfiedDependency {
                        number: migration.number,
                        name: migration.name.to_string(),
                        dependency: *dep,
                    });
                }
            }

            self.apply(migration).await?;
            applied.insert(migration.number);
            newly_applied.push(migration.number);
        }

        Ok(newly_applied)
    }

    /// Rolls back the single most recently applied migration. Refuses if
    /// that migration registered no rollback SQL.
    pub async fn rollback_latest(&self) -> Result<i64, PersistenceError> {
        let row = sqlx::query("SELECT number FROM schema_migrations ORDER BY number DESC LIMIT 1")
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Err(PersistenceError::NotFound("no migrations applied".to_string()));
        };
        let number: i64 = row.get("number");

        let migration = MIGRATIONS
            .iter()
            .find(|m| m.number == number)
            .ok_or_else(|| PersistenceError::NotFound(format!("migration {number} not registered")))?;

        let rollback_sql = migration.rollback_sql.ok_or(PersistenceError::NoRollback(number))?;

        let mut tx = self.pool.begin().await?;
        sqlx::raw_sql(rollback_sql).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM schema_migrations WHERE number = $1")
            .bind(number)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(migration.number, migration.name, "rolled back migration");
        Ok(number)
    }

    async fn ensure_ledger_table(&self) -> Result<(), PersistenceError> {
        // MIGRATIONS[0] is always the schema_migrations bootstrap itself;
        // it must run outside the ledger-gated path since the ledger
        // doesn't exist until this statement does.
        sqlx::raw_sql(MIGRATIONS[0].sql).execute(self.pool).await?;
        Ok(())
    }

    async fn applied_numbers(&self) -> Result<HashSet<i64>, PersistenceError> {
        let rows = sqlx::query("SELECT number FROM schema_migrations")
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get::<i64, _>("number")).collect())
    }

    async fn verify_checksum(&self, migration: &Migration) -> Result<(), PersistenceError> {
        let row = sqlx::query("SELECT checksum FROM schema_migrations WHERE number = $1")
            .bind(migration.number)
            .fetch_one(self.pool)
            .await?;
        let recorded: i64 = row.get("checksum");
        let computed = migration.checksum() as i64;
        if recorded != computed {
            return Err(PersistenceError::ChecksumMismatch {
                number: migration.number,
                name: migration.name.to_string(),
                recorded: recorded as u64,
                computed: computed as u64,
            });
        }
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), PersistenceError> {
        let start = Instant::now();
        let mut tx = self.pool.begin().await?;

        // MIGRATIONS[0] was already applied by `ensure_ledger_table`, but
        // running it again here is harmless — the body is `CREATE TABLE
        // IF NOT EXISTS`.
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;

        let execution_ms = start.elapsed().as_millis() as i64;
        sqlx::query(
            "INSERT INTO schema_migrations (number, name, checksum, execution_ms, rollback_sql) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(migration.number)
        .bind(migration.name)
        .bind(migration.checksum() as i64)
        .bind(execution_ms)
        .bind(migration.rollback_sql)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(migration.number, migration.name, execution_ms, "applied migration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_error_names_the_missing_number() {
        let err = PersistenceError::UnsatisfiedDependency {
            number: 4,
            name: "create_crm_contacts".to_string(),
            dependency: 3,
        };
        assert!(err.to_string().contains("depends on unapplied migration 3"));
    }
}
