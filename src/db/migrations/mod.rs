//! Database schema migrations.
//!
//! Migration files are stored in this directory with the naming convention:
//! - `migration_NN_up.sql` - Upgrades schema from version `NN-1` to version `NN`
//! - `migration_NN_down.sql` - Downgrades schema from version `NN` to version `NN-1`

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::Result;

/// A database migration with up and down SQL.
struct Migration {
    /// The version this migration brings the database to (when going up).
    version: i32,
    /// SQL to execute when upgrading to this version.
    up_sql: &'static str,
    /// SQL to execute when downgrading from this version.
    down_sql: &'static str,
}

/// All available migrations in order.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// The schema version that this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

/// Runs migrations to bring the database from `current_ver` to `target_ver`.
///
/// Going up runs each "up" script in ascending order, going down runs each "down" script in
/// descending order. Every step runs in its own transaction together with the `schema_version`
/// update, and the whole plan is validated before the first step runs.
pub(crate) async fn run(pool: &SqlitePool, current_ver: i32, target_ver: i32) -> Result<()> {
    if current_ver == target_ver {
        debug!("Database already at version {target_ver}, no migrations needed");
        return Ok(());
    }

    validate_migrations(current_ver, target_ver)?;

    for (sql, new_version) in plan(current_ver, target_ver)? {
        debug!("Migrating schema to version {new_version:02}");
        run_single_migration(pool, sql, new_version).await?;
    }

    debug!("Migration complete, schema now at version {target_ver}");
    Ok(())
}

/// Lists the scripts to execute, in order, along with the version each one leaves behind.
fn plan(current_ver: i32, target_ver: i32) -> Result<Vec<(&'static str, i32)>> {
    let find = |version: i32| {
        MIGRATIONS
            .iter()
            .find(|m| m.version == version)
            .with_context(|| format!("Migration {version} not found"))
    };

    if current_ver < target_ver {
        ((current_ver + 1)..=target_ver)
            .map(|v| find(v).map(|m| (m.up_sql, v)))
            .collect()
    } else {
        ((target_ver + 1)..=current_ver)
            .rev()
            .map(|v| find(v).map(|m| (m.down_sql, v - 1)))
            .collect()
    }
}

/// Executes one script and records `new_version`, atomically.
async fn run_single_migration(pool: &SqlitePool, sql: &str, new_version: i32) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    tx.execute(sql)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .context("Failed to update schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")
}

/// Fails if any migration between the two versions is missing.
fn validate_migrations(current_version: i32, target_version: i32) -> Result<()> {
    let low = current_version.min(target_version) + 1;
    let high = current_version.max(target_version);
    if let Some(missing) = (low..=high).find(|v| !MIGRATIONS.iter().any(|m| m.version == *v)) {
        bail!(
            "Migration {missing} is missing but required to migrate from version \
            {current_version} to {target_version}"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, read_schema_version};
    use anyhow::Context;
    use tempfile::TempDir;

    /// Helper to create a test database with schema_version bootstrapped at version 0.
    async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let pool = connect(&temp_dir.path().join("test.sqlite"), true).await?;

        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;

        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to insert initial schema version")?;

        Ok((temp_dir, pool))
    }

    /// Helper to check if a table exists.
    async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table_name)
                .fetch_one(pool)
                .await
                .context("Failed to check table existence")?;
        Ok(row.0 > 0)
    }

    #[tokio::test]
    async fn test_migration_up_creates_tables() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        assert_eq!(read_schema_version(&pool).await.unwrap(), 0);

        run(&pool, 0, 1).await.unwrap();

        assert_eq!(read_schema_version(&pool).await.unwrap(), 1);
        assert!(table_exists(&pool, "categories").await.unwrap());
        assert!(table_exists(&pool, "bills").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_down_drops_tables() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();

        run(&pool, 1, 0).await.unwrap();

        assert_eq!(read_schema_version(&pool).await.unwrap(), 0);
        assert!(!table_exists(&pool, "categories").await.unwrap());
        assert!(!table_exists(&pool, "bills").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_no_op_when_already_at_target() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();

        run(&pool, 1, 1).await.unwrap();

        assert_eq!(read_schema_version(&pool).await.unwrap(), 1);
    }

    #[test]
    fn test_validate_migrations_succeeds_for_valid_range() {
        assert!(validate_migrations(0, CURRENT_VERSION).is_ok());
        assert!(validate_migrations(CURRENT_VERSION, 0).is_ok());
    }

    #[test]
    fn test_validate_migrations_fails_for_missing_migration() {
        assert!(validate_migrations(0, CURRENT_VERSION + 1).is_err());
        assert!(validate_migrations(CURRENT_VERSION, CURRENT_VERSION + 2).is_err());
    }
}
