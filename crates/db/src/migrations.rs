//! Applies module migrations once, recording them in `schema_migration`.

use anyhow::Context;
use chrono::Utc;
use classifieds_kernel::Migration;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

const BOOKKEEPING_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migration (\
     module TEXT NOT NULL, \
     id TEXT NOT NULL, \
     applied_at TIMESTAMPTZ NOT NULL, \
     PRIMARY KEY (module, id))";

pub mod schema_migration {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "schema_migration")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub module: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub applied_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Apply every migration not yet recorded. Each migration runs in its own
/// transaction together with its bookkeeping row. Returns how many ran.
pub async fn run_migrations(
    db: &DatabaseConnection,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    db.execute_unprepared(BOOKKEEPING_DDL)
        .await
        .with_context(|| "failed to create schema_migration table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let key = (module.clone(), migration.id.to_string());
        if schema_migration::Entity::find_by_id(key)
            .one(db)
            .await
            .with_context(|| format!("failed to read migration state for '{module}'"))?
            .is_some()
        {
            tracing::debug!(module = %module, migration = migration.id, "migration already applied");
            continue;
        }

        let txn = db.begin().await?;
        for statement in statements(migration.up) {
            txn.execute_unprepared(statement).await.with_context(|| {
                format!("migration {}/{} failed", module, migration.id)
            })?;
        }
        schema_migration::Entity::insert(schema_migration::ActiveModel {
            module: Set(module.clone()),
            id: Set(migration.id.to_string()),
            applied_at: Set(Utc::now()),
        })
        .exec(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!(module = %module, migration = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

fn statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_in_memory;
    use sea_orm::{DbBackend, Statement};

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "notes".to_string(),
            Migration {
                id: "001_init",
                up: r#"
                    CREATE TABLE note (id TEXT PRIMARY KEY, body TEXT NOT NULL);
                    CREATE INDEX note_body_idx ON note (body);
                "#,
            },
        )]
    }

    #[test]
    fn splits_statements_and_drops_blanks() {
        let parts: Vec<&str> = statements("A;\n  B ;\n\n;").collect();
        assert_eq!(parts, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn applies_each_migration_once() -> anyhow::Result<()> {
        let db = connect_in_memory().await?;

        assert_eq!(run_migrations(&db, &migrations()).await?, 1);
        assert_eq!(run_migrations(&db, &migrations()).await?, 0);

        db.execute(Statement::from_string(
            DbBackend::Sqlite,
            "INSERT INTO note (id, body) VALUES ('1', 'hello')",
        ))
        .await?;

        let recorded = schema_migration::Entity::find().all(&db).await?;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].module, "notes");
        assert_eq!(recorded[0].id, "001_init");
        Ok(())
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() -> anyhow::Result<()> {
        let db = connect_in_memory().await?;
        let broken = vec![(
            "broken".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE ok_table (id TEXT); CREATE TABLE (",
            },
        )];

        assert!(run_migrations(&db, &broken).await.is_err());
        assert!(schema_migration::Entity::find().all(&db).await?.is_empty());
        Ok(())
    }
}
