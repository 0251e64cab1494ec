/*
 * Responsibility
 * - policy_rules テーブルの wholesale load / save
 * - save は 1 トランザクションで DELETE → INSERT (all-or-nothing)
 */
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::repos::error::RepoResult;
use crate::services::policy::backend::{PolicyBackend, PolicyRecord};
use crate::services::policy::rule::PolicyRule;

/// Postgres-backed durable policy storage.
///
/// Schema (see `migrations/`):
/// - policy_rules.position (int, insertion order)
/// - policy_rules.role / resource / action (text)
#[derive(Clone, Debug)]
pub struct PgPolicyRepo {
    pool: PgPool,
}

impl PgPolicyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PolicyBackend for PgPolicyRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn load_all(&self) -> RepoResult<Vec<PolicyRecord>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            r#"
            SELECT role, resource, action
            FROM policy_rules
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(role, resource, action)| PolicyRecord {
                role,
                resource,
                action,
            })
            .collect())
    }

    async fn save_all(&self, rules: &[PolicyRule]) -> RepoResult<()> {
        let mut roles = Vec::with_capacity(rules.len());
        let mut resources = Vec::with_capacity(rules.len());
        let mut actions = Vec::with_capacity(rules.len());
        for rule in rules {
            roles.push(rule.role().to_string());
            resources.push(rule.resource().to_string());
            actions.push(rule.action().to_string());
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM policy_rules")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO policy_rules (position, role, resource, action)
            SELECT (t.ord - 1)::int, t.role, t.resource, t.action
            FROM UNNEST($1::text[], $2::text[], $3::text[])
                WITH ORDINALITY AS t(role, resource, action, ord)
            "#,
        )
        .bind(roles)
        .bind(resources)
        .bind(actions)
        .execute(&mut *tx)
        .await?;

        // Dropping `tx` on any early return rolls back.
        tx.commit().await?;

        Ok(())
    }
}
