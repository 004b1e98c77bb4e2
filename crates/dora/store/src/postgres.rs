//! PostgreSQL storage implementation.

use crate::error::StoreError;
use crate::traits::{MetricsStore, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use dora_types::{DailyMetricRow, DailyMetrics, PeriodAggregate, Targets};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to PostgreSQL and initialize the schema.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> StoreResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS dora_daily_metrics (
                id BIGSERIAL PRIMARY KEY,
                entity_ref TEXT NOT NULL,
                date DATE NOT NULL,
                deployment_count INTEGER NOT NULL DEFAULT 0,
                deployment_failure_count INTEGER NOT NULL DEFAULT 0,
                lead_time_avg_seconds INTEGER NOT NULL DEFAULT 0,
                mttr_avg_seconds INTEGER NOT NULL DEFAULT 0,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                UNIQUE (entity_ref, date)
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS dora_daily_metrics_date ON dora_daily_metrics(date);"#,
            r#"CREATE INDEX IF NOT EXISTS dora_daily_metrics_entity_ref ON dora_daily_metrics(entity_ref);"#,
            r#"
            CREATE TABLE IF NOT EXISTS dora_targets (
                entity_ref TEXT PRIMARY KEY,
                target_freq DOUBLE PRECISION NOT NULL DEFAULT 1.0,
                target_lead DOUBLE PRECISION NOT NULL DEFAULT 24.0,
                target_fail DOUBLE PRECISION NOT NULL DEFAULT 5.0,
                target_mttr DOUBLE PRECISION NOT NULL DEFAULT 60.0,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            "#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        Ok(())
    }
}

#[async_trait]
impl MetricsStore for PostgresStore {
    async fn upsert_daily(
        &self,
        entity_ref: &str,
        date: NaiveDate,
        metrics: DailyMetrics,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dora_daily_metrics
                (entity_ref, date, deployment_count, deployment_failure_count,
                 lead_time_avg_seconds, mttr_avg_seconds, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (entity_ref, date)
            DO UPDATE SET
                deployment_count = EXCLUDED.deployment_count,
                deployment_failure_count = EXCLUDED.deployment_failure_count,
                lead_time_avg_seconds = EXCLUDED.lead_time_avg_seconds,
                mttr_avg_seconds = EXCLUDED.mttr_avg_seconds,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(entity_ref)
        .bind(date)
        .bind(metrics.deployment_count as i32)
        .bind(metrics.deployment_failure_count as i32)
        .bind(metrics.lead_time_avg_seconds as i32)
        .bind(metrics.mttr_avg_seconds as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn period_aggregate(
        &self,
        entity_ref: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<PeriodAggregate> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(deployment_count), 0)::BIGINT AS total_deploy,
                COALESCE(SUM(deployment_failure_count), 0)::BIGINT AS total_fail,
                COALESCE(AVG(lead_time_avg_seconds), 0)::DOUBLE PRECISION AS lead,
                COALESCE(AVG(mttr_avg_seconds), 0)::DOUBLE PRECISION AS mttr
            FROM dora_daily_metrics
            WHERE entity_ref = $1 AND date BETWEEN $2 AND $3
            "#,
        )
        .bind(entity_ref)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let total_deploy: i64 = row
            .try_get("total_deploy")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let total_fail: i64 = row
            .try_get("total_fail")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let lead: f64 = row
            .try_get("lead")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let mttr: f64 = row
            .try_get("mttr")
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(PeriodAggregate {
            total_deployments: total_deploy.max(0) as u64,
            total_failures: total_fail.max(0) as u64,
            lead_time_avg_seconds: lead,
            mttr_avg_seconds: mttr,
        })
    }

    async fn daily_series(
        &self,
        entity_ref: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<DailyMetricRow>> {
        let rows = sqlx::query(
            r#"
            SELECT date, deployment_count, deployment_failure_count,
                   lead_time_avg_seconds, mttr_avg_seconds
            FROM dora_daily_metrics
            WHERE entity_ref = $1 AND date BETWEEN $2 AND $3
            ORDER BY date ASC
            "#,
        )
        .bind(entity_ref)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let date: NaiveDate = row
                    .try_get("date")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let deployment_count: i32 = row
                    .try_get("deployment_count")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let deployment_failure_count: i32 = row
                    .try_get("deployment_failure_count")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let lead_time_avg_seconds: i32 = row
                    .try_get("lead_time_avg_seconds")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let mttr_avg_seconds: i32 = row
                    .try_get("mttr_avg_seconds")
                    .map_err(|e| StoreError::Query(e.to_string()))?;

                Ok(DailyMetricRow {
                    date,
                    metrics: DailyMetrics {
                        deployment_count: deployment_count.max(0) as u32,
                        deployment_failure_count: deployment_failure_count.max(0) as u32,
                        lead_time_avg_seconds: lead_time_avg_seconds.max(0) as u32,
                        mttr_avg_seconds: mttr_avg_seconds.max(0) as u32,
                    },
                })
            })
            .collect()
    }

    async fn last_synced_date(&self, entity_ref: &str) -> StoreResult<Option<NaiveDate>> {
        let row = sqlx::query(
            "SELECT MAX(date) AS last_date FROM dora_daily_metrics WHERE entity_ref = $1",
        )
        .bind(entity_ref)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.try_get("last_date")
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn targets(&self, entity_ref: &str) -> StoreResult<Option<Targets>> {
        let row = sqlx::query(
            r#"
            SELECT target_freq, target_lead, target_fail, target_mttr
            FROM dora_targets
            WHERE entity_ref = $1
            "#,
        )
        .bind(entity_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(record) => {
                let deployment_frequency: f64 = record
                    .try_get("target_freq")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let lead_time: f64 = record
                    .try_get("target_lead")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let change_failure_rate: f64 = record
                    .try_get("target_fail")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let mttr: f64 = record
                    .try_get("target_mttr")
                    .map_err(|e| StoreError::Query(e.to_string()))?;

                Ok(Some(Targets {
                    deployment_frequency,
                    lead_time,
                    change_failure_rate,
                    mttr,
                }))
            }
            None => Ok(None),
        }
    }

    async fn upsert_targets(&self, entity_ref: &str, targets: Targets) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dora_targets
                (entity_ref, target_freq, target_lead, target_fail, target_mttr, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (entity_ref)
            DO UPDATE SET
                target_freq = EXCLUDED.target_freq,
                target_lead = EXCLUDED.target_lead,
                target_fail = EXCLUDED.target_fail,
                target_mttr = EXCLUDED.target_mttr,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(entity_ref)
        .bind(targets.deployment_frequency)
        .bind(targets.lead_time)
        .bind(targets.change_failure_rate)
        .bind(targets.mttr)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }
}
