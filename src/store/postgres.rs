use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;

use crate::harvest::types::{RecipientRow, ResponseRow};

use super::HarvestStore;

/// Postgres-backed store. All rows live under the `gdlive` schema; bulk
/// loads go through UNNEST inserts inside a single transaction so a batch
/// either lands completely or not at all.
pub struct PgHarvestStore {
    pool: PgPool,
}

impl PgHarvestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HarvestStore for PgHarvestStore {
    async fn ensure_tables(&self) -> Result<()> {
        sqlx::query("CREATE SCHEMA IF NOT EXISTS gdlive")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS gdlive.recipient (
                recipient_id BIGINT NOT NULL,
                name         TEXT,
                age          BIGINT,
                country      TEXT,
                occupation   TEXT,
                completed    BOOLEAN NOT NULL DEFAULT FALSE,
                last_updated TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS gdlive.response (
                recipient_id BIGINT NOT NULL,
                survey_id    BIGINT NOT NULL,
                question     TEXT NOT NULL,
                answer       TEXT NOT NULL,
                payment      TEXT,
                amount_usd   DOUBLE PRECISION,
                amount_local DOUBLE PRECISION,
                published_at TIMESTAMPTZ,
                loaded_at    TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS response_survey_question_idx
                ON gdlive.response (survey_id, question)
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn completed_rids(&self) -> Result<HashSet<i64>> {
        let rids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT recipient_id FROM gdlive.recipient WHERE completed",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rids.into_iter().collect())
    }

    async fn completed_surveys(&self) -> Result<HashSet<i64>> {
        let surveys: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT survey_id FROM gdlive.response")
                .fetch_all(&self.pool)
                .await?;
        Ok(surveys.into_iter().collect())
    }

    async fn load_responses(&self, rows: &[ResponseRow]) -> Result<bool> {
        if rows.is_empty() {
            return Ok(true);
        }
        let rids: Vec<i64> = rows.iter().map(|r| r.recipient_id).collect();
        let surveys: Vec<i64> = rows.iter().map(|r| r.survey_id).collect();
        let questions: Vec<String> = rows.iter().map(|r| r.question.clone()).collect();
        let answers: Vec<String> = rows.iter().map(|r| r.answer.clone()).collect();
        let payments: Vec<Option<String>> = rows.iter().map(|r| r.payment.clone()).collect();
        let usd: Vec<Option<f64>> = rows.iter().map(|r| r.amount_usd).collect();
        let local: Vec<Option<f64>> = rows.iter().map(|r| r.amount_local).collect();
        let published: Vec<Option<DateTime<Utc>>> =
            rows.iter().map(|r| r.published_at).collect();

        let mut tx = self.pool.begin().await?;
        let res = sqlx::query(
            r#"
            INSERT INTO gdlive.response
                (recipient_id, survey_id, question, answer,
                 payment, amount_usd, amount_local, published_at)
            SELECT * FROM UNNEST
                ($1::BIGINT[], $2::BIGINT[], $3::TEXT[], $4::TEXT[],
                 $5::TEXT[], $6::FLOAT8[], $7::FLOAT8[], $8::TIMESTAMPTZ[])
            ON CONFLICT (survey_id, question) DO NOTHING
            "#,
        )
        .bind(&rids)
        .bind(&surveys)
        .bind(&questions)
        .bind(&answers)
        .bind(&payments)
        .bind(&usd)
        .bind(&local)
        .bind(&published)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        // every row already present counts as persisted; a payload where
        // nothing landed and nothing conflicted is reported as rejected
        Ok(res.rows_affected() > 0 || all_already_persisted(&self.pool, &surveys).await?)
    }

    async fn load_recipients(&self, rows: &[RecipientRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let rids: Vec<i64> = rows.iter().map(|r| r.recipient_id).collect();
        let names: Vec<Option<String>> = rows.iter().map(|r| r.name.clone()).collect();
        let ages: Vec<Option<i64>> = rows.iter().map(|r| r.age).collect();
        let countries: Vec<Option<String>> = rows.iter().map(|r| r.country.clone()).collect();
        let occupations: Vec<Option<String>> =
            rows.iter().map(|r| r.occupation.clone()).collect();
        let completed: Vec<bool> = rows.iter().map(|r| r.completed).collect();
        let updated: Vec<DateTime<Utc>> = rows.iter().map(|r| r.last_updated).collect();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO gdlive.recipient
                (recipient_id, name, age, country, occupation, completed, last_updated)
            SELECT * FROM UNNEST
                ($1::BIGINT[], $2::TEXT[], $3::BIGINT[], $4::TEXT[],
                 $5::TEXT[], $6::BOOLEAN[], $7::TIMESTAMPTZ[])
            "#,
        )
        .bind(&rids)
        .bind(&names)
        .bind(&ages)
        .bind(&countries)
        .bind(&occupations)
        .bind(&completed)
        .bind(&updated)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_stale_participant_details(&self) -> Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM gdlive.recipient a
            USING gdlive.recipient b
            WHERE a.recipient_id = b.recipient_id
              AND a.last_updated < b.last_updated
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn rebuild_gender_table(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS gdlive.gender")
            .execute(&self.pool)
            .await?;
        // pronoun frequency across a recipient's answers decides the label
        sqlx::query(
            r#"
            CREATE TABLE gdlive.gender AS
            SELECT recipient_id,
                   CASE
                       WHEN she_n > he_n THEN 'female'
                       WHEN he_n > she_n THEN 'male'
                       ELSE 'unknown'
                   END AS gender
            FROM (
                SELECT recipient_id,
                       SUM(ARRAY_LENGTH(REGEXP_SPLIT_TO_ARRAY(LOWER(answer), '\mshe\M'), 1) - 1) AS she_n,
                       SUM(ARRAY_LENGTH(REGEXP_SPLIT_TO_ARRAY(LOWER(answer), '\mhe\M'), 1) - 1) AS he_n
                FROM gdlive.response
                GROUP BY recipient_id
            ) pronouns
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rebuild_aggregate_table(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS gdlive.aggregate")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE gdlive.aggregate AS
            SELECT r.recipient_id,
                   COUNT(DISTINCT r.survey_id)       AS surveys,
                   COUNT(*)                          AS responses,
                   SUM(r.amount_usd)                 AS total_usd,
                   MAX(r.published_at)               AS latest_update,
                   MAX(g.gender)                     AS gender
            FROM gdlive.response r
            LEFT JOIN gdlive.gender g USING (recipient_id)
            GROUP BY r.recipient_id
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

async fn all_already_persisted(pool: &PgPool, surveys: &[i64]) -> Result<bool> {
    let present: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT survey_id) FROM gdlive.response WHERE survey_id = ANY($1)",
    )
    .bind(surveys)
    .fetch_one(pool)
    .await?;
    let distinct: HashSet<i64> = surveys.iter().copied().collect();
    Ok(present as usize == distinct.len())
}
