use chrono::{DateTime, Utc};
use polars::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{HarvestError, Result};
use crate::events::{EventSink, PipelineEvent};
use crate::types::IfExists;

/// Fixed staging destination. One batch per run; downstream owns any
/// dedup or further modeling.
pub const STAGING_TABLE: &str = "tmp";

// Column-type hints: TIMESTAMPTZ for the two timestamp columns, INTEGER
// for the vote/comment counts, TEXT for everything else.
const STAGING_SCHEMA: &str = r#"(
    post_id TEXT,
    created_utc TIMESTAMPTZ,
    title TEXT,
    text TEXT,
    upvote INTEGER,
    downvote INTEGER,
    comments INTEGER,
    subreddit TEXT,
    permalink TEXT,
    author_name TEXT,
    stock TEXT,
    saved_dt_utc TIMESTAMPTZ,
    title_cleaned TEXT,
    text_cleaned TEXT
)"#;

const INSERT_ROW: &str = r#"
    INSERT INTO tmp (
        post_id, created_utc, title, text, upvote, downvote, comments,
        subreddit, permalink, author_name, stock, saved_dt_utc,
        title_cleaned, text_cleaned
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
"#;

/// Writes staging frames to the fixed destination under the configured
/// existence policy. The policy is part of the loader's construction,
/// not a per-run parameter.
pub struct StagingLoader {
    pool: PgPool,
    if_exists: IfExists,
}

impl StagingLoader {
    pub fn new(pool: PgPool, if_exists: IfExists) -> Self {
        Self { pool, if_exists }
    }

    pub const fn if_exists(&self) -> IfExists {
        self.if_exists
    }

    /// Commits one batch inside a single transaction.
    ///
    /// `fail` errors before any write when the destination exists;
    /// `replace` discards the prior contents; `append` keeps them. Any
    /// storage failure propagates and rolls the transaction back.
    pub async fn load(&self, frame: &DataFrame, events: &dyn EventSink) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        match self.if_exists {
            IfExists::Fail => {
                if table_exists(&mut tx, STAGING_TABLE).await? {
                    return Err(HarvestError::TableExists(STAGING_TABLE));
                }
                sqlx::query(&format!("CREATE TABLE {STAGING_TABLE} {STAGING_SCHEMA}"))
                    .execute(tx.as_mut())
                    .await?;
            }
            IfExists::Replace => {
                sqlx::query(&format!("DROP TABLE IF EXISTS {STAGING_TABLE}"))
                    .execute(tx.as_mut())
                    .await?;
                sqlx::query(&format!("CREATE TABLE {STAGING_TABLE} {STAGING_SCHEMA}"))
                    .execute(tx.as_mut())
                    .await?;
            }
            IfExists::Append => {
                sqlx::query(&format!(
                    "CREATE TABLE IF NOT EXISTS {STAGING_TABLE} {STAGING_SCHEMA}"
                ))
                .execute(tx.as_mut())
                .await?;
            }
        }

        let rows = insert_rows(&mut tx, frame).await?;
        tx.commit().await?;

        events.emit(PipelineEvent::TableLoaded {
            table: STAGING_TABLE,
            rows,
            policy: self.if_exists.as_str(),
        });

        Ok(rows)
    }
}

fn micros_to_utc(column: &'static str, micros: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    micros
        .map(|value| {
            DateTime::from_timestamp_micros(value).ok_or_else(|| {
                HarvestError::DataShape(format!(
                    "{column} value {value} is outside the representable timestamp range"
                ))
            })
        })
        .transpose()
}

async fn table_exists(tx: &mut Transaction<'_, Postgres>, table: &str) -> Result<bool> {
    let regclass: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
        .bind(table)
        .fetch_one(tx.as_mut())
        .await?;
    Ok(regclass.is_some())
}

async fn insert_rows(tx: &mut Transaction<'_, Postgres>, frame: &DataFrame) -> Result<u64> {
    let len = frame.height();
    if len == 0 {
        return Ok(0);
    }

    let post_id = frame.column("post_id")?.str()?;
    let created_utc = frame.column("created_utc")?.datetime()?;
    let title = frame.column("title")?.str()?;
    let text = frame.column("text")?.str()?;
    let upvote = frame.column("upvote")?.i32()?;
    let downvote = frame.column("downvote")?.i32()?;
    let comments = frame.column("comments")?.i32()?;
    let subreddit = frame.column("subreddit")?.str()?;
    let permalink = frame.column("permalink")?.str()?;
    let author_name = frame.column("author_name")?.str()?;
    let stock = frame.column("stock")?.str()?;
    let saved_dt_utc = frame.column("saved_dt_utc")?.datetime()?;
    let title_cleaned = frame.column("title_cleaned")?.str()?;
    let text_cleaned = frame.column("text_cleaned")?.str()?;

    let mut rows = 0u64;
    for idx in 0..len {
        let result = sqlx::query(INSERT_ROW)
            .bind(post_id.get(idx))
            .bind(micros_to_utc("created_utc", created_utc.get(idx))?)
            .bind(title.get(idx))
            .bind(text.get(idx))
            .bind(upvote.get(idx))
            .bind(downvote.get(idx))
            .bind(comments.get(idx))
            .bind(subreddit.get(idx))
            .bind(permalink.get(idx))
            .bind(author_name.get(idx))
            .bind(stock.get(idx))
            .bind(micros_to_utc("saved_dt_utc", saved_dt_utc.get(idx))?)
            .bind(title_cleaned.get(idx))
            .bind(text_cleaned.get(idx))
            .execute(tx.as_mut())
            .await?;
        rows += result.rows_affected();
    }

    Ok(rows)
}
