use std::env;

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use tokio::runtime::Runtime;

use stocktalk_core::db;
use stocktalk_core::error::HarvestError;
use stocktalk_core::events::{EventSink, PipelineEvent};
use stocktalk_core::loader::StagingLoader;
use stocktalk_core::normalize::staging_frame;
use stocktalk_core::types::{IfExists, PostAuthor, RawPost};

struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}

fn post(id: &str) -> RawPost {
    RawPost {
        id: id.to_string(),
        created_utc: 1_614_000_000.0,
        title: format!("discussion {id}"),
        selftext: "line1\nline2".to_string(),
        ups: 12,
        downs: 3,
        num_comments: 4,
        subreddit_name: "stocks".to_string(),
        permalink: format!("/r/stocks/comments/{id}/"),
        author: Some(PostAuthor {
            name: "tester".to_string(),
        }),
        stickied: false,
    }
}

async fn row_count(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM tmp")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[test]
fn existence_policies_behave_per_contract() -> Result<()> {
    let database_url = match env::var("STOCKTALK_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping existence_policies_behave_per_contract because STOCKTALK_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let pool = db::connect(&database_url).await?;
        sqlx::query("DROP TABLE IF EXISTS tmp").execute(&pool).await?;

        let saved_at = Utc::now();
        let first_batch = staging_frame(&[post("a"), post("b")], "GME", saved_at)?;
        let second_batch = staging_frame(&[post("c")], "GME", saved_at)?;

        // append creates the table when it is missing
        let loader = StagingLoader::new(pool.clone(), IfExists::Append);
        assert_eq!(loader.load(&first_batch, &NullSink).await?, 2);
        assert_eq!(row_count(&pool).await?, 2);

        // fail refuses the write and leaves the prior contents in place
        let loader = StagingLoader::new(pool.clone(), IfExists::Fail);
        let err = loader.load(&second_batch, &NullSink).await.unwrap_err();
        assert!(matches!(err, HarvestError::TableExists("tmp")));
        assert_eq!(row_count(&pool).await?, 2);

        // append adds the new rows on top of the old ones
        let loader = StagingLoader::new(pool.clone(), IfExists::Append);
        assert_eq!(loader.load(&second_batch, &NullSink).await?, 1);
        assert_eq!(row_count(&pool).await?, 3);

        // replace keeps only the new batch
        let loader = StagingLoader::new(pool.clone(), IfExists::Replace);
        assert_eq!(loader.load(&second_batch, &NullSink).await?, 1);
        assert_eq!(row_count(&pool).await?, 1);

        let (post_id, upvote, stock, text_cleaned): (String, i32, String, String) =
            sqlx::query_as(
                "SELECT post_id, upvote, stock, text_cleaned FROM tmp LIMIT 1",
            )
            .fetch_one(&pool)
            .await?;
        assert_eq!(post_id, "c");
        assert_eq!(upvote, 12);
        assert_eq!(stock, "GME");
        assert_eq!(text_cleaned, "line1 line2");

        sqlx::query("DROP TABLE IF EXISTS tmp").execute(&pool).await?;
        Ok(())
    })
}
