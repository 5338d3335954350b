use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

use crate::error::{HarvestError, Result};
use crate::types::RawPost;

static NEWLINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("newline-run pattern"));

/// Staging schema, in the exact column order consumers depend on.
pub const STAGING_COLUMNS: [&str; 14] = [
    "post_id",
    "created_utc",
    "title",
    "text",
    "upvote",
    "downvote",
    "comments",
    "subreddit",
    "permalink",
    "author_name",
    "stock",
    "saved_dt_utc",
    "title_cleaned",
    "text_cleaned",
];

/// Shapes one batch of filtered posts into the 14-column staging frame.
///
/// `stock` and `saved_dt_utc` are constant across the batch; `saved_at`
/// is taken once by the caller after the fetch materializes.
///
/// A post with an absent author reference (deleted account) or a
/// vote/comment count outside the SQL `INTEGER` range fails the whole
/// batch with [`HarvestError::DataShape`]; there is no per-row isolation.
pub fn staging_frame(
    posts: &[RawPost],
    ticker: &str,
    saved_at: DateTime<Utc>,
) -> Result<DataFrame> {
    let len = posts.len();

    let mut post_ids: Vec<String> = Vec::with_capacity(len);
    let mut created: Vec<i64> = Vec::with_capacity(len);
    let mut titles: Vec<String> = Vec::with_capacity(len);
    let mut texts: Vec<String> = Vec::with_capacity(len);
    let mut upvotes: Vec<i32> = Vec::with_capacity(len);
    let mut downvotes: Vec<i32> = Vec::with_capacity(len);
    let mut comments: Vec<i32> = Vec::with_capacity(len);
    let mut subreddits: Vec<String> = Vec::with_capacity(len);
    let mut permalinks: Vec<String> = Vec::with_capacity(len);
    let mut authors: Vec<String> = Vec::with_capacity(len);
    let mut titles_cleaned: Vec<String> = Vec::with_capacity(len);
    let mut texts_cleaned: Vec<String> = Vec::with_capacity(len);

    for post in posts {
        let author = post.author.as_ref().map(|author| author.name.clone()).ok_or_else(|| {
            HarvestError::DataShape(format!(
                "post '{}' has no author reference (deleted account)",
                post.id
            ))
        })?;

        post_ids.push(post.id.clone());
        created.push(epoch_to_micros(post.created_utc));
        titles.push(post.title.clone());
        texts.push(post.selftext.clone());
        upvotes.push(coerce_count("upvote", &post.id, post.ups)?);
        downvotes.push(coerce_count("downvote", &post.id, post.downs)?);
        comments.push(coerce_count("comments", &post.id, post.num_comments)?);
        subreddits.push(post.subreddit_name.clone());
        permalinks.push(post.permalink.clone());
        authors.push(author);
        titles_cleaned.push(post.title.replace(ticker, ""));
        texts_cleaned.push(NEWLINE_RUN.replace_all(&post.selftext, " ").into_owned());
    }

    let datetime_dtype = DataType::Datetime(TimeUnit::Microseconds, Some(TimeZone::UTC));
    let created_series = Series::new("created_utc".into(), created).cast(&datetime_dtype)?;
    let saved_series = Series::new(
        "saved_dt_utc".into(),
        vec![saved_at.timestamp_micros(); len],
    )
    .cast(&datetime_dtype)?;
    let stock_series = Series::new("stock".into(), vec![ticker; len]);

    let frame = DataFrame::new(vec![
        Series::new("post_id".into(), post_ids).into(),
        created_series.into(),
        Series::new("title".into(), titles).into(),
        Series::new("text".into(), texts).into(),
        Series::new("upvote".into(), upvotes).into(),
        Series::new("downvote".into(), downvotes).into(),
        Series::new("comments".into(), comments).into(),
        Series::new("subreddit".into(), subreddits).into(),
        Series::new("permalink".into(), permalinks).into(),
        Series::new("author_name".into(), authors).into(),
        stock_series.into(),
        saved_series.into(),
        Series::new("title_cleaned".into(), titles_cleaned).into(),
        Series::new("text_cleaned".into(), texts_cleaned).into(),
    ])?;

    Ok(frame)
}

fn epoch_to_micros(epoch_seconds: f64) -> i64 {
    (epoch_seconds * 1_000_000.0).round() as i64
}

fn coerce_count(column: &str, post_id: &str, value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        HarvestError::DataShape(format!(
            "{column} {value} for post '{post_id}' does not fit an INTEGER column"
        ))
    })
}
