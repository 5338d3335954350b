//! Reddit search client backing the core's `PostSearch` seam.
//!
//! Credential acquisition is out of scope: the client is handed an
//! already-issued OAuth access token and a user-agent string, and issues
//! authenticated requests against the site-wide JSON search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;

use stocktalk_core::error::{HarvestError, Result};
use stocktalk_core::fetch::PostSearch;
use stocktalk_core::query::SearchSpec;
use stocktalk_core::types::{PostAuthor, RawPost};

const SEARCH_URL: &str = "https://oauth.reddit.com/search";
/// The listing endpoint caps a single page at 100 items; larger limits
/// are satisfied by following the `after` cursor.
const PAGE_LIMIT: u32 = 100;
/// Marker the JSON API substitutes for a deleted account.
const DELETED_AUTHOR: &str = "[deleted]";

pub struct RedditSearchClient {
    http: reqwest::Client,
}

impl RedditSearchClient {
    pub fn new(access_token: &str, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|err| HarvestError::Search(format!("invalid access token: {err}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let agent = HeaderValue::from_str(user_agent)
            .map_err(|err| HarvestError::Search(format!("invalid user agent: {err}")))?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| HarvestError::Search(err.to_string()))?;

        Ok(Self { http })
    }

    async fn fetch_page(
        &self,
        spec: &SearchSpec,
        page_size: u32,
        after: Option<&str>,
    ) -> Result<ListingData> {
        let mut request = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("q", spec.query.as_str()),
                ("sort", spec.sort_method.as_str()),
                ("t", spec.time_range.as_str()),
                ("type", "link"),
                ("raw_json", "1"),
            ])
            .query(&[("limit", page_size)]);
        if let Some(cursor) = after {
            request = request.query(&[("after", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|err| HarvestError::Search(err.to_string()))?
            .error_for_status()
            .map_err(|err| HarvestError::Search(err.to_string()))?;

        let listing: Listing = response
            .json()
            .await
            .map_err(|err| HarvestError::Search(format!("malformed listing: {err}")))?;

        Ok(listing.data)
    }
}

#[async_trait]
impl PostSearch for RedditSearchClient {
    async fn search(&self, spec: &SearchSpec) -> Result<Vec<RawPost>> {
        let mut posts: Vec<RawPost> = Vec::new();
        let mut after: Option<String> = None;

        while (posts.len() as u32) < spec.limit {
            let remaining = spec.limit - posts.len() as u32;
            let page = self
                .fetch_page(spec, remaining.min(PAGE_LIMIT), after.as_deref())
                .await?;
            if page.children.is_empty() {
                break;
            }

            for child in page.children {
                posts.push(child.data.into_raw_post());
                if posts.len() as u32 == spec.limit {
                    break;
                }
            }

            after = page.after;
            if after.is_none() {
                break;
            }
        }

        Ok(posts)
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: ApiPost,
}

#[derive(Debug, Deserialize)]
struct ApiPost {
    id: String,
    created_utc: f64,
    title: String,
    #[serde(default)]
    selftext: String,
    ups: i64,
    #[serde(default)]
    downs: i64,
    num_comments: i64,
    subreddit: String,
    permalink: String,
    author: Option<String>,
    #[serde(default)]
    stickied: bool,
}

impl ApiPost {
    fn into_raw_post(self) -> RawPost {
        // The JSON API reports deleted accounts as the literal string
        // "[deleted]"; map that to an absent author reference.
        let author = self
            .author
            .filter(|name| name != DELETED_AUTHOR)
            .map(|name| PostAuthor { name });

        RawPost {
            id: self.id,
            created_utc: self.created_utc,
            title: self.title,
            selftext: self.selftext,
            ups: self.ups,
            downs: self.downs,
            num_comments: self.num_comments,
            subreddit_name: self.subreddit,
            permalink: self.permalink,
            author,
            stickied: self.stickied,
        }
    }
}
