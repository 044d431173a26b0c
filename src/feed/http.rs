//! HTTP implementation of the feed and ad sources.
//!
//! Speaks JSON to the aggregation backend: a cursor-paginated feed query
//! endpoint, a promoted-content endpoint, and per-post action endpoints.
//! Response decoding is split into pure functions so tests can exercise the
//! parsing logic without hitting the network.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use super::{Ad, AdSource, FeedError, FeedPage, FeedKind, FeedQuery, Post, RemoteAction, Vote};

/// Feed connection query sent to the backend. The backend treats the feed
/// name as the ranking scope; variables are merged in verbatim.
const FEED_QUERY_NAME: &str = "feedPage";

/// A feed backed by the remote aggregation service.
pub struct HttpSource {
    base_url: String,
    label: String,
    client: Client,
    /// Bearer token for the signed-in user, if any.
    token: Option<String>,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("devfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            label: "api".to_string(),
            client,
            token,
        })
    }

    fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String, FeedError> {
        let mut req = self.client.post(format!("{}{path}", self.base_url)).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send()?.error_for_status()?;
        Ok(resp.text()?)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FeedResponse {
    data: Option<FeedData>,
}

#[derive(Deserialize)]
struct FeedData {
    page: Option<Connection>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    page_info: PageInfo,
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Deserialize)]
struct Edge {
    node: PostNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostNode {
    id: String,
    title: Option<String>,
    permalink: Option<String>,
    created_at: Option<String>,
    read_time: Option<u32>,
    #[serde(default)]
    num_upvotes: i64,
    #[serde(default)]
    num_comments: i64,
    summary: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    author: Option<Named>,
    source: Option<Named>,
    user_state: Option<UserState>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct UserState {
    #[serde(default)]
    vote: i32,
    #[serde(default)]
    bookmarked: bool,
}

#[derive(Deserialize)]
struct AdRecord {
    id: String,
    description: Option<String>,
    link: String,
    company: Option<String>,
}

impl From<PostNode> for Post {
    fn from(node: PostNode) -> Self {
        let user_state = node.user_state.unwrap_or(UserState {
            vote: 0,
            bookmarked: false,
        });
        Post {
            id: node.id,
            title: node.title.unwrap_or_else(|| "(untitled)".to_string()),
            url: node.permalink,
            source_name: node.source.map(|s| s.name).unwrap_or_default(),
            author: node.author.map(|a| a.name),
            // Gracefully degrade to an undated post on a malformed timestamp.
            created_at: node
                .created_at
                .and_then(|raw| raw.parse().ok()),
            read_time: node.read_time,
            num_upvotes: node.num_upvotes,
            num_comments: node.num_comments,
            vote: match user_state.vote {
                1 => Vote::Up,
                -1 => Vote::Down,
                _ => Vote::None,
            },
            bookmarked: user_state.bookmarked,
            summary: node.summary,
            tags: node.tags,
        }
    }
}

/// Decode a feed page response body.
///
/// Pure (no I/O) so tests can feed it fixture JSON.
pub fn parse_page(body: &str) -> Result<FeedPage, FeedError> {
    let resp: FeedResponse = serde_json::from_str(body)?;
    let conn = resp
        .data
        .and_then(|d| d.page)
        .ok_or(FeedError::MissingField("data.page"))?;

    let posts = conn.edges.into_iter().map(|e| e.node.into()).collect();
    Ok(FeedPage::new(
        posts,
        conn.page_info.end_cursor,
        conn.page_info.has_next_page,
    ))
}

/// Decode the promoted-content response body: the first ad, if any.
pub fn parse_ad(body: &str) -> Result<Option<Ad>, FeedError> {
    let records: Vec<AdRecord> = serde_json::from_str(body)?;
    Ok(records.into_iter().next().map(|r| Ad {
        title: r.description.unwrap_or_else(|| "Sponsored".to_string()),
        link: r.link,
        company: r.company.unwrap_or_default(),
        id: r.id,
    }))
}

fn query_variables(query: &FeedQuery, cursor: Option<&str>, first: usize) -> serde_json::Value {
    let mut variables = json!({
        "first": first,
        "after": cursor,
        "ranking": query.ranking.as_str(),
        "feed": query.kind.name(),
    });
    if let FeedKind::Squad(handle) = &query.kind {
        variables["source"] = json!(handle);
    }
    for (key, value) in &query.variables {
        variables[key.as_str()] = json!(value);
    }
    variables
}

impl super::FeedSource for HttpSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&str>,
        first: usize,
    ) -> Result<FeedPage, FeedError> {
        let body = json!({
            "query": FEED_QUERY_NAME,
            "variables": query_variables(query, cursor, first),
        });
        debug!("fetching page for {query} (cursor {cursor:?})");
        let text = self.post_json("/graphql", &body)?;
        parse_page(&text)
    }

    fn apply_action(&self, post_id: &str, action: RemoteAction) -> Result<(), FeedError> {
        let (path, body) = match action {
            RemoteAction::Upvote(set) => (format!("/v1/posts/{post_id}/vote"), json!({"vote": if set { 1 } else { 0 }})),
            RemoteAction::Downvote(set) => (format!("/v1/posts/{post_id}/vote"), json!({"vote": if set { -1 } else { 0 }})),
            RemoteAction::Bookmark(set) => (format!("/v1/posts/{post_id}/bookmark"), json!({"bookmarked": set})),
            RemoteAction::Hide => (format!("/v1/posts/{post_id}/hide"), json!({})),
        };
        self.post_json(&path, &body)?;
        Ok(())
    }
}

/// Promoted content served by the same backend.
pub struct HttpAdSource {
    base_url: String,
    client: Client,
}

impl HttpAdSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("devfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

impl AdSource for HttpAdSource {
    fn fetch_ad(&self) -> Result<Option<Ad>, FeedError> {
        let text = self
            .client
            .get(format!("{}/v1/a", self.base_url))
            .send()?
            .error_for_status()?
            .text()?;
        parse_ad(&text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
