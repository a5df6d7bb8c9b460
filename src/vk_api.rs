//! `WallFeed` over the VK HTTP API (`wall.get`, `wall.getComments`).
//! Takes a ready access token; obtaining one is the caller's business.

use crate::feed::{CommentsRequest, FeedError, FeedPage, WallFeed};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.vk.com";
pub const DEFAULT_API_VERSION: &str = "5.131";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<FeedPage>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

pub struct VkApiFeed {
    client: Client,
    endpoint: String,
    api_version: String,
    access_token: String,
    timeout: Duration,
}

impl VkApiFeed {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(30),
        }
    }
    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> Self {
        self.endpoint = endpoint.as_ref().trim_end_matches('/').to_string();
        self
    }
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn call(&self, method: &str, params: &[(&str, String)]) -> Result<FeedPage, FeedError> {
        let url = format!("{}/method/{}", self.endpoint, method);
        tracing::debug!(method, "VK API request");
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(params)
            .query(&[("access_token", self.access_token.as_str()), ("v", self.api_version.as_str())])
            .send()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        let body = resp.text().map_err(|e| FeedError::Transport(e.to_string()))?;
        let env: Envelope = serde_json::from_str(&body).map_err(|e| FeedError::Decode(e.to_string()))?;
        match (env.response, env.error) {
            (_, Some(err)) => Err(FeedError::Api { code: err.error_code, message: err.error_msg }),
            (Some(page), None) => Ok(page),
            (None, None) => Err(FeedError::Decode("neither response nor error in body".into())),
        }
    }
}

impl WallFeed for VkApiFeed {
    fn owner_posts(&self, community_id: i64, count: usize) -> Result<FeedPage, FeedError> {
        self.call(
            "wall.get",
            &[
                ("owner_id", (-community_id).to_string()),
                ("count", count.to_string()),
                ("filter", "owner".to_string()),
            ],
        )
    }

    fn post_comments(&self, req: &CommentsRequest) -> Result<FeedPage, FeedError> {
        self.call(
            "wall.getComments",
            &[
                ("owner_id", (-req.community_id).to_string()),
                ("post_id", req.post_id.to_string()),
                ("count", req.count.to_string()),
                ("need_likes", "1".to_string()),
                ("thread_items_count", req.thread_items.to_string()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn decodes_wall_page() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/method/wall.get")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("owner_id".into(), "-42".into()),
                Matcher::UrlEncoded("count".into(), "100".into()),
                Matcher::UrlEncoded("filter".into(), "owner".into()),
                Matcher::UrlEncoded("access_token".into(), "tok".into()),
                Matcher::UrlEncoded("v".into(), DEFAULT_API_VERSION.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":{"count":1,"items":[{"id":7,"date":1700000000,"text":"hi","comments":{"count":2}}]}}"#)
            .create();

        let feed = VkApiFeed::new("tok").with_endpoint(server.url());
        let page = feed.owner_posts(42, 100).unwrap();
        assert_eq!(page.count, Some(1));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0]["id"], 7);
        mock.assert();
    }

    #[test]
    fn comment_request_carries_thread_window() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/method/wall.getComments")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("post_id".into(), "7".into()),
                Matcher::UrlEncoded("count".into(), "150".into()),
                Matcher::UrlEncoded("need_likes".into(), "1".into()),
                Matcher::UrlEncoded("thread_items_count".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"response":{"count":0,"items":[]}}"#)
            .create();

        let feed = VkApiFeed::new("tok").with_endpoint(server.url());
        let req = CommentsRequest { community_id: 42, post_id: 7, count: 150, thread_items: 10 };
        let page = feed.post_comments(&req).unwrap();
        assert!(page.items.is_empty());
        mock.assert();
    }

    #[test]
    fn api_error_envelope_is_mapped() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/method/wall.get")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error":{"error_code":15,"error_msg":"Access denied"}}"#)
            .create();

        let feed = VkApiFeed::new("tok").with_endpoint(server.url());
        match feed.owner_posts(42, 10) {
            Err(FeedError::Api { code, message }) => {
                assert_eq!(code, 15);
                assert_eq!(message, "Access denied");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn http_status_and_garbage_are_errors() {
        let mut server = Server::new();
        let _bad = server.mock("GET", "/method/wall.get").match_query(Matcher::Any).with_status(502).create();
        let _junk = server
            .mock("GET", "/method/wall.getComments")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create();

        let feed = VkApiFeed::new("tok").with_endpoint(server.url());
        assert!(matches!(feed.owner_posts(42, 10), Err(FeedError::Status(502))));
        let req = CommentsRequest { community_id: 42, post_id: 1, count: 100, thread_items: 10 };
        assert!(matches!(feed.post_comments(&req), Err(FeedError::Decode(_))));
    }
}
