//! Endpoint-level client.
//!
//! Every method issues exactly one request. Any status other than 200 is fatal for the call;
//! nothing here retries.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::{COMMENT_LIMIT, DEFAULT_API_BASE, DEFAULT_SEARCH_BASE};
use crate::error::{Error, Result};
use crate::model::search::{SearchParams, SearchType};
use crate::model::user::Relation;
use crate::parse::{json_array, json_str, parse_json};
use crate::session::Session;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Lookup key accepted by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileQuery {
    Uid(u64),
    ScreenName(String),
    Custom(String),
}

/// Client for the platform's JSON and HTML endpoints.
#[derive(Clone)]
pub struct WeiboApi {
    transport: Arc<dyn Transport>,
    session: Session,
    api_base: String,
    search_base: String,
}

impl fmt::Debug for WeiboApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeiboApi")
            .field("api_base", &self.api_base)
            .field("search_base", &self.search_base)
            .finish_non_exhaustive()
    }
}

impl WeiboApi {
    /// Client against the public endpoints.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            transport,
            session,
            api_base: DEFAULT_API_BASE.to_string(),
            search_base: DEFAULT_SEARCH_BASE.to_string(),
        }
    }

    /// Point the client at different hosts.
    #[must_use]
    pub fn with_bases(mut self, api_base: &str, search_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.search_base = search_base.trim_end_matches('/').to_string();
        self
    }

    /// Build an HTTP-backed client from configuration and an existing session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config, session: Session) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Ok(Self::new(Arc::new(transport), session.with_user_agent(&config.user_agent))
            .with_bases(&config.api_base, &config.search_base))
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    async fn send(&self, mut request: ApiRequest) -> Result<String> {
        request.headers.extend(self.session.headers());
        debug!(
            method = ?request.method,
            url = %request.url,
            query = ?request.query,
            "Sending request"
        );

        let url = request.url.clone();
        let response = self.transport.request(request).await?;
        if response.status != 200 {
            warn!(url = %url, status = response.status, "Request failed");
            return Err(Error::Status {
                status: response.status,
                url,
            });
        }
        Ok(response.body)
    }

    async fn get_json(&self, request: ApiRequest) -> Result<Value> {
        let body = self.send(request).await?;
        parse_json(&body)
    }

    /// Raw trending-board response.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or a non-JSON body.
    pub async fn hot_band(&self) -> Result<Value> {
        self.get_json(ApiRequest::get(self.api_url("/ajax/statuses/hot_band")))
            .await
    }

    /// Raw topic-board response.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or a non-JSON body.
    pub async fn topic_band(&self) -> Result<Value> {
        self.get_json(ApiRequest::get(self.api_url("/ajax/statuses/topic_band")))
            .await
    }

    /// Raw group listing response.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or a non-JSON body.
    pub async fn all_groups(&self) -> Result<Value> {
        self.get_json(ApiRequest::get(self.api_url("/ajax/feed/allGroups")))
            .await
    }

    /// One page of a group's hot timeline.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or when `statuses` is missing.
    pub async fn hot_timeline(
        &self,
        gid: &str,
        containerid: &str,
        page: u32,
    ) -> Result<Vec<Value>> {
        let request = ApiRequest::get(self.api_url("/ajax/feed/hottimeline"))
            .query("group_id", gid)
            .query("containerid", containerid)
            .query("extparam", "discover|new_feed")
            .query("max_id", page);
        json_array(&self.get_json(request).await?, "statuses")
    }

    /// Full profile response for a uid, screen name or custom slug.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or a non-JSON body.
    pub async fn profile_info(&self, query: &ProfileQuery) -> Result<Value> {
        let request = ApiRequest::get(self.api_url("/ajax/profile/info"));
        let request = match query {
            ProfileQuery::Uid(uid) => request.query("uid", uid),
            ProfileQuery::ScreenName(name) => request.query("screen_name", name),
            ProfileQuery::Custom(slug) => request.query("custom", slug),
        };
        self.get_json(request).await
    }

    /// One page (20 users when full) of a user's followers or followings.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or when `users` is missing.
    pub async fn friends_page(
        &self,
        uid: u64,
        relation: Relation,
        page: u32,
    ) -> Result<Vec<Value>> {
        let mut request = ApiRequest::get(self.api_url("/ajax/friendships/friends"))
            .query("page", page)
            .query("uid", uid);
        if relation == Relation::Fans {
            request = request.query("relate", "fans");
        }
        json_array(&self.get_json(request).await?, "users")
    }

    /// One page of a user's own posts.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or when `data.list` is missing.
    pub async fn user_posts_page(&self, uid: u64, page: u32) -> Result<Vec<Value>> {
        let request = ApiRequest::get(self.api_url("/ajax/statuses/mymblog"))
            .query("uid", uid)
            .query("page", page);
        json_array(&self.get_json(request).await?, "data.list")
    }

    /// A single post by short id.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or a non-JSON body.
    pub async fn show(&self, mblogid: &str) -> Result<Value> {
        let request = ApiRequest::get(self.api_url("/ajax/statuses/show")).query("id", mblogid);
        self.get_json(request).await
    }

    /// Comments of a post, requesting at most 100.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or when `data` is missing.
    pub async fn comments(&self, uid: &str, mid: &str) -> Result<Vec<Value>> {
        let request = ApiRequest::get(self.api_url("/ajax/statuses/buildComments"))
            .query("id", mid)
            .query("is_show_bulletin", 3)
            .query("count", COMMENT_LIMIT)
            .query("uid", uid);
        json_array(&self.get_json(request).await?, "data")
    }

    /// Full text of a truncated post.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or when `data.longTextContent` is missing.
    pub async fn long_text(&self, mblogid: &str) -> Result<String> {
        let request =
            ApiRequest::get(self.api_url("/ajax/statuses/longtext")).query("id", mblogid);
        let response = self.get_json(request).await?;
        Ok(json_str(&response, "data.longTextContent")?.to_string())
    }

    /// Raw body of the video component lookup for a `fid`.
    ///
    /// The body is returned unparsed: a malformed answer means "no video", not a failure.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status.
    pub async fn video_component(&self, fid: &str) -> Result<String> {
        let data = json!({"Component_Play_Playinfo": {"oid": fid}}).to_string();
        let request = ApiRequest::post(self.api_url("/tv/api/component"))
            .query("data", data)
            .header(
                "Referer",
                format!("https://weibo.com/tv/show/{fid}?from=old_pc_videoshow"),
            );
        self.send(request).await
    }

    /// Latest posts of followed accounts.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status or when `statuses` is missing.
    pub async fn friends_timeline(&self, count: usize) -> Result<Vec<Value>> {
        let request = ApiRequest::get(self.api_url("/ajax/feed/friendstimeline"))
            .query("list_id", "null")
            .query("count", count);
        json_array(&self.get_json(request).await?, "statuses")
    }

    /// One rendered search page.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-200 status.
    pub async fn search_page(
        &self,
        keyword: &str,
        search_type: SearchType,
        page: u32,
        params: &SearchParams,
    ) -> Result<String> {
        let mut request = ApiRequest::get(format!("{}/{}", self.search_base, search_type.as_str()))
            .query("q", keyword)
            .query("page", page);
        if search_type == SearchType::Realtime {
            request = request.query("rd", "realtime");
        }
        for (name, value) in params.iter() {
            request = request.query(name, value);
        }
        self.send(request).await
    }
}
