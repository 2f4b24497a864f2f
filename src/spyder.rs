//! High-level entry point.
//!
//! A [`Spyder`] owns the configured [`WeiboApi`] and exposes the named operations: boards,
//! groups, hot posts, the followed feed, search, and user/post lookups.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::api::WeiboApi;
use crate::config::Config;
use crate::constants::HOT_TIMELINE_MAX;
use crate::error::{Error, Result};
use crate::model::search::{self, SearchParams, SearchResult, SearchType};
use crate::model::{Post, User, UserRef};
use crate::paginate::{clamp_target, Paginator};
use crate::parse::{parse_groups, parse_hot_band, parse_topic_band, Group, HotBand, TopicEntry};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct Spyder {
    api: WeiboApi,
}

impl Spyder {
    #[must_use]
    pub fn new(api: WeiboApi) -> Self {
        Self { api }
    }

    /// Build a spyder whose session is read from the configured cookie file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie file is missing or empty, or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let session = Session::from_cookie_file(&config.cookies_path)?;
        info!(path = %config.cookies_path.display(), "Session loaded");
        Ok(Self::new(WeiboApi::from_config(config, session)?))
    }

    /// Persist `cookie` to the configured cookie file, then build a spyder from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie cannot be written or read back.
    pub fn with_cookie(config: &Config, cookie: &str) -> Result<Self> {
        Session::store_cookie(&config.cookies_path, cookie)?;
        Self::from_config(config)
    }

    /// The client used for every request, also needed by entity methods.
    #[must_use]
    pub fn api(&self) -> &WeiboApi {
        &self.api
    }

    /// Category and board groups by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing has an unexpected layout.
    pub async fn groups(&self) -> Result<BTreeMap<String, Group>> {
        parse_groups(&self.api.all_groups().await?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the board is malformed.
    pub async fn hot_band(&self) -> Result<HotBand> {
        parse_hot_band(&self.api.hot_band().await?)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the board is malformed.
    pub async fn topic_band(&self) -> Result<Vec<TopicEntry>> {
        parse_topic_band(&self.api.topic_band().await?)
    }

    /// Up to `num` hot posts of the group titled `title` (at most 400).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownGroup`] if no group has that title, or any request or payload error.
    pub async fn hot_posts(&self, title: &str, num: usize) -> Result<Vec<Post>> {
        let groups = self.groups().await?;
        let group = groups
            .get(title)
            .ok_or_else(|| Error::UnknownGroup(title.to_string()))?;
        let target = clamp_target(num, HOT_TIMELINE_MAX, "hot posts");
        debug!(title, gid = %group.gid, target, "Collecting hot timeline");

        let api = &self.api;
        Paginator::variable(target)
            .collect(|page| api.hot_timeline(&group.gid, &group.containerid, page))
            .await?
            .into_iter()
            .map(Post::feed)
            .collect()
    }

    /// Latest `num` posts from followed accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a post payload is malformed.
    pub async fn feeds(&self, num: usize) -> Result<Vec<Post>> {
        self.api
            .friends_timeline(num)
            .await?
            .into_iter()
            .take(num)
            .map(Post::feed)
            .collect()
    }

    /// # Errors
    ///
    /// Returns an error if any page request fails or a card lacks a required field.
    pub async fn search(
        &self,
        keyword: &str,
        search_type: SearchType,
        num: usize,
        params: &SearchParams,
    ) -> Result<Vec<SearchResult>> {
        search::search(&self.api, keyword, search_type, num, params).await
    }

    /// # Errors
    ///
    /// Returns an error if the user cannot be resolved or the profile fetch fails.
    pub async fn user(&self, user: impl Into<UserRef>) -> Result<User> {
        User::fetch(&self.api, user).await
    }

    /// A single post by short id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the payload is not a post.
    pub async fn post(&self, mblogid: &str) -> Result<Post> {
        Post::feed(self.api.show(mblogid).await?)
    }
}
