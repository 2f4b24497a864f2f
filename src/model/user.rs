use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::post::Post;
use crate::api::{ProfileQuery, WeiboApi};
use crate::constants::FRIENDS_PAGE_SIZE;
use crate::error::{Error, Result};
use crate::paginate::{clamp_target, collect_pages, Paginator};
use crate::parse::{json_path, json_str};

static UID_BEFORE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d\?ref").unwrap());
static UID_BEFORE_QUERY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d+)\?").unwrap());
static UID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d+)").unwrap());

/// How a user is identified before its numeric id is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRef {
    Id(u64),
    /// Profile URL: `/u/<id>`, `/n/<screen name>`, `/<custom slug>` or a search link.
    Url(String),
}

impl UserRef {
    /// A bare number is an id; anything else is treated as a profile URL.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        arg.trim()
            .parse()
            .map_or_else(|_| Self::Url(arg.to_string()), Self::Id)
    }
}

impl From<u64> for UserRef {
    fn from(uid: u64) -> Self {
        Self::Id(uid)
    }
}

impl From<&str> for UserRef {
    fn from(arg: &str) -> Self {
        Self::parse(arg)
    }
}

impl From<String> for UserRef {
    fn from(arg: String) -> Self {
        Self::parse(&arg)
    }
}

/// The handful of profile fields most callers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortInfo {
    pub id: u64,
    pub screen_name: String,
    pub profile_url: String,
    pub followers_count: u64,
    pub friends_count: u64,
}

/// Which side of a follow relationship to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Accounts following the user.
    Fans,
    /// Accounts the user follows.
    Following,
}

impl Relation {
    fn label(self) -> &'static str {
        match self {
            Self::Fans => "followers",
            Self::Following => "following",
        }
    }
}

/// A user with its profile fetched once, at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    uid: u64,
    info: Value,
    shortinfo: ShortInfo,
}

impl User {
    /// Resolve `user` to a numeric id and fetch its profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the id cannot be resolved, the profile request fails, or the profile
    /// lacks one of the [`ShortInfo`] fields.
    pub async fn fetch(api: &WeiboApi, user: impl Into<UserRef>) -> Result<Self> {
        let uid = resolve_uid(api, &user.into()).await?;
        let response = api.profile_info(&ProfileQuery::Uid(uid)).await?;
        let info = json_path(&response, "data.user")?.clone();
        let shortinfo = ShortInfo::deserialize(&info)?;
        debug!(uid, screen_name = %shortinfo.screen_name, "Fetched user profile");
        Ok(Self {
            uid,
            info,
            shortinfo,
        })
    }

    #[must_use]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Full profile payload.
    #[must_use]
    pub fn info(&self) -> &Value {
        &self.info
    }

    #[must_use]
    pub fn shortinfo(&self) -> &ShortInfo {
        &self.shortinfo
    }

    /// The user's posts from the first `pages` pages of their timeline.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails or a post payload is malformed.
    pub async fn posts(&self, api: &WeiboApi, pages: u32) -> Result<Vec<Post>> {
        let uid = self.uid;
        collect_pages(pages, |page| api.user_posts_page(uid, page))
            .await?
            .into_iter()
            .map(Post::feed)
            .collect()
    }

    /// Every follower the platform reports. Large accounts take many requests.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn followers(&self, api: &WeiboApi) -> Result<Vec<Value>> {
        self.relations(api, Relation::Fans, None).await
    }

    /// At most `num` followers.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn followers_limited(&self, api: &WeiboApi, num: usize) -> Result<Vec<Value>> {
        self.relations(api, Relation::Fans, Some(num)).await
    }

    /// Every account the user follows.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn following(&self, api: &WeiboApi) -> Result<Vec<Value>> {
        self.relations(api, Relation::Following, None).await
    }

    /// At most `num` followed accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn following_limited(&self, api: &WeiboApi, num: usize) -> Result<Vec<Value>> {
        self.relations(api, Relation::Following, Some(num)).await
    }

    async fn relations(
        &self,
        api: &WeiboApi,
        relation: Relation,
        num: Option<usize>,
    ) -> Result<Vec<Value>> {
        let available = match relation {
            Relation::Fans => self.shortinfo.followers_count,
            Relation::Following => self.shortinfo.friends_count,
        };
        let available = usize::try_from(available).unwrap_or(usize::MAX);
        let target = num.map_or(available, |num| clamp_target(num, available, relation.label()));

        let uid = self.uid;
        info!(uid, relation = relation.label(), target, "Listing relations");
        Paginator::fixed(target, FRIENDS_PAGE_SIZE)
            .collect(|page| api.friends_page(uid, relation, page))
            .await
    }
}

/// Resolve a [`UserRef`] to a numeric id.
///
/// Search links (`…/<id>?ref…`) and `/u/<id>` URLs are resolved locally; `/n/<name>` and custom
/// slugs cost one profile lookup.
///
/// # Errors
///
/// Returns an error if the URL carries no usable id or the lookup fails.
pub async fn resolve_uid(api: &WeiboApi, user: &UserRef) -> Result<u64> {
    let url = match user {
        UserRef::Id(uid) => return Ok(*uid),
        UserRef::Url(url) => url,
    };

    if UID_BEFORE_REF.is_match(url) {
        return capture_uid(&UID_BEFORE_QUERY, url);
    }
    if url.contains("/u/") {
        return capture_uid(&UID_SEGMENT, url);
    }

    let last_segment = url.rsplit('/').next().unwrap_or_default().to_string();
    let query = if url.contains("/n/") {
        ProfileQuery::ScreenName(last_segment)
    } else {
        ProfileQuery::Custom(last_segment)
    };
    debug!(url = %url, query = ?query, "Resolving uid via profile lookup");
    let response = api.profile_info(&query).await?;
    let idstr = json_str(&response, "data.user.idstr")?;
    idstr
        .parse()
        .map_err(|_| Error::invalid("data.user.idstr", format!("not a numeric id: {idstr}")))
}

fn capture_uid(pattern: &Regex, url: &str) -> Result<u64> {
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|uid| uid.as_str().parse().ok())
        .ok_or_else(|| Error::invalid("profile url", format!("no uid in {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ref_parse() {
        assert_eq!(UserRef::parse("12345"), UserRef::Id(12345));
        assert_eq!(
            UserRef::parse("https://weibo.com/u/12345"),
            UserRef::Url("https://weibo.com/u/12345".to_string())
        );
    }

    #[test]
    fn test_capture_uid_from_search_link() {
        let link = "https://weibo.com/1234567890?refer_flag=1001030103_";
        assert_eq!(capture_uid(&UID_BEFORE_QUERY, link).unwrap(), 1_234_567_890);
        assert_eq!(
            capture_uid(&UID_SEGMENT, "https://weibo.com/u/5555").unwrap(),
            5555
        );
    }

    #[test]
    fn test_capture_uid_without_digits_is_invalid() {
        assert!(matches!(
            capture_uid(&UID_SEGMENT, "https://weibo.com/u/abc"),
            Err(Error::InvalidValue { .. })
        ));
    }
}
