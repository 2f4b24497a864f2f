//! Posts in either of the platform's two representations.
//!
//! Feed-shape posts come from the JSON endpoints; search-shape posts are reconstructed from the
//! rendered search cards. Derived fields are async methods: every call performs its own I/O.

use std::fmt;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::comment::Comment;
use super::user::{User, UserRef};
use crate::api::WeiboApi;
use crate::constants::{EXPAND_MARKER, FEED_TIME_FORMAT, IMAGE_BASE};
use crate::error::{Error, Result};
use crate::parse::id_string;

static VIDEO_FID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"fid=(\d+:\d+)").unwrap());
static FORWARD_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/([^/]*)\?").unwrap());

/// Author fields embedded in a feed-shape post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedUser {
    pub id: u64,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub profile_url: String,
}

/// The part of an embedded original post needed to fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetweetedRef {
    #[serde(default)]
    pub mblogid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlStruct {
    #[serde(default)]
    pub long_url: Option<String>,
}

/// JSON-native post as returned by timeline, profile and lookup endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub created_at: String,
    pub text: String,
    pub text_raw: String,
    pub mblogid: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub mid: String,
    #[serde(default)]
    pub pic_ids: Vec<String>,
    #[serde(default)]
    pub retweeted_status: Option<RetweetedRef>,
    #[serde(default)]
    pub url_struct: Option<Vec<UrlStruct>>,
    pub reposts_count: u64,
    pub comments_count: u64,
    pub attitudes_count: u64,
    pub user: FeedUser,
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    id_string(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

/// Author of a search-shape post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub url: String,
    pub name: String,
}

/// Displayed text plus the raw markup it was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostText {
    pub text: String,
    pub raw: String,
}

/// One playable rendition of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContent {
    pub info: AuthorInfo,
    pub time: String,
    pub text: PostText,
    pub video: Option<VideoSource>,
    pub image: Option<Vec<String>>,
    pub forward: Option<String>,
}

/// Comment count plus the ids needed to list the comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAct {
    pub num: String,
    pub mid: String,
    pub uid: String,
}

/// Action-bar counts as displayed on a search card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAct {
    pub forward: String,
    pub comment: CommentAct,
    pub like: String,
}

/// Post reconstructed from a rendered search card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPost {
    pub content: SearchContent,
    pub act: SearchAct,
}

/// An engagement count. Search cards abbreviate large numbers (`1.2万`), so those stay text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Exact(u64),
    Approx(String),
}

impl Count {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.parse()
            .map_or_else(|_| Self::Approx(text.to_string()), Self::Exact)
    }

    #[must_use]
    pub fn exact(&self) -> Option<u64> {
        match self {
            Self::Exact(n) => Some(*n),
            Self::Approx(_) => None,
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Approx(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub forward: Count,
    pub comment: Count,
    pub like: Count,
}

/// Videos and full-size image URLs attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub video: Vec<VideoSource>,
    pub image: Vec<String>,
}

/// A post in exactly one of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Post {
    Feed(FeedPost),
    Search(SearchPost),
}

impl From<FeedPost> for Post {
    fn from(post: FeedPost) -> Self {
        Self::Feed(post)
    }
}

impl From<SearchPost> for Post {
    fn from(post: SearchPost) -> Self {
        Self::Search(post)
    }
}

impl Post {
    /// Wrap a raw payload, using the `visible` key to tell the feed shape from the search shape.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first required field missing for the detected shape.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("visible").is_some() {
            Self::feed(value)
        } else {
            Ok(Self::Search(serde_json::from_value(value)?))
        }
    }

    /// Wrap a payload known to come from a JSON endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first required feed field that is missing.
    pub fn feed(value: Value) -> Result<Self> {
        Ok(Self::Feed(serde_json::from_value(value)?))
    }

    #[must_use]
    pub fn is_feed(&self) -> bool {
        matches!(self, Self::Feed(_))
    }

    /// Short id, only known for feed-shape posts.
    #[must_use]
    pub fn mblogid(&self) -> Option<&str> {
        match self {
            Self::Feed(post) => Some(&post.mblogid),
            Self::Search(_) => None,
        }
    }

    /// How to look up the author without fetching anything.
    #[must_use]
    pub fn author_ref(&self) -> UserRef {
        match self {
            Self::Feed(post) => UserRef::Id(post.user.id),
            Self::Search(post) => UserRef::Url(post.content.info.url.clone()),
        }
    }

    /// Fetch the author's full profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the author cannot be resolved or fetched.
    pub async fn author(&self, api: &WeiboApi) -> Result<User> {
        User::fetch(api, self.author_ref()).await
    }

    /// Creation time. Feed timestamps are rendered RFC 3339; search cards keep the displayed text.
    ///
    /// # Errors
    ///
    /// Returns an error if a feed timestamp does not match the platform format.
    pub fn created_time(&self) -> Result<String> {
        match self {
            Self::Feed(post) => DateTime::parse_from_str(&post.created_at, FEED_TIME_FORMAT)
                .map(|dt| dt.to_rfc3339())
                .map_err(|e| Error::invalid("created_at", e.to_string())),
            Self::Search(post) => Ok(post.content.time.clone()),
        }
    }

    /// Plain text plus its markup; a truncated feed post has its markup replaced by the full text.
    ///
    /// # Errors
    ///
    /// Returns an error if the full-text lookup fails.
    pub async fn text(&self, api: &WeiboApi) -> Result<PostText> {
        match self {
            Self::Feed(post) => {
                let raw = if post.text.contains(EXPAND_MARKER) {
                    debug!(mblogid = %post.mblogid, "Expanding truncated text");
                    api.long_text(&post.mblogid).await?
                } else {
                    post.text.clone()
                };
                Ok(PostText {
                    text: post.text_raw.clone(),
                    raw,
                })
            }
            Self::Search(post) => Ok(post.content.text.clone()),
        }
    }

    /// Attached videos and images.
    ///
    /// A feed post with an embedded video link costs one lookup; an unusable answer to that
    /// lookup yields no video.
    ///
    /// # Errors
    ///
    /// Returns an error only if the video lookup request itself fails.
    pub async fn media(&self, api: &WeiboApi) -> Result<Media> {
        match self {
            Self::Feed(post) => {
                let image = post
                    .pic_ids
                    .iter()
                    .map(|id| format!("{IMAGE_BASE}/{id}.jpg"))
                    .collect();
                let video = match video_fid(post) {
                    Some(fid) => {
                        let body = api.video_component(&fid).await?;
                        let sources = serde_json::from_str::<Value>(&body)
                            .ok()
                            .and_then(|response| try_video_urls(&response));
                        if sources.is_none() {
                            debug!(fid = %fid, "Video component returned no usable urls");
                        }
                        sources.unwrap_or_default()
                    }
                    None => Vec::new(),
                };
                Ok(Media { video, image })
            }
            Self::Search(post) => Ok(Media {
                video: post.content.video.iter().cloned().collect(),
                image: post.content.image.clone().unwrap_or_default(),
            }),
        }
    }

    /// The post this one forwards, fetched by its short id.
    ///
    /// # Errors
    ///
    /// Returns an error if a forward is indicated but its id is unreadable or the lookup fails.
    pub async fn repost(&self, api: &WeiboApi) -> Result<Option<Post>> {
        let Some(id) = self.forward_id()? else {
            return Ok(None);
        };
        debug!(id = %id, "Resolving reposted post");
        let response = api.show(&id).await?;
        Ok(Some(Self::feed(response)?))
    }

    fn forward_id(&self) -> Result<Option<String>> {
        match self {
            Self::Feed(post) => match &post.retweeted_status {
                Some(retweeted) => retweeted
                    .mblogid
                    .clone()
                    .map(Some)
                    .ok_or_else(|| Error::missing("retweeted_status.mblogid")),
                None => Ok(None),
            },
            Self::Search(post) => match &post.content.forward {
                Some(url) => FORWARD_ID
                    .captures(url)
                    .and_then(|caps| caps.get(1))
                    .map(|id| Some(id.as_str().to_string()))
                    .ok_or_else(|| Error::invalid("forward", format!("no post id in {url}"))),
                None => Ok(None),
            },
        }
    }

    /// Handle on the post's comment listing.
    #[must_use]
    pub fn comments(&self) -> Comment {
        match self {
            Self::Feed(post) => Comment::new(post.user.id.to_string(), post.mid.clone()),
            Self::Search(post) => Comment::new(
                post.act.comment.uid.clone(),
                post.act.comment.mid.clone(),
            ),
        }
    }

    #[must_use]
    pub fn engagement(&self) -> Engagement {
        match self {
            Self::Feed(post) => Engagement {
                forward: Count::Exact(post.reposts_count),
                comment: Count::Exact(post.comments_count),
                like: Count::Exact(post.attitudes_count),
            },
            Self::Search(post) => Engagement {
                forward: Count::parse(&post.act.forward),
                comment: Count::parse(&post.act.comment.num),
                like: Count::parse(&post.act.like),
            },
        }
    }
}

fn video_fid(post: &FeedPost) -> Option<String> {
    let long_url = post.url_struct.as_ref()?.first()?.long_url.as_deref()?;
    Some(VIDEO_FID.captures(long_url)?.get(1)?.as_str().to_string())
}

/// Read `data.Component_Play_Playinfo.urls`, stopping at the first absent or mistyped level.
///
/// An object maps quality labels to URLs; an array carries unlabeled URLs.
#[must_use]
pub fn try_video_urls(response: &Value) -> Option<Vec<VideoSource>> {
    let urls = response
        .get("data")?
        .as_object()?
        .get("Component_Play_Playinfo")?
        .as_object()?
        .get("urls")?;

    match urls {
        Value::Object(map) => Some(
            map.iter()
                .filter_map(|(label, url)| Some(video_source(label, url.as_str()?)))
                .collect(),
        ),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|url| Some(video_source("", url.as_str()?)))
                .collect(),
        ),
        _ => None,
    }
}

fn video_source(label: &str, url: &str) -> VideoSource {
    let src = if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    };
    VideoSource {
        kind: label.to_string(),
        src,
    }
}
