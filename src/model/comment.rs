use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::WeiboApi;
use crate::constants::COMMENT_LIMIT;
use crate::error::{Error, Result};
use crate::parse::{id_string, json_path, json_str};

/// Comment listing of one post, keyed by author id and post id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    uid: String,
    mid: String,
}

/// One comment reduced to its author and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentItem {
    pub uid: String,
    pub name: String,
    pub created_at: String,
    pub text: String,
    pub text_raw: String,
}

impl Comment {
    #[must_use]
    pub fn new(uid: impl Into<String>, mid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            mid: mid.into(),
        }
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    #[must_use]
    pub fn mid(&self) -> &str {
        &self.mid
    }

    /// Raw comment payloads as returned by the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no `data` array.
    pub async fn raw(&self, api: &WeiboApi) -> Result<Vec<Value>> {
        api.comments(&self.uid, &self.mid).await
    }

    /// Up to 100 comments, in platform order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a comment lacks one of the kept fields.
    pub async fn items(&self, api: &WeiboApi) -> Result<Vec<CommentItem>> {
        self.raw(api)
            .await?
            .iter()
            .take(COMMENT_LIMIT)
            .map(parse_comment)
            .collect()
    }
}

fn parse_comment(comment: &Value) -> Result<CommentItem> {
    Ok(CommentItem {
        uid: id_string(json_path(comment, "user.id")?)
            .ok_or_else(|| Error::invalid("user.id", "expected an identifier"))?,
        name: json_str(comment, "user.name")?.to_string(),
        created_at: json_str(comment, "created_at")?.to_string(),
        text: json_str(comment, "text")?.to_string(),
        text_raw: json_str(comment, "text_raw")?.to_string(),
    })
}
