use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::post::Post;
use super::user::User;
use crate::api::WeiboApi;
use crate::error::{Error, Result};
use crate::paginate::{clamp_target, Paginator};
use crate::parse::{
    parse_post_card, parse_search_max, parse_topic_card, parse_user_card, select_cards,
};

/// Kind of search page to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Weibo,
    Realtime,
    User,
    Video,
    Topic,
}

impl SearchType {
    /// Path segment of the search page.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weibo => "weibo",
            Self::Realtime => "realtime",
            Self::User => "user",
            Self::Video => "video",
            Self::Topic => "topic",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "weibo" => Ok(Self::Weibo),
            "realtime" => Ok(Self::Realtime),
            "user" => Ok(Self::User),
            "video" => Ok(Self::Video),
            "topic" => Ok(Self::Topic),
            other => Err(Error::UnknownSearchType(other.to_string())),
        }
    }
}

/// Extra query parameters passed through to the search page, e.g. `nodup=1` or `xsort=hot`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams(Vec<(String, String)>);

impl SearchParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.0.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Summary of a user as shown in user search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStub {
    pub url: String,
    pub name: String,
    /// Follower line as displayed, e.g. `粉丝：1.2万`.
    pub num: String,
}

impl UserStub {
    /// Fetch the full user behind this stub.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile URL cannot be resolved or the profile fetch fails.
    pub async fn fetch(&self, api: &WeiboApi) -> Result<User> {
        User::fetch(api, self.url.as_str()).await
    }
}

/// A topic as shown in topic search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStub {
    pub name: String,
    pub num: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SearchResult {
    Post(Post),
    User(UserStub),
    Topic(TopicStub),
}

/// Search for `keyword`, collecting up to `num` results.
///
/// A plain `weibo` search without `nodup` first reads the result total from page one and clamps
/// `num` to it. Topic search always returns the whole first page and nothing more. Other searches
/// page until `num` cards are collected or a page comes back empty.
///
/// # Errors
///
/// Returns an error if any page request fails or a card lacks a required field.
pub async fn search(
    api: &WeiboApi,
    keyword: &str,
    search_type: SearchType,
    num: usize,
    params: &SearchParams,
) -> Result<Vec<SearchResult>> {
    info!(keyword, search_type = %search_type, num, "Searching");

    let cards = if search_type == SearchType::Topic {
        if num == 0 {
            return Ok(Vec::new());
        }
        let page = api.search_page(keyword, search_type, 1, params).await?;
        select_cards(&page, search_type)
    } else {
        let mut target = num;
        let mut first_page = None;
        if search_type == SearchType::Weibo && !params.contains("nodup") {
            let page = api.search_page(keyword, search_type, 1, params).await?;
            if let Some(max) = parse_search_max(&page) {
                target = clamp_target(target, max, "search results");
            }
            first_page = Some(page);
        }

        Paginator::variable(target)
            .collect(|page| {
                let cached = if page == 1 { first_page.take() } else { None };
                async move {
                    let html = match cached {
                        Some(html) => html,
                        None => api.search_page(keyword, search_type, page, params).await?,
                    };
                    Ok::<_, Error>(select_cards(&html, search_type))
                }
            })
            .await?
    };
    debug!(cards = cards.len(), "Collected search cards");

    cards
        .iter()
        .map(|card| parse_card(card, search_type))
        .collect()
}

fn parse_card(card: &str, search_type: SearchType) -> Result<SearchResult> {
    Ok(match search_type {
        SearchType::User => SearchResult::User(parse_user_card(card)?),
        SearchType::Topic => SearchResult::Topic(parse_topic_card(card)?),
        SearchType::Weibo | SearchType::Realtime | SearchType::Video => {
            SearchResult::Post(Post::Search(parse_post_card(card)?))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_from_str() {
        assert_eq!("realtime".parse::<SearchType>().unwrap(), SearchType::Realtime);
        assert_eq!(SearchType::Topic.to_string(), "topic");
        assert!(matches!(
            "pic".parse::<SearchType>(),
            Err(Error::UnknownSearchType(t)) if t == "pic"
        ));
    }

    #[test]
    fn test_search_params() {
        let params = SearchParams::new().with("nodup", 1).with("xsort", "hot");
        assert!(params.contains("nodup"));
        assert!(!params.contains("hasvideo"));
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("nodup", "1"), ("xsort", "hot")]
        );
    }
}
