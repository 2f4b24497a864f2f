//! Shared constants used across the crate.

/// Browser user agent sent with every request unless overridden.
///
/// The platform serves a degraded page to unknown clients, so this mirrors a desktop Firefox.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:94.0) Gecko/20100101 Firefox/94.0";

/// Base URL for the JSON `ajax` endpoints.
pub const DEFAULT_API_BASE: &str = "https://weibo.com";

/// Base URL for the HTML search pages.
pub const DEFAULT_SEARCH_BASE: &str = "https://s.weibo.com";

/// Default location of the persistent cookie store.
pub const DEFAULT_COOKIES_PATH: &str = "./weibo_cookies.txt";

/// Image host used to build full-size URLs from feed `pic_ids`.
pub const IMAGE_BASE: &str = "https://wx1.sinaimg.cn/large";

/// Time format of `created_at` in feed payloads, e.g. `Sat Nov 20 10:00:00 +0800 2021`.
pub const FEED_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Sentinel present in the rendered text of a truncated post.
pub const EXPAND_MARKER: &str = ">展开</span>";

/// Followers/following listings always return this many users per full page.
pub const FRIENDS_PAGE_SIZE: usize = 20;

/// The hot timeline refuses to page past this many posts.
pub const HOT_TIMELINE_MAX: usize = 400;

/// Maximum number of comments requested in one listing.
pub const COMMENT_LIMIT: usize = 100;

/// Group used by [`crate::Spyder::hot_posts`] when the caller has no preference.
pub const DEFAULT_HOT_GROUP: &str = "24小时榜";

/// Action-bar labels rendered in place of a zero count on search cards.
pub const FORWARD_LABEL: &str = "转发";
pub const COMMENT_LABEL: &str = "评论";
pub const LIKE_LABEL: &str = "赞";
