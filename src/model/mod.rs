//! Entities built from platform payloads.
//!
//! None of them own a connection: methods that need more data take the [`WeiboApi`] to fetch it
//! with, and fetch again on every call.
//!
//! [`WeiboApi`]: crate::api::WeiboApi

pub mod comment;
pub mod post;
pub mod search;
pub mod user;

pub use comment::{Comment, CommentItem};
pub use post::{Count, Engagement, FeedPost, Media, Post, PostText, SearchPost, VideoSource};
pub use search::{SearchParams, SearchResult, SearchType, TopicStub, UserStub};
pub use user::{Relation, ShortInfo, User, UserRef};
