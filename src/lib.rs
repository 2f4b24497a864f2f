//! Weibo spyder library.
//!
//! Fetches trending boards, hot timelines, search results, users, posts and comments from Weibo
//! and normalizes them into typed entities.

// Allow raw string hashes in fixtures - they're harmless and keep HTML snippets readable
#![allow(clippy::needless_raw_string_hashes)]

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod paginate;
pub mod parse;
pub mod session;
pub mod spyder;
pub mod transport;

pub use api::WeiboApi;
pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
pub use spyder::Spyder;
