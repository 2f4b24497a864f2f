//! Authenticated session state shared by every request.
//!
//! A [`Session`] is built once, before any entity is constructed, and is read-only afterwards.

use std::path::Path;

use tracing::debug;

use crate::constants::DEFAULT_USER_AGENT;
use crate::error::{Error, Result};

/// Cookie and user agent attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
    user_agent: String,
}

impl Session {
    /// Create a session from a raw `Cookie` header value.
    #[must_use]
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into().trim().to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Replace the default user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Read the raw cookie string from the persistent cookie store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds no cookie.
    pub fn from_cookie_file(path: &Path) -> Result<Self> {
        let cookie = std::fs::read_to_string(path)?;
        if cookie.trim().is_empty() {
            return Err(Error::invalid(
                path.display().to_string(),
                "cookie file is empty",
            ));
        }
        debug!(path = %path.display(), "Loaded session cookie");
        Ok(Self::new(cookie))
    }

    /// Write a raw cookie string to the persistent cookie store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn store_cookie(path: &Path, cookie: &str) -> Result<()> {
        std::fs::write(path, cookie.trim())?;
        debug!(path = %path.display(), "Stored session cookie");
        Ok(())
    }

    #[must_use]
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Headers every request carries.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Cookie".to_string(), self.cookie.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_cookie() {
        let session = Session::new("  SUB=abc; SUBP=def\n");
        assert_eq!(session.cookie(), "SUB=abc; SUBP=def");
        assert_eq!(session.user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_store_and_load_cookie_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");

        Session::store_cookie(&path, "SUB=abc\n").unwrap();
        let session = Session::from_cookie_file(&path).unwrap();

        assert_eq!(session.cookie(), "SUB=abc");
        let headers = session.headers();
        assert!(headers.contains(&("Cookie".to_string(), "SUB=abc".to_string())));
    }

    #[test]
    fn test_empty_cookie_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "   \n").unwrap();

        assert!(matches!(
            Session::from_cookie_file(&path),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_cookie_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Session::from_cookie_file(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_with_user_agent() {
        let session = Session::new("a=b").with_user_agent("test-agent");
        assert_eq!(session.user_agent(), "test-agent");
    }
}
