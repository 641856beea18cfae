use crate::types::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Username and app password for the feed service.
#[derive(Clone)]
pub struct FeedCredentials {
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for FeedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCredentials")
            .field("identifier", &self.identifier)
            .field("password", &"***")
            .finish()
    }
}

/// An authenticated session: bearer token plus the account's DID.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_jwt: String,
    pub did: String,
}

/// One page of an author feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub feed: Vec<FeedViewPost>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedViewPost {
    #[serde(default)]
    pub post: PostView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostView {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub record: PostRecord,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Transport to the feed service. The pagination policy lives in
/// `FeedFetcher`; implementations only move bytes.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Create a session. Fails on non-2xx or when the token or DID is missing.
    async fn create_session(&self, credentials: &FeedCredentials) -> Result<Session>;

    /// Fetch one page of the author feed for `session.did`.
    async fn author_feed(
        &self,
        session: &Session,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FeedPage>;
}

#[async_trait]
impl<T: FeedApi + ?Sized> FeedApi for std::sync::Arc<T> {
    async fn create_session(&self, credentials: &FeedCredentials) -> Result<Session> {
        (**self).create_session(credentials).await
    }

    async fn author_feed(
        &self,
        session: &Session,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FeedPage> {
        (**self).author_feed(session, limit, cursor).await
    }
}
