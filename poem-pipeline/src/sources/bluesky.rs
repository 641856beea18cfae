use crate::traits::{FeedApi, FeedCredentials, FeedPage, Session};
use crate::types::{FetchConfig, PipelineError, Result, MAX_PAGE_SIZE};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const CREATE_SESSION: &str = "xrpc/com.atproto.server.createSession";
const GET_AUTHOR_FEED: &str = "xrpc/app.bsky.feed.getAuthorFeed";

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    access_jwt: Option<String>,
    did: Option<String>,
}

/// XRPC client for a Bluesky PDS.
pub struct BlueskyClient {
    client: Client,
    session_url: Url,
    feed_url: Url,
}

impl BlueskyClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        let base = Url::parse(&config.service_url)?;

        Ok(Self {
            client,
            session_url: base.join(CREATE_SESSION)?,
            feed_url: base.join(GET_AUTHOR_FEED)?,
        })
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(PipelineError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl FeedApi for BlueskyClient {
    async fn create_session(&self, credentials: &FeedCredentials) -> Result<Session> {
        debug!(identifier = %credentials.identifier, "Creating feed session");

        let response = self
            .client
            .post(self.session_url.clone())
            .json(&CreateSessionRequest {
                identifier: &credentials.identifier,
                password: &credentials.password,
            })
            .send()
            .await?;

        let body: CreateSessionResponse = Self::ensure_success(response).await?.json().await?;

        match (body.access_jwt, body.did) {
            (Some(access_jwt), Some(did)) if !access_jwt.is_empty() && !did.is_empty() => {
                info!(did = %did, "Authenticated with feed service");
                Ok(Session { access_jwt, did })
            }
            _ => Err(PipelineError::Auth(
                "session response is missing accessJwt or did".to_string(),
            )),
        }
    }

    async fn author_feed(
        &self,
        session: &Session,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FeedPage> {
        let mut query = vec![
            ("actor", session.did.clone()),
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let response = self
            .client
            .get(self.feed_url.clone())
            .bearer_auth(&session.access_jwt)
            .query(&query)
            .send()
            .await?;

        let page: FeedPage = Self::ensure_success(response).await?.json().await?;
        debug!(items = page.feed.len(), has_cursor = page.cursor.is_some(), "Fetched feed page");
        Ok(page)
    }
}
