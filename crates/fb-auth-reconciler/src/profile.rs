//! Optional profile enrichment before the login exchange.

use crate::{AuthResponse, BridgeError, BridgeResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

/// Default Graph API location.
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/";

const GRAPH_PROFILE_FIELDS: &str = "id,email,first_name,last_name,gender,birthday";

/// Profile fields forwarded with the login exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// Provider ids of the user's friends.
    pub friends: Vec<String>,
}

impl ProfileFields {
    pub fn is_empty(&self) -> bool {
        *self == ProfileFields::default()
    }
}

/// Fetches profile fields for a connected identity.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(&self, auth: &AuthResponse) -> BridgeResult<ProfileFields>;
}

/// Forwards raw tokens only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProfileFetch;

#[async_trait]
impl ProfileFetcher for NoProfileFetch {
    async fn fetch(&self, _auth: &AuthResponse) -> BridgeResult<ProfileFields> {
        Ok(ProfileFields::default())
    }
}

#[derive(Debug, Deserialize)]
struct GraphUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    /// `MM/DD/YYYY`, or partial (`MM/DD`, `YYYY`) depending on the user's privacy settings.
    #[serde(default)]
    birthday: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphFriends {
    #[serde(default)]
    data: Vec<GraphFriend>,
}

#[derive(Debug, Deserialize)]
struct GraphFriend {
    id: String,
}

/// Reads the profile from the Graph API `/me` endpoint, and optionally the
/// friends list from `/me/friends`.
///
/// The access token travels in the `Authorization` header so that request
/// URLs, which end up in error messages, never carry it.
#[derive(Debug, Clone)]
pub struct GraphProfileFetcher {
    http_client: Client,
    base_url: Url,
    friends: bool,
}

impl GraphProfileFetcher {
    pub fn new(http_client: Client, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
            friends: false,
        }
    }

    /// Fetcher against the public Graph API.
    pub fn with_defaults(http_client: Client) -> BridgeResult<Self> {
        Ok(Self::new(http_client, Url::parse(DEFAULT_GRAPH_API_URL)?))
    }

    /// Also forward the friends list.
    pub fn with_friends(mut self, enabled: bool) -> Self {
        self.friends = enabled;
        self
    }

    fn me_url(&self) -> BridgeResult<Url> {
        let mut url = self.base_url.join("me")?;
        url.query_pairs_mut().append_pair("fields", GRAPH_PROFILE_FIELDS);
        Ok(url)
    }

    fn friends_url(&self) -> BridgeResult<Url> {
        let mut url = self.base_url.join("me/friends")?;
        url.query_pairs_mut().append_pair("fields", "id");
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> BridgeResult<Response> {
        let response = request.send().await.map_err(|e| {
            let e = e.without_url();
            warn!(error = %e, "{} request failed", what);
            BridgeError::Transport(format!("{} request failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "{} request answered with an error status", what);
            return Err(BridgeError::Transport(format!(
                "{} request failed: HTTP {}",
                what, status
            )));
        }
        Ok(response)
    }

    async fn fetch_friends(&self, auth: &AuthResponse) -> BridgeResult<Vec<String>> {
        let request = self
            .http_client
            .get(self.friends_url()?)
            .bearer_auth(&auth.access_token);
        let friends: GraphFriends = self
            .send(request, "Friends")
            .await?
            .json()
            .await
            .map_err(|e| {
                BridgeError::Transport(format!("Malformed friends response: {}", e.without_url()))
            })?;
        Ok(friends.data.into_iter().map(|friend| friend.id).collect())
    }
}

#[async_trait]
impl ProfileFetcher for GraphProfileFetcher {
    async fn fetch(&self, auth: &AuthResponse) -> BridgeResult<ProfileFields> {
        debug!(user_id = %auth.user_id, "Fetching provider profile");

        let request = self
            .http_client
            .get(self.me_url()?)
            .bearer_auth(&auth.access_token);
        let user: GraphUser = self
            .send(request, "Profile")
            .await?
            .json()
            .await
            .map_err(|e| {
                BridgeError::Transport(format!("Malformed profile response: {}", e.without_url()))
            })?;

        if user.id != auth.user_id {
            warn!(
                expected = %auth.user_id,
                actual = %user.id,
                "Profile belongs to another user"
            );
            return Err(BridgeError::Transport(
                "Profile does not match the connected user".to_string(),
            ));
        }

        let friends = if self.friends {
            self.fetch_friends(auth).await.unwrap_or_else(|e| {
                warn!(error = %e, user_id = %auth.user_id, "Friends list unavailable");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        Ok(ProfileFields {
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            gender: user.gender,
            birthday: user.birthday.as_deref().and_then(parse_graph_birthday),
            friends,
        })
    }
}

/// Only full dates are kept.
fn parse_graph_birthday(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}
