use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use parley_types::api::{NewChannel, PostsQuery, ProfilesInChannelQuery, ServerError};
use parley_types::models::{
    Channel, ChannelMember, ChannelStats, FileInfo, Millis, PostList, Preference, Team, TeamMember,
    UserProfile,
};

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::source::DataSource;

/// [`DataSource`] backed by the server's REST API (v4).
#[derive(Clone)]
pub struct HttpDataSource {
    client: Client,
    api_root: Url,
    token: String,
}

impl HttpDataSource {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let mut api_root = config.server_url.clone();
        api_root
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["api", "v4"]);

        Ok(Self {
            client,
            api_root,
            token: config.token.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", url.path());
        let response = self.authorized(self.client.get(url)).send().await?;
        decode(response).await
    }

    async fn get_posts(&self, channel_id: &str, query: &PostsQuery) -> Result<PostList, FetchError> {
        let url = self.url(&["channels", channel_id, "posts"])?;
        debug!("GET {} {:?}", url.path(), query);
        let response = self
            .authorized(self.client.get(url).query(query))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let response = check_status(response).await?;
    Ok(response.json::<T>().await?)
}

/// Turns non-2xx responses into [`FetchError::Status`], preferring the
/// server's own error message over the raw body.
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ServerError>(&body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(body);

    Err(FetchError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_me(&self) -> Result<UserProfile, FetchError> {
        self.get(self.url(&["users", "me"])?).await
    }

    async fn fetch_my_teams(&self) -> Result<Vec<Team>, FetchError> {
        self.get(self.url(&["users", "me", "teams"])?).await
    }

    async fn fetch_my_channels_and_members(
        &self,
        team_id: &str,
    ) -> Result<(Vec<Channel>, Vec<ChannelMember>), FetchError> {
        let channels = self
            .get(self.url(&["users", "me", "teams", team_id, "channels"])?)
            .await?;
        let members = self
            .get(self.url(&["users", "me", "teams", team_id, "channels", "members"])?)
            .await?;
        Ok((channels, members))
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, FetchError> {
        self.get(self.url(&["channels", channel_id])?).await
    }

    async fn fetch_channel_stats(&self, channel_id: &str) -> Result<ChannelStats, FetchError> {
        self.get(self.url(&["channels", channel_id, "stats"])?).await
    }

    async fn fetch_posts(
        &self,
        channel_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostList, FetchError> {
        self.get_posts(channel_id, &PostsQuery::page(page, per_page)).await
    }

    async fn fetch_posts_since(&self, channel_id: &str, since: Millis) -> Result<PostList, FetchError> {
        self.get_posts(channel_id, &PostsQuery::since(since)).await
    }

    async fn fetch_posts_before(
        &self,
        channel_id: &str,
        post_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostList, FetchError> {
        self.get_posts(channel_id, &PostsQuery::before(post_id, page, per_page))
            .await
    }

    async fn fetch_post_thread(&self, root_id: &str) -> Result<PostList, FetchError> {
        self.get(self.url(&["posts", root_id, "thread"])?).await
    }

    async fn fetch_files_for_post(&self, post_id: &str) -> Result<Vec<FileInfo>, FetchError> {
        self.get(self.url(&["posts", post_id, "files", "info"])?).await
    }

    async fn save_preferences(&self, user_id: &str, preferences: &[Preference]) -> Result<(), FetchError> {
        let url = self.url(&["users", user_id, "preferences"])?;
        debug!("PUT {} ({} preferences)", url.path(), preferences.len());
        let response = self
            .authorized(self.client.put(url).json(preferences))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_preferences(&self, user_id: &str, preferences: &[Preference]) -> Result<(), FetchError> {
        let url = self.url(&["users", user_id, "preferences", "delete"])?;
        debug!("POST {} ({} preferences)", url.path(), preferences.len());
        let response = self
            .authorized(self.client.post(url).json(preferences))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_team_members_by_ids(
        &self,
        team_id: &str,
        user_ids: &[String],
    ) -> Result<Vec<TeamMember>, FetchError> {
        let url = self.url(&["teams", team_id, "members", "ids"])?;
        debug!("POST {} ({} ids)", url.path(), user_ids.len());
        let response = self
            .authorized(self.client.post(url).json(user_ids))
            .send()
            .await?;
        decode(response).await
    }

    async fn fetch_profiles_in_channel(
        &self,
        channel_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<UserProfile>, FetchError> {
        let url = self.url(&["users"])?;
        let query = ProfilesInChannelQuery {
            in_channel: channel_id.to_string(),
            page,
            per_page,
        };
        debug!("GET {} {:?}", url.path(), query);
        let response = self
            .authorized(self.client.get(url).query(&query))
            .send()
            .await?;
        decode(response).await
    }

    async fn create_channel(&self, channel: &NewChannel) -> Result<Channel, FetchError> {
        let url = self.url(&["channels"])?;
        debug!("POST {} name={}", url.path(), channel.name);
        let response = self
            .authorized(self.client.post(url).json(channel))
            .send()
            .await?;
        decode(response).await
    }

    async fn leave_channel(&self, channel_id: &str, user_id: &str) -> Result<(), FetchError> {
        let url = self.url(&["channels", channel_id, "members", user_id])?;
        debug!("DELETE {}", url.path());
        let response = self.authorized(self.client.delete(url)).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
