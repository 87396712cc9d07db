use async_trait::async_trait;

use parley_types::api::NewChannel;
use parley_types::models::{
    Channel, ChannelMember, ChannelStats, FileInfo, Millis, PostList, Preference, Team, TeamMember,
    UserProfile,
};

use crate::error::FetchError;

/// Everything the view layer needs from the server.
///
/// Implementations perform the request and return the payload; they do not
/// touch client state. The view layer decides what a failure means.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_me(&self) -> Result<UserProfile, FetchError>;

    async fn fetch_my_teams(&self) -> Result<Vec<Team>, FetchError>;

    async fn fetch_my_channels_and_members(
        &self,
        team_id: &str,
    ) -> Result<(Vec<Channel>, Vec<ChannelMember>), FetchError>;

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, FetchError>;

    async fn fetch_channel_stats(&self, channel_id: &str) -> Result<ChannelStats, FetchError>;

    /// A page of posts, newest first.
    async fn fetch_posts(
        &self,
        channel_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostList, FetchError>;

    /// Every post created or changed after `since`.
    async fn fetch_posts_since(&self, channel_id: &str, since: Millis) -> Result<PostList, FetchError>;

    /// A page of posts older than `post_id`.
    async fn fetch_posts_before(
        &self,
        channel_id: &str,
        post_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostList, FetchError>;

    async fn fetch_post_thread(&self, root_id: &str) -> Result<PostList, FetchError>;

    async fn fetch_files_for_post(&self, post_id: &str) -> Result<Vec<FileInfo>, FetchError>;

    async fn save_preferences(&self, user_id: &str, preferences: &[Preference]) -> Result<(), FetchError>;

    async fn delete_preferences(&self, user_id: &str, preferences: &[Preference]) -> Result<(), FetchError>;

    async fn fetch_team_members_by_ids(
        &self,
        team_id: &str,
        user_ids: &[String],
    ) -> Result<Vec<TeamMember>, FetchError>;

    async fn fetch_profiles_in_channel(
        &self,
        channel_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<UserProfile>, FetchError>;

    async fn create_channel(&self, channel: &NewChannel) -> Result<Channel, FetchError>;

    async fn leave_channel(&self, channel_id: &str, user_id: &str) -> Result<(), FetchError>;
}
