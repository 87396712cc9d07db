//! Entity fetches: each call hits the data source, files the payload into the
//! store and hands it back. A failed request yields `None` ("no result"),
//! never an error; callers decide whether to retry.

use tracing::{debug, warn};

use parley_client::{DataSource, FetchError};
use parley_types::actions::Action;
use parley_types::api::NewChannel;
use parley_types::models::{
    Channel, ChannelStats, FileInfo, Millis, PostList, Preference, Team, TeamMember, UserProfile,
};

use crate::store::Store;

fn settle<T>(what: &str, result: Result<T, FetchError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_client_error() => {
            warn!("{} rejected: {}", what, e);
            None
        }
        Err(e) => {
            debug!("{} returned no result: {}", what, e);
            None
        }
    }
}

pub async fn get_me(store: &Store, source: &dyn DataSource) -> Option<UserProfile> {
    let me = settle("get me", source.fetch_me().await)?;
    store.dispatch(Action::ReceivedMe(me.clone())).await;
    Some(me)
}

pub async fn get_my_teams(store: &Store, source: &dyn DataSource) -> Option<Vec<Team>> {
    let teams = settle("get my teams", source.fetch_my_teams().await)?;
    store.dispatch(Action::ReceivedMyTeams(teams.clone())).await;
    Some(teams)
}

/// Returns the number of channels received.
pub async fn fetch_my_channels_and_members(
    store: &Store,
    source: &dyn DataSource,
    team_id: &str,
) -> Option<usize> {
    let (channels, members) = settle(
        "fetch my channels",
        source.fetch_my_channels_and_members(team_id).await,
    )?;
    let count = channels.len();
    store
        .dispatch(Action::ReceivedMyChannels {
            team_id: team_id.to_string(),
            channels,
            members,
        })
        .await;
    Some(count)
}

pub async fn get_channel(store: &Store, source: &dyn DataSource, channel_id: &str) -> Option<Channel> {
    let channel = settle("get channel", source.fetch_channel(channel_id).await)?;
    store.dispatch(Action::ReceivedChannel(channel.clone())).await;
    Some(channel)
}

pub async fn get_channel_stats(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
) -> Option<ChannelStats> {
    let stats = settle("get channel stats", source.fetch_channel_stats(channel_id).await)?;
    store.dispatch(Action::ReceivedChannelStats(stats.clone())).await;
    Some(stats)
}

pub async fn get_posts(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
    page: usize,
    per_page: usize,
) -> Option<PostList> {
    let posts = settle("get posts", source.fetch_posts(channel_id, page, per_page).await)?;
    store
        .dispatch(Action::ReceivedPosts {
            channel_id: channel_id.to_string(),
            posts: posts.clone(),
        })
        .await;
    Some(posts)
}

pub async fn get_posts_since(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
    since: Millis,
) -> Option<PostList> {
    let posts = settle(
        "get posts since",
        source.fetch_posts_since(channel_id, since).await,
    )?;
    store
        .dispatch(Action::ReceivedPostsSince {
            channel_id: channel_id.to_string(),
            posts: posts.clone(),
        })
        .await;
    Some(posts)
}

pub async fn get_posts_before(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
    post_id: &str,
    page: usize,
    per_page: usize,
) -> Option<PostList> {
    let posts = settle(
        "get posts before",
        source
            .fetch_posts_before(channel_id, post_id, page, per_page)
            .await,
    )?;
    store
        .dispatch(Action::ReceivedPosts {
            channel_id: channel_id.to_string(),
            posts: posts.clone(),
        })
        .await;
    Some(posts)
}

pub async fn get_post_thread(store: &Store, source: &dyn DataSource, root_id: &str) -> Option<PostList> {
    let posts = settle("get post thread", source.fetch_post_thread(root_id).await)?;
    store
        .dispatch(Action::ReceivedPostThread {
            root_id: root_id.to_string(),
            posts: posts.clone(),
        })
        .await;
    Some(posts)
}

pub async fn get_files_for_post(
    store: &Store,
    source: &dyn DataSource,
    post_id: &str,
) -> Option<Vec<FileInfo>> {
    let files = settle("get files for post", source.fetch_files_for_post(post_id).await)?;
    store
        .dispatch(Action::ReceivedFiles {
            post_id: post_id.to_string(),
            files: files.clone(),
        })
        .await;
    Some(files)
}

pub async fn save_preferences(
    store: &Store,
    source: &dyn DataSource,
    user_id: &str,
    preferences: Vec<Preference>,
) -> Option<()> {
    settle(
        "save preferences",
        source.save_preferences(user_id, &preferences).await,
    )?;
    store.dispatch(Action::ReceivedPreferences(preferences)).await;
    Some(())
}

pub async fn delete_preferences(
    store: &Store,
    source: &dyn DataSource,
    user_id: &str,
    preferences: Vec<Preference>,
) -> Option<()> {
    settle(
        "delete preferences",
        source.delete_preferences(user_id, &preferences).await,
    )?;
    store.dispatch(Action::DeletedPreferences(preferences)).await;
    Some(())
}

pub async fn get_team_members_by_ids(
    store: &Store,
    source: &dyn DataSource,
    team_id: &str,
    user_ids: &[String],
) -> Option<Vec<TeamMember>> {
    let members = settle(
        "get team members by ids",
        source.fetch_team_members_by_ids(team_id, user_ids).await,
    )?;
    store
        .dispatch(Action::ReceivedTeamMembers {
            team_id: team_id.to_string(),
            members: members.clone(),
        })
        .await;
    Some(members)
}

pub async fn get_profiles_in_channel(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
    page: usize,
    per_page: usize,
) -> Option<Vec<UserProfile>> {
    let profiles = settle(
        "get profiles in channel",
        source
            .fetch_profiles_in_channel(channel_id, page, per_page)
            .await,
    )?;
    store
        .dispatch(Action::ReceivedProfilesInChannel {
            channel_id: channel_id.to_string(),
            profiles: profiles.clone(),
        })
        .await;
    Some(profiles)
}

pub async fn create_channel(store: &Store, source: &dyn DataSource, channel: &NewChannel) -> Option<Channel> {
    let created = settle("create channel", source.create_channel(channel).await)?;
    store.dispatch(Action::ReceivedChannel(created.clone())).await;
    Some(created)
}

pub async fn leave_channel(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
    user_id: &str,
) -> Option<()> {
    settle("leave channel", source.leave_channel(channel_id, user_id).await)?;
    store
        .dispatch(Action::LeftChannel {
            channel_id: channel_id.to_string(),
        })
        .await;
    Some(())
}
