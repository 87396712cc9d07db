use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    Channel, ChannelMember, ChannelStats, FileInfo, Millis, OpenGraphMetadata, PostList, Preference,
    Team, TeamMember, UserProfile,
};

/// Update records applied to the client state. Controllers never mutate state
/// directly; they dispatch these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Action {
    // -- Entities --
    ReceivedMe(UserProfile),

    ReceivedMyTeams(Vec<Team>),

    SelectTeam { team_id: String },

    /// The user's channels and memberships for a team.
    ReceivedMyChannels {
        team_id: String,
        channels: Vec<Channel>,
        members: Vec<ChannelMember>,
    },

    ReceivedChannel(Channel),

    ReceivedChannelStats(ChannelStats),

    /// The current user left the channel.
    LeftChannel { channel_id: String },

    SelectChannel { channel_id: String },

    ReceivedPosts { channel_id: String, posts: PostList },

    /// Posts changed since a timestamp; merged like any other page.
    ReceivedPostsSince { channel_id: String, posts: PostList },

    /// Posts belonging to a thread, keyed by root.
    ReceivedPostThread { root_id: String, posts: PostList },

    /// Empty string clears the selection.
    SelectPost { post_id: String },

    ReceivedFiles { post_id: String, files: Vec<FileInfo> },

    ReceivedPreferences(Vec<Preference>),

    DeletedPreferences(Vec<Preference>),

    ReceivedTeamMembers { team_id: String, members: Vec<TeamMember> },

    ReceivedProfilesInChannel {
        channel_id: String,
        profiles: Vec<UserProfile>,
    },

    ReceivedProfileInChannel { channel_id: String, user_id: String },

    ReceivedConfig(HashMap<String, String>),

    ReceivedOpenGraph { url: String, metadata: OpenGraphMetadata },

    // -- Device --
    WebsocketConnected { at: Millis },

    DeviceDimensions { width: u32, height: u32 },

    // -- Views --
    SetChannelLoading(bool),

    SetChannelRefreshing(bool),

    SetChannelDisplayName(String),

    /// Marks a "load more" request for the channel as in flight or finished.
    LoadingPosts { channel_id: String, loading: bool },

    IncreasePostVisibility { channel_id: String, amount: usize },

    ReceivedPostsForChannelAtTime { channel_id: String, time: Millis },

    SetLastChannelForTeam { team_id: String, channel_id: String },

    PostDraftChanged { channel_id: String, draft: String },

    PostTooltipVisible(bool),
}

impl Action {
    /// Returns the channel this action is scoped to, if any.
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::ReceivedChannel(channel) => Some(&channel.id),
            Self::ReceivedChannelStats(stats) => Some(&stats.channel_id),
            Self::LeftChannel { channel_id }
            | Self::SelectChannel { channel_id }
            | Self::ReceivedPosts { channel_id, .. }
            | Self::ReceivedPostsSince { channel_id, .. }
            | Self::ReceivedProfilesInChannel { channel_id, .. }
            | Self::ReceivedProfileInChannel { channel_id, .. }
            | Self::LoadingPosts { channel_id, .. }
            | Self::IncreasePostVisibility { channel_id, .. }
            | Self::ReceivedPostsForChannelAtTime { channel_id, .. }
            | Self::SetLastChannelForTeam { channel_id, .. }
            | Self::PostDraftChanged { channel_id, .. } => Some(channel_id),
            _ => None,
        }
    }
}
