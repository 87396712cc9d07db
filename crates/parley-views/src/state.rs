use std::collections::{BTreeMap, HashMap, HashSet};

use parley_types::actions::Action;
use parley_types::constants::{
    CATEGORY_DIRECT_CHANNEL_SHOW, CATEGORY_FAVORITE_CHANNEL, CATEGORY_GROUP_CHANNEL_SHOW,
    POST_VISIBILITY_CHUNK_SIZE,
};
use parley_types::models::{
    Channel, ChannelMember, ChannelStats, ChannelType, FileInfo, Millis, OpenGraphMetadata, Post,
    PostList, Preference, Team, UserProfile,
};

/// The whole client state. Only [`AppState::apply`] mutates it.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub entities: Entities,
    pub views: Views,
    pub device: DeviceState,
}

#[derive(Debug, Clone, Default)]
pub struct Entities {
    pub channels: ChannelsState,
    pub posts: PostsState,
    pub preferences: PreferencesState,
    pub users: UsersState,
    pub teams: TeamsState,
    pub files: FilesState,
    /// Server configuration, string values as the server sends them.
    pub config: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelsState {
    pub current_channel_id: String,
    /// Ordered by id so "first channel of a team" is deterministic.
    pub channels: BTreeMap<String, Channel>,
    pub my_members: HashMap<String, ChannelMember>,
    pub stats: HashMap<String, ChannelStats>,
}

#[derive(Debug, Clone, Default)]
pub struct PostsState {
    pub posts: HashMap<String, Post>,
    /// Post ids per channel, newest first.
    pub posts_in_channel: HashMap<String, Vec<String>>,
    pub selected_post_id: String,
    pub open_graph: HashMap<String, OpenGraphMetadata>,
}

#[derive(Debug, Clone, Default)]
pub struct PreferencesState {
    /// Keyed by `(category, name)`.
    pub my_preferences: HashMap<(String, String), Preference>,
}

impl PreferencesState {
    pub fn get(&self, category: &str, name: &str) -> Option<&Preference> {
        self.my_preferences
            .get(&(category.to_string(), name.to_string()))
    }

    pub fn is_true(&self, category: &str, name: &str) -> bool {
        self.get(category, name).is_some_and(Preference::is_true)
    }

    /// All preferences of a category keyed by name.
    pub fn by_category(&self, category: &str) -> BTreeMap<String, Preference> {
        self.my_preferences
            .values()
            .filter(|p| p.category == category)
            .map(|p| (p.name.clone(), p.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsersState {
    pub current_user_id: String,
    pub profiles: HashMap<String, UserProfile>,
    pub profiles_in_channel: HashMap<String, HashSet<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamsState {
    pub current_team_id: String,
    pub teams: HashMap<String, Team>,
    pub members_in_team: HashMap<String, HashSet<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct FilesState {
    pub files: HashMap<String, FileInfo>,
    pub file_ids_by_post_id: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct Views {
    pub channel: ChannelView,
    pub team: TeamView,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelView {
    pub display_name: String,
    pub loading: bool,
    pub refreshing: bool,
    pub tooltip_visible: bool,
    pub drafts: HashMap<String, String>,
    /// How many posts of each channel the post list renders.
    pub post_visibility: HashMap<String, usize>,
    /// Channels with a "load more" request in flight.
    pub loading_posts: HashMap<String, bool>,
    /// When posts were last fetched for each channel.
    pub last_get_posts: HashMap<String, Millis>,
}

impl ChannelView {
    pub fn is_loading_posts(&self, channel_id: &str) -> bool {
        self.loading_posts.get(channel_id).copied().unwrap_or(false)
    }

    pub fn post_visibility(&self, channel_id: &str) -> usize {
        self.post_visibility.get(channel_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamView {
    pub last_channel_for_team: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Last time the websocket (re)connected.
    pub last_connect_at: Millis,
    pub width: u32,
    pub height: u32,
}

impl AppState {
    pub fn current_user_id(&self) -> &str {
        &self.entities.users.current_user_id
    }

    pub fn current_team_id(&self) -> &str {
        &self.entities.teams.current_team_id
    }

    pub fn current_channel_id(&self) -> &str {
        &self.entities.channels.current_channel_id
    }

    pub fn channel(&self, channel_id: &str) -> Option<&Channel> {
        self.entities.channels.channels.get(channel_id)
    }

    pub fn channel_by_name(&self, name: &str) -> Option<&Channel> {
        self.entities
            .channels
            .channels
            .values()
            .find(|c| c.name == name)
    }

    pub fn my_member(&self, channel_id: &str) -> Option<&ChannelMember> {
        self.entities.channels.my_members.get(channel_id)
    }

    pub fn post_ids_in_channel(&self, channel_id: &str) -> Option<&Vec<String>> {
        self.entities.posts.posts_in_channel.get(channel_id)
    }

    pub fn is_direct_channel_visible(&self, channel: &Channel) -> bool {
        channel
            .teammate_id(self.current_user_id())
            .is_some_and(|teammate| {
                self.entities
                    .preferences
                    .is_true(CATEGORY_DIRECT_CHANNEL_SHOW, &teammate)
            })
    }

    pub fn is_group_channel_visible(&self, channel: &Channel) -> bool {
        channel.is_group()
            && self
                .entities
                .preferences
                .is_true(CATEGORY_GROUP_CHANNEL_SHOW, &channel.id)
    }

    pub fn is_favorite(&self, channel_id: &str) -> bool {
        self.entities
            .preferences
            .is_true(CATEGORY_FAVORITE_CHANNEL, channel_id)
    }

    /// Applies one update record.
    pub fn apply(&mut self, action: Action) {
        match action {
            // -- Entities --
            Action::ReceivedMe(profile) => {
                self.entities.users.current_user_id = profile.id.clone();
                self.entities.users.profiles.insert(profile.id.clone(), profile);
            }
            Action::ReceivedMyTeams(teams) => {
                for team in teams {
                    self.entities.teams.teams.insert(team.id.clone(), team);
                }
            }
            Action::SelectTeam { team_id } => {
                self.entities.teams.current_team_id = team_id;
            }
            Action::ReceivedMyChannels { channels, members, .. } => {
                let state = &mut self.entities.channels;
                for channel in channels {
                    state.channels.insert(channel.id.clone(), channel);
                }
                for member in members {
                    state.my_members.insert(member.channel_id.clone(), member);
                }
            }
            Action::ReceivedChannel(channel) => {
                self.entities
                    .channels
                    .channels
                    .insert(channel.id.clone(), channel);
            }
            Action::ReceivedChannelStats(stats) => {
                self.entities
                    .channels
                    .stats
                    .insert(stats.channel_id.clone(), stats);
            }
            Action::LeftChannel { channel_id } => {
                let state = &mut self.entities.channels;
                state.my_members.remove(&channel_id);
                // Private channels are no longer readable once left.
                if state
                    .channels
                    .get(&channel_id)
                    .is_some_and(|c| c.channel_type == ChannelType::Private)
                {
                    state.channels.remove(&channel_id);
                }
            }
            Action::SelectChannel { channel_id } => {
                self.views
                    .channel
                    .post_visibility
                    .entry(channel_id.clone())
                    .or_insert(POST_VISIBILITY_CHUNK_SIZE);
                self.entities.channels.current_channel_id = channel_id;
            }
            Action::ReceivedPosts { channel_id, posts }
            | Action::ReceivedPostsSince { channel_id, posts } => {
                self.merge_posts(Some(&channel_id), posts);
            }
            Action::ReceivedPostThread { posts, .. } => {
                self.merge_posts(None, posts);
            }
            Action::SelectPost { post_id } => {
                self.entities.posts.selected_post_id = post_id;
            }
            Action::ReceivedFiles { post_id, files } => {
                let state = &mut self.entities.files;
                let ids = files.iter().map(|f| f.id.clone()).collect();
                for file in files {
                    state.files.insert(file.id.clone(), file);
                }
                state.file_ids_by_post_id.insert(post_id, ids);
            }
            Action::ReceivedPreferences(preferences) => {
                for pref in preferences {
                    self.entities
                        .preferences
                        .my_preferences
                        .insert(pref.key(), pref);
                }
            }
            Action::DeletedPreferences(preferences) => {
                for pref in preferences {
                    self.entities.preferences.my_preferences.remove(&pref.key());
                }
            }
            Action::ReceivedTeamMembers { team_id, members } => {
                let in_team = self
                    .entities
                    .teams
                    .members_in_team
                    .entry(team_id)
                    .or_default();
                in_team.extend(members.into_iter().map(|m| m.user_id));
            }
            Action::ReceivedProfilesInChannel { channel_id, profiles } => {
                let users = &mut self.entities.users;
                let in_channel = users.profiles_in_channel.entry(channel_id).or_default();
                for profile in profiles {
                    in_channel.insert(profile.id.clone());
                    users.profiles.insert(profile.id.clone(), profile);
                }
            }
            Action::ReceivedProfileInChannel { channel_id, user_id } => {
                self.entities
                    .users
                    .profiles_in_channel
                    .entry(channel_id)
                    .or_default()
                    .insert(user_id);
            }
            Action::ReceivedConfig(config) => {
                self.entities.config.extend(config);
            }
            Action::ReceivedOpenGraph { url, metadata } => {
                self.entities.posts.open_graph.insert(url, metadata);
            }

            // -- Device --
            Action::WebsocketConnected { at } => {
                self.device.last_connect_at = at;
            }
            Action::DeviceDimensions { width, height } => {
                self.device.width = width;
                self.device.height = height;
            }

            // -- Views --
            Action::SetChannelLoading(loading) => self.views.channel.loading = loading,
            Action::SetChannelRefreshing(refreshing) => self.views.channel.refreshing = refreshing,
            Action::SetChannelDisplayName(name) => self.views.channel.display_name = name,
            Action::PostTooltipVisible(visible) => self.views.channel.tooltip_visible = visible,
            Action::LoadingPosts { channel_id, loading } => {
                self.views.channel.loading_posts.insert(channel_id, loading);
            }
            Action::IncreasePostVisibility { channel_id, amount } => {
                *self
                    .views
                    .channel
                    .post_visibility
                    .entry(channel_id)
                    .or_default() += amount;
            }
            Action::ReceivedPostsForChannelAtTime { channel_id, time } => {
                self.views.channel.last_get_posts.insert(channel_id, time);
            }
            Action::SetLastChannelForTeam { team_id, channel_id } => {
                self.views
                    .team
                    .last_channel_for_team
                    .insert(team_id, channel_id);
            }
            Action::PostDraftChanged { channel_id, draft } => {
                self.views.channel.drafts.insert(channel_id, draft);
            }
        }
    }

    /// Stores post bodies and adds their ids to the owning channel's list,
    /// keeping each list newest first without duplicates. With `channel_id`
    /// set, the page's order is filed under that channel.
    fn merge_posts(&mut self, channel_id: Option<&str>, list: PostList) {
        let state = &mut self.entities.posts;
        let mut touched: HashSet<String> = HashSet::new();

        for id in &list.order {
            let Some(post) = list.posts.get(id) else {
                continue;
            };
            let channel = channel_id.unwrap_or(post.channel_id.as_str()).to_string();
            state
                .posts_in_channel
                .entry(channel.clone())
                .or_default()
                .push(id.clone());
            touched.insert(channel);
        }

        state.posts.extend(list.posts);

        for channel in touched {
            if let Some(ids) = state.posts_in_channel.get_mut(&channel) {
                let posts = &state.posts;
                let created = |id: &String| posts.get(id).map(|p| p.create_at).unwrap_or(0);
                ids.sort_by(|a, b| created(b).cmp(&created(a)).then_with(|| b.cmp(a)));
                ids.dedup();
            }
        }
    }
}
