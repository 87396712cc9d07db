//! In-memory data source and fixtures for view-layer tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use parley_client::{DataSource, FetchError};
use parley_types::api::NewChannel;
use parley_types::models::{
    Channel, ChannelMember, ChannelStats, ChannelType, FileInfo, Millis, Post, PostList, Preference,
    Team, TeamMember, UserProfile,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Me,
    MyTeams,
    MyChannels(String),
    Channel(String),
    ChannelStats(String),
    Posts { channel_id: String, page: usize, per_page: usize },
    PostsSince { channel_id: String, since: Millis },
    PostsBefore { channel_id: String, post_id: String, page: usize, per_page: usize },
    Thread(String),
    Files(String),
    SavePreferences(Vec<Preference>),
    DeletePreferences(Vec<Preference>),
    TeamMembers { team_id: String, user_ids: Vec<String> },
    ProfilesInChannel { channel_id: String, page: usize },
    CreateChannel(NewChannel),
    LeaveChannel(String),
}

/// Records every call. Post fetches answer from a script (`None` = failed
/// request) and fall back to an empty page once the script runs out.
#[derive(Default)]
pub struct FakeSource {
    calls: Mutex<Vec<Call>>,
    posts: Mutex<VecDeque<Option<PostList>>>,
    failing: Mutex<HashSet<&'static str>>,
    pub me: Mutex<UserProfile>,
    pub my_channels: Mutex<(Vec<Channel>, Vec<ChannelMember>)>,
    pub remote_channels: Mutex<HashMap<String, Channel>>,
    pub files: Mutex<Vec<FileInfo>>,
    /// Yield to the scheduler inside post fetches, letting other tasks run.
    pub yield_on_posts: AtomicBool,
}

impl FakeSource {
    pub fn push_posts(&self, result: Option<PostList>) {
        self.posts.lock().unwrap().push_back(result);
    }

    /// Makes every call to `method` fail.
    pub fn fail(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, method: &'static str) -> Result<(), FetchError> {
        if self.failing.lock().unwrap().contains(method) {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn next_posts(&self) -> Result<PostList, FetchError> {
        if self.yield_on_posts.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        match self.posts.lock().unwrap().pop_front() {
            Some(Some(list)) => Ok(list),
            Some(None) => Err(unavailable()),
            None => Ok(PostList::default()),
        }
    }
}

fn unavailable() -> FetchError {
    FetchError::Status {
        status: 503,
        message: "unavailable".into(),
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch_me(&self) -> Result<UserProfile, FetchError> {
        self.record(Call::Me);
        self.check("fetch_me")?;
        Ok(self.me.lock().unwrap().clone())
    }

    async fn fetch_my_teams(&self) -> Result<Vec<Team>, FetchError> {
        self.record(Call::MyTeams);
        self.check("fetch_my_teams")?;
        Ok(vec![Team {
            id: "t1".into(),
            name: "team-one".into(),
            display_name: "Team One".into(),
        }])
    }

    async fn fetch_my_channels_and_members(
        &self,
        team_id: &str,
    ) -> Result<(Vec<Channel>, Vec<ChannelMember>), FetchError> {
        self.record(Call::MyChannels(team_id.to_string()));
        self.check("fetch_my_channels_and_members")?;
        Ok(self.my_channels.lock().unwrap().clone())
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, FetchError> {
        self.record(Call::Channel(channel_id.to_string()));
        self.check("fetch_channel")?;
        self.remote_channels
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .ok_or(FetchError::Status {
                status: 404,
                message: "not found".into(),
            })
    }

    async fn fetch_channel_stats(&self, channel_id: &str) -> Result<ChannelStats, FetchError> {
        self.record(Call::ChannelStats(channel_id.to_string()));
        self.check("fetch_channel_stats")?;
        Ok(ChannelStats {
            channel_id: channel_id.to_string(),
            member_count: 2,
        })
    }

    async fn fetch_posts(
        &self,
        channel_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostList, FetchError> {
        self.record(Call::Posts {
            channel_id: channel_id.to_string(),
            page,
            per_page,
        });
        self.next_posts().await
    }

    async fn fetch_posts_since(&self, channel_id: &str, since: Millis) -> Result<PostList, FetchError> {
        self.record(Call::PostsSince {
            channel_id: channel_id.to_string(),
            since,
        });
        self.next_posts().await
    }

    async fn fetch_posts_before(
        &self,
        channel_id: &str,
        post_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostList, FetchError> {
        self.record(Call::PostsBefore {
            channel_id: channel_id.to_string(),
            post_id: post_id.to_string(),
            page,
            per_page,
        });
        self.next_posts().await
    }

    async fn fetch_post_thread(&self, root_id: &str) -> Result<PostList, FetchError> {
        self.record(Call::Thread(root_id.to_string()));
        self.next_posts().await
    }

    async fn fetch_files_for_post(&self, post_id: &str) -> Result<Vec<FileInfo>, FetchError> {
        self.record(Call::Files(post_id.to_string()));
        self.check("fetch_files_for_post")?;
        Ok(self.files.lock().unwrap().clone())
    }

    async fn save_preferences(&self, _user_id: &str, preferences: &[Preference]) -> Result<(), FetchError> {
        self.record(Call::SavePreferences(preferences.to_vec()));
        self.check("save_preferences")
    }

    async fn delete_preferences(&self, _user_id: &str, preferences: &[Preference]) -> Result<(), FetchError> {
        self.record(Call::DeletePreferences(preferences.to_vec()));
        self.check("delete_preferences")
    }

    async fn fetch_team_members_by_ids(
        &self,
        team_id: &str,
        user_ids: &[String],
    ) -> Result<Vec<TeamMember>, FetchError> {
        self.record(Call::TeamMembers {
            team_id: team_id.to_string(),
            user_ids: user_ids.to_vec(),
        });
        self.check("fetch_team_members_by_ids")?;
        Ok(user_ids
            .iter()
            .map(|id| TeamMember {
                team_id: team_id.to_string(),
                user_id: id.clone(),
                roles: "team_user".into(),
            })
            .collect())
    }

    async fn fetch_profiles_in_channel(
        &self,
        channel_id: &str,
        page: usize,
        _per_page: usize,
    ) -> Result<Vec<UserProfile>, FetchError> {
        self.record(Call::ProfilesInChannel {
            channel_id: channel_id.to_string(),
            page,
        });
        self.check("fetch_profiles_in_channel")?;
        Ok(vec![UserProfile {
            id: format!("{}-member", channel_id),
            username: "member".into(),
            ..Default::default()
        }])
    }

    async fn create_channel(&self, channel: &NewChannel) -> Result<Channel, FetchError> {
        self.record(Call::CreateChannel(channel.clone()));
        self.check("create_channel")?;
        Ok(Channel {
            id: format!("new-{}", channel.name),
            team_id: channel.team_id.clone(),
            channel_type: channel.channel_type,
            name: channel.name.clone(),
            display_name: channel.display_name.clone(),
            purpose: channel.purpose.clone(),
            header: channel.header.clone(),
            create_at: 1,
            last_post_at: 0,
            total_msg_count: 0,
        })
    }

    async fn leave_channel(&self, channel_id: &str, _user_id: &str) -> Result<(), FetchError> {
        self.record(Call::LeaveChannel(channel_id.to_string()));
        self.check("leave_channel")
    }
}

// -- Fixtures --

pub fn channel(id: &str, team_id: &str, channel_type: ChannelType, name: &str) -> Channel {
    Channel {
        id: id.to_string(),
        team_id: team_id.to_string(),
        channel_type,
        name: name.to_string(),
        display_name: name.to_string(),
        purpose: String::new(),
        header: String::new(),
        create_at: 0,
        last_post_at: 0,
        total_msg_count: 0,
    }
}

/// Membership of the user `me`.
pub fn member(channel_id: &str, mention_count: u64, msg_count: u64) -> ChannelMember {
    ChannelMember {
        channel_id: channel_id.to_string(),
        user_id: "me".into(),
        msg_count,
        mention_count,
        last_viewed_at: 0,
    }
}

pub fn post(id: &str, channel_id: &str, user_id: &str, create_at: Millis) -> Post {
    Post {
        id: id.to_string(),
        channel_id: channel_id.to_string(),
        user_id: user_id.to_string(),
        message: format!("message {}", id),
        create_at,
        ..Default::default()
    }
}

/// Keeps the given order, which should be newest first.
pub fn post_list(posts: Vec<Post>) -> PostList {
    PostList {
        order: posts.iter().map(|p| p.id.clone()).collect(),
        posts: posts.into_iter().map(|p| (p.id.clone(), p)).collect(),
    }
}

/// `count` posts in `channel_id`, newest first, created at `newest`, `newest - 1`, ...
pub fn page_of(count: usize, channel_id: &str, newest: Millis) -> PostList {
    post_list(
        (0..count)
            .map(|i| {
                let at = newest - i as Millis;
                post(&format!("{}-{}", channel_id, at), channel_id, "other", at)
            })
            .collect(),
    )
}
