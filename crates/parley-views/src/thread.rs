use parley_client::DataSource;
use parley_types::actions::Action;
use parley_types::models::{ChannelMember, Millis, Post};

use crate::post_list::{PostListItem, PostListOptions, PostListView};
use crate::posts::load_thread_if_necessary;
use crate::state::AppState;
use crate::store::Store;

/// A reply thread opened from a channel.
///
/// The unread divider is anchored to the `last_viewed_at` seen when the
/// thread opened; later membership updates do not move it.
#[derive(Debug, Clone)]
pub struct ThreadScreen {
    pub root_id: String,
    pub channel_id: String,
    last_viewed_at: Option<Millis>,
}

impl ThreadScreen {
    pub fn new(root_id: &str, channel_id: &str) -> Self {
        Self {
            root_id: root_id.to_string(),
            channel_id: channel_id.to_string(),
            last_viewed_at: None,
        }
    }

    pub fn last_viewed_at(&self) -> Option<Millis> {
        self.last_viewed_at
    }

    pub fn receive_member(&mut self, member: &ChannelMember) {
        if self.last_viewed_at.is_none() {
            self.last_viewed_at = Some(member.last_viewed_at);
        }
    }

    /// Root and replies, newest first.
    pub fn thread_posts(&self, state: &AppState) -> Vec<Post> {
        let posts = &state.entities.posts.posts;
        let mut thread: Vec<Post> = posts
            .values()
            .filter(|p| p.id == self.root_id || p.root_id == self.root_id)
            .cloned()
            .collect();
        thread.sort_by(|a, b| b.create_at.cmp(&a.create_at).then_with(|| b.id.cmp(&a.id)));
        thread
    }

    pub fn view(&self, state: &AppState) -> PostListView {
        PostListView {
            channel_id: None,
            posts: self.thread_posts(state),
            options: PostListOptions {
                indicate_new_messages: true,
                current_user_id: state.current_user_id().to_string(),
                last_viewed_at: self.last_viewed_at.unwrap_or(0),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn items(&self, state: &AppState) -> Vec<PostListItem> {
        self.view(state).items()
    }

    /// Loads the thread and captures the membership seen on open.
    pub async fn mount(&mut self, store: &Store, source: &dyn DataSource) {
        load_thread_if_necessary(store, source, &self.root_id, &self.channel_id).await;
        let member = store.read(|state| state.my_member(&self.channel_id).cloned()).await;
        if let Some(member) = member {
            self.receive_member(&member);
        }
    }

    pub async fn close(&self, store: &Store) {
        store
            .dispatch(Action::SelectPost {
                post_id: String::new(),
            })
            .await;
    }
}
