//! Post list rendering data: the item sequence behind the inverted list and
//! the props of the list container.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use parley_client::DataSource;
use parley_types::models::{Millis, Post, PostList};

use crate::posts::refresh_channel_with_retry;
use crate::state::AppState;
use crate::store::Store;

const START_OF_NEW_MESSAGES: &str = "start-of-new-messages";
const LOAD_MORE_POSTS: &str = "load-more-posts";

/// One row of the post list, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostListItem {
    Post(String),
    /// Follows the last post of a calendar day.
    DateSeparator(NaiveDate),
    StartOfNewMessages,
    LoadMore,
}

impl PostListItem {
    /// Stable identity of the row.
    pub fn key(&self) -> String {
        match self {
            Self::Post(id) => id.clone(),
            Self::DateSeparator(date) => date.format("%Y-%m-%d").to_string(),
            Self::StartOfNewMessages => START_OF_NEW_MESSAGES.to_string(),
            Self::LoadMore => LOAD_MORE_POSTS.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostListOptions {
    pub indicate_new_messages: bool,
    pub current_user_id: String,
    pub last_viewed_at: Millis,
    pub show_load_more: bool,
    /// Offset used to decide which calendar day a post belongs to.
    pub utc_offset: FixedOffset,
}

impl Default for PostListOptions {
    fn default() -> Self {
        Self {
            indicate_new_messages: false,
            current_user_id: String::new(),
            last_viewed_at: 0,
            show_load_more: false,
            utc_offset: Utc.fix(),
        }
    }
}

impl PostListOptions {
    fn is_unread(&self, post: &Post) -> bool {
        post.create_at > self.last_viewed_at && post.user_id != self.current_user_id
    }

    fn day_of(&self, at: Millis) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(at)
            .unwrap_or_default()
            .with_timezone(&self.utc_offset)
            .date_naive()
    }
}

/// Interleaves `posts` (newest first) with date separators, the new messages
/// divider and the load-more row.
pub fn build_post_list_items(posts: &[Post], options: &PostListOptions) -> Vec<PostListItem> {
    let kept: Vec<&Post> = posts
        .iter()
        .filter(|p| !(p.is_deleted() && p.user_id == options.current_user_id))
        .collect();

    // When the oldest loaded post is unread, older unread posts may still be
    // behind the load-more row, so the boundary is unknown.
    let divider_after = if options.indicate_new_messages {
        kept.iter()
            .rposition(|p| options.is_unread(p))
            .filter(|i| !(options.show_load_more && *i + 1 == kept.len()))
    } else {
        None
    };

    let mut items = Vec::with_capacity(kept.len() + 4);
    let mut last_day: Option<NaiveDate> = None;

    for (i, post) in kept.iter().enumerate() {
        let day = options.day_of(post.create_at);
        if let Some(previous) = last_day.filter(|d| *d != day) {
            items.push(PostListItem::DateSeparator(previous));
        }
        last_day = Some(day);

        items.push(PostListItem::Post(post.id.clone()));
        if divider_after == Some(i) {
            items.push(PostListItem::StartOfNewMessages);
        }
    }

    if let Some(day) = last_day {
        items.push(PostListItem::DateSeparator(day));
    }
    if options.show_load_more {
        items.push(PostListItem::LoadMore);
    }
    items
}

/// The channel's posts the list currently shows, newest first.
pub fn visible_posts(state: &AppState, channel_id: &str) -> Vec<Post> {
    let limit = state.views.channel.post_visibility(channel_id);
    state
        .post_ids_in_channel(channel_id)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| state.entities.posts.posts.get(id))
                .take(limit)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Props of a post list container.
#[derive(Debug, Clone, Default)]
pub struct PostListView {
    /// Set for a channel's list; thread lists have none.
    pub channel_id: Option<String>,
    pub posts: Vec<Post>,
    pub options: PostListOptions,
    /// The list can ask for older posts when scrolled to the end.
    pub can_load_more: bool,
    pub is_loading_more: bool,
    pub refreshing: bool,
}

impl PostListView {
    /// The list of a channel as the channel screen shows it.
    pub fn for_channel(state: &AppState, channel_id: &str, show_load_more: bool) -> Self {
        let last_viewed_at = state
            .my_member(channel_id)
            .map(|m| m.last_viewed_at)
            .unwrap_or(0);

        Self {
            channel_id: Some(channel_id.to_string()),
            posts: visible_posts(state, channel_id),
            options: PostListOptions {
                indicate_new_messages: true,
                current_user_id: state.current_user_id().to_string(),
                last_viewed_at,
                show_load_more,
                ..Default::default()
            },
            can_load_more: true,
            is_loading_more: state.views.channel.is_loading_posts(channel_id),
            refreshing: state.views.channel.refreshing,
        }
    }

    pub fn items(&self) -> Vec<PostListItem> {
        build_post_list_items(&self.posts, &self.options)
    }

    pub fn should_load_more(&self) -> bool {
        self.can_load_more && !self.is_loading_more
    }

    pub fn shows_channel_intro(&self) -> bool {
        self.channel_id.is_some() && !self.options.show_load_more && !self.refreshing
    }

    pub async fn on_refresh(&self, store: &Store, source: &dyn DataSource) -> Option<PostList> {
        let channel_id = self.channel_id.as_deref()?;
        refresh_channel_with_retry(store, source, channel_id).await
    }
}
