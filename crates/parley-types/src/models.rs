use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CATEGORY_DIRECT_CHANNEL_SHOW, CATEGORY_GROUP_CHANNEL_SHOW, POST_DELETED,
};

/// Timestamps on the wire are milliseconds since the Unix epoch.
pub type Millis = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Empty for direct and group channels.
    #[serde(default)]
    pub team_id: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub create_at: Millis,
    #[serde(default)]
    pub last_post_at: Millis,
    #[serde(default)]
    pub total_msg_count: u64,
}

impl Channel {
    pub fn is_direct(&self) -> bool {
        self.channel_type == ChannelType::Direct
    }

    pub fn is_group(&self) -> bool {
        self.channel_type == ChannelType::Group
    }

    /// The other participant of a direct channel, read from its name.
    pub fn teammate_id(&self, current_user_id: &str) -> Option<String> {
        if !self.is_direct() {
            return None;
        }
        user_id_from_channel_name(current_user_id, &self.name)
    }
}

/// Direct channel names are both user ids, sorted, joined by `__`.
pub fn direct_channel_name(user_id: &str, other_user_id: &str) -> String {
    if user_id > other_user_id {
        format!("{}__{}", other_user_id, user_id)
    } else {
        format!("{}__{}", user_id, other_user_id)
    }
}

pub fn user_id_from_channel_name(user_id: &str, channel_name: &str) -> Option<String> {
    let (first, second) = channel_name.split_once("__")?;
    if first == user_id {
        Some(second.to_string())
    } else {
        Some(first.to_string())
    }
}

/// The current user's membership in a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMember {
    pub channel_id: String,
    pub user_id: String,
    /// Number of messages the user has seen.
    #[serde(default)]
    pub msg_count: u64,
    #[serde(default)]
    pub mention_count: u64,
    #[serde(default)]
    pub last_viewed_at: Millis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel_id: String,
    #[serde(default)]
    pub member_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub channel_id: String,
    pub user_id: String,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub message: String,
    pub create_at: Millis,
    #[serde(default)]
    pub update_at: Millis,
    #[serde(default)]
    pub delete_at: Millis,
    /// Set client-side to `DELETED` when a post is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

impl Post {
    pub fn is_deleted(&self) -> bool {
        self.state.as_deref() == Some(POST_DELETED)
    }
}

/// A page of posts as returned by the server: ids newest first plus bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub posts: HashMap<String, Post>,
}

impl PostList {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Posts in `order`, skipping ids without a body.
    pub fn ordered(&self) -> impl Iterator<Item = &Post> {
        self.order.iter().filter_map(|id| self.posts.get(id))
    }
}

/// Latest `create_at` among the given posts, or 0 when there are none.
pub fn last_create_at<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Millis {
    posts.into_iter().map(|p| p.create_at).max().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Preference {
    pub user_id: String,
    pub category: String,
    pub name: String,
    /// Stored as the strings `"true"` / `"false"` for boolean preferences.
    pub value: String,
}

impl Preference {
    pub fn flag(user_id: &str, category: &str, name: &str, value: bool) -> Self {
        Self {
            user_id: user_id.to_string(),
            category: category.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_true(&self) -> bool {
        self.value == "true"
    }

    /// `(category, name)` identifies a preference for a single user.
    pub fn key(&self) -> (String, String) {
        (self.category.clone(), self.name.clone())
    }

    pub fn is_visibility(&self) -> bool {
        self.category == CATEGORY_DIRECT_CHANNEL_SHOW || self.category == CATEGORY_GROUP_CHANNEL_SHOW
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub nickname: String,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: String,
    pub user_id: String,
    #[serde(default)]
    pub roles: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub post_id: String,
    pub name: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenGraphImage {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenGraphMetadata {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<OpenGraphImage>,
}
