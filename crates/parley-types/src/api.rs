use serde::{Deserialize, Serialize};

use crate::models::ChannelType;

// -- Channels --

/// Body of `POST /channels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChannel {
    pub team_id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub header: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    /// Not part of the request body; the creating user is the token owner.
    #[serde(skip)]
    pub creator_id: String,
}

// -- Posts --

/// Query parameters accepted by `GET /channels/{channel_id}/posts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

impl PostsQuery {
    pub fn page(page: usize, per_page: usize) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            ..Default::default()
        }
    }

    pub fn since(since: i64) -> Self {
        Self {
            since: Some(since),
            ..Default::default()
        }
    }

    pub fn before(post_id: &str, page: usize, per_page: usize) -> Self {
        Self {
            before: Some(post_id.to_string()),
            ..Self::page(page, per_page)
        }
    }
}

// -- Users --

/// Query parameters for `GET /users`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilesInChannelQuery {
    pub in_channel: String,
    pub page: usize,
    pub per_page: usize,
}

// -- Errors --

/// Error body returned by the server with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_channel_serializes_without_creator() {
        let channel = NewChannel {
            team_id: "t1".into(),
            name: "general-chat".into(),
            display_name: "General chat".into(),
            purpose: String::new(),
            header: String::new(),
            channel_type: ChannelType::Open,
            creator_id: "u1".into(),
        };
        let value = serde_json::to_value(&channel).unwrap();
        assert_eq!(value["type"], "O");
        assert!(value.get("creator_id").is_none());
    }

    #[test]
    fn before_query_carries_paging() {
        let query = PostsQuery::before("p9", 2, 15);
        assert_eq!(query.before.as_deref(), Some("p9"));
        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(15));
        assert_eq!(query.since, None);
    }
}
