use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use parley_client::DataSource;
use parley_types::actions::Action;
use parley_types::constants::{
    CATEGORY_DISPLAY_SETTINGS, CONFIG_TEAMMATE_NAME_DISPLAY, DISPLAY_PREFER_FULL_NAME,
    DISPLAY_PREFER_NICKNAME, DISPLAY_PREFER_USERNAME, NAME_NAME_FORMAT,
};
use parley_types::models::{Channel, UserProfile};

use crate::channel::{handle_select_channel, load_channels_if_necessary, set_channel_display_name};
use crate::fetch;
use crate::posts::load_posts_if_necessary_with_retry;
use crate::state::AppState;
use crate::store::Store;

/// Payload of an in-app notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NotificationData {
    pub channel_id: String,
    /// Empty for direct and group messages.
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationProps {
    pub data: NotificationData,
    pub user: Option<UserProfile>,
    pub channel: Option<Channel>,
    pub teammate_name_display: String,
    pub config: HashMap<String, String>,
    pub device_width: u32,
}

impl NotificationProps {
    /// Sender's name per the display setting, empty when the sender is unknown.
    pub fn sender_name(&self) -> String {
        self.user
            .as_ref()
            .map(|user| display_username(user, &self.teammate_name_display))
            .unwrap_or_default()
    }
}

pub fn notification_props(state: &AppState, data: &NotificationData) -> NotificationProps {
    let user = Some(data.sender_id.as_str())
        .filter(|id| !id.is_empty())
        .and_then(|id| state.entities.users.profiles.get(id))
        .cloned();
    let channel = Some(data.channel_id.as_str())
        .filter(|id| !id.is_empty())
        .and_then(|id| state.channel(id))
        .cloned();

    NotificationProps {
        data: data.clone(),
        user,
        channel,
        teammate_name_display: teammate_name_display(state),
        config: state.entities.config.clone(),
        device_width: state.device.width,
    }
}

/// The user's name format preference, else the server default, else usernames.
pub fn teammate_name_display(state: &AppState) -> String {
    state
        .entities
        .preferences
        .get(CATEGORY_DISPLAY_SETTINGS, NAME_NAME_FORMAT)
        .map(|p| p.value.clone())
        .or_else(|| state.entities.config.get(CONFIG_TEAMMATE_NAME_DISPLAY).cloned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DISPLAY_PREFER_USERNAME.to_string())
}

pub fn display_username(user: &UserProfile, setting: &str) -> String {
    let name = match setting {
        DISPLAY_PREFER_NICKNAME if !user.nickname.is_empty() => user.nickname.clone(),
        DISPLAY_PREFER_NICKNAME | DISPLAY_PREFER_FULL_NAME => user.full_name(),
        _ => user.username.clone(),
    };
    if name.is_empty() {
        user.username.clone()
    } else {
        name
    }
}

/// Opens the notification's channel, switching team and loading what is
/// missing on the way. Returns `false` when the channel cannot be found.
pub async fn go_to_notification(store: &Store, source: &dyn DataSource, data: &NotificationData) -> bool {
    let current_team_id = store.read(|state| state.current_team_id().to_string()).await;
    let team_id = if data.team_id.is_empty() {
        current_team_id.clone()
    } else {
        data.team_id.clone()
    };

    store.dispatch(set_channel_display_name("")).await;

    if !team_id.is_empty() && team_id != current_team_id {
        debug!("notification switches team to {}", team_id);
        store
            .dispatch(Action::SelectTeam {
                team_id: team_id.clone(),
            })
            .await;
        load_channels_if_necessary(store, source, &team_id).await;
    }

    let known = store.read(|state| state.channel(&data.channel_id).cloned()).await;
    let channel = match known {
        Some(channel) => channel,
        None => match fetch::get_channel(store, source, &data.channel_id).await {
            Some(channel) => channel,
            None => {
                info!("notification channel {} not found", data.channel_id);
                return false;
            }
        },
    };

    store
        .dispatch(set_channel_display_name(&channel.display_name))
        .await;
    handle_select_channel(store, source, &channel.id).await;
    load_posts_if_necessary_with_retry(store, source, &channel.id).await;
    true
}
