//! Channel lifecycle: loading a team's channels, choosing which one to show,
//! and leaving or closing channels.

use tracing::{debug, info, warn};

use parley_client::DataSource;
use parley_types::actions::Action;
use parley_types::constants::{CATEGORY_FAVORITE_CHANNEL, DEFAULT_CHANNEL};
use parley_types::models::{ChannelType, Preference};

use crate::fetch;
use crate::reconciler::{toggle_dm_channel, toggle_gm_channel};
use crate::state::AppState;
use crate::store::Store;

/// Where the initial channel of a team came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialChannel {
    /// The channel last viewed in this team.
    LastViewed(String),
    /// The team's `town-square`.
    Default(String),
    /// The team's first channel by id.
    First(String),
    None,
}

impl InitialChannel {
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::LastViewed(id) | Self::Default(id) | Self::First(id) => Some(id),
            Self::None => None,
        }
    }
}

pub fn resolve_initial_channel(state: &AppState, team_id: &str) -> InitialChannel {
    let last = state
        .views
        .team
        .last_channel_for_team
        .get(team_id)
        .and_then(|id| state.channel(id));

    if let Some(channel) = last {
        let visible = match channel.channel_type {
            ChannelType::Direct => state.is_direct_channel_visible(channel),
            ChannelType::Group => state.is_group_channel_visible(channel),
            _ => false,
        };
        if state.my_member(&channel.id).is_some() && (channel.team_id == team_id || visible) {
            return InitialChannel::LastViewed(channel.id.clone());
        }
    }

    let mut in_team = state
        .entities
        .channels
        .channels
        .values()
        .filter(|c| c.team_id == team_id);

    if let Some(channel) = in_team.clone().find(|c| c.name == DEFAULT_CHANNEL) {
        return InitialChannel::Default(channel.id.clone());
    }
    match in_team.next() {
        Some(channel) => InitialChannel::First(channel.id.clone()),
        None => InitialChannel::None,
    }
}

pub async fn load_channels_if_necessary(store: &Store, source: &dyn DataSource, team_id: &str) {
    if let Some(count) = fetch::fetch_my_channels_and_members(store, source, team_id).await {
        debug!("team {}: {} channels", team_id, count);
    }
}

/// Selects the channel the user should land on in `team_id`. Returns its id,
/// or `None` when the team has no channels.
pub async fn select_initial_channel(
    store: &Store,
    source: &dyn DataSource,
    team_id: &str,
) -> Option<String> {
    let initial = store.read(|state| resolve_initial_channel(state, team_id)).await;
    debug!("team {}: initial channel {:?}", team_id, initial);

    let channel_id = match initial {
        InitialChannel::LastViewed(id) => id,
        InitialChannel::Default(id) | InitialChannel::First(id) => {
            store.dispatch(set_channel_display_name("")).await;
            id
        }
        InitialChannel::None => {
            info!("team {} has no channels to select", team_id);
            return None;
        }
    };

    handle_select_channel(store, source, &channel_id).await;
    Some(channel_id)
}

pub async fn handle_select_channel(store: &Store, source: &dyn DataSource, channel_id: &str) {
    let team_id = store.read(|state| state.current_team_id().to_string()).await;

    store
        .dispatch_batch(vec![
            Action::SelectChannel {
                channel_id: channel_id.to_string(),
            },
            set_channel_loading(false),
            Action::SetLastChannelForTeam {
                team_id,
                channel_id: channel_id.to_string(),
            },
        ])
        .await;

    fetch::get_channel_stats(store, source, channel_id).await;
}

pub async fn handle_post_draft_changed(store: &Store, channel_id: &str, draft: &str) {
    store
        .dispatch(Action::PostDraftChanged {
            channel_id: channel_id.to_string(),
            draft: draft.to_string(),
        })
        .await;
}

pub async fn unfavorite_channel(store: &Store, source: &dyn DataSource, channel_id: &str) {
    let user_id = store.read(|state| state.current_user_id().to_string()).await;
    let pref = Preference::flag(&user_id, CATEGORY_FAVORITE_CHANNEL, channel_id, true);
    fetch::delete_preferences(store, source, &user_id, vec![pref]).await;
}

/// What closing needs to know about a channel, read in one go.
struct Closing {
    team_id: String,
    is_current: bool,
    is_favorite: bool,
}

async fn read_closing(store: &Store, channel_id: &str) -> Closing {
    store
        .read(|state| Closing {
            team_id: state.current_team_id().to_string(),
            is_current: state.current_channel_id() == channel_id,
            is_favorite: state.is_favorite(channel_id),
        })
        .await
}

/// Hides a direct channel from the sidebar, moving away if it was showing.
/// Returns `false`, leaving everything as it was, when the channel is not a
/// known direct channel.
pub async fn close_dm_channel(store: &Store, source: &dyn DataSource, channel_id: &str) -> bool {
    let closing = read_closing(store, channel_id).await;
    let teammate_id = store
        .read(|state| {
            state
                .channel(channel_id)
                .and_then(|c| c.teammate_id(state.current_user_id()))
        })
        .await;
    let Some(teammate_id) = teammate_id else {
        warn!("cannot close {}: not a known direct channel", channel_id);
        return false;
    };

    if closing.is_favorite {
        unfavorite_channel(store, source, channel_id).await;
    }
    toggle_dm_channel(store, source, &teammate_id, false).await;
    if closing.is_current {
        select_initial_channel(store, source, &closing.team_id).await;
    }
    true
}

pub async fn close_gm_channel(store: &Store, source: &dyn DataSource, channel_id: &str) {
    let closing = read_closing(store, channel_id).await;

    if closing.is_favorite {
        unfavorite_channel(store, source, channel_id).await;
    }
    toggle_gm_channel(store, source, channel_id, false).await;
    if closing.is_current {
        select_initial_channel(store, source, &closing.team_id).await;
    }
}

/// Leaves the channel. With `reset`, or when it was the current channel, a
/// new initial channel is selected afterwards.
pub async fn leave_channel(store: &Store, source: &dyn DataSource, channel_id: &str, reset: bool) {
    let (team_id, user_id, is_current) = store
        .read(|state| {
            (
                state.current_team_id().to_string(),
                state.current_user_id().to_string(),
                state.current_channel_id() == channel_id,
            )
        })
        .await;

    fetch::leave_channel(store, source, channel_id, &user_id).await;
    if is_current || reset {
        select_initial_channel(store, source, &team_id).await;
    }
}

// -- Action constructors --

pub fn set_channel_loading(loading: bool) -> Action {
    Action::SetChannelLoading(loading)
}

pub fn set_channel_refreshing(refreshing: bool) -> Action {
    Action::SetChannelRefreshing(refreshing)
}

pub fn set_post_tooltip_visible(visible: bool) -> Action {
    Action::PostTooltipVisible(visible)
}

pub fn set_channel_display_name(display_name: &str) -> Action {
    Action::SetChannelDisplayName(display_name.to_string())
}
