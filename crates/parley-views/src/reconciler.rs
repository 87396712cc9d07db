use std::collections::BTreeMap;

use futures_util::future::join_all;
use tracing::debug;

use parley_client::DataSource;
use parley_types::actions::Action;
use parley_types::constants::{
    CATEGORY_DIRECT_CHANNEL_SHOW, CATEGORY_GROUP_CHANNEL_SHOW, PROFILES_PER_PAGE,
};
use parley_types::models::{Preference, direct_channel_name};

use crate::fetch;
use crate::state::AppState;
use crate::store::Store;

/// What the direct-message sidebar needs before it can render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarPlan {
    /// Visibility preferences to save in one batch, at most one per target.
    pub preferences: Vec<Preference>,
    /// Visible DM teammates, in id order.
    pub visible_teammates: Vec<String>,
    /// Teammates missing from the team's cached member set.
    pub members_to_load: Vec<String>,
    /// Visible group channels whose roster is not cached.
    pub rosters_to_load: Vec<String>,
}

/// Works out which hidden DM/GM channels have become worth showing and what
/// profile data the visible ones still lack.
pub fn plan_dm_sidebar(state: &AppState, team_id: &str) -> SidebarPlan {
    let current_user_id = state.current_user_id();
    let prefs = &state.entities.preferences;

    let mut dm_prefs = prefs.by_category(CATEGORY_DIRECT_CHANNEL_SHOW);
    let mut gm_prefs = prefs.by_category(CATEGORY_GROUP_CHANNEL_SHOW);
    // Keyed by (category, name) so a target shows up once per batch.
    let mut changes: BTreeMap<(String, String), Preference> = BTreeMap::new();

    for channel in state.entities.channels.channels.values() {
        let Some(member) = state.my_member(&channel.id) else {
            continue;
        };

        if channel.is_direct() {
            if state.is_direct_channel_visible(channel) || member.mention_count == 0 {
                continue;
            }
            let Some(teammate_id) = channel.teammate_id(current_user_id) else {
                continue;
            };
            let pref = show(dm_prefs.get(&teammate_id), current_user_id, CATEGORY_DIRECT_CHANNEL_SHOW, &teammate_id);
            dm_prefs.insert(teammate_id, pref.clone());
            changes.insert(pref.key(), pref);
        } else if channel.is_group() {
            let unread = member.mention_count > 0 || member.msg_count < channel.total_msg_count;
            if state.is_group_channel_visible(channel) || !unread {
                continue;
            }
            let pref = show(gm_prefs.get(&channel.id), current_user_id, CATEGORY_GROUP_CHANNEL_SHOW, &channel.id);
            gm_prefs.insert(channel.id.clone(), pref.clone());
            changes.insert(pref.key(), pref);
        }
    }

    let visible_teammates: Vec<String> = dm_prefs
        .into_iter()
        .filter(|(_, pref)| pref.is_true())
        .map(|(name, _)| name)
        .collect();

    let rosters_to_load = gm_prefs
        .into_iter()
        .filter(|(name, pref)| {
            pref.is_true() && !state.entities.users.profiles_in_channel.contains_key(name)
        })
        .map(|(name, _)| name)
        .collect();

    let members_to_load = match state.entities.teams.members_in_team.get(team_id) {
        Some(known) => visible_teammates
            .iter()
            .filter(|id| !known.contains(*id))
            .cloned()
            .collect(),
        None => visible_teammates.clone(),
    };

    SidebarPlan {
        preferences: changes.into_values().collect(),
        visible_teammates,
        members_to_load,
        rosters_to_load,
    }
}

/// The existing preference switched on, or a fresh one.
fn show(existing: Option<&Preference>, user_id: &str, category: &str, name: &str) -> Preference {
    match existing {
        Some(pref) => Preference {
            value: true.to_string(),
            ..pref.clone()
        },
        None => Preference::flag(user_id, category, name, true),
    }
}

/// Reveals DM/GM channels with unread activity and loads the profile data the
/// sidebar shows for them.
pub async fn load_profiles_and_team_members_for_dm_sidebar(
    store: &Store,
    source: &dyn DataSource,
    team_id: &str,
) -> SidebarPlan {
    let (plan, current_user_id) = store
        .read(|state| (plan_dm_sidebar(state, team_id), state.current_user_id().to_string()))
        .await;

    if !plan.preferences.is_empty() {
        debug!("showing {} hidden direct/group channels", plan.preferences.len());
        fetch::save_preferences(store, source, &current_user_id, plan.preferences.clone()).await;
    }

    join_all(plan.rosters_to_load.iter().map(|channel_id| {
        fetch::get_profiles_in_channel(store, source, channel_id, 0, PROFILES_PER_PAGE)
    }))
    .await;

    if !plan.members_to_load.is_empty() {
        fetch::get_team_members_by_ids(store, source, team_id, &plan.members_to_load).await;
    }

    let profile_actions = store
        .read(|state| {
            plan.visible_teammates
                .iter()
                .filter_map(|user_id| {
                    let name = direct_channel_name(&current_user_id, user_id);
                    state.channel_by_name(&name).map(|channel| Action::ReceivedProfileInChannel {
                        channel_id: channel.id.clone(),
                        user_id: user_id.clone(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .await;
    store.dispatch_batch(profile_actions).await;

    plan
}

async fn save_visibility(store: &Store, source: &dyn DataSource, category: &str, name: &str, visible: bool) {
    let user_id = store.read(|state| state.current_user_id().to_string()).await;
    let pref = Preference::flag(&user_id, category, name, visible);
    fetch::save_preferences(store, source, &user_id, vec![pref]).await;
}

pub async fn toggle_dm_channel(store: &Store, source: &dyn DataSource, other_user_id: &str, visible: bool) {
    save_visibility(store, source, CATEGORY_DIRECT_CHANNEL_SHOW, other_user_id, visible).await;
}

pub async fn toggle_gm_channel(store: &Store, source: &dyn DataSource, channel_id: &str, visible: bool) {
    save_visibility(store, source, CATEGORY_GROUP_CHANNEL_SHOW, channel_id, visible).await;
}
