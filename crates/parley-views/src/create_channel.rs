use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use parley_client::DataSource;
use parley_types::api::NewChannel;
use parley_types::models::{Channel, ChannelType};

use crate::channel::{handle_select_channel, set_channel_display_name};
use crate::fetch;
use crate::store::Store;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s]").unwrap());
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Turns a display name into a URL-safe channel name.
pub fn clean_up_urlable(input: &str) -> String {
    let spaced = input.trim().replace('-', " ");
    let cleaned = NON_WORD.replace_all(&spaced, "").to_lowercase();
    let dashed: String = cleaned
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    DASH_RUNS
        .replace_all(&dashed, "-")
        .trim_matches('-')
        .to_string()
}

/// Creates a channel in the current team and switches to it.
pub async fn handle_create_channel(
    store: &Store,
    source: &dyn DataSource,
    display_name: &str,
    purpose: &str,
    header: &str,
    channel_type: ChannelType,
) -> Option<Channel> {
    let (team_id, creator_id) = store
        .read(|state| {
            (
                state.current_team_id().to_string(),
                state.current_user_id().to_string(),
            )
        })
        .await;

    let request = NewChannel {
        team_id,
        name: clean_up_urlable(display_name),
        display_name: display_name.to_string(),
        purpose: purpose.to_string(),
        header: header.to_string(),
        channel_type,
        creator_id,
    };

    let Some(channel) = fetch::create_channel(store, source, &request).await else {
        warn!("could not create channel {:?}", request.name);
        return None;
    };
    info!("created channel {} ({})", channel.name, channel.id);

    store.dispatch(set_channel_display_name(display_name)).await;
    handle_select_channel(store, source, &channel.id).await;
    Some(channel)
}
