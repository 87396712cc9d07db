use anyhow::{Context, bail};
use chrono::{DateTime, Local, Offset, Utc};
use tracing::{info, warn};

use parley_client::{ClientConfig, HttpDataSource};
use parley_types::actions::Action;
use parley_types::models::Millis;
use parley_views::channel::{handle_select_channel, load_channels_if_necessary, select_initial_channel};
use parley_views::post_list::{PostListItem, PostListView};
use parley_views::posts::{increase_post_visibility, load_posts_if_necessary_with_retry};
use parley_views::reconciler::load_profiles_and_team_members_for_dm_sidebar;
use parley_views::{AppState, Store, fetch};

/// Usage: `parley [channel-name] [--more N]`
struct Args {
    channel_name: Option<String>,
    more_pages: usize,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        channel_name: None,
        more_pages: 0,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--more" => {
                let n = iter.next().context("--more needs a number")?;
                args.more_pages = n.parse().with_context(|| format!("invalid page count '{}'", n))?;
            }
            _ if args.channel_name.is_none() => args.channel_name = Some(arg),
            _ => bail!("unexpected argument '{}'", arg),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug".into()),
        )
        .init();

    let args = parse_args()?;
    let config = ClientConfig::from_env()?;
    let source = HttpDataSource::new(&config).context("building http client")?;
    let store = Store::default();

    // Session
    let me = fetch::get_me(&store, &source)
        .await
        .context("could not load the current user")?;
    info!("signed in as {}", me.username);

    let team_id = match config.team_id.clone() {
        Some(team_id) => team_id,
        None => fetch::get_my_teams(&store, &source)
            .await
            .and_then(|teams| teams.into_iter().next())
            .map(|team| team.id)
            .context("the user is not on any team")?,
    };
    store.dispatch(Action::SelectTeam { team_id: team_id.clone() }).await;

    load_channels_if_necessary(&store, &source, &team_id).await;
    load_profiles_and_team_members_for_dm_sidebar(&store, &source, &team_id).await;

    // Channel
    let channel_id = match &args.channel_name {
        Some(name) => {
            let found = store
                .read(|state| state.channel_by_name(name).map(|c| c.id.clone()))
                .await
                .with_context(|| format!("no channel named '{}'", name))?;
            handle_select_channel(&store, &source, &found).await;
            found
        }
        None => select_initial_channel(&store, &source, &team_id)
            .await
            .context("the team has no channels")?,
    };

    if !load_posts_if_necessary_with_retry(&store, &source, &channel_id).await {
        warn!("showing cached posts only for {}", channel_id);
    }

    let mut has_more = true;
    for _ in 0..args.more_pages {
        has_more = increase_post_visibility(&store, &source, &channel_id, None).await;
        if !has_more {
            break;
        }
    }

    let state = store.snapshot().await;
    print_channel(&state, &channel_id, has_more);
    Ok(())
}

fn print_channel(state: &AppState, channel_id: &str, has_more: bool) {
    let mut view = PostListView::for_channel(state, channel_id, has_more);
    view.options.utc_offset = Local::now().offset().fix();

    if let Some(channel) = state.channel(channel_id) {
        println!("# {}", channel.display_name);
    }

    // The list is newest first; a terminal reads top to bottom.
    for item in view.items().iter().rev() {
        match item {
            PostListItem::Post(id) => {
                let Some(post) = state.entities.posts.posts.get(id) else {
                    continue;
                };
                let author = state
                    .entities
                    .users
                    .profiles
                    .get(&post.user_id)
                    .map(|u| u.username.as_str())
                    .unwrap_or(post.user_id.as_str());
                println!("[{}] {}: {}", clock(post.create_at), author, post.message);
            }
            PostListItem::DateSeparator(date) => println!("--- {} ---", date.format("%A, %B %-d, %Y")),
            PostListItem::StartOfNewMessages => println!("--- new messages ---"),
            PostListItem::LoadMore => println!("(older messages available, use --more)"),
        }
    }

    if view.shows_channel_intro() {
        println!("(beginning of {})", channel_id);
    }
}

fn clock(at: Millis) -> String {
    DateTime::<Utc>::from_timestamp_millis(at)
        .unwrap_or_default()
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string()
}
