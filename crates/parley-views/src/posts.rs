use std::future::Future;

use chrono::Utc;
use tracing::{debug, info};

use parley_client::DataSource;
use parley_types::actions::Action;
use parley_types::constants::{MAX_POST_TRIES, POST_CHUNK_SIZE, POST_VISIBILITY_CHUNK_SIZE};
use parley_types::models::{Millis, PostList, last_create_at};

use crate::fetch;
use crate::state::AppState;
use crate::store::Store;

/// How to bring a channel's posts up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostsFetch {
    /// Not even one chunk is known locally: fetch the first page.
    FirstPage,
    /// Fetch everything changed after this timestamp.
    Since(Millis),
}

pub fn plan_posts_fetch(state: &AppState, channel_id: &str) -> PostsFetch {
    let ids = match state.post_ids_in_channel(channel_id) {
        Some(ids) if ids.len() >= POST_VISIBILITY_CHUNK_SIZE => ids,
        _ => return PostsFetch::FirstPage,
    };

    let last_get_posts = state
        .views
        .channel
        .last_get_posts
        .get(channel_id)
        .copied()
        .filter(|t| *t > 0);

    match last_get_posts {
        // The websocket dropped after our last fetch; posts may have been missed.
        Some(last) if last < state.device.last_connect_at => PostsFetch::Since(last),
        _ => {
            let posts = ids.iter().filter_map(|id| state.entities.posts.posts.get(id));
            PostsFetch::Since(last_create_at(posts))
        }
    }
}

/// Runs `attempt` until it yields a value, at most `max_tries` times.
pub async fn retry_fetch<T, F, Fut>(max_tries: usize, mut attempt: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for n in 1..=max_tries {
        if let Some(value) = attempt().await {
            return Some(value);
        }
        debug!("attempt {}/{} returned nothing", n, max_tries);
    }
    None
}

/// Makes sure the channel has its recent posts. Returns whether anything was
/// received; giving up after the retries is not an error.
pub async fn load_posts_if_necessary_with_retry(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
) -> bool {
    let plan = store.read(|state| plan_posts_fetch(state, channel_id)).await;
    let time = Utc::now().timestamp_millis();

    let received = match plan {
        PostsFetch::FirstPage => {
            retry_fetch(MAX_POST_TRIES, move || {
                fetch::get_posts(store, source, channel_id, 0, POST_CHUNK_SIZE)
            })
            .await
        }
        PostsFetch::Since(since) => {
            retry_fetch(MAX_POST_TRIES, move || {
                fetch::get_posts_since(store, source, channel_id, since)
            })
            .await
        }
    };

    match received {
        Some(posts) => {
            debug!("channel {}: received {} posts", channel_id, posts.len());
            store
                .dispatch(Action::ReceivedPostsForChannelAtTime {
                    channel_id: channel_id.to_string(),
                    time,
                })
                .await;
            true
        }
        None => {
            info!("channel {}: no posts after {} attempts", channel_id, MAX_POST_TRIES);
            false
        }
    }
}

/// Pull-to-refresh: the first page again, with retries.
pub async fn refresh_channel_with_retry(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
) -> Option<PostList> {
    retry_fetch(MAX_POST_TRIES, move || {
        fetch::get_posts(store, source, channel_id, 0, POST_CHUNK_SIZE)
    })
    .await
}

/// Clears a channel's load-more flag when dropped, unless disarmed.
struct LoadingPostsGuard<'a> {
    store: &'a Store,
    channel_id: &'a str,
    armed: bool,
}

impl LoadingPostsGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingPostsGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("channel {}: load more cancelled", self.channel_id);
            self.store.dispatch_detached(Action::LoadingPosts {
                channel_id: self.channel_id.to_string(),
                loading: false,
            });
        }
    }
}

/// Reveals one more chunk of the channel's history, fetching it first.
///
/// Returns whether more posts are likely to exist: a short page means the
/// start of the channel was reached. While a previous call for the same
/// channel is still in flight this is a no-op that answers `true`.
pub async fn increase_post_visibility(
    store: &Store,
    source: &dyn DataSource,
    channel_id: &str,
    focused_post_id: Option<&str>,
) -> bool {
    let started = store
        .try_dispatch(
            |state| !state.views.channel.is_loading_posts(channel_id),
            Action::LoadingPosts {
                channel_id: channel_id.to_string(),
                loading: true,
            },
        )
        .await;
    if !started {
        debug!("channel {}: load more already in flight", channel_id);
        return true;
    }
    let guard = LoadingPostsGuard {
        store,
        channel_id,
        armed: true,
    };

    let visible = store
        .read(|state| state.views.channel.post_visibility(channel_id))
        .await;
    let page = visible / POST_VISIBILITY_CHUNK_SIZE;

    let posts = match focused_post_id {
        Some(post_id) => {
            fetch::get_posts_before(store, source, channel_id, post_id, page, POST_VISIBILITY_CHUNK_SIZE)
                .await
        }
        None => fetch::get_posts(store, source, channel_id, page, POST_VISIBILITY_CHUNK_SIZE).await,
    };

    let mut updates = Vec::with_capacity(2);
    if posts.is_some() {
        updates.push(Action::IncreasePostVisibility {
            channel_id: channel_id.to_string(),
            amount: POST_VISIBILITY_CHUNK_SIZE,
        });
    }
    updates.push(Action::LoadingPosts {
        channel_id: channel_id.to_string(),
        loading: false,
    });
    store.dispatch_batch(updates).await;
    guard.disarm();

    posts.is_some_and(|p| p.len() >= POST_VISIBILITY_CHUNK_SIZE)
}

pub async fn load_files_for_post_if_necessary(store: &Store, source: &dyn DataSource, post_id: &str) {
    let cached = store
        .read(|state| state.entities.files.file_ids_by_post_id.contains_key(post_id))
        .await;
    if !cached {
        fetch::get_files_for_post(store, source, post_id).await;
    }
}

/// Fetches the thread unless its root is already known in the channel.
pub async fn load_thread_if_necessary(
    store: &Store,
    source: &dyn DataSource,
    root_id: &str,
    channel_id: &str,
) {
    if root_id.is_empty() {
        return;
    }

    let known = store
        .read(|state| {
            state.entities.posts.posts.contains_key(root_id)
                && state
                    .post_ids_in_channel(channel_id)
                    .is_some_and(|ids| ids.iter().any(|id| id == root_id))
        })
        .await;
    if !known {
        fetch::get_post_thread(store, source, root_id).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_support::{Call, FakeSource, page_of, post, post_list};

    async fn store_with_posts(channel_id: &str, count: usize, newest: Millis) -> Store {
        let store = Store::default();
        store
            .dispatch(Action::ReceivedPosts {
                channel_id: channel_id.to_string(),
                posts: page_of(count, channel_id, newest),
            })
            .await;
        store
    }

    #[tokio::test]
    async fn short_history_fetches_first_page_never_since() {
        let store = store_with_posts("c1", POST_VISIBILITY_CHUNK_SIZE - 1, 500).await;
        let source = FakeSource::default();

        assert!(load_posts_if_necessary_with_retry(&store, &source, "c1").await);

        assert_eq!(
            source.calls(),
            vec![Call::Posts {
                channel_id: "c1".into(),
                page: 0,
                per_page: POST_CHUNK_SIZE,
            }]
        );
    }

    #[tokio::test]
    async fn unknown_channel_fetches_first_page() {
        let store = Store::default();
        assert_eq!(
            store.read(|s| plan_posts_fetch(s, "nowhere")).await,
            PostsFetch::FirstPage
        );
    }

    #[tokio::test]
    async fn reconnect_after_last_fetch_fetches_since_last_fetch() {
        let store = store_with_posts("c1", POST_VISIBILITY_CHUNK_SIZE, 500).await;
        store
            .dispatch_batch(vec![
                Action::ReceivedPostsForChannelAtTime {
                    channel_id: "c1".into(),
                    time: 1_000,
                },
                Action::WebsocketConnected { at: 2_000 },
            ])
            .await;
        let source = FakeSource::default();

        load_posts_if_necessary_with_retry(&store, &source, "c1").await;

        assert_eq!(
            source.calls(),
            vec![Call::PostsSince {
                channel_id: "c1".into(),
                since: 1_000,
            }]
        );
    }

    #[tokio::test]
    async fn connected_since_last_fetch_uses_newest_post() {
        let store = store_with_posts("c1", POST_VISIBILITY_CHUNK_SIZE, 500).await;
        store
            .dispatch_batch(vec![
                Action::WebsocketConnected { at: 1_000 },
                Action::ReceivedPostsForChannelAtTime {
                    channel_id: "c1".into(),
                    time: 2_000,
                },
            ])
            .await;

        let plan = store.read(|s| plan_posts_fetch(s, "c1")).await;
        assert_eq!(plan, PostsFetch::Since(500));
    }

    #[tokio::test]
    async fn never_fetched_uses_newest_post() {
        let store = store_with_posts("c1", POST_VISIBILITY_CHUNK_SIZE + 3, 900).await;
        store.dispatch(Action::WebsocketConnected { at: 5_000 }).await;

        let plan = store.read(|s| plan_posts_fetch(s, "c1")).await;
        assert_eq!(plan, PostsFetch::Since(900));
    }

    #[tokio::test]
    async fn success_records_fetch_time() {
        let store = Store::default();
        let source = FakeSource::default();
        let before = Utc::now().timestamp_millis();

        load_posts_if_necessary_with_retry(&store, &source, "c1").await;

        let recorded = store
            .read(|s| s.views.channel.last_get_posts.get("c1").copied())
            .await
            .unwrap();
        assert!(recorded >= before);
    }

    #[tokio::test]
    async fn retry_succeeds_on_third_attempt() {
        let store = Store::default();
        let source = FakeSource::default();
        source.push_posts(None);
        source.push_posts(None);
        source.push_posts(Some(post_list(vec![post("p1", "c1", "u", 1)])));

        assert!(load_posts_if_necessary_with_retry(&store, &source, "c1").await);
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_three_attempts() {
        let store = Store::default();
        let source = FakeSource::default();
        for _ in 0..5 {
            source.push_posts(None);
        }

        assert!(!load_posts_if_necessary_with_retry(&store, &source, "c1").await);
        assert_eq!(source.calls().len(), MAX_POST_TRIES);
        assert!(
            store
                .read(|s| s.views.channel.last_get_posts.get("c1").is_none())
                .await
        );
    }

    #[tokio::test]
    async fn empty_page_is_a_result_not_a_failure() {
        let store = Store::default();
        let source = FakeSource::default();
        source.push_posts(Some(PostList::default()));

        assert!(load_posts_if_necessary_with_retry(&store, &source, "c1").await);
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn retry_fetch_stops_at_first_value() {
        let mut attempts = 0;
        let value = retry_fetch(3, || {
            attempts += 1;
            let n = attempts;
            async move { (n == 2).then_some(n) }
        })
        .await;
        assert_eq!(value, Some(2));
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn full_page_means_more_and_grows_visibility() {
        let store = Store::default();
        store.dispatch(Action::SelectChannel { channel_id: "c1".into() }).await;
        let source = FakeSource::default();
        source.push_posts(Some(page_of(POST_VISIBILITY_CHUNK_SIZE, "c1", 100)));

        assert!(increase_post_visibility(&store, &source, "c1", None).await);

        assert_eq!(
            source.calls(),
            vec![Call::Posts {
                channel_id: "c1".into(),
                page: 1,
                per_page: POST_VISIBILITY_CHUNK_SIZE,
            }]
        );
        let (visible, loading) = store
            .read(|s| {
                (
                    s.views.channel.post_visibility("c1"),
                    s.views.channel.is_loading_posts("c1"),
                )
            })
            .await;
        assert_eq!(visible, 2 * POST_VISIBILITY_CHUNK_SIZE);
        assert!(!loading);
    }

    #[tokio::test]
    async fn short_page_means_end_of_history() {
        let store = Store::default();
        let source = FakeSource::default();
        source.push_posts(Some(page_of(POST_VISIBILITY_CHUNK_SIZE - 1, "c1", 100)));

        assert!(!increase_post_visibility(&store, &source, "c1", None).await);
        assert_eq!(
            store.read(|s| s.views.channel.post_visibility("c1")).await,
            POST_VISIBILITY_CHUNK_SIZE
        );
    }

    #[tokio::test]
    async fn failed_load_more_keeps_visibility_and_clears_flag() {
        let store = Store::default();
        let source = FakeSource::default();
        source.push_posts(None);

        assert!(!increase_post_visibility(&store, &source, "c1", None).await);
        let (visible, loading) = store
            .read(|s| {
                (
                    s.views.channel.post_visibility("c1"),
                    s.views.channel.is_loading_posts("c1"),
                )
            })
            .await;
        assert_eq!(visible, 0);
        assert!(!loading);
    }

    #[tokio::test]
    async fn focused_post_anchors_the_page() {
        let store = Store::default();
        store
            .dispatch(Action::IncreasePostVisibility {
                channel_id: "c1".into(),
                amount: 2 * POST_VISIBILITY_CHUNK_SIZE,
            })
            .await;
        let source = FakeSource::default();

        increase_post_visibility(&store, &source, "c1", Some("p42")).await;

        assert_eq!(
            source.calls(),
            vec![Call::PostsBefore {
                channel_id: "c1".into(),
                post_id: "p42".into(),
                page: 2,
                per_page: POST_VISIBILITY_CHUNK_SIZE,
            }]
        );
    }

    #[tokio::test]
    async fn overlapping_load_more_is_coalesced() {
        let store = Store::default();
        let source = FakeSource::default();
        source.yield_on_posts.store(true, Ordering::SeqCst);
        source.push_posts(Some(page_of(POST_VISIBILITY_CHUNK_SIZE, "c1", 100)));

        let (first, second) = tokio::join!(
            increase_post_visibility(&store, &source, "c1", None),
            increase_post_visibility(&store, &source, "c1", None),
        );

        assert!(first);
        assert!(second);
        assert_eq!(source.calls().len(), 1);
        assert_eq!(
            store.read(|s| s.views.channel.post_visibility("c1")).await,
            POST_VISIBILITY_CHUNK_SIZE
        );
    }

    #[tokio::test]
    async fn cancelled_load_more_releases_the_channel() {
        let store = Store::default();
        let source = FakeSource::default();
        source.yield_on_posts.store(true, Ordering::SeqCst);
        source.push_posts(Some(page_of(POST_VISIBILITY_CHUNK_SIZE, "c1", 100)));

        tokio::select! {
            biased;
            _ = increase_post_visibility(&store, &source, "c1", None) => panic!("fetch should still be pending"),
            _ = std::future::ready(()) => {}
        }

        assert_eq!(source.calls().len(), 1);
        assert!(!store.read(|s| s.views.channel.is_loading_posts("c1")).await);

        source.yield_on_posts.store(false, Ordering::SeqCst);
        assert!(increase_post_visibility(&store, &source, "c1", None).await);
        assert_eq!(source.calls().len(), 2);
        assert_eq!(
            store.read(|s| s.views.channel.post_visibility("c1")).await,
            POST_VISIBILITY_CHUNK_SIZE
        );
    }

    #[tokio::test]
    async fn late_fetch_still_records_its_time() {
        let store = Store::default();
        store.dispatch(Action::SelectChannel { channel_id: "c1".into() }).await;
        let source = FakeSource::default();
        source.yield_on_posts.store(true, Ordering::SeqCst);
        source.push_posts(Some(post_list(vec![post("p1", "c1", "u", 1)])));

        let (received, ()) = tokio::join!(
            load_posts_if_necessary_with_retry(&store, &source, "c1"),
            store.dispatch(Action::SelectChannel { channel_id: "c2".into() }),
        );

        assert!(received);
        let (recorded, current) = store
            .read(|s| {
                (
                    s.views.channel.last_get_posts.get("c1").copied(),
                    s.current_channel_id().to_string(),
                )
            })
            .await;
        assert!(recorded.is_some());
        assert_eq!(current, "c2");
    }

    #[tokio::test]
    async fn thread_is_fetched_only_when_root_is_unknown() {
        let store = store_with_posts("c1", 1, 10).await;
        let source = FakeSource::default();

        load_thread_if_necessary(&store, &source, "c1-10", "c1").await;
        load_thread_if_necessary(&store, &source, "", "c1").await;
        assert!(source.calls().is_empty());

        load_thread_if_necessary(&store, &source, "root", "c1").await;
        assert_eq!(source.calls(), vec![Call::Thread("root".into())]);
    }

    #[tokio::test]
    async fn files_are_fetched_once() {
        let store = Store::default();
        let source = FakeSource::default();

        load_files_for_post_if_necessary(&store, &source, "p1").await;
        load_files_for_post_if_necessary(&store, &source, "p1").await;

        assert_eq!(source.calls(), vec![Call::Files("p1".into())]);
    }
}
