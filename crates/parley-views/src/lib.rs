pub mod channel;
pub mod create_channel;
pub mod fetch;
pub mod link_preview;
pub mod notification;
pub mod post_list;
pub mod posts;
pub mod reconciler;
pub mod state;
pub mod store;
pub mod thread;

#[cfg(test)]
mod test_support;

pub use state::AppState;
pub use store::Store;
