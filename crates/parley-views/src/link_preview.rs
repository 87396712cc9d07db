use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use parley_types::constants::{
    CATEGORY_ADVANCED_SETTINGS, CONFIG_ENABLE_LINK_PREVIEWS, EMBED_PREVIEW, FEATURE_TOGGLE_PREFIX,
};
use parley_types::models::OpenGraphMetadata;

use crate::state::AppState;

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|\s|<br/?>)((?:https?|ftp)://[-A-Z0-9+&@#/%?=()~_|!:,.;\x{2019}]*[-A-Z0-9+&@#/%=~()_|])",
    )
    .unwrap()
});
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]*`").unwrap());
static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());

/// First http(s)/ftp link of a message, ignoring code spans and inline images.
pub fn extract_first_link(message: &str) -> Option<String> {
    let without_code = INLINE_CODE.replace_all(message, "");
    let text = MARKDOWN_IMAGE.replace_all(&without_code, "");

    let link = LINK.captures(&text)?.get(1)?.as_str();
    Url::parse(link).ok()?;
    Some(link.to_string())
}

/// Remembers the link of the last message seen.
#[derive(Debug, Default)]
pub struct FirstLinkCache {
    last_message: Option<String>,
    link: Option<String>,
    extractions: usize,
}

impl FirstLinkCache {
    pub fn get(&mut self, message: &str) -> Option<&str> {
        if self.last_message.as_deref() != Some(message) {
            self.link = extract_first_link(message);
            self.last_message = Some(message.to_string());
            self.extractions += 1;
        }
        self.link.as_deref()
    }

    /// How many times a link was actually extracted.
    pub fn extractions(&self) -> usize {
        self.extractions
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkPreviewProps {
    pub link: Option<String>,
    pub show_link_previews: bool,
    pub open_graph: Option<OpenGraphMetadata>,
    pub device_width: u32,
    pub device_height: u32,
}

pub fn previews_enabled(state: &AppState) -> bool {
    let toggle = format!("{}{}", FEATURE_TOGGLE_PREFIX, EMBED_PREVIEW);
    state
        .entities
        .preferences
        .is_true(CATEGORY_ADVANCED_SETTINGS, &toggle)
        && state
            .entities
            .config
            .get(CONFIG_ENABLE_LINK_PREVIEWS)
            .is_some_and(|v| v == "true")
}

pub fn link_preview_props(cache: &mut FirstLinkCache, state: &AppState, message: &str) -> LinkPreviewProps {
    let link = cache.get(message).map(str::to_string);
    let open_graph = link
        .as_ref()
        .and_then(|url| state.entities.posts.open_graph.get(url))
        .cloned();

    LinkPreviewProps {
        link,
        show_link_previews: previews_enabled(state),
        open_graph,
        device_width: state.device.width,
        device_height: state.device.height,
    }
}
