/// Posts are revealed in the post list this many at a time.
pub const POST_VISIBILITY_CHUNK_SIZE: usize = 15;

/// Page size for the first page of a channel.
pub const POST_CHUNK_SIZE: usize = 60;

pub const MAX_POST_TRIES: usize = 3;

pub const PROFILES_PER_PAGE: usize = 100;

pub const DEFAULT_CHANNEL: &str = "town-square";

pub const POST_DELETED: &str = "DELETED";

// -- Preference categories --

pub const CATEGORY_DIRECT_CHANNEL_SHOW: &str = "direct_channel_show";
pub const CATEGORY_GROUP_CHANNEL_SHOW: &str = "group_channel_show";
pub const CATEGORY_FAVORITE_CHANNEL: &str = "favorite_channel";
pub const CATEGORY_ADVANCED_SETTINGS: &str = "advanced_settings";
pub const CATEGORY_DISPLAY_SETTINGS: &str = "display_settings";

// -- Preference names --

pub const NAME_NAME_FORMAT: &str = "name_format";
pub const FEATURE_TOGGLE_PREFIX: &str = "feature_enabled_";
pub const EMBED_PREVIEW: &str = "embed_preview";

// -- Teammate name display --

pub const DISPLAY_PREFER_USERNAME: &str = "username";
pub const DISPLAY_PREFER_NICKNAME: &str = "nickname_full_name";
pub const DISPLAY_PREFER_FULL_NAME: &str = "full_name";

// -- Server config keys --

pub const CONFIG_ENABLE_LINK_PREVIEWS: &str = "EnableLinkPreviews";
pub const CONFIG_TEAMMATE_NAME_DISPLAY: &str = "TeammateNameDisplay";
