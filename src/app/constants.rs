/// Name used when an app is initialized without an explicit name.
pub const DEFAULT_ENTRY_NAME: &str = "[DEFAULT]";
