pub const NAMESPACE_SEP: char = ':';
pub const ALIAS_PREFIX: char = '/';

pub fn namespaced(plugin: &str, resource: &str) -> String {
    format!("{}{}{}", plugin, NAMESPACE_SEP, resource)
}

/// `/{plugin}:{command}`, reachable regardless of collisions.
pub fn qualified_alias(plugin: &str, command: &str) -> String {
    format!("{}{}", ALIAS_PREFIX, namespaced(plugin, command))
}

/// `/{command}`, only registered when nothing else claims it.
pub fn short_alias(command: &str) -> String {
    format!("{}{}", ALIAS_PREFIX, command)
}

/// File name for a materialized command prompt: `<plugin>_<command>.md`.
pub fn command_file_name(plugin: &str, command: &str) -> String {
    let sanitize = |s: &str| s.replace(['/', '\\', NAMESPACE_SEP], "_");
    format!("{}_{}.md", sanitize(plugin), sanitize(command))
}
