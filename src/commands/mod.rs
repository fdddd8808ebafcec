//! Slash command lookup across built-in and plugin commands.
//!
//! Built-in aliases are fixed when the registry is built. Every plugin
//! command is reachable as `/{plugin}:{command}`; the short `/{command}`
//! form goes to the first plugin that claims it, and never to a plugin when
//! a built-in already owns the alias.

mod builtin;

use std::collections::HashMap;
use std::path::PathBuf;

pub use builtin::{BuiltinHandler, Command, builtin_commands};

use crate::plugins::namespace::{qualified_alias, short_alias};

/// A plugin command as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCommandEntry {
    pub name: String,
    pub plugin_name: String,
    pub description: String,
    /// Absolute path of the prompt, when the plugin provides a readable one.
    pub prompt_file: Option<PathBuf>,
}

impl PluginCommandEntry {
    pub fn qualified_alias(&self) -> String {
        qualified_alias(&self.plugin_name, &self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMatch<'a> {
    Builtin(&'a Command),
    Plugin(&'a PluginCommandEntry),
}

#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    alias_map: HashMap<&'static str, usize>,
    /// Plugin aliases in registration order.
    plugin_aliases: Vec<(String, PluginCommandEntry)>,
    plugin_index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Registry of all built-ins except those whose key is in `excluded`.
    pub fn new(excluded: &[&str]) -> Self {
        let commands: Vec<Command> = builtin_commands()
            .into_iter()
            .filter(|c| !excluded.contains(&c.key))
            .collect();
        let alias_map = commands
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.aliases.iter().map(move |alias| (*alias, i)))
            .collect();

        Self {
            commands,
            alias_map,
            plugin_aliases: Vec::new(),
            plugin_index: HashMap::new(),
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn register_plugin_command(&mut self, entry: PluginCommandEntry) {
        let short = short_alias(&entry.name);
        let claim_short = !self.is_builtin_alias(&short) && !self.plugin_index.contains_key(&short);

        self.insert_plugin_alias(entry.qualified_alias(), entry.clone());
        if claim_short {
            self.insert_plugin_alias(short, entry);
        }
    }

    /// Built-in aliases match case-insensitively, as in [`Self::find_command`].
    fn is_builtin_alias(&self, alias: &str) -> bool {
        self.alias_map.contains_key(alias.to_lowercase().as_str())
    }

    fn insert_plugin_alias(&mut self, alias: String, entry: PluginCommandEntry) {
        match self.plugin_index.get(&alias) {
            Some(&i) => self.plugin_aliases[i].1 = entry,
            None => {
                self.plugin_index.insert(alias.clone(), self.plugin_aliases.len());
                self.plugin_aliases.push((alias, entry));
            }
        }
    }

    /// Replaces all plugin commands.
    pub fn set_plugin_commands(&mut self, entries: impl IntoIterator<Item = PluginCommandEntry>) {
        self.plugin_aliases.clear();
        self.plugin_index.clear();
        for entry in entries {
            self.register_plugin_command(entry);
        }
    }

    pub fn plugin_alias_count(&self) -> usize {
        self.plugin_aliases.len()
    }

    pub fn find(&self, input: &str) -> Option<CommandMatch<'_>> {
        self.find_command(input)
            .map(CommandMatch::Builtin)
            .or_else(|| self.find_plugin_command(input).map(CommandMatch::Plugin))
    }

    /// Built-in matched by the first token of `input`, case-insensitively.
    pub fn find_command(&self, input: &str) -> Option<&Command> {
        let token = first_token(input)?.to_lowercase();
        self.alias_map
            .get(token.as_str())
            .map(|&i| &self.commands[i])
    }

    /// Plugin command matched by the first token of `input` as typed.
    pub fn find_plugin_command(&self, input: &str) -> Option<&PluginCommandEntry> {
        let token = first_token(input)?;
        self.plugin_index
            .get(token)
            .map(|&i| &self.plugin_aliases[i].1)
    }

    /// Splits `input` into its command token and whitespace separated arguments.
    pub fn parse_command_args(input: &str) -> (&str, Vec<&str>) {
        let mut parts = input.split_whitespace();
        let base = parts.next().unwrap_or_default();
        (base, parts.collect())
    }

    /// `(alias, description)` pairs for autocompletion: built-in aliases
    /// first, then plugin aliases in registration order.
    pub fn completion_entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .commands
            .iter()
            .flat_map(|c| {
                c.aliases
                    .iter()
                    .map(|alias| (alias.to_string(), c.description.to_string()))
            })
            .collect();

        for (alias, entry) in &self.plugin_aliases {
            if !self.is_builtin_alias(alias) {
                entries.push((alias.clone(), entry.description.clone()));
            }
        }
        entries
    }

    /// Markdown help listing built-in commands and, when registered, plugin
    /// commands by their qualified alias.
    pub fn help_text(&self) -> String {
        let mut lines = vec!["### Commands".to_string(), String::new()];
        for command in &self.commands {
            let aliases = command
                .aliases
                .iter()
                .map(|alias| format!("`{alias}`"))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("- {aliases}: {}", command.description));
            for (name, description) in &command.subcommands {
                lines.push(format!("  - `{name}`: {description}"));
            }
        }

        if !self.plugin_aliases.is_empty() {
            lines.extend(["".to_string(), "### Plugin Commands".to_string(), String::new()]);
            let mut listed = std::collections::HashSet::new();
            for (_, entry) in &self.plugin_aliases {
                let qualified = entry.qualified_alias();
                if listed.insert(qualified.clone()) {
                    lines.push(format!("- `{qualified}`: {}", entry.description));
                }
            }
        }
        lines.join("\n")
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(&[])
    }
}

fn first_token(input: &str) -> Option<&str> {
    input.split_whitespace().next()
}
