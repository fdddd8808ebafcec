use std::collections::BTreeSet;

/// What the host application should do for a built-in command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinHandler {
    ShowHelp,
    ShowStatus,
    ShowConfig,
    ReloadConfig,
    ClearHistory,
    ShowLogPath,
    CompactHistory,
    ManagePlugins,
    RunSubagent,
    ExitApp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Stable identifier, used by the exclusion list.
    pub key: &'static str,
    pub aliases: BTreeSet<&'static str>,
    pub description: &'static str,
    pub handler: BuiltinHandler,
    /// Leaves the application after running.
    pub exits: bool,
    /// Subcommand name and description, in display order.
    pub subcommands: Vec<(&'static str, &'static str)>,
}

impl Command {
    fn new(
        key: &'static str,
        aliases: &[&'static str],
        description: &'static str,
        handler: BuiltinHandler,
    ) -> Self {
        Self {
            key,
            aliases: aliases.iter().copied().collect(),
            description,
            handler,
            exits: false,
            subcommands: Vec::new(),
        }
    }

    fn exiting(mut self) -> Self {
        self.exits = true;
        self
    }

    fn with_subcommands(mut self, subcommands: &[(&'static str, &'static str)]) -> Self {
        self.subcommands = subcommands.to_vec();
        self
    }
}

const PLUGIN_SUBCOMMANDS: &[(&str, &str)] = &[
    ("install", "Install a plugin from GitHub or marketplace"),
    ("remove", "Remove an installed plugin"),
    ("list", "List installed plugins"),
    ("enable", "Enable a disabled plugin"),
    ("disable", "Disable a plugin"),
    ("marketplace", "Manage plugin marketplaces"),
];

/// The built-in command table in display order.
pub fn builtin_commands() -> Vec<Command> {
    use BuiltinHandler::*;

    vec![
        Command::new("help", &["/help", "/h"], "Show help message", ShowHelp),
        Command::new("status", &["/status", "/stats"], "Display agent statistics", ShowStatus),
        Command::new(
            "config",
            &["/config", "/cfg", "/theme", "/model"],
            "Edit config settings",
            ShowConfig,
        ),
        Command::new("reload", &["/reload", "/r"], "Reload configuration from disk", ReloadConfig),
        Command::new("clear", &["/clear", "/reset"], "Clear conversation history", ClearHistory),
        Command::new(
            "log",
            &["/log", "/logpath"],
            "Show path to current interaction log file",
            ShowLogPath,
        ),
        Command::new(
            "compact",
            &["/compact", "/summarize"],
            "Compact conversation history by summarizing",
            CompactHistory,
        ),
        Command::new(
            "plugin",
            &["/plugin", "/plugins"],
            "Manage plugins (install, list, remove)",
            ManagePlugins,
        )
        .with_subcommands(PLUGIN_SUBCOMMANDS),
        Command::new(
            "subagent",
            &["/subagent", "/subagents"],
            "Run a plugin subagent prompt",
            RunSubagent,
        ),
        Command::new("exit", &["/exit", "/quit", "/q"], "Exit the application", ExitApp).exiting(),
    ]
}
