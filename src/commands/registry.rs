//! Command descriptors and prefix lookup.

use crate::app::App;
use crate::error::{Error, Result};
use std::fmt;
use tracing::warn;

/// Callback run with the parsed arguments and bang flag.
pub type CommandFn = fn(&mut App, &[String], bool) -> Result<()>;
/// Completion provider, given the partial argument and bang flag.
pub type CompleteFn = fn(&App, &str, bool) -> Vec<String>;

/// An ex-style command.
///
/// `usage` marks the shortest unambiguous abbreviation with brackets, so
/// `g[lobal]` accepts `g`, `gl`, ... `global`.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub min_args: usize,
    /// `None` accepts any number of arguments.
    pub max_args: Option<usize>,
    pub execute: Option<CommandFn>,
    /// Run on every keystroke while the command is being typed.
    pub on_type: Option<CommandFn>,
    pub complete: Option<CompleteFn>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }
}

/// Help entry for a key handled outside the mapping table.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinHelp {
    pub names: &'static [&'static str],
    pub description: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    builtin_helps: Vec<BuiltinHelp>,
}

const HELP_HEADER: &str = "--- <C-f>/<C-b> to scroll down/up in the info window ---\n";

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        for command in super::builtins::COMMANDS {
            if let Err(err) = registry.register(*command) {
                warn!("skipping builtin: {err}");
            }
        }
        registry
            .builtin_helps
            .extend_from_slice(super::builtins::BUILTIN_HELPS);
        registry
    }

    pub fn register(&mut self, command: Command) -> Result<()> {
        if self.commands.iter().any(|c| c.name == command.name) {
            return Err(Error::InvalidArgument(format!(
                "command already registered: {}",
                command.name
            )));
        }
        self.commands.push(command);
        Ok(())
    }

    /// Every command whose name starts with `prefix`, in registration order.
    pub fn lookup(&self, prefix: &str) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| c.name.starts_with(prefix))
            .collect()
    }

    #[cfg(test)]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Builtin names starting with `prefix`.
    pub fn builtin_names(&self, prefix: &str) -> Vec<&'static str> {
        self.builtin_helps
            .iter()
            .flat_map(|h| h.names.iter().copied())
            .filter(|name| name.starts_with(prefix))
            .collect()
    }

    /// Help text for everything, or for the commands and builtins matching `subject`.
    pub fn help(&self, subject: Option<&str>) -> Result<String> {
        let mut text = String::from(HELP_HEADER);
        match subject {
            None => {
                for help in &self.builtin_helps {
                    text.push_str(&builtin_entry(help));
                }
                for command in &self.commands {
                    text.push_str(&format!(":{}\n  {}\n", command.usage, command.description));
                }
            }
            Some(subject) => {
                let query = subject.strip_prefix(':').unwrap_or(subject);
                let mut found = false;
                for command in self.lookup(query) {
                    found = true;
                    text.push_str(&format!(":{} - {}\n", command.usage, command.description));
                }
                for help in self.builtin_helps.iter().filter(|h| h.names.contains(&query)) {
                    found = true;
                    text.push_str(&builtin_entry(help));
                }
                if !found {
                    return Err(Error::InvalidArgument(format!("no help for {subject}")));
                }
            }
        }
        Ok(text)
    }
}

fn builtin_entry(help: &BuiltinHelp) -> String {
    format!("(builtin) {}\n  {}\n", help.names.join(" or "), help.description)
}

#[cfg(test)]
mod tests {
    use super::{Command, CommandRegistry};
    use crate::commands::builtins::COMMANDS;
    use crate::error::Error;

    fn command(name: &'static str) -> Command {
        Command {
            name,
            usage: name,
            description: "",
            min_args: 1,
            max_args: Some(1),
            execute: None,
            on_type: None,
            complete: None,
        }
    }

    #[test]
    fn lookup_full_name_returns_exactly_that_command() {
        let registry = CommandRegistry::new();
        for command in registry.commands() {
            let found = registry.lookup(command.name);
            assert_eq!(found.len(), 1, "{} is ambiguous", command.name);
            assert_eq!(found[0].name, command.name);
        }
    }

    #[test]
    fn every_builtin_registers_under_a_unique_name() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.commands().len(), COMMANDS.len());

        let mut again = CommandRegistry::new();
        for command in COMMANDS {
            assert!(again.register(*command).is_err(), "{}", command.name);
        }
    }

    #[test]
    fn empty_prefix_returns_everything() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.lookup("").len(), registry.commands().len());
    }

    #[test]
    fn usage_brackets_mark_shortest_unique_prefix() {
        let registry = CommandRegistry::new();
        for command in registry.commands() {
            let (short, _) = command
                .usage
                .split_once('[')
                .unwrap_or((command.usage, ""));
            assert!(command.name.starts_with(short), "{}", command.usage);
            assert_eq!(registry.lookup(short).len(), 1, "{} is ambiguous", short);
            let shorter = &short[..short.len() - 1];
            assert!(
                registry.lookup(shorter).len() > 1,
                "{} could be abbreviated to {}",
                command.name,
                shorter
            );
        }
    }

    #[test]
    fn overlapping_names_are_all_returned() {
        let mut registry = CommandRegistry::default();
        registry.register(command("open")).expect("register");
        registry.register(command("openurl")).expect("register");
        let names: Vec<_> = registry.lookup("open").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["open", "openurl"]);
        assert_eq!(registry.lookup("openu").len(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = CommandRegistry::default();
        registry.register(command("open")).expect("register");
        assert!(matches!(
            registry.register(command("open")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn arity_bounds() {
        let mut unbounded = command("echo");
        unbounded.max_args = None;
        assert!(unbounded.accepts(40));
        assert!(!unbounded.accepts(0));
        assert!(command("open").accepts(1));
        assert!(!command("open").accepts(2));
    }

    #[test]
    fn help_lists_usage_and_builtins() {
        let registry = CommandRegistry::new();
        let all = registry.help(None).expect("help");
        assert!(all.contains(":g[lobal][!]/{pattern}/{cmd}\n"));
        assert!(all.contains("(builtin) <C-n> or <Down> or j\n"));

        let one = registry.help(Some(":sc")).expect("help");
        assert_eq!(one.lines().count(), 2);
        assert!(one.contains(":sc[rollinfo] {direction=up|down} - "));

        let builtin = registry.help(Some("option-list")).expect("help");
        assert!(builtin.contains("winopen"));

        assert!(registry.help(Some("nothing")).is_err());
    }
}
