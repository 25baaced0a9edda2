use super::parse::{classify, split_chain, ParsedCommand, Segment};
use super::registry::{Command, CommandRegistry};
use crate::app::App;
use crate::error::{Error, Result};
use tracing::debug;

/// Resolves the command named by `parsed` and checks its arity.
pub fn resolve(registry: &CommandRegistry, parsed: &ParsedCommand) -> Result<Command> {
    let matches = registry.lookup(&parsed.name);
    let command = match matches.as_slice() {
        [] => return Err(Error::UnknownCommand(parsed.name.clone())),
        [command] => **command,
        many => {
            return Err(Error::AmbiguousCommand {
                name: parsed.name.clone(),
                candidates: many.iter().map(|c| c.name.to_string()).collect(),
            })
        }
    };
    if parsed.args.len() < command.min_args {
        return Err(Error::MissingArgument(command.name.to_string()));
    }
    if !command.accepts(parsed.args.len()) {
        return Err(Error::TrailingArguments(parsed.args.join("")));
    }
    Ok(command)
}

/// Executes every segment of `line` in order, stopping at the first error.
pub fn execute_line(app: &mut App, line: &str) -> Result<()> {
    for segment in split_chain(line) {
        execute_segment(app, &segment)?;
    }
    Ok(())
}

fn execute_segment(app: &mut App, segment: &str) -> Result<()> {
    match classify(segment) {
        Segment::Command(parsed) if parsed.name.is_empty() => Ok(()),
        Segment::Command(parsed) => {
            let command = resolve(&app.commands, &parsed)?;
            debug!(command = command.name, args = ?parsed.args, bang = parsed.bang, "execute");
            match command.execute {
                Some(execute) => execute(app, &parsed.args, parsed.bang),
                None => Ok(()),
            }
        }
        Segment::SearchForward(pattern) => search(app, pattern, true),
        Segment::SearchBackward(pattern) => search(app, pattern, false),
        Segment::Other => Ok(()),
    }
}

fn search(app: &mut App, pattern: String, forward: bool) -> Result<()> {
    if pattern.is_empty() {
        return Ok(());
    }
    app.dashboard.last_search = pattern;
    app.dashboard.search(forward);
    Ok(())
}

/// Live counterpart of [`execute_line`], run after every edit.
///
/// All segments run. Unknown names, ambiguity and arity problems are expected
/// while a command is half typed and are ignored; the first error raised by
/// an `on_type` callback is returned.
pub fn type_line(app: &mut App, line: &str) -> Result<()> {
    let mut first_error = None;
    for segment in split_chain(line) {
        match classify(&segment) {
            Segment::Command(parsed) if parsed.name.is_empty() => {}
            Segment::Command(parsed) => {
                let Ok(command) = resolve(&app.commands, &parsed) else {
                    continue;
                };
                if let Some(on_type) = command.on_type {
                    if let Err(err) = on_type(app, &parsed.args, parsed.bang) {
                        first_error.get_or_insert(err);
                    }
                }
            }
            Segment::SearchForward(pattern) | Segment::SearchBackward(pattern) => {
                app.dashboard.last_search = pattern;
            }
            Segment::Other => {}
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
