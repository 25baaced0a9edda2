use super::registry::{BuiltinHelp, Command};
use crate::app::App;
use crate::dashboard::{FilterState, ListId, StatusLevel};
use crate::error::{Error, Result};
use crate::keys::Key;
use crate::link::{self, OpenMethod, METHODS};
use crate::refresh::RefreshKind;
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

const LISTS: &[&str] = &["strims", "toggle", "twitch"];
const DIRECTIONS: &[&str] = &["down", "up"];
const OPTIONS: &[&str] = &["strims", "winopen"];

static FILTER_ARG: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^/([^/]*)/([dp])$"));

pub const COMMANDS: &[Command] = &[
    Command {
        name: "clear",
        usage: "cl[ear][!]",
        description: "Clear the filter and search highlight, ! clears all lists",
        min_args: 0,
        max_args: Some(0),
        execute: Some(clear),
        on_type: None,
        complete: None,
    },
    Command {
        name: "copyurl",
        usage: "co[pyurl] {method}",
        description: "Copy url of stream by the chosen method",
        min_args: 1,
        max_args: Some(1),
        execute: Some(copyurl),
        on_type: None,
        complete: Some(complete_copyurl),
    },
    Command {
        name: "echo",
        usage: "e[cho] {text}",
        description: "Echo a string to the status line",
        min_args: 1,
        max_args: None,
        execute: Some(echo),
        on_type: None,
        complete: None,
    },
    Command {
        name: "focus",
        usage: "f[ocus] {list=twitch|strims|toggle}",
        description: "Focus the window for {list}",
        min_args: 1,
        max_args: Some(1),
        execute: Some(focus),
        on_type: None,
        complete: Some(complete_focus),
    },
    Command {
        name: "global",
        usage: "g[lobal][!]/{pattern}/{cmd}",
        description: "Filter {cmd=d|p} lines matching {pattern}, ! filters all lists",
        min_args: 1,
        max_args: None,
        execute: Some(global),
        on_type: Some(global_typed),
        complete: Some(complete_global),
    },
    Command {
        name: "help",
        usage: "h[elp] [subject]",
        description: "Show help for all commands, or those matching [subject] if provided",
        min_args: 0,
        max_args: Some(1),
        execute: Some(help),
        on_type: None,
        complete: Some(complete_help),
    },
    Command {
        name: "map",
        usage: "m[ap] [lhs [rhs]]",
        description: "Print mappings or map keypress [lhs] into command [rhs]. <Bar> replaces | in mappings",
        min_args: 0,
        max_args: None,
        execute: Some(map),
        on_type: None,
        complete: Some(complete_map),
    },
    Command {
        name: "nohlsearch",
        usage: "noh[lsearch]",
        description: "Stop highlighting search",
        min_args: 0,
        max_args: Some(0),
        execute: Some(nohlsearch),
        on_type: None,
        complete: None,
    },
    Command {
        name: "normal",
        usage: "nor[mal] {key}",
        description: "Run the builtin list action for {key}, ignoring mappings",
        min_args: 1,
        max_args: Some(1),
        execute: Some(normal),
        on_type: None,
        complete: None,
    },
    Command {
        name: "open",
        usage: "o[pen] {method}",
        description: "Open stream with the chosen method",
        min_args: 1,
        max_args: Some(1),
        execute: Some(open),
        on_type: None,
        complete: Some(complete_open),
    },
    Command {
        name: "quit",
        usage: "q[uit]",
        description: "Quit the app",
        min_args: 0,
        max_args: Some(0),
        execute: Some(quit),
        on_type: None,
        complete: None,
    },
    Command {
        name: "resize",
        usage: "r[esize] {size}",
        description: "Resize current window to {size} (default: 1)",
        min_args: 1,
        max_args: Some(1),
        execute: Some(resize),
        on_type: None,
        complete: None,
    },
    Command {
        name: "scrollinfo",
        usage: "sc[rollinfo] {direction=up|down}",
        description: "Scroll the stream info window by {direction}",
        min_args: 1,
        max_args: Some(1),
        execute: Some(scrollinfo),
        on_type: None,
        complete: Some(complete_scrollinfo),
    },
    Command {
        name: "set",
        usage: "se[t][!] [no]{option}",
        description: "Set {option} or no{option}, ! toggles the value. see `:h option-list`",
        min_args: 1,
        max_args: Some(1),
        execute: Some(set),
        on_type: None,
        complete: Some(complete_set),
    },
    Command {
        name: "sync",
        usage: "sy[nc]",
        description: "Synchronize all streams on the client side",
        min_args: 0,
        max_args: Some(0),
        execute: Some(sync),
        on_type: None,
        complete: None,
    },
    Command {
        name: "undo",
        usage: "und[o]",
        description: "Undo the filter of the focused list",
        min_args: 0,
        max_args: Some(0),
        execute: Some(undo),
        on_type: None,
        complete: None,
    },
    Command {
        name: "unmap",
        usage: "unm[ap] {lhs}",
        description: "Remove the mapping for {lhs}",
        min_args: 1,
        max_args: Some(1),
        execute: Some(unmap),
        on_type: None,
        complete: Some(complete_unmap),
    },
    Command {
        name: "update",
        usage: "up[date]",
        description: "Update all streams on the connected server",
        min_args: 0,
        max_args: Some(0),
        execute: Some(update),
        on_type: None,
        complete: None,
    },
    Command {
        name: "vglobal",
        usage: "v[global][!]/{pattern}/{cmd}",
        description: "Filter {cmd=d|p} lines NOT matching {pattern}, ! filters all lists",
        min_args: 1,
        max_args: None,
        execute: Some(vglobal),
        on_type: Some(vglobal_typed),
        complete: Some(complete_vglobal),
    },
    Command {
        name: "windo",
        usage: "w[indo] {cmd}",
        description: "Execute {cmd} once for each list",
        min_args: 1,
        max_args: None,
        execute: Some(windo),
        on_type: None,
        complete: None,
    },
];

pub const BUILTIN_HELPS: &[BuiltinHelp] = &[
    BuiltinHelp {
        names: &["/", "?"],
        description: "Enter search mode",
    },
    BuiltinHelp {
        names: &[":"],
        description: "Enter command mode",
    },
    BuiltinHelp {
        names: &["<C-d>"],
        description: "Scroll downwards half of the list",
    },
    BuiltinHelp {
        names: &["<C-e>"],
        description: "Scroll downwards one line",
    },
    BuiltinHelp {
        names: &["<C-n>", "<Down>", "j"],
        description: "Go down one line",
    },
    BuiltinHelp {
        names: &["<C-p>", "<Up>", "k"],
        description: "Go up one line",
    },
    BuiltinHelp {
        names: &["<C-u>"],
        description: "Scroll upwards half of the list",
    },
    BuiltinHelp {
        names: &["<C-y>"],
        description: "Scroll upwards one line",
    },
    BuiltinHelp {
        names: &["<C-z>"],
        description: "When used in mappings, this triggers autocomplete (like `wildcharm` in vim)",
    },
    BuiltinHelp {
        names: &["G"],
        description: "Go to last line of the list",
    },
    BuiltinHelp {
        names: &["M"],
        description: "Go to middle of the list",
    },
    BuiltinHelp {
        names: &["N"],
        description: "Go to previous search match",
    },
    BuiltinHelp {
        names: &["g"],
        description: "Go to first line of the list",
    },
    BuiltinHelp {
        names: &["n"],
        description: "Go to next search match",
    },
    BuiltinHelp {
        names: &["option-list"],
        description: "strims: toggle strims window; winopen: open links in new browser window",
    },
    BuiltinHelp {
        names: &["z"],
        description: "Redraw line at center of window",
    },
];

fn prefixed(command: &str, candidates: &[&str], partial: &str) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| c.starts_with(partial))
        .map(|c| format!(":{command} {c}"))
        .collect()
}

fn clear(app: &mut App, _args: &[String], bang: bool) -> Result<()> {
    for id in app.dashboard.targets(bang) {
        app.dashboard.list_mut(id).clear_filter();
    }
    app.dashboard.last_search.clear();
    Ok(())
}

fn selected_url(app: &App, method: &str) -> Result<(String, OpenMethod)> {
    let method: OpenMethod = method.parse()?;
    let stream = app
        .dashboard
        .focused_list()
        .selected_stream()
        .ok_or(Error::NoSelection)?;
    Ok((link::stream_url(stream, method)?, method))
}

fn copyurl(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let (url, _) = selected_url(app, &args[0])?;
    app.launcher.copy(&url)?;
    app.dashboard
        .set_status(StatusLevel::Success, format!("Copied {url}"));
    Ok(())
}

fn complete_copyurl(_app: &App, partial: &str, _bang: bool) -> Vec<String> {
    prefixed("copyurl", METHODS, partial)
}

fn echo(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    app.dashboard.set_status(StatusLevel::Info, args.join(" "));
    Ok(())
}

fn focus(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let target = match args[0].as_str() {
        "twitch" => ListId::Twitch,
        "strims" => ListId::Strims,
        "toggle" => app.dashboard.focused.other(),
        other => return Err(Error::InvalidArgument(format!("unknown list {other}"))),
    };
    app.dashboard.focus(target);
    Ok(())
}

fn complete_focus(_app: &App, partial: &str, _bang: bool) -> Vec<String> {
    prefixed("focus", LISTS, partial)
}

/// Parses `/{pattern}/{d|p}`. `d` drops matching lines, `p` keeps them.
fn parse_filter(arg: &str, invert: bool) -> Result<Option<FilterState>> {
    let grammar = FILTER_ARG
        .as_ref()
        .map_err(|err| Error::PatternSyntaxInvalid(err.to_string()))?;
    Ok(grammar.captures(arg).map(|captures| {
        let drop = &captures[2] == "d";
        FilterState::new(&captures[1], drop != invert)
    }))
}

fn apply_filter(app: &mut App, args: &[String], bang: bool, invert: bool) -> Result<bool> {
    let arg = args.join(" ");
    let Some(filter) = parse_filter(&arg, invert)? else {
        return Ok(false);
    };
    for id in app.dashboard.targets(bang) {
        app.dashboard.list_mut(id).set_filter(filter.clone())?;
    }
    Ok(true)
}

fn filter_command(app: &mut App, args: &[String], bang: bool, invert: bool) -> Result<()> {
    if apply_filter(app, args, bang, invert)? {
        app.dashboard.show_selection();
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "expected /{{pattern}}/{{d|p}}, got {}",
            args.join(" ")
        )))
    }
}

fn global(app: &mut App, args: &[String], bang: bool) -> Result<()> {
    filter_command(app, args, bang, false)
}

fn global_typed(app: &mut App, args: &[String], bang: bool) -> Result<()> {
    apply_filter(app, args, bang, false).map(|_| ())
}

fn vglobal(app: &mut App, args: &[String], bang: bool) -> Result<()> {
    filter_command(app, args, bang, true)
}

fn vglobal_typed(app: &mut App, args: &[String], bang: bool) -> Result<()> {
    apply_filter(app, args, bang, true).map(|_| ())
}

fn filter_templates(app: &App, command: &str) -> Vec<String> {
    let current = &app.dashboard.focused_list().filter().pattern;
    let mut out = Vec::new();
    if !current.is_empty() {
        out.push(format!(":{command}/{current}/d"));
    }
    out.push(format!(":{command}//d"));
    out
}

fn complete_global(app: &App, _partial: &str, _bang: bool) -> Vec<String> {
    filter_templates(app, "global")
}

fn complete_vglobal(app: &App, _partial: &str, _bang: bool) -> Vec<String> {
    filter_templates(app, "vglobal")
}

fn help(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let text = app.commands.help(args.first().map(String::as_str))?;
    app.dashboard.show_info("HELP", text);
    Ok(())
}

fn complete_help(app: &App, partial: &str, _bang: bool) -> Vec<String> {
    let mut out: Vec<String> = app
        .commands
        .builtin_names(partial)
        .into_iter()
        .map(|name| format!(":help {name}"))
        .collect();
    let query = partial.strip_prefix(':').unwrap_or(partial);
    out.extend(
        app.commands
            .lookup(query)
            .into_iter()
            .map(|c| format!(":help :{}", c.name)),
    );
    out
}

fn map(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let listing: Vec<String> = match args {
        [] => app
            .mappings
            .iter()
            .map(|(lhs, rhs)| format!("{lhs} - {rhs}"))
            .collect(),
        [prefix] => {
            let found: Vec<String> = app
                .mappings
                .iter()
                .filter(|(lhs, _)| lhs.starts_with(prefix.as_str()))
                .map(|(lhs, rhs)| format!("{lhs} - {rhs}"))
                .collect();
            if found.is_empty() {
                return Err(Error::InvalidArgument(format!("no mapping found for {prefix}")));
            }
            found
        }
        [lhs, rhs @ ..] => {
            app.mappings.insert(lhs, &rhs.join(" "))?;
            info!(%lhs, "mapping added");
            return Ok(());
        }
    };
    let mut text = String::from("--- <C-f>/<C-b> to scroll down/up in the info window ---\n");
    for line in listing {
        text.push_str(&line);
        text.push('\n');
    }
    app.dashboard.show_info("MAPPINGS", text);
    Ok(())
}

fn complete_map(app: &App, partial: &str, _bang: bool) -> Vec<String> {
    app.mappings
        .iter()
        .filter(|(lhs, _)| lhs.starts_with(partial))
        .map(|(lhs, _)| format!(":map {lhs}"))
        .collect()
}

fn nohlsearch(app: &mut App, _args: &[String], _bang: bool) -> Result<()> {
    app.dashboard.last_search.clear();
    Ok(())
}

fn normal(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let key = Key::decode(&args[0])?;
    app.list_action(key);
    Ok(())
}

fn open(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let (url, method) = selected_url(app, &args[0])?;
    info!(%url, "open");
    app.launcher.open(&url, method, app.dashboard.winopen)
}

fn complete_open(_app: &App, partial: &str, _bang: bool) -> Vec<String> {
    prefixed("open", METHODS, partial)
}

fn quit(app: &mut App, _args: &[String], _bang: bool) -> Result<()> {
    app.should_quit = true;
    Ok(())
}

fn resize(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let weight = args[0]
        .parse::<u16>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| Error::InvalidArgument(format!("invalid size: {}", args[0])))?;
    app.dashboard.focused_list_mut().weight = weight;
    Ok(())
}

fn scrollinfo(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let delta = match args[0].as_str() {
        "down" => 1,
        "up" => -1,
        other => return Err(Error::InvalidArgument(format!("unknown direction: {other}"))),
    };
    app.dashboard.info.scroll_by(delta);
    Ok(())
}

fn complete_scrollinfo(_app: &App, partial: &str, _bang: bool) -> Vec<String> {
    prefixed("scrollinfo", DIRECTIONS, partial)
}

fn set(app: &mut App, args: &[String], bang: bool) -> Result<()> {
    let (negate, option) = match args[0].strip_prefix("no") {
        Some(rest) => (true, rest),
        None => (false, args[0].as_str()),
    };
    let current = match option {
        "strims" => app.dashboard.strims_visible,
        "winopen" => app.dashboard.winopen,
        other => return Err(Error::InvalidArgument(format!("unknown option {other}"))),
    };
    let value = if bang { !current } else { !negate };
    if option == "strims" {
        app.dashboard.set_strims_visible(value);
    } else {
        app.dashboard.winopen = value;
    }
    Ok(())
}

fn complete_set(_app: &App, partial: &str, bang: bool) -> Vec<String> {
    let mut prefix = String::from(":set");
    if bang {
        prefix.push('!');
    }
    prefix.push(' ');
    let partial = match partial.strip_prefix("no") {
        Some(rest) => {
            prefix.push_str("no");
            rest
        }
        None => partial,
    };
    OPTIONS
        .iter()
        .filter(|o| o.starts_with(partial))
        .map(|o| format!("{prefix}{o}"))
        .collect()
}

fn sync(app: &mut App, _args: &[String], _bang: bool) -> Result<()> {
    app.refresh.request(RefreshKind::Fetch)
}

fn undo(app: &mut App, _args: &[String], _bang: bool) -> Result<()> {
    app.dashboard.focused_list_mut().clear_filter();
    app.dashboard.show_selection();
    Ok(())
}

fn unmap(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    app.mappings.remove(&args[0])?;
    Ok(())
}

fn complete_unmap(app: &App, partial: &str, _bang: bool) -> Vec<String> {
    app.mappings
        .iter()
        .filter(|(lhs, _)| lhs.starts_with(partial))
        .map(|(lhs, _)| format!(":unmap {lhs}"))
        .collect()
}

fn update(app: &mut App, _args: &[String], _bang: bool) -> Result<()> {
    app.refresh.request(RefreshKind::RemoteUpdate)
}

fn windo(app: &mut App, args: &[String], _bang: bool) -> Result<()> {
    let line = format!(":{}", args.join(" "));
    let original = app.dashboard.focused;
    let mut result = Ok(());
    for id in ListId::ALL {
        app.dashboard.focused = id;
        result = super::execute_line(app, &line);
        if result.is_err() {
            break;
        }
    }
    app.dashboard.focused = original;
    result
}
