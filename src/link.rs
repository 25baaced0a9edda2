use crate::error::{Error, Result};
use crate::streams::Stream;
use std::env;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::info;

pub const METHODS: &[&str] = &["chat", "embed", "homepage", "mpv", "strims"];

const NEW_WINDOW_BROWSERS: &[&str] = &[
    "brave",
    "chromium",
    "firefox",
    "google-chrome",
    "opera",
    "vivaldi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMethod {
    Chat,
    Embed,
    Homepage,
    Mpv,
    Strims,
}

impl FromStr for OpenMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chat" => Ok(OpenMethod::Chat),
            "embed" => Ok(OpenMethod::Embed),
            "homepage" => Ok(OpenMethod::Homepage),
            "mpv" => Ok(OpenMethod::Mpv),
            "strims" => Ok(OpenMethod::Strims),
            other => Err(Error::UnsupportedMethod(other.to_string())),
        }
    }
}

pub fn stream_url(stream: &Stream, method: OpenMethod) -> Result<String> {
    let name = stream.name.as_str();
    let lower = stream.name.to_lowercase();
    let service = stream.service.as_str();
    let url = match (method, service) {
        (OpenMethod::Embed, "angelthump") => {
            format!("https://player.angelthump.com/?channel={lower}")
        }
        (OpenMethod::Embed, "twitch") => {
            format!("https://player.twitch.tv/?channel={lower}&parent=strims.gg")
        }
        (OpenMethod::Embed, "twitch-vod") => {
            format!("https://player.twitch.tv/?parent=strims.gg&video=v{name}")
        }
        (OpenMethod::Embed, "youtube") => {
            format!("https://www.youtube.com/embed/{name}?autoplay=true")
        }
        (OpenMethod::Embed | OpenMethod::Homepage, "m3u8") => {
            format!("https://strims.gg/m3u8/{name}")
        }
        (OpenMethod::Homepage, "angelthump") => format!("https://angelthump.com/{lower}"),
        (OpenMethod::Homepage | OpenMethod::Mpv, "twitch") => {
            format!("https://www.twitch.tv/{lower}")
        }
        (OpenMethod::Homepage | OpenMethod::Mpv, "twitch-vod") => {
            format!("https://www.twitch.tv/videos/{name}")
        }
        (OpenMethod::Homepage | OpenMethod::Mpv, "youtube") => {
            format!("https://www.youtube.com/watch?v={name}")
        }
        (OpenMethod::Mpv, "angelthump") => {
            format!("https://ams-haproxy.angelthump.com/hls/{name}/index.m3u8")
        }
        (OpenMethod::Mpv, "m3u8") => name.to_string(),
        (OpenMethod::Strims, _) => format!("https://strims.gg/{service}/{lower}"),
        (OpenMethod::Chat, "twitch") => format!("https://www.twitch.tv/popout/{lower}/chat"),
        (OpenMethod::Chat, _) => "https://chat.strims.gg".to_string(),
        (_, other) => {
            return Err(Error::UnsupportedMethod(format!(
                "{} for service {other}",
                method_name(method)
            )))
        }
    };
    Ok(url)
}

fn method_name(method: OpenMethod) -> &'static str {
    match method {
        OpenMethod::Chat => "chat",
        OpenMethod::Embed => "embed",
        OpenMethod::Homepage => "homepage",
        OpenMethod::Mpv => "mpv",
        OpenMethod::Strims => "strims",
    }
}

pub trait Launcher {
    fn open(&self, url: &str, method: OpenMethod, winopen: bool) -> Result<()>;
    fn copy(&self, url: &str) -> Result<()>;
}

/// Opens URLs with mpv or the user's browser, copies with `wl-copy`.
pub struct ProcessLauncher {
    browser: Option<String>,
}

impl ProcessLauncher {
    pub fn new(browser: Option<String>) -> Self {
        Self { browser }
    }
}

impl Launcher for ProcessLauncher {
    fn open(&self, url: &str, method: OpenMethod, winopen: bool) -> Result<()> {
        let browser = self.browser.clone().or_else(|| env::var("BROWSER").ok());
        let (program, mut args) = launch_command(browser.as_deref(), method, winopen);
        args.push(url.to_string());
        info!(%program, ?args, "opening stream");
        Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|err| Error::Launch(format!("Failed to launch {program}: {err}")))
    }

    fn copy(&self, url: &str) -> Result<()> {
        let status = Command::new("wl-copy")
            .arg(url)
            .stdin(Stdio::null())
            .status()
            .map_err(|err| Error::Launch(format!("Failed to run wl-copy: {err}")))?;
        if !status.success() {
            return Err(Error::Launch(format!("wl-copy exited with status {status}")));
        }
        Ok(())
    }
}

/// Program and leading arguments used to open a URL.
pub fn launch_command(
    browser: Option<&str>,
    method: OpenMethod,
    winopen: bool,
) -> (String, Vec<String>) {
    if method == OpenMethod::Mpv {
        return ("mpv".to_string(), Vec::new());
    }
    let mut parts = browser
        .and_then(|raw| shell_words::split(raw).ok())
        .filter(|parts| !parts.is_empty())
        .unwrap_or_else(|| vec![platform_opener().to_string()]);
    let program = parts.remove(0);
    let base = Path::new(&program)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(&program)
        .to_string();
    if winopen && NEW_WINDOW_BROWSERS.contains(&base.as_str()) {
        parts.push("--new-window".to_string());
    }
    (program, parts)
}

fn platform_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}

#[cfg(test)]
mod tests {
    use super::{launch_command, stream_url, OpenMethod};
    use crate::dashboard::tests::stream;
    use crate::error::Error;

    #[test]
    fn method_parsing_rejects_unknown_names() {
        assert_eq!("mpv".parse::<OpenMethod>(), Ok(OpenMethod::Mpv));
        assert_eq!(
            "vlc".parse::<OpenMethod>(),
            Err(Error::UnsupportedMethod("vlc".to_string()))
        );
    }

    #[test]
    fn twitch_urls_use_lowercase_channel() {
        let s = stream("twitch", "LoudGuy", "");
        assert_eq!(
            stream_url(&s, OpenMethod::Embed).expect("url"),
            "https://player.twitch.tv/?channel=loudguy&parent=strims.gg"
        );
        assert_eq!(
            stream_url(&s, OpenMethod::Chat).expect("url"),
            "https://www.twitch.tv/popout/loudguy/chat"
        );
    }

    #[test]
    fn strims_and_chat_have_defaults() {
        let s = stream("angelthump", "Someone", "");
        assert_eq!(
            stream_url(&s, OpenMethod::Strims).expect("url"),
            "https://strims.gg/angelthump/someone"
        );
        assert_eq!(
            stream_url(&s, OpenMethod::Chat).expect("url"),
            "https://chat.strims.gg"
        );
        assert_eq!(
            stream_url(&s, OpenMethod::Mpv).expect("url"),
            "https://ams-haproxy.angelthump.com/hls/Someone/index.m3u8"
        );
    }

    #[test]
    fn unknown_service_is_unsupported() {
        let s = stream("kick", "x", "");
        assert!(matches!(
            stream_url(&s, OpenMethod::Embed),
            Err(Error::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn launch_command_prefers_browser_and_new_window() {
        let (program, args) =
            launch_command(Some("/usr/bin/firefox --private"), OpenMethod::Embed, true);
        assert_eq!(program, "/usr/bin/firefox");
        assert_eq!(args, vec!["--private".to_string(), "--new-window".to_string()]);

        let (program, args) = launch_command(Some("firefox"), OpenMethod::Mpv, true);
        assert_eq!(program, "mpv");
        assert!(args.is_empty());

        let (_, args) = launch_command(Some("w3m"), OpenMethod::Homepage, true);
        assert!(args.is_empty());
    }
}
