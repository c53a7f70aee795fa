//! Terminal presentation for the `storyweb-player` binary.

use std::fmt::Write as _;

use storyweb_domain::media::VideoAudioSetting;
use storyweb_domain::navigation::{ConditionedMode, NavStyle};
use storyweb_domain::{EngineError, NavigationModel, Node, NodeMedia};

/// One line of reader input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 1-based button number
    Choose(usize),
    /// Empty line: follow the primary link
    Continue,
    Back,
    Home,
    Quit,
    Unknown,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "" => Command::Continue,
        "b" | "back" => Command::Back,
        "h" | "home" => Command::Home,
        "q" | "quit" | "exit" => Command::Quit,
        other => match other.parse::<usize>() {
            Ok(number) if number > 0 => Command::Choose(number),
            _ => Command::Unknown,
        },
    }
}

/// Node text with markup removed and whitespace collapsed per line.
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag = String::new();
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                if matches!(name.as_str(), "p" | "br" | "br/" | "div" | "li" | "h1" | "h2" | "h3") {
                    text.push('\n');
                }
            }
            _ if in_tag => tag.push(c),
            _ => text.push(c),
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Media lines shown under the node text.
pub fn render_media(media: &NodeMedia) -> String {
    let mut out = String::new();
    if let Some(video) = &media.video {
        let mut notes = Vec::new();
        if video.looping {
            notes.push("loop".to_string());
        }
        match video.audio {
            VideoAudioSetting::On => {}
            VideoAudioSetting::Off => notes.push("muted".to_string()),
            VideoAudioSetting::OffMobile => notes.push("muted on mobile".to_string()),
        }
        if let Some(subtitles) = video.subtitle_candidates.first() {
            notes.push(format!("subtitles {subtitles}"));
        }
        let suffix = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        let _ = writeln!(out, "  [video] {}{}", video.source, suffix);
    }
    if let Some(image_url) = &media.image_url {
        let _ = writeln!(out, "  [image] {image_url}");
    }
    if let Some(reference) = &media.reference {
        let action = if reference.new_tab {
            "Open in new tab"
        } else {
            "Open link"
        };
        match &reference.url {
            Some(url) => {
                let _ = writeln!(out, "  [{action}] {url}");
            }
            None => {
                let _ = writeln!(out, "  [{action}] No URL found in this node.");
            }
        }
    }
    out
}

/// Render the shown node, its media and its buttons.
pub fn render_node(
    node: &Node,
    media: &NodeMedia,
    model: &NavigationModel,
    style: NavStyle,
    progress_percent: u8,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==  [{}%]", node.title, progress_percent);
    let text = plain_text(&node.text);
    if !text.is_empty() {
        let _ = writeln!(out, "{text}");
    }
    out.push_str(&render_media(media));
    out.push('\n');

    if style == NavStyle::NoButtons || model.buttons.is_empty() {
        if model.primary_link_id.is_some() {
            let _ = writeln!(out, "  [enter] continue");
        }
    } else {
        for (index, button) in model.buttons.iter().enumerate() {
            let mut notes = Vec::new();
            if button.is_current {
                notes.push("here");
            }
            if button.disabled {
                notes.push("unavailable");
            }
            if button.conditioned_mode == Some(ConditionedMode::Dim) {
                notes.push("dimmed");
            }
            let suffix = if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join(", "))
            };
            let _ = writeln!(out, "  {}. {}{}", index + 1, button.label, suffix);
        }
    }
    let _ = write!(out, "  [b]ack  [h]ome  [q]uit > ");
    out
}

pub fn render_error(error: &EngineError) -> String {
    match &error.description {
        Some(description) => format!("! {}: {}", error.title, description),
        None => format!("! {}", error.title),
    }
}
