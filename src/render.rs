//! Message rendering.
//!
//! Turns a [`ContentItem`] into the text posted to the channel. Rendering is
//! pure: no I/O and no failure path.

use crate::config::RenderConfig;
use crate::feed::ContentItem;

/// Longest message text Telegram accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Titles are cut to this many characters before escaping.
const MAX_TITLE_CHARS: usize = 256;

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedMessage {
    /// Message body, already escaped for the channel's markup.
    pub text: String,
}

impl FormattedMessage {
    /// Wrap rendered text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Renders items into messages.
pub trait Renderer: Send + Sync {
    /// Render `item`.
    fn render(&self, item: &ContentItem) -> FormattedMessage;
}

/// Markup dialect of the delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// Telegram legacy Markdown.
    Markdown,
    /// Telegram MarkdownV2.
    MarkdownV2,
    /// Telegram HTML subset.
    Html,
    /// No markup at all.
    Plain,
}

impl Markup {
    /// Map a Telegram `parse_mode` value to a dialect.
    pub fn from_parse_mode(parse_mode: &str) -> Self {
        match parse_mode.to_ascii_lowercase().as_str() {
            "markdown" => Markup::Markdown,
            "markdownv2" => Markup::MarkdownV2,
            "html" => Markup::Html,
            _ => Markup::Plain,
        }
    }

    /// Escape feed text so it renders literally.
    pub fn escape(self, text: &str) -> String {
        let specials: &[char] = match self {
            Markup::Markdown => &['_', '*', '`', '['],
            Markup::MarkdownV2 => &[
                '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}',
                '.', '!', '\\',
            ],
            Markup::Html => {
                return text
                    .replace('&', "&amp;")
                    .replace('<', "&lt;")
                    .replace('>', "&gt;")
            }
            Markup::Plain => return text.to_string(),
        };

        let mut escaped = String::with_capacity(text.len());
        for ch in text.chars() {
            if specials.contains(&ch) {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        escaped
    }

    fn bold(self, text: &str) -> String {
        match self {
            Markup::Markdown | Markup::MarkdownV2 => format!("*{text}*"),
            Markup::Html => format!("<b>{text}</b>"),
            Markup::Plain => text.to_string(),
        }
    }
}

/// Default renderer: header, bold title, summary, link, source and footer.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    header: String,
    footer: Option<String>,
    max_summary_chars: usize,
    markup: Markup,
}

impl MessageRenderer {
    /// Build a renderer from config.
    ///
    /// `{minutes}` in the footer is replaced with `tick_minutes`.
    pub fn new(config: &RenderConfig, markup: Markup, tick_minutes: u64) -> Self {
        let footer = config
            .footer
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(|f| f.replace("{minutes}", &tick_minutes.to_string()));

        Self {
            header: config.header.clone(),
            footer,
            max_summary_chars: config.max_summary_chars,
            markup,
        }
    }

    fn compose(&self, item: &ContentItem, summary_chars: usize) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if !self.header.is_empty() {
            blocks.push(self.header.clone());
        }
        if !item.title.is_empty() {
            let title = ellipsize(&item.title, MAX_TITLE_CHARS);
            blocks.push(self.markup.bold(&self.markup.escape(&title)));
        }
        if summary_chars > 0 {
            if let Some(summary) = item.summary.as_deref().filter(|s| !s.is_empty()) {
                let summary = ellipsize(summary, summary_chars);
                blocks.push(self.markup.escape(&summary));
            }
        }

        let mut origin = Vec::new();
        if let Some(link) = item.link.as_deref() {
            origin.push(self.markup.escape(link));
        }
        if !item.source.is_empty() {
            origin.push(format!("Source: {}", self.markup.escape(&item.source)));
        }
        if !origin.is_empty() {
            blocks.push(origin.join("\n"));
        }

        if let Some(footer) = &self.footer {
            blocks.push(footer.clone());
        }

        blocks.join("\n\n")
    }
}

impl Renderer for MessageRenderer {
    /// The result never exceeds [`MAX_MESSAGE_CHARS`]. The summary shrinks
    /// first; a message still too long without it is cut hard.
    fn render(&self, item: &ContentItem) -> FormattedMessage {
        let mut budget = self.max_summary_chars;
        let mut text = self.compose(item, budget);

        loop {
            let over = text.chars().count().saturating_sub(MAX_MESSAGE_CHARS);
            if over == 0 || budget == 0 {
                break;
            }
            budget = budget.saturating_sub(over);
            text = self.compose(item, budget);
        }

        if let Some((cut, _)) = text.char_indices().nth(MAX_MESSAGE_CHARS) {
            text.truncate(cut);
        }

        FormattedMessage::new(text)
    }
}

/// Cut `text` to `max_chars`, ending on a word boundary with an ellipsis.
fn ellipsize(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };
    format!("{}…", head.trim_end())
}
