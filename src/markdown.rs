//! Markdown → HTML for AI answers and chat bubbles.
//!
//! GFM flavour with single newlines kept as line breaks, which is what the
//! backend's answers are written for.

use pulldown_cmark::{html::push_html, Event, Options, Parser};

pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let parser = Parser::new_ext(text, options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut html = String::with_capacity(text.len() * 3 / 2);
    push_html(&mut html, parser);
    html
}

fn options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_and_emphasis() {
        assert_eq!(render_markdown("Hello **team**"), "<p>Hello <strong>team</strong></p>\n");
    }

    #[test]
    fn single_newline_breaks() {
        assert_eq!(render_markdown("a\nb"), "<p>a<br />\nb</p>\n");
    }

    #[test]
    fn empty_is_empty() {
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }
}
