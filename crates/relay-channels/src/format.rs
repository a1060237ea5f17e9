//! Rewrite markdown answers into what each channel can render.
//!
//! | dialect     | headings | bold `**` | links `[t](u)` | bullets |
//! |-------------|----------|-----------|----------------|---------|
//! | WhatsApp    | `*`      | `*`       | `t`            | kept    |
//! | Telegram    | `*`      | kept      | kept           | kept    |
//! | Discord     | kept     | kept      | kept           | kept    |
//! | Passthrough | kept     | kept      | kept           | kept    |
//!
//! Every rewrite is idempotent.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `#`..`######` plus whitespace at the start of a line.
static HEADING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").ok());

/// Two or more consecutive asterisks.
static BOLD_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*{2,}").ok());

/// Innermost `[label](url)`; labels cannot contain brackets.
static LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]\([^()\s]*\)").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupDialect {
    Whatsapp,
    Telegram,
    Discord,
    #[default]
    Passthrough,
}

impl MarkupDialect {
    /// Map a caller-supplied platform name to a dialect. Unknown names pass through.
    pub fn from_platform(platform: &str) -> Self {
        match platform.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => MarkupDialect::Whatsapp,
            "telegram" => MarkupDialect::Telegram,
            "discord" => MarkupDialect::Discord,
            _ => MarkupDialect::Passthrough,
        }
    }

    pub fn rewrite(&self, text: &str) -> String {
        match self {
            MarkupDialect::Whatsapp => rewrite_whatsapp(text),
            MarkupDialect::Telegram => rewrite_headings(text),
            MarkupDialect::Discord | MarkupDialect::Passthrough => text.to_string(),
        }
    }
}

fn replace_all(re: &Option<Regex>, text: &str, rep: &str) -> String {
    match re {
        Some(re) => re.replace_all(text, rep).into_owned(),
        None => text.to_string(),
    }
}

fn rewrite_headings(text: &str) -> String {
    replace_all(&HEADING, text, "*")
}

fn rewrite_whatsapp(text: &str) -> String {
    let mut out = text.to_string();
    // Stripping an inner link can expose an outer one, so repeat until stable.
    while LINK.as_ref().is_some_and(|re| re.is_match(&out)) {
        out = replace_all(&LINK, &out, "$1");
    }
    let out = rewrite_headings(&out);
    replace_all(&BOLD_RUN, &out, "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = "# Research Results\n\n## Summary\nSome **bold** claim.\n\n\
        • **Point 1**: detail\n- [Academic Source](https://example.com/source1)\n";

    #[test]
    fn whatsapp_rewrites_headings_bold_and_links() {
        let out = MarkupDialect::Whatsapp.rewrite(ANSWER);
        assert_eq!(
            out,
            "*Research Results\n\n*Summary\nSome *bold* claim.\n\n\
             • *Point 1*: detail\n- Academic Source\n"
        );
    }

    #[test]
    fn telegram_only_rewrites_headings() {
        let out = MarkupDialect::Telegram.rewrite(ANSWER);
        assert!(out.starts_with("*Research Results\n\n*Summary\n"));
        assert!(out.contains("**bold**"));
        assert!(out.contains("[Academic Source](https://example.com/source1)"));
    }

    #[test]
    fn discord_and_passthrough_are_identity() {
        assert_eq!(MarkupDialect::Discord.rewrite(ANSWER), ANSWER);
        assert_eq!(MarkupDialect::Passthrough.rewrite(ANSWER), ANSWER);
    }

    #[test]
    fn rewrites_are_idempotent() {
        let samples = [
            ANSWER,
            "#### deep\n# # nested heading",
            "****very**** bold ***",
            "[[inner](a)](b) and [x](y)",
            "  ## indented heading",
            "C# is not a heading, nor is #hashtag",
        ];
        for dialect in [MarkupDialect::Whatsapp, MarkupDialect::Telegram] {
            for s in samples {
                let once = dialect.rewrite(s);
                assert_eq!(dialect.rewrite(&once), once, "{dialect:?} not idempotent on {s:?}");
            }
        }
    }

    #[test]
    fn nested_links_collapse_to_innermost_label() {
        assert_eq!(MarkupDialect::Whatsapp.rewrite("[[inner](a)](b)"), "inner");
    }

    #[test]
    fn mid_line_hashes_are_kept() {
        let s = "C# is not a heading, nor is #hashtag";
        assert_eq!(MarkupDialect::Whatsapp.rewrite(s), s);
    }

    #[test]
    fn bullets_are_preserved() {
        let s = "• one\n• two\n- three";
        assert_eq!(MarkupDialect::Whatsapp.rewrite(s), s);
    }

    #[test]
    fn platform_names_map_to_dialects() {
        assert_eq!(MarkupDialect::from_platform("WhatsApp"), MarkupDialect::Whatsapp);
        assert_eq!(MarkupDialect::from_platform("telegram"), MarkupDialect::Telegram);
        assert_eq!(MarkupDialect::from_platform("discord"), MarkupDialect::Discord);
        assert_eq!(MarkupDialect::from_platform("slack"), MarkupDialect::Passthrough);
    }
}
