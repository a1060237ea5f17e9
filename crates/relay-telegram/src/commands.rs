//! Bot commands, intercepted before the research backend.
//!
//! `/start`, `/help` and `/about` answer with fixed text. `/research <q>`
//! forwards `q` as an ordinary question; without `q` it answers with a
//! usage hint. Anything else that starts with `/` is ignored.

/// A recognized (or ignored) bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Help,
    About,
    /// `/research` and the trimmed text after it, possibly empty.
    Research(&'a str),
    /// Unknown command, or one addressed to a different bot.
    Ignored,
}

/// Outcome of a command once applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction<'a> {
    /// Reply with canned text; the research backend is not called.
    Reply(String),
    /// Continue the normal pipeline with this question.
    Research(&'a str),
    /// Do nothing.
    Ignore,
}

/// Parse `text` as a command. Returns `None` when it is not one.
///
/// The first word is matched case-insensitively. A `@botname` suffix is
/// accepted when it names this bot (or when no bot username is configured).
pub fn parse<'a>(text: &'a str, bot_username: Option<&str>) -> Option<Command<'a>> {
    let trimmed = text.trim_start();
    let rest = trimmed.strip_prefix('/')?;

    let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (word, remainder) = rest.split_at(word_end);

    let name = match word.split_once('@') {
        Some((name, addressed_to)) => {
            let for_us = bot_username
                .map(|me| me.trim_start_matches('@').eq_ignore_ascii_case(addressed_to))
                .unwrap_or(true);
            if !for_us {
                return Some(Command::Ignored);
            }
            name
        }
        None => word,
    };

    let cmd = match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "about" => Command::About,
        "research" => Command::Research(remainder.trim()),
        _ => Command::Ignored,
    };
    Some(cmd)
}

impl<'a> Command<'a> {
    /// Decide what to do with this command for a sender called `username`.
    pub fn action(&self, username: Option<&str>) -> CommandAction<'a> {
        match self {
            Command::Start => CommandAction::Reply(welcome_text(username)),
            Command::Help => CommandAction::Reply(HELP_TEXT.to_string()),
            Command::About => CommandAction::Reply(ABOUT_TEXT.to_string()),
            Command::Research(q) if q.is_empty() => CommandAction::Reply(RESEARCH_USAGE.to_string()),
            Command::Research(q) => CommandAction::Research(*q),
            Command::Ignored => CommandAction::Ignore,
        }
    }
}

pub fn welcome_text(username: Option<&str>) -> String {
    let name = username.filter(|u| !u.is_empty()).unwrap_or("Unknown");
    format!(
        "🤖 *Welcome to the Research Assistant!*\n\n\
         Hello @{name}! Ask me anything and I'll come back with a researched answer.\n\n\
         *How to use:*\n\
         • Just send me any question or topic\n\
         • Use /research <question> for specific research\n\
         • Use /help for more commands\n\n\
         Try asking: \"What are the latest developments in AI?\""
    )
}

pub const HELP_TEXT: &str = "📖 *Available Commands:*\n\n\
    /start - Welcome message and introduction\n\
    /help - Show this help message\n\
    /research <question> - Research a specific topic\n\
    /about - About this bot\n\n\
    *Examples:*\n\
    • `/research quantum computing applications`\n\
    • `What is machine learning?`\n\n\
    Just send me any question and I'll research it for you! 🚀";

pub const ABOUT_TEXT: &str = "🤖 *Research Assistant*\n\n\
    Questions sent here are forwarded to a research service that searches \
    multiple sources and replies with a structured answer.\n\n\
    *Features:*\n\
    • Multiple source analysis\n\
    • Structured responses\n\
    • Also reachable from WhatsApp and webhooks";

pub const RESEARCH_USAGE: &str =
    "Please provide a question after /research\n\nExample: `/research artificial intelligence trends`";
