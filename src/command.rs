use crate::api::rooms::RoomRef;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Room(RoomRef),
    React(String),
    Help,
    Quit,
}

pub fn parse_command(input: &str) -> Option<Command> {
    let input = input.strip_prefix(':').unwrap_or(input).trim();

    if input.is_empty() {
        return None;
    }

    let (cmd, args) = match input.split_once(char::is_whitespace) {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (input, ""),
    };

    match cmd {
        "room" | "r" => RoomRef::parse(args).map(Command::Room),
        "react" | "+" => normalize_emoji(args).map(Command::React),
        "help" | "h" => Some(Command::Help),
        "quit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

/// Turn `smile`, `:smile:` or `:smile` into the `:smile:` shortcode form.
pub fn normalize_emoji(input: &str) -> Option<String> {
    let name = input.trim().trim_matches(':');
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }
    Some(format!(":{name}:"))
}
