//! Display-ready messages built from raw API documents.

use std::fmt::Display;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::api::types::RawMessage;

/// A search result as the screen renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Stable id, used as the list key.
    pub id: String,
    pub room_id: Option<String>,
    pub text: String,
    pub author: Author,
    pub ts: Option<DateTime<Utc>>,
    pub edited: bool,
    pub reactions: Vec<Reaction>,
    pub attachments: Vec<String>,
    pub system_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub username: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reaction {
    pub emoji: String,
    pub usernames: Vec<String>,
}

impl Reaction {
    pub fn count(&self) -> usize {
        self.usernames.len()
    }

    pub fn includes(&self, username: &str) -> bool {
        self.usernames.iter().any(|u| u == username)
    }
}

/// Normalize a raw message document into a [`Message`].
pub fn build_message(raw: RawMessage) -> Message {
    let author = raw
        .u
        .map(|u| Author {
            username: u.username,
            name: u.name.filter(|n| !n.is_empty()),
        })
        .unwrap_or_else(|| Author {
            username: "unknown".to_string(),
            name: None,
        });

    // BTreeMap iteration keeps reactions sorted by shortcode.
    let reactions = raw
        .reactions
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, r)| !r.usernames.is_empty())
        .map(|(emoji, r)| Reaction {
            emoji,
            usernames: r.usernames,
        })
        .collect();

    let attachments = raw
        .attachments
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.title.or(a.text))
        .filter(|s| !s.is_empty())
        .collect();

    Message {
        id: raw.id,
        room_id: raw.rid,
        text: raw.msg,
        author,
        ts: raw.ts,
        edited: raw.edited_at.is_some(),
        reactions,
        attachments,
        system_type: raw.type_,
    }
}

/// English ordinal suffix for a day of month: 1st, 2nd, 3rd, 4th, 11th...
pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Format with a chrono pattern, expanding `{Do}` to the ordinal day.
pub fn format_timestamp<Tz>(ts: DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let pattern = pattern.replace("{Do}", &ordinal(ts.day()));
    ts.format(&pattern).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_full_message() {
        let msg = build_message(raw(
            r#"{"_id":"m1","rid":"R1","msg":"hello world","ts":"2024-03-03T16:05:09Z",
                "u":{"_id":"u1","username":"alice","name":"Alice"},
                "editedAt":{"$date":1709481999000},
                "reactions":{":tada:":{"usernames":["bob"]},":+1:":{"usernames":["alice","bob"]}}}"#,
        ));

        assert_eq!(msg.id, "m1");
        assert_eq!(msg.room_id.as_deref(), Some("R1"));
        assert_eq!(msg.author.name.as_deref(), Some("Alice"));
        assert!(msg.edited);
        let emojis: Vec<&str> = msg.reactions.iter().map(|r| r.emoji.as_str()).collect();
        assert_eq!(emojis, vec![":+1:", ":tada:"]);
        assert_eq!(msg.reactions[0].count(), 2);
        assert!(msg.reactions[0].includes("alice"));
    }

    #[test]
    fn missing_author_and_empty_reactions() {
        let msg = build_message(raw(
            r#"{"_id":"m2","msg":"x","reactions":{":smile:":{"usernames":[]}},
                "attachments":[{"title":"report.pdf"},{"text":""}]}"#,
        ));
        assert_eq!(msg.author.username, "unknown");
        assert!(msg.reactions.is_empty());
        assert_eq!(msg.attachments, vec!["report.pdf"]);
        assert!(!msg.edited);
    }

    #[test]
    fn ordinal_suffixes() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 31]
            .into_iter()
            .map(ordinal)
            .collect();
        assert_eq!(
            got,
            vec!["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd", "31st"]
        );
    }

    #[test]
    fn formats_long_timestamp() {
        let ts = DateTime::parse_from_rfc3339("2024-03-03T16:05:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            format_timestamp(ts, "%B {Do} %Y, %-I:%M:%S %P"),
            "March 3rd 2024, 4:05:09 pm"
        );
    }
}
