use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Search response
// ---------------------------------------------------------------------------

/// Result of a message search.
///
/// The REST endpoint answers `{ "messages": [...] }`; the method-call API
/// answers `{ "message": { "docs": [...] } }`. Both shapes are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Rest { messages: Vec<RawMessage> },
    Method { message: SearchDocs },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchDocs {
    #[serde(default)]
    pub docs: Vec<RawMessage>,
}

impl SearchResponse {
    pub fn into_docs(self) -> Vec<RawMessage> {
        match self {
            Self::Rest { messages } => messages,
            Self::Method { message } => message.docs,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub rid: Option<String>,
    #[serde(default)]
    pub msg: String,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub u: Option<RawUser>,
    /// Keyed by emoji shortcode, e.g. `":+1:"`.
    #[serde(default)]
    pub reactions: Option<BTreeMap<String, RawReaction>>,
    #[serde(default)]
    pub attachments: Option<Vec<RawAttachment>>,
    #[serde(default, rename = "editedAt", deserialize_with = "de_opt_timestamp")]
    pub edited_at: Option<DateTime<Utc>>,
    /// System message type; absent for regular messages.
    #[serde(default, rename = "t")]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReaction {
    #[serde(default)]
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAttachment {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Timestamps arrive either as ISO-8601 strings (REST) or as
/// `{ "$date": <millis> }` objects (EJSON).
#[derive(Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Iso(DateTime<Utc>),
    Ejson {
        #[serde(rename = "$date")]
        date: i64,
    },
}

fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Timestamp>::deserialize(deserializer)?;
    Ok(raw.and_then(|ts| match ts {
        Timestamp::Iso(dt) => Some(dt),
        Timestamp::Ejson { date } => DateTime::from_timestamp_millis(date),
    }))
}

// ---------------------------------------------------------------------------
// Misc endpoints
// ---------------------------------------------------------------------------

/// Generic `{ "success": bool, "error": ... }` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api/v1/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct Me {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET /api/v1/rooms.info`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomInfoResponse {
    pub room: Room,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "fname")]
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rest_search_shape() {
        let body = r#"{"messages":[{"_id":"m1","msg":"hello","ts":"2024-03-03T16:05:09.000Z",
            "u":{"_id":"u1","username":"alice"}}],"success":true}"#;
        let docs = serde_json::from_str::<SearchResponse>(body)
            .unwrap()
            .into_docs();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "m1");
        assert_eq!(docs[0].u.as_ref().unwrap().username, "alice");
        assert!(docs[0].ts.is_some());
    }

    #[test]
    fn parses_method_search_shape_with_ejson_dates() {
        let body = r#"{"message":{"docs":[{"_id":"m2","msg":"hi","ts":{"$date":1709481909000},
            "reactions":{":+1:":{"usernames":["bob"]}}}]}}"#;
        let docs = serde_json::from_str::<SearchResponse>(body)
            .unwrap()
            .into_docs();
        assert_eq!(docs[0].id, "m2");
        assert_eq!(
            docs[0].ts.unwrap(),
            DateTime::from_timestamp_millis(1_709_481_909_000).unwrap()
        );
        let reactions = docs[0].reactions.as_ref().unwrap();
        assert_eq!(reactions[":+1:"].usernames, vec!["bob"]);
    }

    #[test]
    fn null_timestamp_is_none() {
        let raw: RawMessage = serde_json::from_str(r#"{"_id":"m3","ts":null}"#).unwrap();
        assert!(raw.ts.is_none());
        assert!(raw.msg.is_empty());
    }
}
