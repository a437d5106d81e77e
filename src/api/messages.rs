use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::api::types::{SearchResponse, StatusResponse};
use crate::api::{ApiClientError, RocketChatClient};

/// Percent-encoding set for URL query values (encode everything except unreserved chars).
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn encode_query(s: &str) -> String {
    utf8_percent_encode(s, QUERY_ENCODE_SET).to_string()
}

fn search_path(text: &str, room_id: &str, offset: u32, count: u32) -> String {
    format!(
        "/chat.search?roomId={}&searchText={}&offset={offset}&count={count}",
        encode_query(room_id),
        encode_query(text),
    )
}

impl RocketChatClient {
    /// Search messages in a room. `offset` skips that many matches.
    pub async fn message_search(
        &self,
        text: &str,
        room_id: &str,
        offset: u32,
        count: u32,
    ) -> Result<SearchResponse, ApiClientError> {
        let url = self.url(&search_path(text, room_id, offset, count));
        self.get(&url).await
    }

    /// Toggle `emoji` on a message for the authenticated user.
    pub async fn set_reaction(&self, emoji: &str, message_id: &str) -> Result<(), ApiClientError> {
        let url = self.url("/chat.react");
        let body = serde_json::json!({
            "messageId": message_id,
            "emoji": emoji,
        });
        let resp: StatusResponse = self.post(&url, &body).await?;
        if !resp.success {
            return Err(ApiClientError::ApiError {
                status: 200,
                detail: resp.error.unwrap_or_else(|| "reaction rejected".to_string()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_path_encodes_regex_queries() {
        assert_eq!(
            search_path("/^hello$/i", "R1", 40, 20),
            "/chat.search?roomId=R1&searchText=%2F%5Ehello%24%2Fi&offset=40&count=20"
        );
    }

    #[test]
    fn search_path_encodes_spaces_and_unicode() {
        let path = search_path("olá mundo", "GENERAL", 0, 20);
        assert!(path.contains("searchText=ol%C3%A1%20mundo"));
        assert!(path.ends_with("&offset=0&count=20"));
    }
}
