use crate::api::messages::encode_query;
use crate::api::types::RoomInfoResponse;
use crate::api::{ApiClientError, RocketChatClient};

/// How the user referred to a room on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRef {
    Id(String),
    Name(String),
}

impl RoomRef {
    /// `#general` is a room name; anything else is taken as a room id.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        match input.strip_prefix('#') {
            Some("") => None,
            Some(name) => Some(Self::Name(name.to_owned())),
            None if input.is_empty() => None,
            None => Some(Self::Id(input.to_owned())),
        }
    }
}

impl RocketChatClient {
    /// Resolve a room name to its id via `GET /api/v1/rooms.info`.
    pub async fn room_id_by_name(&self, name: &str) -> Result<String, ApiClientError> {
        let url = self.url(&format!("/rooms.info?roomName={}", encode_query(name)));
        let resp: RoomInfoResponse = self.get(&url).await?;
        Ok(resp.room.id)
    }

    pub async fn resolve_room(&self, room: &RoomRef) -> Result<String, ApiClientError> {
        match room {
            RoomRef::Id(id) => Ok(id.clone()),
            RoomRef::Name(name) => self.room_id_by_name(name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_prefix_means_name() {
        assert_eq!(RoomRef::parse("#general"), Some(RoomRef::Name("general".into())));
    }

    #[test]
    fn bare_value_means_id() {
        assert_eq!(RoomRef::parse(" GENERAL "), Some(RoomRef::Id("GENERAL".into())));
    }

    #[test]
    fn empty_refs_are_rejected() {
        assert_eq!(RoomRef::parse(""), None);
        assert_eq!(RoomRef::parse("#"), None);
    }
}
