use crate::directory::filter::filter_rooms;
use crate::directory::Room;
use crate::shared::links::{avatar_url, room_path};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub href: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: String,
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            href: room_path(&room.id),
            avatar_url: avatar_url(&room.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomView>,
    pub total: usize,
    /// No room matches the query; the page shows its "no communities found" notice.
    pub empty: bool,
}

impl RoomsResponse {
    pub fn build(rooms: &[Room], query: &str) -> Self {
        let matching = filter_rooms(rooms, query);
        Self {
            empty: matching.is_empty(),
            total: rooms.len(),
            rooms: matching.iter().map(RoomView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_lists_filtered_rooms_with_links() {
        let rooms = vec![Room::new("gen", "General"), Room::new("help", "Help Desk")];
        let response = RoomsResponse::build(&rooms, "desk");
        assert_eq!(response.total, 2);
        assert!(!response.empty);
        assert_eq!(response.rooms.len(), 1);
        assert_eq!(response.rooms[0].href, "/help");
        assert!(response.rooms[0].avatar_url.contains("seed=help"));
    }

    #[test]
    fn empty_flag_is_set_when_nothing_matches() {
        let rooms = vec![Room::new("gen", "General")];
        assert!(RoomsResponse::build(&rooms, "zzz").empty);
        assert!(RoomsResponse::build(&[], "").empty);
    }

    #[test]
    fn serializes_camel_case_avatar_field() {
        let rooms = vec![Room::new("gen", "General")];
        let value = serde_json::to_value(RoomsResponse::build(&rooms, "")).expect("json");
        assert_eq!(value["rooms"][0]["avatarUrl"], avatar_url("gen"));
        assert_eq!(value["rooms"][0]["name"], "General");
    }
}
