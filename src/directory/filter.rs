use super::Room;

/// Rooms whose name or id contains `query`, ignoring case. A blank query keeps
/// every room. Input order is preserved.
pub fn filter_rooms(rooms: &[Room], query: &str) -> Vec<Room> {
    if query.trim().is_empty() {
        return rooms.to_vec();
    }
    let needle = query.to_lowercase();
    rooms
        .iter()
        .filter(|room| matches_query(room, &needle))
        .cloned()
        .collect()
}

fn matches_query(room: &Room, needle: &str) -> bool {
    room.name.to_lowercase().contains(needle) || room.id.to_lowercase().contains(needle)
}
