const AVATAR_BASE_URL: &str = "https://api.dicebear.com/9.x/thumbs/svg";
const AVATAR_STYLE: &str =
    "backgroundColor=e4e4e7&eyesColor=a1a1aa&mouthColor=a1a1aa&shapeColor=transparent";

pub fn room_path(room_id: &str) -> String {
    format!("/{room_id}")
}

// Stored ids are limited to [a-z0-9_.-], which needs no escaping in a query string.
pub fn avatar_url(room_id: &str) -> String {
    format!("{AVATAR_BASE_URL}?seed={room_id}&{AVATAR_STYLE}")
}
