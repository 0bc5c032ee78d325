pub mod links;
pub mod room_id;
