use std::fmt;
use thiserror::Error;

pub const MAX_ROOM_ID_LENGTH: usize = 10;

pub const INVALID_ROOM_ID_MESSAGE: &str =
    "無効なルームIDです。使用できるのは、文字、数字、'-'、'_'、および '.' のみです。";
pub const ROOM_ID_TOO_LONG_MESSAGE: &str = "ルームIDは10文字を超えてはいけません。";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoomIdError {
    #[error("room id may only contain letters, digits, '-', '_' and '.'")]
    InvalidFormat,
    #[error("room id must be at most 10 characters")]
    TooLong,
}

impl RoomIdError {
    /// Fixed message shown under the creation form.
    pub fn user_message(&self) -> &'static str {
        match self {
            RoomIdError::InvalidFormat => INVALID_ROOM_ID_MESSAGE,
            RoomIdError::TooLong => ROOM_ID_TOO_LONG_MESSAGE,
        }
    }
}

/// A room identifier that passed format and length checks. The original casing is
/// kept; `storage_key` is what gets written to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomId(String);

impl RoomId {
    pub fn storage_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_room_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.'
}

pub fn validate_room_id(value: &str) -> Result<RoomId, RoomIdError> {
    if value.is_empty() || !value.chars().all(is_room_id_char) {
        return Err(RoomIdError::InvalidFormat);
    }
    if value.chars().count() > MAX_ROOM_ID_LENGTH {
        return Err(RoomIdError::TooLong);
    }
    Ok(RoomId(value.to_string()))
}

/// Identifier input is lower-cased as it is typed.
pub fn normalize_room_id_input(value: &str) -> String {
    value.to_lowercase()
}
