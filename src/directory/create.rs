//! Room creation: identifier validation followed by a single upsert.
//!
//! Nothing is inserted locally. A created room shows up once the directory's
//! subscription delivers the next snapshot.
use super::Room;
use crate::shared::room_id::{normalize_room_id_input, validate_room_id, RoomId, RoomIdError};
use crate::store::{CollectionClient, StoreError};
use std::sync::Arc;
use thiserror::Error;

pub const DUPLICATE_ROOM_ID_MESSAGE: &str = "このルームIDは既に使用されています。";

/// What to do when the requested id already names a room in the local mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateIdPolicy {
    /// Write anyway; the existing room's name is replaced.
    #[default]
    Overwrite,
    Reject,
}

#[derive(Debug, Error)]
pub enum CreateRoomError {
    #[error("room name and id are both required")]
    Incomplete,
    #[error(transparent)]
    Validation(#[from] RoomIdError),
    #[error("room id {0:?} is already taken")]
    DuplicateId(String),
    #[error("failed to create room")]
    Write(#[source] StoreError),
}

impl CreateRoomError {
    /// Message to show in the creation form, if this error has one.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            CreateRoomError::Validation(error) => Some(error.user_message()),
            CreateRoomError::DuplicateId(_) => Some(DUPLICATE_ROOM_ID_MESSAGE),
            CreateRoomError::Incomplete | CreateRoomError::Write(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct RoomCreator {
    client: Arc<dyn CollectionClient>,
    collection: String,
    policy: DuplicateIdPolicy,
}

impl RoomCreator {
    pub fn new(
        client: Arc<dyn CollectionClient>,
        collection: impl Into<String>,
        policy: DuplicateIdPolicy,
    ) -> Self {
        Self {
            client,
            collection: collection.into(),
            policy,
        }
    }

    /// Every check that runs before the remote write. Makes no remote call.
    pub fn check(&self, name: &str, id: &str, existing: &[Room]) -> Result<RoomId, CreateRoomError> {
        if name.is_empty() || id.is_empty() {
            return Err(CreateRoomError::Incomplete);
        }
        let room_id = validate_room_id(id)?;
        if self.policy == DuplicateIdPolicy::Reject {
            let key = room_id.storage_key();
            if existing.iter().any(|room| room.id == key) {
                return Err(CreateRoomError::DuplicateId(key));
            }
        }
        Ok(room_id)
    }

    /// Issues the upsert on its own task, so the write finishes and its outcome is
    /// logged even if the caller stops waiting for it.
    pub async fn write(&self, room_id: &RoomId, name: &str) -> Result<(), CreateRoomError> {
        let key = room_id.storage_key();
        let client = Arc::clone(&self.client);
        let collection = self.collection.clone();
        let body = serde_json::json!({ "name": name });
        let write = tokio::spawn(async move {
            let result = client.upsert(&collection, &key, body).await;
            match &result {
                Ok(()) => tracing::info!(collection, key, "room created"),
                Err(error) => tracing::error!(?error, collection, key, "error creating room"),
            }
            result
        });

        match write.await {
            Ok(result) => result.map_err(CreateRoomError::Write),
            Err(error) => {
                tracing::error!(?error, collection = %self.collection, "room write task failed");
                Err(CreateRoomError::Write(StoreError::Unexpected(
                    anyhow::Error::new(error).context("room write task failed"),
                )))
            }
        }
    }
}

/// State behind the "create community" modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRoomForm {
    name: String,
    id: String,
    error_message: String,
    modal_open: bool,
}

impl CreateRoomForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self) {
        self.modal_open = true;
    }

    /// Closes the modal. Typed values and any error stay for the next opening.
    pub fn dismiss(&mut self) {
        self.modal_open = false;
    }

    pub fn set_name(&mut self, value: &str) {
        self.name = value.to_string();
    }

    pub fn set_id(&mut self, value: &str) {
        self.id = normalize_room_id_input(value);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        self.modal_open
    }

    pub fn error_message(&self) -> Option<&str> {
        if self.error_message.is_empty() {
            None
        } else {
            Some(&self.error_message)
        }
    }

    /// Submits the current input. Missing fields change nothing; validation errors
    /// set the form's message; a successful write resets the fields and closes the
    /// modal. On a write error the fields and modal are left as they are and the
    /// error is returned for the caller to surface.
    pub async fn submit(
        &mut self,
        creator: &RoomCreator,
        existing: &[Room],
    ) -> Result<RoomId, CreateRoomError> {
        let room_id = match creator.check(&self.name, &self.id, existing) {
            Ok(room_id) => room_id,
            Err(error) => {
                if let Some(message) = error.user_message() {
                    self.error_message = message.to_string();
                }
                return Err(error);
            }
        };
        self.error_message.clear();

        creator.write(&room_id, &self.name).await?;
        self.name.clear();
        self.id.clear();
        self.modal_open = false;
        Ok(room_id)
    }
}
