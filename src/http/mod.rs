use crate::directory::create::{CreateRoomError, CreateRoomForm, RoomCreator};
use crate::directory::RoomList;
use crate::shared::links::room_path;
use crate::transport::ws_session::handle_socket;
use axum::{
    extract::{rejection::JsonRejection, Query, State, WebSocketUpgrade},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

pub mod views;

use views::RoomsResponse;

#[derive(Clone)]
pub struct AppState {
    rooms: watch::Receiver<RoomList>,
    creator: RoomCreator,
}

impl AppState {
    pub fn new(rooms: watch::Receiver<RoomList>, creator: RoomCreator) -> Self {
        Self { rooms, creator }
    }

    fn current_rooms(&self) -> RoomList {
        self.rooms.borrow().clone()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RoomsQuery {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    name: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    ok: bool,
    id: String,
    href: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: error.into(),
        }),
    )
        .into_response()
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/live", get(live_rooms))
        .layer(cors)
        .with_state(Arc::new(state))
}

async fn health() -> impl IntoResponse {
    Json(OkResponse { ok: true })
}

async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoomsQuery>,
) -> impl IntoResponse {
    let rooms = state.current_rooms();
    let query = params.q.unwrap_or_default();
    Json(RoomsResponse::build(&rooms, &query))
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON"),
    };
    let mut form = CreateRoomForm::new();
    form.show();
    form.set_name(payload.name.as_deref().unwrap_or_default());
    form.set_id(payload.id.as_deref().unwrap_or_default());
    let existing = state.current_rooms();

    match form.submit(&state.creator, &existing).await {
        Ok(room_id) => {
            let key = room_id.storage_key();
            (
                StatusCode::OK,
                Json(CreatedResponse {
                    ok: true,
                    href: room_path(&key),
                    id: key,
                }),
            )
                .into_response()
        }
        Err(error) => {
            let status = match &error {
                CreateRoomError::Incomplete | CreateRoomError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                CreateRoomError::DuplicateId(_) => StatusCode::CONFLICT,
                CreateRoomError::Write(_) => StatusCode::BAD_GATEWAY,
            };
            let message = match form.error_message() {
                Some(message) => message.to_string(),
                None => match error {
                    CreateRoomError::Incomplete => "Room name and id are required".to_string(),
                    _ => "Room could not be created".to_string(),
                },
            };
            error_response(status, message)
        }
    }
}

async fn live_rooms(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoomsQuery>,
) -> impl IntoResponse {
    let rooms = state.rooms.clone();
    let query = params.q.unwrap_or_default();
    ws.on_upgrade(move |socket| handle_socket(socket, rooms, query))
}
