// handler/chat.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::HttpError,
    middleware::AuthUser,
    models::chatmodel::{Chat, MediaType, Message},
    models::jobmodel::JobKind,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/chats", get(get_user_chats))
        .route("/chats/from-proposal", post(open_chat_from_proposal))
        .route("/chats/:chat_id", get(get_chat_details))
        .route(
            "/chats/:chat_id/messages",
            get(get_messages).post(send_message),
        )
        .route("/chats/:chat_id/read", put(mark_chat_as_read))
        .route("/unread-count", get(get_unread_count))
}

#[derive(Debug, Deserialize)]
pub struct OpenChatDto {
    pub job_id: Uuid,
    pub proposal_id: Uuid,
    pub kind: JobKind,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatWithDetails {
    pub chat: Chat,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

pub async fn open_chat_from_proposal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<OpenChatDto>,
) -> Result<impl IntoResponse, HttpError> {
    let creation = app_state
        .chat_service
        .open_chat_for_proposal(auth.id, body.job_id, body.proposal_id, body.kind)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "chat": creation.chat,
            "created": creation.created,
            "warning": creation.seed_warning,
        }
    })))
}

pub async fn get_user_chats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination.limit.unwrap_or(20) as i64;
    let offset = ((page - 1) * limit as u32) as i64;

    let chats = app_state
        .chat_service
        .list_chats(auth.id, limit, offset)
        .await
        .map_err(HttpError::from)?;

    let mut chat_details = Vec::new();
    for chat in chats {
        let last_message = app_state
            .ledger
            .history(chat.id, auth.id, 1, 0)
            .await
            .map_err(HttpError::from)?
            .into_iter()
            .next();

        // A wrong badge is lower severity than a failed chat list.
        let unread_count = app_state
            .ledger
            .chat_unread_count(chat.id, auth.id)
            .await
            .unwrap_or(0);

        chat_details.push(ChatWithDetails {
            chat,
            last_message,
            unread_count,
        });
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": chat_details
    })))
}

pub async fn get_chat_details(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let chat = app_state
        .chat_service
        .get_chat(chat_id, auth.id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": chat
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageDto {
    #[validate(length(max = 5000))]
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let media = match (body.media_url, body.media_type) {
        (Some(url), Some(kind)) => Some((url, kind)),
        (Some(url), None) => Some((url, MediaType::Document)),
        (None, _) => None,
    };

    let message = app_state
        .ledger
        .append(
            chat_id,
            Some(auth.id),
            body.content.unwrap_or_default(),
            media,
        )
        .await
        .map_err(HttpError::from)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": message
    })))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination.limit.unwrap_or(50) as i64;
    let offset = ((page - 1) * limit as u32) as i64;

    let messages = app_state
        .ledger
        .history(chat_id, auth.id, limit, offset)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": messages
    })))
}

pub async fn mark_chat_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let marked = app_state
        .ledger
        .mark_chat_read(chat_id, auth.id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "marked_read": marked
        }
    })))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    // Errors degrade to 0: a miscounted badge beats a crashed screen.
    let count = app_state
        .ledger
        .unread_count_for(auth.id)
        .await
        .unwrap_or(0);

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "unread_count": count
        }
    })))
}
