//! Board posts owned by the logged-in user.
use axum::{extract::State, http::StatusCode, Json};
use board_common::{Message, NewMessage};
use tracing::info;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::validation::validate_message;
use crate::AppState;

/// `GET /messages`
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state.messages.messages_for(&user.username).await?;
    Ok(Json(messages))
}

/// `POST /messages`
pub async fn post_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(post): Json<NewMessage>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    validate_message(&post)?;

    let message = Message {
        username: user.username,
        title: post.title.trim().to_string(),
        body: post.body.trim().to_string(),
    };
    state.messages.append_message(&message).await?;

    info!(username = %message.username, "message posted");
    Ok((StatusCode::CREATED, Json(message)))
}
