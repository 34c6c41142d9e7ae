use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domains::intake::ChatInput;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub debug: Option<String>,
}

impl ChatQuery {
    pub fn debug(&self) -> bool {
        matches!(
            self.debug.as_deref().map(str::trim),
            Some("1" | "true" | "yes")
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// `POST /api/chat` - one conversational turn
///
/// Body: `{message, history?, max_output_tokens?}`. With `?debug=1` the
/// response also carries the matching and data diagnostics.
pub async fn chat_handler(
    Extension(state): Extension<AppState>,
    query: Result<Query<ChatQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let Json(body) = body?;

    if !body.is_object() {
        return Err(ApiError::invalid_request("Request body must be a JSON object"));
    }

    let outcome = state.intake.handle(ChatInput::from_json(&body)).await?;

    if query.debug() {
        let payload = outcome.debug_payload(
            state.intake.instruction_files(),
            state.intake.settings().debug_preview_rows,
        );
        return Ok(Json(payload).into_response());
    }

    Ok(Json(ChatReply {
        reply: outcome.reply,
    })
    .into_response())
}
