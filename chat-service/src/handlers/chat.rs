use crate::models::{ChatRequest, PromptRequired};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use service_core::middleware::tracing::RequestId;

/// `POST /chat`: validate the prompt, then hand it to the dispatcher.
///
/// Backend failures still answer 200; only a missing prompt (or a body that
/// is not a JSON object) gets a 400.
pub async fn chat(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request_id = request_id
        .as_ref()
        .map(|Extension(id)| id.as_str())
        .unwrap_or("-");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::info!(
                request_id = %request_id,
                error = %rejection.body_text(),
                "Unreadable chat request body"
            );
            return prompt_required();
        }
    };

    let Some(prompt) = request.prompt() else {
        tracing::info!(request_id = %request_id, "Chat request without prompt");
        return prompt_required();
    };

    tracing::info!(
        request_id = %request_id,
        bot = request.bot.as_deref().unwrap_or("-"),
        prompt_len = prompt.len(),
        "Dispatching chat request"
    );

    let result = state.dispatcher.dispatch(prompt, request.bot.as_deref()).await;

    (StatusCode::OK, Json(result)).into_response()
}

fn prompt_required() -> Response {
    (StatusCode::BAD_REQUEST, Json(PromptRequired::default())).into_response()
}
