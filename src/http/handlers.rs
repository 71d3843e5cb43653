//! Request handlers.
//!
//! # Design Decisions
//! - Every lookup failure maps to 400 with the error message verbatim
//! - A found character answers 302 with `{"data": ...}`, as existing clients expect

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::{CharacterDto, LookupError};
use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::resilience::BreakerSnapshot;

#[derive(Debug, Deserialize, Serialize)]
pub struct GetCharacterRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub breakers: Vec<BreakerSnapshot>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        breakers: state.breakers.iter().map(|b| b.snapshot()).collect(),
    })
}

pub async fn get_character(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GetCharacterRequest>, JsonRejection>,
) -> Response {
    let request_id = headers.request_id();

    let name = match payload {
        Ok(Json(req)) if !req.name.is_empty() => req.name,
        Ok(_) => return bad_request(LookupError::InvalidInput.to_string()),
        Err(rejection) => {
            tracing::debug!(request_id = %request_id, error = %rejection, "Rejected lookup body");
            return bad_request(LookupError::InvalidInput.to_string());
        }
    };

    match state.service.get_by_name(&name).await {
        Ok(character) => (StatusCode::FOUND, Json(DataBody::<CharacterDto> { data: character })).into_response(),
        Err(e) => {
            tracing::info!(request_id = %request_id, name = %name, error = %e, "Character lookup failed");
            bad_request(e.to_string())
        }
    }
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(MessageBody { message })).into_response()
}
