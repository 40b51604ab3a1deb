// src/handlers/cedentes.rs

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::config::AppState;

// O documento de cedentes é salvo e devolvido inteiro; quem edita a lista é a
// tela. O backend só carimba o savedAt e preserva o que veio.

// ---
// Handler: GET /api/cedentes
// ---
pub async fn carregar(State(app_state): State<AppState>) -> Response {
    match app_state.cedentes_repo.read_raw().await {
        Ok(doc) => Json(json!({ "ok": true, "data": doc })).into_response(),
        Err(e) => e.into_ok_false_response(),
    }
}

// ---
// Handler: POST /api/cedentes (sobrescreve o documento)
// ---
pub async fn salvar(State(app_state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let body = match body {
        Some(Json(v)) => v,
        None => Value::Null,
    };

    let doc = match body {
        Value::Object(mut obj) => {
            obj.entry("savedAt")
                .or_insert_with(|| json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)));
            Value::Object(obj)
        }
        // formatos fora do padrão são gravados como vieram
        outro => outro,
    };

    match app_state.cedentes_repo.write_raw(&doc).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => e.into_ok_false_response(),
    }
}
