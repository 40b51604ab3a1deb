// src/handlers/bloqueios.rs

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::config::AppState;

// ---
// Handler: GET /api/bloqueios
// ---
pub async fn carregar(State(app_state): State<AppState>) -> Response {
    match app_state.bloqueios_repo.read_doc().await {
        Ok(doc) => {
            let (saved_at, lista) = match &doc {
                // já no formato normalizado { savedAt, lista }
                Some(d)
                    if d.get("savedAt").is_some()
                        && d.get("lista").is_some_and(Value::is_array) =>
                {
                    (
                        d.get("savedAt").cloned().unwrap_or_else(agora),
                        d["lista"].clone(),
                    )
                }
                // formatos alternativos legados
                Some(d) => (
                    d.get("savedAt")
                        .filter(|v| v.is_string())
                        .cloned()
                        .unwrap_or(Value::Null),
                    Value::Array(app_state.bloqueios_repo.pick_lista(d)),
                ),
                None => (Value::Null, json!([])),
            };
            Json(json!({ "ok": true, "data": { "savedAt": saved_at, "lista": lista } }))
                .into_response()
        }
        Err(e) => e.into_ok_false_response(),
    }
}

// ---
// Handler: POST /api/bloqueios (aceita array puro ou os envelopes legados)
// ---
pub async fn salvar(State(app_state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let body = match body {
        Some(Json(v)) => v,
        None => Value::Null,
    };
    let lista = app_state.bloqueios_repo.pick_lista(&body);

    match app_state.bloqueios_repo.save_lista(lista).await {
        Ok(doc) => Json(json!({ "ok": true, "data": doc })).into_response(),
        Err(e) => e.into_ok_false_response(),
    }
}

fn agora() -> Value {
    json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}
