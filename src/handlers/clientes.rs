// src/handlers/clientes.rs

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::config::AppState;

// ---
// Handler: GET /api/clientes
// ---
pub async fn carregar(State(app_state): State<AppState>) -> Response {
    match app_state.clientes_repo.read_doc().await {
        Ok(Some(doc)) => {
            let lista = app_state.clientes_repo.pick_lista(&doc);
            let saved_at = doc.get("savedAt").cloned().unwrap_or_else(|| {
                json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
            });
            Json(json!({ "ok": true, "data": { "savedAt": saved_at, "lista": lista } }))
                .into_response()
        }
        Ok(None) => {
            Json(json!({ "ok": true, "data": { "savedAt": null, "lista": [] } })).into_response()
        }
        Err(e) => e.into_ok_false_response(),
    }
}

// ---
// Handler: POST /api/clientes
// ---
pub async fn salvar(State(app_state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let body = match body {
        Some(Json(v)) => v,
        None => Value::Null,
    };
    let lista = app_state.clientes_repo.pick_lista(&body);

    match app_state.clientes_repo.save_lista(lista).await {
        Ok(doc) => Json(json!({ "ok": true, "data": doc })).into_response(),
        Err(e) => e.into_ok_false_response(),
    }
}
