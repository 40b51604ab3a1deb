// src/handlers/comissoes.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::common::{coerce, error::AppError};
use crate::config::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ComissoesQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

// ---
// Payload: upsert de comissão
// ---
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComissaoPayload {
    #[validate(
        required(message = "O campo 'compraId' é obrigatório."),
        length(min = 1, message = "O campo 'compraId' é obrigatório.")
    )]
    pub compra_id: Option<String>,

    #[validate(
        required(message = "O campo 'cedenteId' é obrigatório."),
        length(min = 1, message = "O campo 'cedenteId' é obrigatório.")
    )]
    pub cedente_id: Option<String>,

    #[serde(default)]
    pub cedente_nome: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_num")]
    pub valor: f64,

    #[serde(default)]
    pub status: Option<String>,
}

// ---
// Handler: GET /api/comissoes (?q= e ?status=)
// ---
pub async fn listar(
    State(app_state): State<AppState>,
    Query(params): Query<ComissoesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut data = app_state.comissoes_repo.list_all().await?;

    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        data.retain(|c| c.status == status);
    }
    if let Some(q) = params.q.as_deref().filter(|s| !s.is_empty()) {
        let q = q.to_lowercase();
        data.retain(|c| {
            c.cedente_nome.to_lowercase().contains(&q) || c.compra_id.to_lowercase().contains(&q)
        });
    }

    data.sort_by(|a, b| b.criado_em.cmp(&a.criado_em));
    Ok(Json(json!({ "data": data })))
}

// ---
// Handler: POST /api/comissoes (upsert por compraId + cedenteId)
// ---
pub async fn salvar(
    State(app_state): State<AppState>,
    Json(payload): Json<ComissaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let data = app_state
        .comissoes_repo
        .upsert(
            payload.compra_id.unwrap_or_default(),
            payload.cedente_id.unwrap_or_default(),
            payload.cedente_nome.unwrap_or_default(),
            payload.valor,
            payload.status.filter(|s| !s.is_empty()),
        )
        .await?;

    Ok(Json(json!({ "ok": true, "data": data })))
}

// ---
// Handler: PATCH /api/comissoes/{id}
// ---
pub async fn atualizar(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let status = body
        .as_ref()
        .and_then(|Json(b)| b.get("status"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let data = app_state.comissoes_repo.update_status(&id, status).await?;
    Ok(Json(json!({ "ok": true, "data": data })))
}

// ---
// Handler: DELETE /api/comissoes/{id}
// ---
pub async fn excluir(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.comissoes_repo.delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
