// src/handlers/compras.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::models::compras::{CompraSubmission, StatusPontos};
use crate::services::compras_service::ListFilter;

// Chaves aceitas no PATCH /api/compras/{id}; o resto do corpo é descartado.
const ALLOWED_KEYS: [&str; 12] = [
    "statusPontos",
    "dataCompra",
    "cedenteId",
    "modo",
    "ciaCompra",
    "destCia",
    "origem",
    "valores",
    "calculos",
    "itens",
    "totaisId",
    "savedAt",
];

#[derive(Debug, Default, Deserialize)]
pub struct ComprasQuery {
    pub id: Option<String>,
    pub q: Option<String>,
    pub modo: Option<String>,
    pub cia: Option<String>,
    pub origem: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

fn parse_usize(v: Option<&str>, padrao: usize) -> usize {
    v.and_then(|s| s.trim().parse().ok()).unwrap_or(padrao)
}

fn patch_map(body: Option<Json<Value>>) -> Map<String, Value> {
    match body {
        Some(Json(Value::Object(m))) => m,
        _ => Map::new(),
    }
}

// ---
// Handler: GET /api/compras (?id= busca um; senão listagem com filtros)
// ---
pub async fn listar(
    State(app_state): State<AppState>,
    Query(params): Query<ComprasQuery>,
) -> Result<Response, AppError> {
    if let Some(id) = params.id.as_deref().filter(|s| !s.is_empty()) {
        let compra = app_state.compras_service.get(id).await?;
        return Ok(Json(compra).into_response());
    }

    let filtro = ListFilter {
        q: params.q.unwrap_or_default(),
        modo: params.modo.unwrap_or_default(),
        cia: params.cia.unwrap_or_default(),
        origem: params.origem.unwrap_or_default(),
        start: params.start.unwrap_or_default(),
        end: params.end.unwrap_or_default(),
        offset: parse_usize(params.offset.as_deref(), 0),
        limit: parse_usize(params.limit.as_deref(), 20),
    };

    let (total, items) = app_state.compras_service.list(&filtro).await?;
    Ok(Json(json!({ "ok": true, "total": total, "items": items })).into_response())
}

// ---
// Handler: POST /api/compras (upsert com normalização)
// ---
pub async fn salvar(
    State(app_state): State<AppState>,
    Json(sub): Json<CompraSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let id = app_state.compras_service.upsert(sub).await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}

// ---
// Handler: PATCH /api/compras?id= (patch livre, corpo ilegível vira {})
// ---
pub async fn atualizar_por_query(
    State(app_state): State<AppState>,
    Query(params): Query<IdQuery>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let id = params
        .id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing id".to_string()))?;

    let atualizado = app_state
        .compras_service
        .apply_patch(&id, patch_map(body))
        .await?;
    Ok(Json(atualizado))
}

// ---
// Handler: DELETE /api/compras?id=
// ---
pub async fn excluir_por_query(
    State(app_state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = params
        .id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing id".to_string()))?;

    app_state.compras_service.delete(&id).await?;
    Ok(Json(json!({ "ok": true, "deleted": id })))
}

// ---
// Handler: GET /api/compras/next-id
// ---
pub async fn proximo_id(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let next = app_state.compras_service.next_id().await?;
    Ok(Json(json!({ "ok": true, "nextId": next, "data": { "nextId": next } })))
}

// ---
// Handler: GET /api/compras/{id}
// ---
pub async fn obter(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let compra = app_state.compras_service.get(&id).await?;
    Ok(Json(compra))
}

// ---
// Handler: PATCH /api/compras/{id} (patch sanitizado)
// ---
pub async fn atualizar(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let Some(Json(Value::Object(body))) = body else {
        return Err(AppError::BadRequest("Body inválido".to_string()));
    };

    let mut patch = Map::new();
    for (k, v) in body {
        if ALLOWED_KEYS.contains(&k.as_str()) {
            patch.insert(k, v);
        }
    }

    if let Some(s) = patch.get("statusPontos") {
        if s.as_str().and_then(StatusPontos::parse).is_none() {
            return Err(AppError::BadRequest("statusPontos inválido".to_string()));
        }
    }

    let atualizado = app_state.compras_service.apply_patch(&id, patch).await?;
    Ok(Json(json!({ "ok": true, "id": id, "data": atualizado })))
}

// ---
// Handler: DELETE /api/compras/{id}
// ---
pub async fn excluir(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.compras_service.delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
