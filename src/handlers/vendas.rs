// src/handlers/vendas.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::common::coerce;
use crate::config::AppState;
use crate::models::vendas::{NovaVenda, PagamentoStatus};

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

fn ok_false(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": msg }))).into_response()
}

// ---
// Handler: GET /api/vendas
// ---
pub async fn listar(State(app_state): State<AppState>) -> Response {
    match app_state.vendas_service.list().await {
        Ok(lista) => Json(json!({ "ok": true, "lista": lista })).into_response(),
        Err(e) => e.into_ok_false_response(),
    }
}

// ---
// Handler: POST /api/vendas (cria e debita pontos dos cedentes)
// ---
pub async fn criar(State(app_state): State<AppState>, Json(body): Json<NovaVenda>) -> Response {
    let sem_cia = body.cia.as_deref().map_or(true, str::is_empty);
    if sem_cia || body.pontos == 0.0 {
        return ok_false(
            StatusCode::BAD_REQUEST,
            "Campos obrigatórios ausentes (cia, pontos).",
        );
    }

    match app_state.vendas_service.create(body).await {
        Ok((id, next_cedentes)) => {
            Json(json!({ "ok": true, "id": id, "nextCedentes": next_cedentes })).into_response()
        }
        Err(e) => e.into_ok_false_response(),
    }
}

// ---
// Handler: PATCH /api/vendas (pagamentoStatus ou cancelamento)
// ---
pub async fn atualizar(State(app_state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let body = match body {
        Some(Json(v)) => v,
        None => Value::Null,
    };
    let id = body.get("id").and_then(Value::as_str).unwrap_or("").to_string();

    let existe = match app_state.vendas_service.list().await {
        Ok(lista) => lista.iter().any(|v| v.id == id),
        Err(e) => return e.into_ok_false_response(),
    };
    if !existe {
        return ok_false(StatusCode::NOT_FOUND, "Venda não encontrada.");
    }

    // 1) Atualização simples do pagamentoStatus
    if let Some(status) = body
        .get("pagamentoStatus")
        .and_then(Value::as_str)
        .and_then(PagamentoStatus::parse)
    {
        return match app_state.vendas_service.set_pagamento(&id, status).await {
            Ok(record) => Json(json!({ "ok": true, "record": record })).into_response(),
            Err(e) => e.into_ok_false_response(),
        };
    }

    // 2) Cancelamento (taxas/estorno e possível devolução de pontos)
    if let Some(cancel) = body.get("cancel").filter(|v| coerce::truthy(Some(v))) {
        let taxa_cia = coerce::num(cancel.get("taxaCia"));
        let taxa_empresa = coerce::num(cancel.get("taxaEmpresa"));
        let recredit = coerce::truthy(cancel.get("recreditPoints"));
        let note = cancel
            .get("note")
            .and_then(Value::as_str)
            .map(str::to_string);

        return match app_state
            .vendas_service
            .cancel(&id, taxa_cia, taxa_empresa, recredit, note)
            .await
        {
            Ok(record) => Json(json!({ "ok": true, "record": record })).into_response(),
            Err(e) => e.into_ok_false_response(),
        };
    }

    ok_false(
        StatusCode::BAD_REQUEST,
        "Nada para atualizar (use pagamentoStatus ou cancel).",
    )
}

// ---
// Handler: DELETE /api/vendas (?id= ou corpo { id, restorePoints })
// ---
pub async fn excluir(
    State(app_state): State<AppState>,
    Query(params): Query<IdQuery>,
    body: Option<Json<Value>>,
) -> Response {
    let mut id = params.id.unwrap_or_default();
    let mut restore_points = true;

    if let Some(Json(b)) = body {
        if let Some(s) = b.get("id").and_then(Value::as_str) {
            if !s.is_empty() {
                id = s.to_string();
            }
        }
        if let Some(r) = b.get("restorePoints").and_then(Value::as_bool) {
            restore_points = r;
        }
    }

    if id.is_empty() {
        return ok_false(StatusCode::BAD_REQUEST, "ID é obrigatório.");
    }

    match app_state.vendas_service.delete(&id, restore_points).await {
        Ok(removed_id) => Json(json!({ "ok": true, "removedId": removed_id })).into_response(),
        Err(e) => e.into_ok_false_response(),
    }
}
