// src/handlers/finalizacoes.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::common::{coerce, error::AppError};
use crate::config::AppState;
use crate::models::finalizacoes::Finalizacao;

#[derive(Debug, Default, Deserialize)]
pub struct FinalizacoesQuery {
    pub id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<String>,
}

fn agora_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn gen_id() -> String {
    let data = Utc::now().format("%Y%m%d");
    let sufixo: u32 = rand::rng().random_range(1000..10000);
    format!("FIN-{}-{}", data, sufixo)
}

fn texto_ou<'a>(v: Option<&'a Value>, padrao: &'a str) -> &'a str {
    v.and_then(Value::as_str).filter(|s| !s.is_empty()).unwrap_or(padrao)
}

// ---
// Handler: GET /api/finalizacoes (?id= busca uma; senão lista filtrada)
// ---
pub async fn listar(
    State(app_state): State<AppState>,
    Query(params): Query<FinalizacoesQuery>,
) -> Result<Response, AppError> {
    let list = app_state.finalizacoes_repo.list_all().await?;

    if let Some(id) = params.id.as_deref().filter(|s| !s.is_empty()) {
        let found = list
            .into_iter()
            .find(|x| x.id == id)
            .ok_or_else(|| AppError::NotFound("Não encontrada".to_string()))?;
        return Ok(Json(found).into_response());
    }

    let mut list = list;
    if let Some(start) = params.start.as_deref().filter(|s| !s.is_empty()) {
        list.retain(|x| x.data.as_str() >= start);
    }
    if let Some(end) = params.end.as_deref().filter(|s| !s.is_empty()) {
        list.retain(|x| x.data.as_str() <= end);
    }

    // data desc, depois createdAt desc
    list.sort_by(|a, b| {
        b.data.cmp(&a.data).then_with(|| {
            b.created_at
                .as_deref()
                .unwrap_or("")
                .cmp(a.created_at.as_deref().unwrap_or(""))
        })
    });

    let limit = params
        .limit
        .as_deref()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(2000)
        .max(1);

    let total = list.len();
    let items: Vec<Finalizacao> = list.into_iter().take(limit).collect();
    Ok(Json(json!({ "items": items, "total": total })).into_response())
}

// ---
// Handler: POST /api/finalizacoes
// ---
pub async fn criar(
    State(app_state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let body = match body {
        Some(Json(v)) => v,
        None => Value::Null,
    };

    let now_iso = agora_iso();
    let hoje = &now_iso[..10];

    let rec = Finalizacao {
        id: gen_id(),
        data: texto_ou(body.get("data"), hoje).to_string(),
        compra_id: body.get("compraId").and_then(Value::as_str).map(String::from),
        conta_id: body.get("contaId").and_then(Value::as_str).map(String::from),
        owner_funcionario_id: body
            .get("ownerFuncionarioId")
            .and_then(Value::as_str)
            .map(String::from),
        lucro_finalizacao: coerce::num(body.get("lucroFinalizacao")),
        observacao: body
            .get("observacao")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        created_at: Some(now_iso.clone()),
        updated_at: Some(now_iso),
    };

    app_state.finalizacoes_repo.create(rec.clone()).await?;
    Ok((StatusCode::CREATED, Json(rec)))
}

// ---
// Handler: PATCH /api/finalizacoes?id=
// ---
pub async fn atualizar(
    State(app_state): State<AppState>,
    Query(params): Query<FinalizacoesQuery>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let id = params
        .id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("ID ausente".to_string()))?;

    let body = match body {
        Some(Json(v)) => v,
        None => Value::Null,
    };

    let updated = app_state
        .finalizacoes_repo
        .update_with(&id, |curr| Finalizacao {
            id: curr.id.clone(),
            data: texto_ou(body.get("data"), &curr.data).to_string(),
            compra_id: campo_ou(body.get("compraId"), &curr.compra_id),
            conta_id: campo_ou(body.get("contaId"), &curr.conta_id),
            owner_funcionario_id: campo_ou(body.get("ownerFuncionarioId"), &curr.owner_funcionario_id),
            lucro_finalizacao: match body.get("lucroFinalizacao") {
                Some(v) => coerce::num(Some(v)),
                None => curr.lucro_finalizacao,
            },
            observacao: body
                .get("observacao")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| curr.observacao.clone()),
            created_at: curr.created_at.clone(),
            updated_at: Some(agora_iso()),
        })
        .await?;

    Ok(Json(updated))
}

/// Campo string do corpo quando presente e não-nulo, senão o valor atual.
fn campo_ou(v: Option<&Value>, atual: &Option<String>) -> Option<String> {
    match v {
        None | Some(Value::Null) => atual.clone(),
        Some(outro) => outro.as_str().map(String::from),
    }
}

// ---
// Handler: DELETE /api/finalizacoes?id=
// ---
pub async fn excluir(
    State(app_state): State<AppState>,
    Query(params): Query<FinalizacoesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = params
        .id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("ID ausente".to_string()))?;

    app_state.finalizacoes_repo.delete_by_id(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
