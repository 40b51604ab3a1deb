// src/db/listas_repo.rs

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use super::JsonStore;
use crate::common::error::AppError;

/// Coleções que são só uma lista dentro de um envelope `{ savedAt, lista }`
/// (bloqueios, clientes). Cada tela antiga salvou a lista sob uma chave
/// diferente; a leitura tenta todas.
#[derive(Clone)]
pub struct ListaRepo {
    store: JsonStore,
    chaves: &'static [&'static str],
}

impl ListaRepo {
    pub fn bloqueios(data_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(data_dir, "bloqueios.json"),
            chaves: &["lista", "listaBloqueios", "bloqueios", "items"],
        }
    }

    pub fn clientes(data_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(data_dir, "clientes.json"),
            chaves: &["lista", "items"],
        }
    }

    pub async fn read_doc(&self) -> Result<Option<Value>, AppError> {
        self.store.read().await
    }

    /// Extrai a lista de qualquer um dos formatos aceitos: array puro, chave
    /// direta ou aninhada sob `data`.
    pub fn pick_lista(&self, payload: &Value) -> Vec<Value> {
        if let Value::Array(itens) = payload {
            return itens.clone();
        }
        for chave in self.chaves {
            if let Some(Value::Array(itens)) = payload.get(chave) {
                return itens.clone();
            }
        }
        if let Some(data) = payload.get("data") {
            for chave in self.chaves {
                if let Some(Value::Array(itens)) = data.get(chave) {
                    return itens.clone();
                }
            }
        }
        Vec::new()
    }

    /// Grava normalizado como `{ savedAt, lista }` e devolve o documento salvo.
    pub async fn save_lista(&self, lista: Vec<Value>) -> Result<Value, AppError> {
        let doc = json!({
            "savedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "lista": lista,
        });
        self.store.write(&doc).await?;
        Ok(doc)
    }
}
