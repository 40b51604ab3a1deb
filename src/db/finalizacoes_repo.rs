// src/db/finalizacoes_repo.rs

use std::path::Path;

use super::JsonStore;
use crate::common::error::AppError;
use crate::models::finalizacoes::Finalizacao;

#[derive(Clone)]
pub struct FinalizacoesRepo {
    store: JsonStore,
}

impl FinalizacoesRepo {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(data_dir, "finalizacoes.json"),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Finalizacao>, AppError> {
        Ok(self.store.read().await?.unwrap_or_default())
    }

    pub async fn create(&self, rec: Finalizacao) -> Result<(), AppError> {
        self.store
            .mutate(|doc: &mut Vec<Finalizacao>| {
                doc.push(rec);
                Ok(())
            })
            .await
    }

    pub async fn update_with<F>(&self, id: &str, f: F) -> Result<Finalizacao, AppError>
    where
        F: FnOnce(&Finalizacao) -> Finalizacao,
    {
        self.store
            .mutate(|doc: &mut Vec<Finalizacao>| {
                let slot = doc.iter_mut().find(|x| x.id == id).ok_or_else(|| {
                    AppError::NotFound("Finalização não encontrada".to_string())
                })?;
                let atualizada = f(slot);
                *slot = atualizada.clone();
                Ok(atualizada)
            })
            .await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.store
            .mutate(|doc: &mut Vec<Finalizacao>| {
                let antes = doc.len();
                doc.retain(|x| x.id != id);
                if doc.len() == antes {
                    return Err(AppError::NotFound(
                        "Finalização não encontrada".to_string(),
                    ));
                }
                Ok(())
            })
            .await
    }
}
