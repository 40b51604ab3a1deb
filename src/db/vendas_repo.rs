// src/db/vendas_repo.rs

use std::path::Path;

use super::JsonStore;
use crate::common::error::AppError;
use crate::models::vendas::Venda;

#[derive(Clone)]
pub struct VendasRepo {
    store: JsonStore,
}

impl VendasRepo {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(data_dir, "vendas.json"),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Venda>, AppError> {
        Ok(self.store.read().await?.unwrap_or_default())
    }

    /// Vendas novas entram no topo da lista.
    pub async fn prepend(&self, venda: Venda) -> Result<(), AppError> {
        self.store
            .mutate(|doc: &mut Vec<Venda>| {
                doc.insert(0, venda);
                Ok(())
            })
            .await
    }

    /// Atualiza a venda de id dado sob a trava da coleção.
    pub async fn update_with<F>(&self, id: &str, f: F) -> Result<Venda, AppError>
    where
        F: FnOnce(&Venda) -> Result<Venda, AppError>,
    {
        self.store
            .mutate(|doc: &mut Vec<Venda>| {
                let slot = doc
                    .iter_mut()
                    .find(|v| v.id == id)
                    .ok_or_else(|| AppError::NotFound("Venda não encontrada.".to_string()))?;
                let atualizada = f(slot)?;
                *slot = atualizada.clone();
                Ok(atualizada)
            })
            .await
    }

    /// Remove e devolve a venda, para o chamador poder estornar pontos.
    pub async fn remove(&self, id: &str) -> Result<Venda, AppError> {
        self.store
            .mutate(|doc: &mut Vec<Venda>| {
                let idx = doc
                    .iter()
                    .position(|v| v.id == id)
                    .ok_or_else(|| AppError::NotFound("Venda não encontrada.".to_string()))?;
                Ok(doc.remove(idx))
            })
            .await
    }
}
