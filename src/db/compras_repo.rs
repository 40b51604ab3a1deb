// src/db/compras_repo.rs

use std::path::Path;

use serde_json::{Map, Value};

use super::JsonStore;
use crate::common::{error::AppError, ids};
use crate::models::compras::Compra;

#[derive(Clone)]
pub struct ComprasRepo {
    store: JsonStore,
}

impl ComprasRepo {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(data_dir, "compras.json"),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Compra>, AppError> {
        Ok(self.store.read().await?.unwrap_or_default())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Compra>, AppError> {
        Ok(self.list_all().await?.into_iter().find(|c| c.id == id))
    }

    /// Substitui o registro de mesmo id, ou acrescenta no fim.
    pub async fn upsert(&self, compra: Compra) -> Result<(), AppError> {
        self.store
            .mutate(|doc: &mut Vec<Compra>| {
                match doc.iter_mut().find(|c| c.id == compra.id) {
                    Some(slot) => *slot = compra,
                    None => doc.push(compra),
                }
                Ok(())
            })
            .await
    }

    /// Merge raso do patch sobre o registro persistido.
    pub async fn update_by_id(
        &self,
        id: &str,
        apply: Map<String, Value>,
    ) -> Result<Compra, AppError> {
        self.store
            .mutate(|doc: &mut Vec<Compra>| {
                let slot = doc
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| AppError::NotFound("Não encontrado".to_string()))?;
                let atualizado = merge_compra(slot, &apply)?;
                *slot = atualizado.clone();
                Ok(atualizado)
            })
            .await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.store
            .mutate(|doc: &mut Vec<Compra>| {
                let antes = doc.len();
                doc.retain(|c| c.id != id);
                if doc.len() == antes {
                    return Err(AppError::NotFound("Não encontrado".to_string()));
                }
                Ok(())
            })
            .await
    }

    pub async fn next_short_id(&self) -> Result<String, AppError> {
        let todas = self.list_all().await?;
        Ok(ids::next_short_id(todas.iter().map(|c| c.id.as_str())))
    }
}

fn merge_compra(atual: &Compra, apply: &Map<String, Value>) -> Result<Compra, AppError> {
    let mut raiz = serde_json::to_value(atual)?;
    if let Value::Object(obj) = &mut raiz {
        for (k, v) in apply {
            obj.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(raiz).map_err(|e| AppError::BadRequest(format!("Patch inválido: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn compra_minima(id: &str) -> Compra {
        serde_json::from_value(json!({
            "id": id,
            "dataCompra": "2025-09-20",
            "itens": [{"kind": "compra", "data": {"programa": "latam", "pontos": 1000}}],
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_substitui_por_id() {
        let dir = tempdir().unwrap();
        let repo = ComprasRepo::new(dir.path());

        repo.upsert(compra_minima("0001")).await.unwrap();
        let mut segunda = compra_minima("0001");
        segunda.data_compra = "2025-09-21".to_string();
        repo.upsert(segunda).await.unwrap();

        let todas = repo.list_all().await.unwrap();
        assert_eq!(todas.len(), 1);
        assert_eq!(todas[0].data_compra, "2025-09-21");
    }

    #[tokio::test]
    async fn patch_de_status_nao_toca_itens() {
        let dir = tempdir().unwrap();
        let repo = ComprasRepo::new(dir.path());
        repo.upsert(compra_minima("0001")).await.unwrap();
        let antes = repo.find_by_id("0001").await.unwrap().unwrap();

        let mut apply = Map::new();
        apply.insert("statusPontos".to_string(), json!("liberados"));
        let depois = repo.update_by_id("0001", apply).await.unwrap();

        assert_eq!(
            depois.status_pontos,
            crate::models::compras::StatusPontos::Liberados
        );
        assert_eq!(antes.itens, depois.itens);
        assert_eq!(
            serde_json::to_value(&antes.totais).unwrap(),
            serde_json::to_value(&depois.totais).unwrap()
        );
    }

    #[tokio::test]
    async fn update_de_id_inexistente_e_not_found() {
        let dir = tempdir().unwrap();
        let repo = ComprasRepo::new(dir.path());
        let res = repo.update_by_id("9999", Map::new()).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn next_short_id_vem_do_maior_existente() {
        let dir = tempdir().unwrap();
        let repo = ComprasRepo::new(dir.path());
        repo.upsert(compra_minima("0002")).await.unwrap();
        repo.upsert(compra_minima("0010")).await.unwrap();
        assert_eq!(repo.next_short_id().await.unwrap(), "0011");
    }
}
