// src/db/comissoes_repo.rs

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use super::JsonStore;
use crate::common::error::AppError;
use crate::models::comissoes::Comissao;

#[derive(Clone)]
pub struct ComissoesRepo {
    store: JsonStore,
}

impl ComissoesRepo {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(data_dir, "comissoes.json"),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Comissao>, AppError> {
        Ok(self.store.read().await?.unwrap_or_default())
    }

    /// Upsert pela chave natural (compraId, cedenteId).
    pub async fn upsert(
        &self,
        compra_id: String,
        cedente_id: String,
        cedente_nome: String,
        valor: f64,
        status: Option<String>,
    ) -> Result<Comissao, AppError> {
        let agora = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.store
            .mutate(move |doc: &mut Vec<Comissao>| {
                if let Some(existente) = doc
                    .iter_mut()
                    .find(|c| c.compra_id == compra_id && c.cedente_id == cedente_id)
                {
                    existente.cedente_nome = cedente_nome;
                    existente.valor = valor;
                    existente.status = status.unwrap_or_else(|| "aguardando".to_string());
                    existente.atualizado_em = agora;
                    return Ok(existente.clone());
                }
                let nova = Comissao {
                    id: Uuid::new_v4().to_string(),
                    compra_id,
                    cedente_id,
                    cedente_nome,
                    valor,
                    status: status.unwrap_or_else(|| "aguardando".to_string()),
                    criado_em: agora.clone(),
                    atualizado_em: agora,
                };
                doc.push(nova.clone());
                Ok(nova)
            })
            .await
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: Option<String>,
    ) -> Result<Comissao, AppError> {
        let agora = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.store
            .mutate(move |doc: &mut Vec<Comissao>| {
                let existente = doc
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| AppError::NotFound("Comissão não encontrada".to_string()))?;
                if let Some(status) = status {
                    existente.status = status;
                }
                existente.atualizado_em = agora;
                Ok(existente.clone())
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store
            .mutate(|doc: &mut Vec<Comissao>| {
                let antes = doc.len();
                doc.retain(|c| c.id != id);
                if doc.len() == antes {
                    return Err(AppError::NotFound("Comissão não encontrada".to_string()));
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn upsert_atualiza_pela_chave_natural() {
        let dir = tempdir().unwrap();
        let repo = ComissoesRepo::new(dir.path());

        let criada = repo
            .upsert(
                "0001".to_string(),
                "AB".to_string(),
                "Ana".to_string(),
                120.0,
                None,
            )
            .await
            .unwrap();
        assert_eq!(criada.status, "aguardando");

        let atualizada = repo
            .upsert(
                "0001".to_string(),
                "AB".to_string(),
                "Ana B.".to_string(),
                150.0,
                Some("pago".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(atualizada.id, criada.id);
        assert_eq!(atualizada.valor, 150.0);
        assert_eq!(atualizada.status, "pago");
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_de_id_desconhecido_e_not_found() {
        let dir = tempdir().unwrap();
        let repo = ComissoesRepo::new(dir.path());
        assert!(matches!(
            repo.delete("nada").await,
            Err(AppError::NotFound(_))
        ));
    }
}
