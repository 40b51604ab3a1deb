// src/models/comissoes.rs

use serde::{Deserialize, Serialize};

use crate::common::coerce;

/// Comissão devida a um cedente por uma compra. A dupla (compraId, cedenteId)
/// é a chave natural do upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comissao {
    pub id: String,
    pub compra_id: String,
    pub cedente_id: String,
    #[serde(default)]
    pub cedente_nome: String,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub valor: f64,
    #[serde(default = "status_padrao")]
    pub status: String,
    pub criado_em: String,
    pub atualizado_em: String,
}

fn status_padrao() -> String {
    "aguardando".to_string()
}
