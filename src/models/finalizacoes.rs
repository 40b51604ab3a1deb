// src/models/finalizacoes.rs

use serde::{Deserialize, Serialize};

use crate::common::coerce;

/// Registro de finalização (fechamento/acerto) de uma operação.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finalizacao {
    pub id: String,
    /// Data no formato yyyy-mm-dd.
    #[serde(default)]
    pub data: String,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub compra_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub conta_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub owner_funcionario_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub lucro_finalizacao: f64,
    #[serde(default)]
    pub observacao: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
