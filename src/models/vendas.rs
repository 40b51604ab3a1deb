// src/models/vendas.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::common::coerce;
use crate::models::compras::Cia;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagamentoStatus {
    Pago,
    #[default]
    Pendente,
}

impl PagamentoStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pago" => Some(Self::Pago),
            "pendente" => Some(Self::Pendente),
            _ => None,
        }
    }
}

fn de_pagamento_lenient<'de, D>(d: D) -> Result<PagamentoStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(v.as_str()
        .and_then(PagamentoStatus::parse)
        .unwrap_or_default())
}

/// Qualquer coisa que não seja "latam" conta como "smiles".
pub fn cia_de_venda(s: Option<&str>) -> Cia {
    match s {
        Some("latam") => Cia::Latam,
        _ => Cia::Smiles,
    }
}

fn de_cia_venda<'de, D>(d: D) -> Result<Cia, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(cia_de_venda(v.as_str()))
}

fn cia_padrao() -> Cia {
    Cia::Smiles
}

/// Conta de cedente escolhida para debitar os pontos da venda.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContaEscolhida {
    pub id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub usar: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub disponivel: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub leftover: f64,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub compra_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regra: Option<String>,
}

/// Parte de uma combinação de contas sugerida para cobrir os pontos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParteCombinacao {
    pub id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub usar: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub disp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelInfo {
    pub at: String,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub taxa_cia: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub taxa_empresa: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub refund: f64,
    #[serde(default)]
    pub recredit_points: bool,
    #[serde(default)]
    pub note: Option<String>,
}

/// Registro de venda. Campos ausentes viram null no JSON gravado, como os
/// registros históricos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venda {
    pub id: String,
    pub created_at: String,

    #[serde(default)]
    pub data: String,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub pontos: f64,
    #[serde(default = "cia_padrao", deserialize_with = "de_cia_venda")]
    pub cia: Cia,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub qtd_passageiros: f64,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub funcionario_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub funcionario_nome: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub user_email: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cliente_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cliente_nome: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cliente_origem: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub conta_escolhida: Option<ContaEscolhida>,
    #[serde(default, deserialize_with = "coerce::de_vec_lenient")]
    pub sugestao_combinacao: Vec<ParteCombinacao>,

    #[serde(default, deserialize_with = "coerce::de_num")]
    pub milheiros: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub valor_milheiro: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub valor_pontos: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub taxa_embarque: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub total_cobrar: f64,

    #[serde(default, deserialize_with = "coerce::de_f64_estrito_opt")]
    pub meta_milheiro: Option<f64>,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub comissao_base: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub comissao_bonus_meta: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub comissao_total: f64,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cartao_funcionario_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cartao_funcionario_nome: Option<String>,

    #[serde(default, deserialize_with = "de_pagamento_lenient")]
    pub pagamento_status: PagamentoStatus,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub localizador: Option<String>,
    #[serde(rename = "origemIATA", default, deserialize_with = "coerce::de_opt_lenient")]
    pub origem_iata: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub sobrenome: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cancel_info: Option<CancelInfo>,
}

/// Corpo de criação de venda. Tudo tolerante: os campos numéricos aceitam o
/// que a tela mandar e viram 0 quando ilegíveis; só `cia` e `pontos` são
/// exigidos (no handler).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovaVenda {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub pontos: f64,
    #[serde(default)]
    pub cia: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub qtd_passageiros: f64,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub funcionario_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub funcionario_nome: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub user_email: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cliente_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cliente_nome: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cliente_origem: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub conta_escolhida: Option<ContaEscolhida>,
    #[serde(default, deserialize_with = "coerce::de_vec_lenient")]
    pub sugestao_combinacao: Vec<ParteCombinacao>,

    #[serde(default, deserialize_with = "coerce::de_num")]
    pub milheiros: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub valor_milheiro: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub valor_pontos: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub taxa_embarque: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub total_cobrar: f64,

    #[serde(default, deserialize_with = "coerce::de_f64_estrito_opt")]
    pub meta_milheiro: Option<f64>,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub comissao_base: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub comissao_bonus_meta: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub comissao_total: f64,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cartao_funcionario_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub cartao_funcionario_nome: Option<String>,

    #[serde(default)]
    pub pagamento_status: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub localizador: Option<String>,
    #[serde(rename = "origemIATA", default, deserialize_with = "coerce::de_opt_lenient")]
    pub origem_iata: Option<String>,
    #[serde(default, deserialize_with = "coerce::de_opt_lenient")]
    pub sobrenome: Option<String>,

    // Snapshot opcional de cedentes para semear o arquivo na primeira venda.
    #[serde(default, deserialize_with = "coerce::de_vec_lenient")]
    pub cedentes: Vec<Value>,
    #[serde(default, deserialize_with = "coerce::de_vec_lenient")]
    pub cedentes_snapshot: Vec<Value>,
}
