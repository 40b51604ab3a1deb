// src/models/compras.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::common::coerce;

// --- Enums de domínio ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPontos {
    #[default]
    Aguardando,
    Liberados,
}

impl StatusPontos {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "aguardando" => Some(Self::Aguardando),
            "liberados" => Some(Self::Liberados),
            _ => None,
        }
    }
}

/// Programa de destino (a "CIA" aérea que recebe os pontos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cia {
    Latam,
    Smiles,
}

impl Cia {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "latam" => Some(Self::Latam),
            "smiles" => Some(Self::Smiles),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latam => "latam",
            Self::Smiles => "smiles",
        }
    }
}

/// Programa de origem das transferências.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrigemPrograma {
    Livelo,
    Esfera,
}

impl OrigemPrograma {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "livelo" => Some(Self::Livelo),
            "esfera" => Some(Self::Esfera),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Livelo => "livelo",
            Self::Esfera => "esfera",
        }
    }
}

/// Modo "achatado" de compatibilidade com a listagem antiga. Compras com itens
/// de tipos mistos não têm modo único e ficam sem esses campos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModoCompat {
    Compra,
    Transferencia,
}

impl ModoCompat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "compra" => Some(Self::Compra),
            "transferencia" => Some(Self::Transferencia),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compra => "compra",
            Self::Transferencia => "transferencia",
        }
    }
}

/// Registros antigos guardam qualquer coisa no statusPontos; valores
/// desconhecidos voltam ao padrão em vez de derrubar a leitura.
pub fn de_status_lenient<'de, D>(d: D) -> Result<StatusPontos, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(v.as_str().and_then(StatusPontos::parse).unwrap_or_default())
}

// --- Totais ---

/// Representação canônica dos agregados de uma compra. Existe UMA vez
/// internamente; os espelhos legados (`totais`, `totaisId`, `calculos`) são
/// gerados na borda de serialização.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totais {
    pub total_pts: f64,
    pub custo_total: f64,
    pub custo_milheiro: f64,
    pub lucro_total: f64,
}

impl Totais {
    /// Visão no formato novo (nomes `totalCIA`/`custoMilheiroTotal`).
    pub fn como_cia(&self) -> TotaisCia {
        TotaisCia {
            total_cia: Some(self.total_pts),
            pontos_cia: None,
            custo_total: self.custo_total,
            custo_milheiro_total: self.custo_milheiro,
            lucro_total: self.lucro_total,
        }
    }

    /// Visão legada (nomes `totalPts`/`custoMilheiro`), usada em `totaisId`
    /// e `calculos`.
    pub fn como_legado(&self) -> TotaisLegado {
        TotaisLegado {
            total_pts: self.total_pts,
            custo_total: self.custo_total,
            custo_milheiro: self.custo_milheiro,
            lucro_total: self.lucro_total,
        }
    }
}

/// Bloco `totais` no formato novo. A tela nova usa `pontosCIA` no lugar de
/// `totalCIA`, então os dois são aceitos.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TotaisCia {
    #[serde(
        rename = "totalCIA",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_num_opt"
    )]
    pub total_cia: Option<f64>,

    #[serde(
        rename = "pontosCIA",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_num_opt"
    )]
    pub pontos_cia: Option<f64>,

    #[serde(rename = "custoTotal", default, deserialize_with = "coerce::de_money")]
    pub custo_total: f64,

    #[serde(
        rename = "custoMilheiroTotal",
        default,
        deserialize_with = "coerce::de_num"
    )]
    pub custo_milheiro_total: f64,

    #[serde(rename = "lucroTotal", default, deserialize_with = "coerce::de_money")]
    pub lucro_total: f64,
}

impl TotaisCia {
    /// `totalCIA` quando presente, senão `pontosCIA`, senão 0.
    pub fn pontos(&self) -> f64 {
        self.total_cia.or(self.pontos_cia).unwrap_or(0.0)
    }
}

/// Bloco de totais com os nomes antigos (`totaisId`/`calculos`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotaisLegado {
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub total_pts: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub custo_total: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub custo_milheiro: f64,
    #[serde(default, deserialize_with = "coerce::de_num")]
    pub lucro_total: f64,
}

// --- Registro principal ---

/// Registro canônico de uma compra, como persistido e servido pela API.
///
/// Os itens ficam como JSON cru: eles fazem o round-trip intacto e só o motor
/// de consolidação os interpreta. Campos desconhecidos de registros antigos
/// sobrevivem em `extras`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compra {
    pub id: String,

    #[serde(default)]
    pub data_compra: String,

    #[serde(default, deserialize_with = "de_status_lenient")]
    pub status_pontos: StatusPontos,

    #[serde(default)]
    pub cedente_id: String,
    #[serde(default)]
    pub cedente_nome: String,

    #[serde(default)]
    pub itens: Vec<Value>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_opt_lenient"
    )]
    pub totais: Option<TotaisCia>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_opt_lenient"
    )]
    pub totais_id: Option<TotaisLegado>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_opt_lenient"
    )]
    pub calculos: Option<TotaisLegado>,

    // Compatibilidade com a listagem antiga; válidos só quando todos os itens
    // compartilham um único tipo.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_opt_lenient"
    )]
    pub modo: Option<ModoCompat>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_opt_lenient"
    )]
    pub cia_compra: Option<Cia>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_opt_lenient"
    )]
    pub dest_cia: Option<Cia>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coerce::de_opt_lenient"
    )]
    pub origem: Option<OrigemPrograma>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_milheiro: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comissao_cedente: Option<Value>,

    #[serde(default, deserialize_with = "coerce::de_epoch_ms")]
    pub saved_at: i64,

    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

// --- Submissões ---

/// Submissão de compra, decodificada uma única vez na borda.
///
/// A presença de um array `itens` decide o formato: novo (itemizado) ou antigo
/// (um item implícito descrito por campos de topo + bloco `calculos`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompraSubmission {
    Itemizada(ItemizedSubmission),
    Legada(LegacySubmission),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemizedSubmission {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data_compra: Option<String>,
    #[serde(default, deserialize_with = "de_status_lenient")]
    pub status_pontos: StatusPontos,
    #[serde(default)]
    pub cedente_id: Option<String>,
    #[serde(default)]
    pub cedente_nome: Option<String>,

    // Sem `default`: é a presença deste array que seleciona o formato novo.
    pub itens: Vec<Value>,

    #[serde(default)]
    pub totais: Option<Value>,
    #[serde(default)]
    pub meta_milheiro: Option<Value>,
    #[serde(default)]
    pub comissao_cedente: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySubmission {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data_compra: Option<String>,
    #[serde(default, deserialize_with = "de_status_lenient")]
    pub status_pontos: StatusPontos,
    #[serde(default)]
    pub cedente_id: Option<String>,
    #[serde(default)]
    pub cedente_nome: Option<String>,

    #[serde(default)]
    pub modo: Option<Value>,
    #[serde(default)]
    pub cia_compra: Option<Value>,
    #[serde(default)]
    pub dest_cia: Option<Value>,
    #[serde(default)]
    pub origem: Option<Value>,
    #[serde(default)]
    pub valores: Option<Value>,
    #[serde(default)]
    pub calculos: Option<Value>,

    #[serde(default)]
    pub meta_milheiro: Option<Value>,
    #[serde(default)]
    pub comissao_cedente: Option<Value>,
}

impl CompraSubmission {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Itemizada(s) => s.id.as_deref(),
            Self::Legada(s) => s.id.as_deref(),
        }
    }

    pub fn data_compra(&self) -> String {
        match self {
            Self::Itemizada(s) => s.data_compra.clone().unwrap_or_default(),
            Self::Legada(s) => s.data_compra.clone().unwrap_or_default(),
        }
    }

    pub fn status_pontos(&self) -> StatusPontos {
        match self {
            Self::Itemizada(s) => s.status_pontos,
            Self::Legada(s) => s.status_pontos,
        }
    }

    pub fn cedente_id(&self) -> String {
        match self {
            Self::Itemizada(s) => s.cedente_id.clone().unwrap_or_default(),
            Self::Legada(s) => s.cedente_id.clone().unwrap_or_default(),
        }
    }

    pub fn cedente_nome(&self) -> String {
        match self {
            Self::Itemizada(s) => s.cedente_nome.clone().unwrap_or_default(),
            Self::Legada(s) => s.cedente_nome.clone().unwrap_or_default(),
        }
    }

    pub fn meta_milheiro(&self) -> Option<Value> {
        let v = match self {
            Self::Itemizada(s) => &s.meta_milheiro,
            Self::Legada(s) => &s.meta_milheiro,
        };
        v.clone().filter(|v| !v.is_null())
    }

    pub fn comissao_cedente(&self) -> Option<Value> {
        let v = match self {
            Self::Itemizada(s) => &s.comissao_cedente,
            Self::Legada(s) => &s.comissao_cedente,
        };
        v.clone().filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submissao_com_itens_vira_itemizada() {
        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0003",
            "itens": [{"kind": "compra", "data": {"programa": "latam"}}]
        }))
        .unwrap();
        assert!(matches!(sub, CompraSubmission::Itemizada(_)));
    }

    #[test]
    fn submissao_sem_itens_vira_legada() {
        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0001",
            "modo": "transferencia",
            "origem": "livelo",
            "calculos": {"totalPts": 10000, "custoTotal": 180}
        }))
        .unwrap();
        assert!(matches!(sub, CompraSubmission::Legada(_)));
    }

    #[test]
    fn itens_nao_array_cai_no_formato_antigo() {
        let sub: CompraSubmission =
            serde_json::from_value(json!({"id": "0002", "itens": "oops"})).unwrap();
        assert!(matches!(sub, CompraSubmission::Legada(_)));
    }

    #[test]
    fn registro_antigo_com_campos_estranhos_ainda_carrega() {
        let compra: Compra = serde_json::from_value(json!({
            "id": "0009",
            "statusPontos": "qualquercoisa",
            "modo": "clube",
            "ciaCompra": "azul",
            "totais": {"totalCIA": "1500", "custoTotal": "30,50"},
            "camposLivres": {"x": 1}
        }))
        .unwrap();
        assert_eq!(compra.status_pontos, StatusPontos::Aguardando);
        assert!(compra.modo.is_none());
        assert!(compra.cia_compra.is_none());
        let totais = compra.totais.unwrap();
        assert_eq!(totais.total_cia, Some(1500.0));
        assert_eq!(totais.custo_total, 30.5);
        assert!(compra.extras.contains_key("camposLivres"));
    }

    #[test]
    fn pontos_prefere_total_cia_mesmo_zerado() {
        let t: TotaisCia =
            serde_json::from_value(json!({"totalCIA": 0, "pontosCIA": 5000})).unwrap();
        assert_eq!(t.pontos(), 0.0);

        let t: TotaisCia = serde_json::from_value(json!({"pontosCIA": 5000})).unwrap();
        assert_eq!(t.pontos(), 5000.0);
    }
}
