// src/services/compras_service.rs

use std::collections::HashSet;

use chrono::Utc;
use serde_json::{Map, Value, json};

use crate::common::{coerce, error::AppError};
use crate::db::ComprasRepo;
use crate::models::compras::{
    Cia, Compra, CompraSubmission, ItemizedSubmission, LegacySubmission, ModoCompat,
    OrigemPrograma, Totais, TotaisCia, TotaisLegado,
};

// ---
// Motor de consolidação
// ---
// Funções puras: recebem a submissão/itens e devolvem os agregados. Nada aqui
// lê ou grava estado; o service orquestra o repositório em volta.

// Ordem de preferência dos nomes de campo acumulados pelo histórico de telas.
// A ordem é contrato de compatibilidade com os registros já gravados; para
// tipos novos de item crie um `kind` explícito em vez de estender as listas.
const CANDIDATOS_PONTOS: [&str; 10] = [
    "chegam",
    "chegamPts",
    "totalCIA",
    "pontosCIA",
    "total_destino",
    "total",
    "quantidade",
    "pontosTotais",
    "pontosUsados",
    "pontos",
];
const CANDIDATOS_CUSTO: [&str; 6] = [
    "custoTotal",
    "valor",
    "valorPago",
    "precoTotal",
    "preco",
    "custo",
];

fn campo<'a>(obj: Option<&'a Value>, chave: &str) -> Option<&'a Value> {
    obj.and_then(|v| v.get(chave))
}

fn parse_totais(v: &Value) -> TotaisCia {
    serde_json::from_value(v.clone()).unwrap_or_default()
}

/// Estratégia 1: um bloco `totais` com qualquer campo de pontos/dinheiro
/// não-zerado é confiado como está.
fn tem_override(t: &TotaisCia) -> bool {
    t.total_cia.unwrap_or(0.0) != 0.0
        || t.pontos_cia.unwrap_or(0.0) != 0.0
        || t.custo_total != 0.0
        || t.custo_milheiro_total != 0.0
}

fn totais_explicitos(t: &TotaisCia) -> Totais {
    // pontos não são fracionários
    let total_pts = t.pontos().round();
    let custo_total = t.custo_total;
    let custo_milheiro = if t.custo_milheiro_total > 0.0 {
        // valor já misturado calculado por uma tela antiga tem precedência
        t.custo_milheiro_total
    } else if total_pts > 0.0 {
        custo_total / (total_pts / 1000.0)
    } else {
        0.0
    };
    Totais {
        total_pts,
        custo_total,
        custo_milheiro,
        lucro_total: t.lucro_total,
    }
}

/// Estratégia 2: itens no formato antigo carregam um `resumo` pré-calculado.
fn totais_de_resumo(itens: &[Value]) -> Totais {
    let mut total_pts = 0.0;
    let mut custo_total = 0.0;
    let mut lucro_total = 0.0;
    let mut peso = 0.0;
    let mut acumulado = 0.0;

    for item in itens {
        let resumo = item.get("resumo");
        let pts = coerce::num(campo(resumo, "totalPts"));
        let custo = coerce::num(campo(resumo, "custoTotal"));
        total_pts += pts;
        custo_total += custo;
        lucro_total += coerce::num(campo(resumo, "lucroTotal"));

        // custoMilheiro não é média simples: a taxa de cada item pesa pelo seu
        // volume em milheiros, senão um item minúsculo e caro distorce a
        // mistura além da sua contribuição de pontos
        let milheiros = pts / 1000.0;
        if milheiros > 0.0 {
            let taxa = custo / milheiros;
            peso += milheiros;
            acumulado += taxa * milheiros;
        }
    }

    let custo_milheiro = if peso > 0.0 { acumulado / peso } else { 0.0 };
    Totais {
        total_pts,
        custo_total,
        custo_milheiro,
        lucro_total,
    }
}

/// Estratégia 3 (padrão): soma por tipo de item aplicando bônus e custos.
fn totais_por_tipo(itens: &[Value]) -> Totais {
    let mut total_pts = 0.0;
    let mut custo_total = 0.0;

    for item in itens {
        let kind = item.get("kind").and_then(Value::as_str).unwrap_or("");
        let dados = item.get("data");

        match kind {
            "transferencia" => {
                let modo = campo(dados, "modo").and_then(Value::as_str).unwrap_or("");
                let base = if modo == "pontos+dinheiro" {
                    coerce::num(campo(dados, "pontosTotais"))
                } else {
                    coerce::num(campo(dados, "pontosUsados"))
                };
                let bonus = coerce::num(campo(dados, "bonusPct"));
                let chegam = (base * (1.0 + bonus / 100.0)).round();
                total_pts += chegam.max(0.0);
                custo_total += coerce::money(campo(dados, "valorPago"));
            }
            "compra" => {
                let programa = campo(dados, "programa").and_then(Value::as_str).unwrap_or("");
                let pts_base = coerce::num(campo(dados, "pontos"));
                let bonus = coerce::num(campo(dados, "bonusPct"));
                // pontos destinados a um programa desconhecido não contam,
                // mas o dinheiro gasto conta sempre
                if Cia::parse(programa).is_some() {
                    total_pts += (pts_base * (1.0 + bonus / 100.0)).round();
                }
                custo_total += coerce::money(campo(dados, "valor"));
            }
            "clube" => {
                let programa = campo(dados, "programa").and_then(Value::as_str).unwrap_or("");
                let pts = coerce::num(campo(dados, "pontos"));
                if Cia::parse(programa).is_some() {
                    total_pts += pts.max(0.0);
                }
                custo_total += coerce::money(campo(dados, "valor"));
            }
            _ => {
                // Tipo antigo/desconhecido: varredura dos nomes de campo na
                // ordem fixa, depois o sub-bloco `totais` do item, depois o
                // `resumo` legado.
                let pts = CANDIDATOS_PONTOS
                    .iter()
                    .map(|c| coerce::num(campo(dados, c)))
                    .find(|v| *v > 0.0)
                    .unwrap_or(0.0);
                let custo = CANDIDATOS_CUSTO
                    .iter()
                    .map(|c| campo(dados, c))
                    .find(|v| coerce::num(*v) > 0.0)
                    .map(|v| coerce::money(v))
                    .unwrap_or(0.0);

                let tot = item.get("totais");
                let pts_alt = ["totalCIA", "pontosCIA", "cia"]
                    .iter()
                    .map(|c| coerce::num(campo(tot, c)))
                    .find(|v| *v != 0.0)
                    .unwrap_or(0.0);
                let custo_alt = coerce::money(campo(tot, "custoTotal"));

                total_pts += if pts > 0.0 { pts } else { pts_alt };
                custo_total += if custo > 0.0 { custo } else { custo_alt };

                let resumo = item.get("resumo");
                if !(pts > 0.0 || pts_alt > 0.0) {
                    total_pts += coerce::num(campo(resumo, "totalPts"));
                }
                if !(custo > 0.0 || custo_alt > 0.0) {
                    custo_total += coerce::num(campo(resumo, "custoTotal"));
                }
            }
        }
    }

    let custo_milheiro = if total_pts > 0.0 {
        custo_total / (total_pts / 1000.0)
    } else {
        0.0
    };
    // itens novos não carregam preço de venda; lucro só existe quando um
    // resumo legado o trouxe pronto
    let lucro_total = itens
        .iter()
        .map(|i| coerce::money(campo(i.get("resumo"), "lucroTotal")))
        .sum();

    Totais {
        total_pts,
        custo_total,
        custo_milheiro,
        lucro_total,
    }
}

/// Escolhe a estratégia de consolidação, nesta ordem: override explícito,
/// resumo legado, soma por tipo.
fn smart_totals(itens: &[Value], totais: Option<&TotaisCia>) -> Totais {
    if let Some(t) = totais {
        if tem_override(t) {
            return totais_explicitos(t);
        }
    }
    if itens.iter().any(|i| coerce::truthy(i.get("resumo"))) {
        return totais_de_resumo(itens);
    }
    totais_por_tipo(itens)
}

// ---
// Normalização das submissões
// ---

struct Normalizado {
    itens: Vec<Value>,
    totais: TotaisCia,
    totais_id: TotaisLegado,
    modo: Option<ModoCompat>,
    cia_compra: Option<Cia>,
    dest_cia: Option<Cia>,
    origem: Option<OrigemPrograma>,
}

/// Formato antigo: um item implícito descrito pelos campos de topo e pelo
/// bloco `calculos`. Sintetiza o equivalente itemizado para que todo o resto
/// do sistema só conheça um formato.
fn normalize_legada(sub: &LegacySubmission) -> Normalizado {
    let modo = sub
        .modo
        .as_ref()
        .and_then(Value::as_str)
        .and_then(ModoCompat::parse)
        .unwrap_or_else(|| {
            if coerce::truthy(sub.origem.as_ref()) {
                ModoCompat::Transferencia
            } else {
                ModoCompat::Compra
            }
        });

    let calculos = sub.calculos.as_ref();
    let resumo = TotaisLegado {
        total_pts: coerce::num(campo(calculos, "totalPts")),
        custo_milheiro: coerce::num(campo(calculos, "custoMilheiro")),
        custo_total: coerce::num(campo(calculos, "custoTotal")),
        lucro_total: coerce::num(campo(calculos, "lucroTotal")),
    };

    let valores = match &sub.valores {
        Some(v) if !v.is_null() => v.clone(),
        _ => json!({
            "ciaCompra": sub.cia_compra.clone().unwrap_or(Value::Null),
            "destCia": sub.dest_cia.clone().unwrap_or(Value::Null),
            "origem": sub.origem.clone().unwrap_or(Value::Null),
        }),
    };

    let item = json!({
        "idx": 1,
        "modo": modo.as_str(),
        "resumo": resumo,
        "valores": valores,
    });

    let (cia_compra, dest_cia, origem) = match modo {
        ModoCompat::Compra => (
            campo(Some(&valores), "ciaCompra")
                .and_then(Value::as_str)
                .and_then(Cia::parse),
            None,
            None,
        ),
        ModoCompat::Transferencia => (
            None,
            campo(Some(&valores), "destCia")
                .and_then(Value::as_str)
                .and_then(Cia::parse),
            campo(Some(&valores), "origem")
                .and_then(Value::as_str)
                .and_then(OrigemPrograma::parse),
        ),
    };

    let totais = TotaisCia {
        total_cia: Some(resumo.total_pts),
        pontos_cia: None,
        custo_total: resumo.custo_total,
        custo_milheiro_total: resumo.custo_milheiro,
        lucro_total: resumo.lucro_total,
    };

    Normalizado {
        itens: vec![item],
        totais,
        totais_id: resumo,
        modo: Some(modo),
        cia_compra,
        dest_cia,
        origem,
    }
}

/// Formato novo: array explícito de itens + bloco `totais` opcional.
fn normalize_itemizada(sub: &ItemizedSubmission) -> Normalizado {
    let itens = sub.itens.clone();
    let totais_sub = sub.totais.as_ref().map(parse_totais);
    let totals = smart_totals(&itens, totais_sub.as_ref());

    // modo único só quando todos os itens compartilham exatamente um tipo;
    // compra mista não tem achatamento legado possível
    let mut kinds: HashSet<Option<String>> = HashSet::new();
    for item in &itens {
        let k = coerce::texto(item.get("modo"))
            .or_else(|| coerce::texto(item.get("kind")))
            .map(str::to_string);
        kinds.insert(k);
    }
    let mut modo = None;
    if kinds.len() == 1 {
        if let Some(Some(k)) = kinds.into_iter().next() {
            modo = ModoCompat::parse(&k);
        }
    }

    let first_compra = itens.iter().find(|x| eh_tipo(x, "compra"));
    let first_transf = itens.iter().find(|x| eh_tipo(x, "transferencia"));

    let cia_compra = first_compra
        .and_then(|x| campo(x.get("data"), "programa"))
        .and_then(Value::as_str)
        .and_then(Cia::parse);
    let dest_cia = first_transf
        .and_then(|x| campo(x.get("data"), "destino"))
        .and_then(Value::as_str)
        .and_then(Cia::parse);
    let origem = first_transf
        .and_then(|x| campo(x.get("data"), "origem"))
        .and_then(Value::as_str)
        .and_then(OrigemPrograma::parse);

    Normalizado {
        itens,
        totais: totals.como_cia(),
        totais_id: totals.como_legado(),
        modo,
        cia_compra,
        dest_cia,
        origem,
    }
}

fn eh_tipo(item: &Value, tipo: &str) -> bool {
    item.get("kind").and_then(Value::as_str) == Some(tipo)
        || item.get("modo").and_then(Value::as_str) == Some(tipo)
}

fn normalize(sub: &CompraSubmission) -> Normalizado {
    match sub {
        CompraSubmission::Itemizada(s) => normalize_itemizada(s),
        CompraSubmission::Legada(s) => normalize_legada(s),
    }
}

// ---
// Patch parcial
// ---

/// Completa um patch antes do merge: itens novos regeneram os três espelhos de
/// totais, `totais` sozinho deriva `totaisId`/`calculos`, e o primeiro item
/// com modo único renova os campos achatados da listagem.
fn enrich_patch(mut apply: Map<String, Value>) -> Map<String, Value> {
    let tem_totais = apply.get("totais").is_some_and(|v| coerce::truthy(Some(v)));
    let tem_totais_id = apply
        .get("totaisId")
        .is_some_and(|v| coerce::truthy(Some(v)));

    let itens_patch = match apply.get("itens") {
        Some(Value::Array(a)) => Some(a.clone()),
        _ => None,
    };
    if let Some(itens) = &itens_patch {
        if !tem_totais && !tem_totais_id {
            let smart = smart_totals(itens, None);
            let legado = serde_json::to_value(smart.como_legado()).unwrap_or(Value::Null);
            apply.insert("totaisId".to_string(), legado.clone());
            apply.insert("calculos".to_string(), legado);
            apply.insert(
                "totais".to_string(),
                serde_json::to_value(smart.como_cia()).unwrap_or(Value::Null),
            );
        }
    }

    let tem_totais = apply.get("totais").is_some_and(|v| coerce::truthy(Some(v)));
    let tem_totais_id = apply
        .get("totaisId")
        .is_some_and(|v| coerce::truthy(Some(v)));
    if tem_totais && !tem_totais_id {
        let t = apply.get("totais").cloned().unwrap_or(Value::Null);
        let compat = totais_explicitos(&parse_totais(&t));
        let legado = serde_json::to_value(compat.como_legado()).unwrap_or(Value::Null);
        apply.insert("totaisId".to_string(), legado.clone());
        apply.insert("calculos".to_string(), legado);
    }

    if let Some(first) = apply.get("itens").and_then(|v| v.get(0)).cloned() {
        let modo = coerce::texto(first.get("modo"))
            .or_else(|| coerce::texto(first.get("kind")))
            .and_then(ModoCompat::parse);
        if let Some(modo) = modo {
            apply.insert("modo".to_string(), json!(modo.as_str()));
            match modo {
                ModoCompat::Compra => {
                    let cia = campo(first.get("valores"), "ciaCompra")
                        .filter(|v| !v.is_null())
                        .or_else(|| campo(first.get("data"), "programa").filter(|v| !v.is_null()))
                        .cloned()
                        .unwrap_or(Value::Null);
                    apply.insert("ciaCompra".to_string(), cia);
                    apply.insert("destCia".to_string(), Value::Null);
                    apply.insert("origem".to_string(), Value::Null);
                }
                ModoCompat::Transferencia => {
                    let dest = campo(first.get("valores"), "destCia")
                        .filter(|v| !v.is_null())
                        .or_else(|| campo(first.get("data"), "destino").filter(|v| !v.is_null()))
                        .cloned()
                        .unwrap_or(Value::Null);
                    let orig = campo(first.get("valores"), "origem")
                        .filter(|v| !v.is_null())
                        .or_else(|| campo(first.get("data"), "origem").filter(|v| !v.is_null()))
                        .cloned()
                        .unwrap_or(Value::Null);
                    apply.insert("ciaCompra".to_string(), Value::Null);
                    apply.insert("destCia".to_string(), dest);
                    apply.insert("origem".to_string(), orig);
                }
            }
        }
    }

    apply
}

// ---
// Filtros da listagem
// ---

#[derive(Debug, Default, Clone)]
pub struct ListFilter {
    pub q: String,
    pub modo: String,
    pub cia: String,
    pub origem: String,
    pub start: String,
    pub end: String,
    pub offset: usize,
    pub limit: usize,
}

fn first_modo(r: &Compra) -> String {
    if let Some(m) = r.modo {
        return m.as_str().to_string();
    }
    let primeiro = r.itens.first();
    coerce::texto(campo(primeiro, "modo"))
        .or_else(|| coerce::texto(campo(primeiro, "kind")))
        .unwrap_or("")
        .to_string()
}

fn row_cia(r: &Compra) -> String {
    match first_modo(r).as_str() {
        "compra" => {
            if let Some(c) = r.cia_compra {
                return c.as_str().to_string();
            }
            let primeiro = r.itens.first();
            coerce::texto(campo(primeiro, "valores").and_then(|v| v.get("ciaCompra")))
                .or_else(|| {
                    let item = r.itens.iter().find(|x| eh_tipo(x, "compra"));
                    coerce::texto(item.and_then(|x| campo(x.get("data"), "programa")))
                })
                .unwrap_or("")
                .to_string()
        }
        "transferencia" => {
            if let Some(c) = r.dest_cia {
                return c.as_str().to_string();
            }
            let primeiro = r.itens.first();
            coerce::texto(campo(primeiro, "valores").and_then(|v| v.get("destCia")))
                .or_else(|| {
                    let item = r.itens.iter().find(|x| eh_tipo(x, "transferencia"));
                    coerce::texto(item.and_then(|x| campo(x.get("data"), "destino")))
                })
                .unwrap_or("")
                .to_string()
        }
        _ => String::new(),
    }
}

fn row_origem(r: &Compra) -> String {
    if let Some(o) = r.origem {
        return o.as_str().to_string();
    }
    let primeiro = r.itens.first();
    coerce::texto(campo(primeiro, "valores").and_then(|v| v.get("origem")))
        .or_else(|| {
            let item = r.itens.iter().find(|x| eh_tipo(x, "transferencia"));
            coerce::texto(item.and_then(|x| campo(x.get("data"), "origem")))
        })
        .unwrap_or("")
        .to_string()
}

/// Garante os três blocos de totais em uma linha vinda do disco (registros
/// antigos podem não os ter); espelha `pontosCIA` em `totalCIA` quando só a
/// variante da tela nova existe. Nada disso é persistido.
fn ensure_totais(mut r: Compra) -> Compra {
    let has_pts = r.totais.as_ref().is_some_and(|t| t.pontos() > 0.0);
    if !has_pts {
        let totals = smart_totals(&r.itens, r.totais.as_ref());
        r.totais = Some(totals.como_cia());
        r.totais_id = Some(totals.como_legado());
        r.calculos = Some(totals.como_legado());
    } else if let Some(t) = r.totais.as_mut() {
        if t.total_cia.unwrap_or(0.0) == 0.0 && t.pontos_cia.unwrap_or(0.0) != 0.0 {
            t.total_cia = t.pontos_cia;
        }
    }
    r
}

// ---
// Service
// ---

#[derive(Clone)]
pub struct ComprasService {
    repo: ComprasRepo,
}

impl ComprasService {
    pub fn new(repo: ComprasRepo) -> Self {
        Self { repo }
    }

    /// Normaliza a submissão (formato antigo ou novo) e grava o registro
    /// canônico com todos os espelhos de compatibilidade preenchidos.
    pub async fn upsert(&self, sub: CompraSubmission) -> Result<String, AppError> {
        let id = match sub.id() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => self.repo.next_short_id().await?,
        };

        let n = normalize(&sub);
        let compra = Compra {
            id: id.clone(),
            data_compra: sub.data_compra(),
            status_pontos: sub.status_pontos(),
            cedente_id: sub.cedente_id(),
            cedente_nome: sub.cedente_nome(),
            itens: n.itens,
            totais: Some(n.totais),
            totais_id: Some(n.totais_id.clone()),
            calculos: Some(n.totais_id),
            modo: n.modo,
            cia_compra: n.cia_compra,
            dest_cia: n.dest_cia,
            origem: n.origem,
            meta_milheiro: sub.meta_milheiro(),
            comissao_cedente: sub.comissao_cedente(),
            saved_at: Utc::now().timestamp_millis(),
            extras: Map::new(),
        };

        self.repo.upsert(compra).await?;
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Result<Compra, AppError> {
        let compra = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Não encontrado".to_string()))?;
        Ok(ensure_totais(compra))
    }

    pub async fn list(&self, f: &ListFilter) -> Result<(usize, Vec<Compra>), AppError> {
        let todas = self.repo.list_all().await?;
        let mut rows: Vec<Compra> = todas.into_iter().map(ensure_totais).collect();

        if !f.q.is_empty() {
            let q = f.q.to_lowercase();
            rows.retain(|r| {
                r.id.to_lowercase().contains(&q)
                    || r.cedente_id.to_lowercase().contains(&q)
                    || r.cedente_nome.to_lowercase().contains(&q)
            });
        }
        if !f.modo.is_empty() {
            rows.retain(|r| first_modo(r) == f.modo);
        }
        if !f.cia.is_empty() {
            rows.retain(|r| row_cia(r) == f.cia);
        }
        if !f.origem.is_empty() {
            rows.retain(|r| row_origem(r) == f.origem);
        }
        if !f.start.is_empty() {
            rows.retain(|r| r.data_compra.as_str() >= f.start.as_str());
        }
        if !f.end.is_empty() {
            rows.retain(|r| r.data_compra.as_str() <= f.end.as_str());
        }

        rows.sort_by(|a, b| b.data_compra.cmp(&a.data_compra).then_with(|| a.id.cmp(&b.id)));

        let total = rows.len();
        let items = rows.into_iter().skip(f.offset).take(f.limit).collect();
        Ok((total, items))
    }

    /// Merge raso do patch, com os espelhos de totais regenerados quando o
    /// patch traz itens ou totais novos.
    pub async fn apply_patch(
        &self,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Compra, AppError> {
        let apply = enrich_patch(patch);
        self.repo.update_by_id(id, apply).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete_by_id(id).await
    }

    pub async fn next_id(&self) -> Result<String, AppError> {
        self.repo.next_short_id().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn item_transferencia(pontos_usados: f64, bonus: f64, valor_pago: f64) -> Value {
        json!({
            "kind": "transferencia",
            "data": {
                "origem": "livelo",
                "destino": "latam",
                "modo": "pontos",
                "pontosUsados": pontos_usados,
                "bonusPct": bonus,
                "valorPago": valor_pago,
            }
        })
    }

    // --- estratégia por tipo ---

    #[test]
    fn transferencia_aplica_bonus_sobre_pontos_usados() {
        let t = totais_por_tipo(&[item_transferencia(10000.0, 20.0, 500.0)]);
        assert_eq!(t.total_pts, 12000.0);
        assert_eq!(t.custo_total, 500.0);
    }

    #[test]
    fn transferencia_pontos_mais_dinheiro_usa_pontos_totais() {
        let item = json!({
            "kind": "transferencia",
            "data": {"modo": "pontos+dinheiro", "pontosUsados": 1000, "pontosTotais": 8000, "valorPago": 300}
        });
        let t = totais_por_tipo(&[item]);
        assert_eq!(t.total_pts, 8000.0);
        assert_eq!(t.custo_total, 300.0);
    }

    #[test]
    fn compra_so_conta_pontos_de_programa_reconhecido() {
        let latam = json!({"kind": "compra", "data": {"programa": "latam", "pontos": 5000, "bonusPct": 0, "valor": 250}});
        let t = totais_por_tipo(&[latam]);
        assert_eq!(t.total_pts, 5000.0);
        assert_eq!(t.custo_total, 250.0);

        let desconhecido = json!({"kind": "compra", "data": {"programa": "unknown", "pontos": 5000, "bonusPct": 0, "valor": 250}});
        let t = totais_por_tipo(&[desconhecido]);
        assert_eq!(t.total_pts, 0.0);
        // o custo conta mesmo sem os pontos
        assert_eq!(t.custo_total, 250.0);
    }

    #[test]
    fn clube_ignora_pontos_negativos() {
        let item = json!({"kind": "clube", "data": {"programa": "smiles", "pontos": -500, "valor": 40}});
        let t = totais_por_tipo(&[item]);
        assert_eq!(t.total_pts, 0.0);
        assert_eq!(t.custo_total, 40.0);
    }

    #[test]
    fn custo_milheiro_zera_sem_pontos() {
        let item = json!({"kind": "compra", "data": {"programa": "unknown", "pontos": 1000, "valor": 99}});
        let t = totais_por_tipo(&[item]);
        assert_eq!(t.total_pts, 0.0);
        assert_eq!(t.custo_milheiro, 0.0);
    }

    #[test]
    fn campos_numericos_invalidos_viram_zero() {
        let item = json!({"kind": "compra", "data": {"programa": "latam", "pontos": "muitos", "bonusPct": null, "valor": "caro"}});
        let t = totais_por_tipo(&[item]);
        assert_eq!(t.total_pts, 0.0);
        assert_eq!(t.custo_total, 0.0);
        assert_eq!(t.custo_milheiro, 0.0);
    }

    #[test]
    fn tipo_desconhecido_respeita_a_ordem_dos_candidatos() {
        // "chegam" vem antes de "pontos" na ordem de preferência
        let item = json!({"kind": "misterio", "data": {"pontos": 999, "chegam": 100, "valor": 50}});
        let t = totais_por_tipo(&[item]);
        assert_eq!(t.total_pts, 100.0);
        assert_eq!(t.custo_total, 50.0);
    }

    #[test]
    fn tipo_desconhecido_cai_para_totais_do_item_e_depois_resumo() {
        let com_totais = json!({"kind": "misterio", "data": {}, "totais": {"pontosCIA": 700, "custoTotal": 20}});
        let t = totais_por_tipo(&[com_totais]);
        assert_eq!(t.total_pts, 700.0);
        assert_eq!(t.custo_total, 20.0);

        let so_resumo = json!({"kind": "misterio", "data": {}, "resumo": {"totalPts": 300, "custoTotal": 9}});
        let t = totais_por_tipo(std::slice::from_ref(&so_resumo));
        // sem candidato e sem totais, o resumo legado entra na soma
        assert_eq!(t.total_pts, 300.0);
        assert_eq!(t.custo_total, 9.0);
    }

    // --- estratégia resumo ---

    #[test]
    fn resumo_pondera_custo_milheiro_pelo_volume() {
        let itens = vec![
            json!({"resumo": {"totalPts": 1000, "custoTotal": 100}}),
            json!({"resumo": {"totalPts": 9000, "custoTotal": 450}}),
        ];
        let t = totais_de_resumo(&itens);
        assert_eq!(t.total_pts, 10000.0);
        assert_eq!(t.custo_total, 550.0);
        // (100/1 * 1 + 450/9 * 9) / 10 = 55 e não a média simples 75
        assert!((t.custo_milheiro - 55.0).abs() < 1e-9);
    }

    #[test]
    fn resumo_ignora_itens_sem_pontos_na_mistura() {
        let itens = vec![
            json!({"resumo": {"totalPts": 2000, "custoTotal": 50}}),
            json!({"resumo": {"totalPts": 0, "custoTotal": 30}}),
        ];
        let t = totais_de_resumo(&itens);
        assert_eq!(t.custo_total, 80.0);
        assert!((t.custo_milheiro - 25.0).abs() < 1e-9);
    }

    // --- seleção de estratégia ---

    #[test]
    fn override_explicito_tem_precedencia() {
        let itens = vec![item_transferencia(10000.0, 20.0, 500.0)];
        let explicito: TotaisCia =
            serde_json::from_value(json!({"totalCIA": 7000, "custoTotal": 140})).unwrap();
        let t = smart_totals(&itens, Some(&explicito));
        assert_eq!(t.total_pts, 7000.0);
        assert_eq!(t.custo_total, 140.0);
        assert!((t.custo_milheiro - 20.0).abs() < 1e-9);
    }

    #[test]
    fn override_arredonda_pontos_e_respeita_milheiro_ja_misturado() {
        let explicito: TotaisCia = serde_json::from_value(
            json!({"pontosCIA": 1234.6, "custoTotal": 100, "custoMilheiroTotal": 17.5}),
        )
        .unwrap();
        let t = totais_explicitos(&explicito);
        assert_eq!(t.total_pts, 1235.0);
        assert_eq!(t.custo_milheiro, 17.5);
    }

    #[test]
    fn totais_zerados_nao_contam_como_override() {
        let zerado: TotaisCia =
            serde_json::from_value(json!({"totalCIA": 0, "custoTotal": 0})).unwrap();
        let itens = vec![item_transferencia(1000.0, 0.0, 20.0)];
        let t = smart_totals(&itens, Some(&zerado));
        assert_eq!(t.total_pts, 1000.0);
    }

    #[test]
    fn resumo_vence_a_soma_por_tipo() {
        let itens = vec![json!({
            "kind": "compra",
            "data": {"programa": "latam", "pontos": 5000, "valor": 100},
            "resumo": {"totalPts": 1111, "custoTotal": 22}
        })];
        let t = smart_totals(&itens, None);
        assert_eq!(t.total_pts, 1111.0);
        assert_eq!(t.custo_total, 22.0);
    }

    #[test]
    fn recomputar_sobre_itens_normalizados_e_idempotente() {
        let itens = vec![
            json!({"resumo": {"totalPts": 4000, "custoTotal": 80, "lucroTotal": 10}}),
            json!({"resumo": {"totalPts": 6000, "custoTotal": 150, "lucroTotal": 5}}),
        ];
        let primeira = smart_totals(&itens, None);
        let segunda = smart_totals(&itens, None);
        assert_eq!(primeira.total_pts, segunda.total_pts);
        assert_eq!(primeira.custo_total, segunda.custo_total);
        assert!((primeira.custo_milheiro - segunda.custo_milheiro).abs() < 1e-9);
        assert_eq!(primeira.lucro_total, segunda.lucro_total);
    }

    // --- normalização ---

    #[test]
    fn formato_antigo_sintetiza_um_item_com_resumo() {
        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0001",
            "modo": "transferencia",
            "origem": "livelo",
            "destCia": "smiles",
            "calculos": {"totalPts": 10000, "custoTotal": 180, "custoMilheiro": 18, "lucroTotal": 0}
        }))
        .unwrap();
        let n = normalize(&sub);

        assert_eq!(n.itens.len(), 1);
        assert_eq!(n.itens[0]["resumo"]["totalPts"], json!(10000.0));
        assert_eq!(n.modo, Some(ModoCompat::Transferencia));
        assert_eq!(n.dest_cia, Some(Cia::Smiles));
        assert_eq!(n.origem, Some(OrigemPrograma::Livelo));
        assert!(n.cia_compra.is_none());
        assert_eq!(n.totais.total_cia, Some(10000.0));
        assert_eq!(n.totais_id.total_pts, 10000.0);
        assert_eq!(n.totais.custo_milheiro_total, 18.0);
    }

    #[test]
    fn formato_antigo_sem_modo_deduz_pela_origem() {
        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0002",
            "origem": "esfera",
            "calculos": {"totalPts": 100, "custoTotal": 2}
        }))
        .unwrap();
        let n = normalize(&sub);
        assert_eq!(n.modo, Some(ModoCompat::Transferencia));

        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0003",
            "ciaCompra": "latam",
            "calculos": {"totalPts": 100, "custoTotal": 2}
        }))
        .unwrap();
        let n = normalize(&sub);
        assert_eq!(n.modo, Some(ModoCompat::Compra));
        assert_eq!(n.cia_compra, Some(Cia::Latam));
    }

    #[test]
    fn itens_mistos_nao_tem_campos_achatados() {
        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0004",
            "itens": [
                {"kind": "compra", "data": {"programa": "latam", "pontos": 1000, "valor": 50}},
                {"kind": "transferencia", "data": {"origem": "livelo", "destino": "latam", "modo": "pontos", "pontosUsados": 2000, "valorPago": 70}}
            ]
        }))
        .unwrap();
        let n = normalize(&sub);
        assert!(n.modo.is_none());
        // os campos de programa ainda apontam para o primeiro item de cada tipo
        assert_eq!(n.cia_compra, Some(Cia::Latam));
        assert_eq!(n.dest_cia, Some(Cia::Latam));
        assert_eq!(n.origem, Some(OrigemPrograma::Livelo));
    }

    #[test]
    fn itens_de_um_so_tipo_preenchem_o_modo() {
        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0005",
            "itens": [item_transferencia(10000.0, 20.0, 500.0)]
        }))
        .unwrap();
        let n = normalize(&sub);
        assert_eq!(n.modo, Some(ModoCompat::Transferencia));
        assert_eq!(n.dest_cia, Some(Cia::Latam));
        assert_eq!(n.origem, Some(OrigemPrograma::Livelo));
        assert_eq!(n.totais.total_cia, Some(12000.0));
        assert_eq!(n.totais_id.total_pts, 12000.0);
    }

    // --- patch ---

    #[test]
    fn patch_so_de_status_nao_mexe_em_totais() {
        let mut patch = Map::new();
        patch.insert("statusPontos".to_string(), json!("liberados"));
        let apply = enrich_patch(patch);
        assert_eq!(apply.len(), 1);
        assert!(!apply.contains_key("totais"));
        assert!(!apply.contains_key("totaisId"));
    }

    #[test]
    fn patch_com_itens_regenera_os_tres_espelhos() {
        let mut patch = Map::new();
        patch.insert(
            "itens".to_string(),
            json!([item_transferencia(10000.0, 0.0, 170.0)]),
        );
        let apply = enrich_patch(patch);
        assert_eq!(apply["totais"]["totalCIA"], json!(10000.0));
        assert_eq!(apply["totaisId"]["totalPts"], json!(10000.0));
        assert_eq!(apply["calculos"], apply["totaisId"]);
        // primeiro item é transferência: campos achatados renovados
        assert_eq!(apply["modo"], json!("transferencia"));
        assert_eq!(apply["ciaCompra"], Value::Null);
        assert_eq!(apply["destCia"], json!("latam"));
        assert_eq!(apply["origem"], json!("livelo"));
    }

    #[test]
    fn patch_com_totais_deriva_totais_id() {
        let mut patch = Map::new();
        patch.insert("totais".to_string(), json!({"totalCIA": 5000, "custoTotal": 90}));
        let apply = enrich_patch(patch);
        assert_eq!(apply["totaisId"]["totalPts"], json!(5000.0));
        assert!((apply["totaisId"]["custoMilheiro"].as_f64().unwrap() - 18.0).abs() < 1e-9);
    }

    // --- service ---

    #[tokio::test]
    async fn upsert_e_get_preenchem_todos_os_espelhos() {
        let dir = tempdir().unwrap();
        let service = ComprasService::new(ComprasRepo::new(dir.path()));

        let sub: CompraSubmission = serde_json::from_value(json!({
            "id": "0001",
            "dataCompra": "2025-09-20",
            "cedenteId": "AB",
            "cedenteNome": "Ana Braga",
            "itens": [item_transferencia(10000.0, 20.0, 500.0)]
        }))
        .unwrap();

        let id = service.upsert(sub).await.unwrap();
        assert_eq!(id, "0001");

        let compra = service.get("0001").await.unwrap();
        let totais = compra.totais.unwrap();
        assert_eq!(totais.total_cia, Some(12000.0));
        let totais_id = compra.totais_id.unwrap();
        assert_eq!(totais_id.total_pts, 12000.0);
        assert!((totais_id.custo_milheiro - 500.0 / 12.0).abs() < 1e-9);
        assert_eq!(
            serde_json::to_value(&compra.calculos).unwrap(),
            serde_json::to_value(Some(totais_id)).unwrap()
        );
    }

    #[tokio::test]
    async fn get_recalcula_totais_de_registro_antigo_sem_persistir() {
        let dir = tempdir().unwrap();
        let repo = ComprasRepo::new(dir.path());
        let service = ComprasService::new(repo.clone());

        // registro gravado por uma versão antiga, sem bloco de totais
        let crua: Compra = serde_json::from_value(json!({
            "id": "0001",
            "dataCompra": "2025-01-15",
            "itens": [{"kind": "compra", "data": {"programa": "smiles", "pontos": 4000, "valor": 120}}]
        }))
        .unwrap();
        repo.upsert(crua).await.unwrap();

        let compra = service.get("0001").await.unwrap();
        assert_eq!(compra.totais.unwrap().total_cia, Some(4000.0));

        let no_disco = repo.find_by_id("0001").await.unwrap().unwrap();
        assert!(no_disco.totais.is_none());
    }

    #[tokio::test]
    async fn listagem_filtra_ordena_e_pagina() {
        let dir = tempdir().unwrap();
        let service = ComprasService::new(ComprasRepo::new(dir.path()));

        for (id, data, programa) in [
            ("0001", "2025-01-10", "latam"),
            ("0002", "2025-02-10", "smiles"),
            ("0003", "2025-03-10", "latam"),
        ] {
            let sub: CompraSubmission = serde_json::from_value(json!({
                "id": id,
                "dataCompra": data,
                "cedenteNome": "Ana",
                "itens": [{"kind": "compra", "data": {"programa": programa, "pontos": 1000, "valor": 30}}]
            }))
            .unwrap();
            service.upsert(sub).await.unwrap();
        }

        let f = ListFilter {
            limit: 20,
            ..Default::default()
        };
        let (total, items) = service.list(&f).await.unwrap();
        assert_eq!(total, 3);
        // data decrescente
        assert_eq!(items[0].id, "0003");

        let f = ListFilter {
            cia: "latam".to_string(),
            limit: 20,
            ..Default::default()
        };
        let (total, _) = service.list(&f).await.unwrap();
        assert_eq!(total, 2);

        let f = ListFilter {
            q: "ana".to_string(),
            start: "2025-02-01".to_string(),
            limit: 1,
            ..Default::default()
        };
        let (total, items) = service.list(&f).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "0003");
    }

    #[tokio::test]
    async fn patch_de_id_inexistente_e_not_found() {
        let dir = tempdir().unwrap();
        let service = ComprasService::new(ComprasRepo::new(dir.path()));
        let res = service.apply_patch("9999", Map::new()).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }
}
