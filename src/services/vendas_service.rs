// src/services/vendas_service.rs

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::common::{coerce, error::AppError};
use crate::db::{CedentesRepo, VendasRepo};
use crate::models::cedentes::{identificador_up, pick_cedente_fields, saldo_field};
use crate::models::vendas::{CancelInfo, NovaVenda, PagamentoStatus, Venda, cia_de_venda};

#[derive(Clone)]
pub struct VendasService {
    vendas: VendasRepo,
    cedentes: CedentesRepo,
}

impl VendasService {
    pub fn new(vendas: VendasRepo, cedentes: CedentesRepo) -> Self {
        Self { vendas, cedentes }
    }

    pub async fn list(&self) -> Result<Vec<Venda>, AppError> {
        self.vendas.list_all().await
    }

    /// Registra a venda e desconta os pontos da conta escolhida (ou de cada
    /// parte da combinação sugerida) no saldo da CIA da venda.
    ///
    /// Devolve o id criado e a lista de cedentes após o débito.
    pub async fn create(&self, body: NovaVenda) -> Result<(String, Vec<Value>), AppError> {
        let raiz = self.cedentes.read_raw().await?;
        let do_disco = raiz
            .as_ref()
            .map(CedentesRepo::extract_lista)
            .unwrap_or_default();

        let seed = if !body.cedentes.is_empty() {
            body.cedentes.clone()
        } else {
            body.cedentes_snapshot.clone()
        };

        let disco_vazio = do_disco.is_empty();
        let mut cedentes = if !disco_vazio {
            do_disco
        } else if !seed.is_empty() {
            seed.iter().map(pick_cedente_fields).collect()
        } else {
            Vec::new()
        };

        // primeira venda com snapshot: inicializa o arquivo de cedentes
        if disco_vazio && !seed.is_empty() {
            self.cedentes
                .write_raw(&Value::Array(cedentes.clone()))
                .await?;
        }

        let id = format!("V{}", Utc::now().timestamp_millis());
        let record = Venda {
            id: id.clone(),
            created_at: agora_iso(),

            data: body.data.unwrap_or_default(),
            pontos: body.pontos,
            cia: cia_de_venda(body.cia.as_deref()),
            qtd_passageiros: body.qtd_passageiros,

            funcionario_id: body.funcionario_id,
            funcionario_nome: body.funcionario_nome,
            user_name: body.user_name,
            user_email: body.user_email,

            cliente_id: body.cliente_id,
            cliente_nome: body.cliente_nome,
            cliente_origem: body.cliente_origem,

            conta_escolhida: body.conta_escolhida,
            sugestao_combinacao: body.sugestao_combinacao,

            milheiros: body.milheiros,
            valor_milheiro: body.valor_milheiro,
            valor_pontos: body.valor_pontos,
            taxa_embarque: body.taxa_embarque,
            total_cobrar: body.total_cobrar,

            meta_milheiro: body.meta_milheiro,
            comissao_base: body.comissao_base,
            comissao_bonus_meta: body.comissao_bonus_meta,
            comissao_total: body.comissao_total,

            cartao_funcionario_id: body.cartao_funcionario_id,
            cartao_funcionario_nome: body.cartao_funcionario_nome,

            pagamento_status: body
                .pagamento_status
                .as_deref()
                .and_then(PagamentoStatus::parse)
                .unwrap_or_default(),

            localizador: body.localizador,
            origem_iata: body.origem_iata,
            sobrenome: body.sobrenome,

            cancel_info: None,
        };

        self.vendas.prepend(record.clone()).await?;

        let field = saldo_field(record.cia);
        if let Some(conta) = record.conta_escolhida.as_ref().filter(|c| !c.id.is_empty()) {
            ajustar_saldo(&mut cedentes, field, &conta.id, -record.pontos);
        } else if !record.sugestao_combinacao.is_empty() {
            for parte in &record.sugestao_combinacao {
                ajustar_saldo(&mut cedentes, field, &parte.id, -parte.usar);
            }
        }

        self.cedentes
            .write_raw(&CedentesRepo::rebuild(raiz.as_ref(), cedentes.clone()))
            .await?;

        Ok((id, cedentes))
    }

    pub async fn set_pagamento(
        &self,
        id: &str,
        status: PagamentoStatus,
    ) -> Result<Venda, AppError> {
        self.vendas
            .update_with(id, |cur| {
                let mut v = cur.clone();
                v.pagamento_status = status;
                Ok(v)
            })
            .await
    }

    /// Cancela a venda: grava as taxas e o estorno calculado e, se pedido,
    /// devolve os pontos debitados aos cedentes.
    pub async fn cancel(
        &self,
        id: &str,
        taxa_cia: f64,
        taxa_empresa: f64,
        recredit_points: bool,
        note: Option<String>,
    ) -> Result<Venda, AppError> {
        let atualizada = self
            .vendas
            .update_with(id, move |cur| {
                let refund = (cur.total_cobrar - (taxa_cia + taxa_empresa)).max(0.0);
                let mut v = cur.clone();
                v.cancel_info = Some(CancelInfo {
                    at: agora_iso(),
                    taxa_cia,
                    taxa_empresa,
                    refund,
                    recredit_points,
                    note,
                });
                Ok(v)
            })
            .await?;

        if recredit_points {
            self.creditar_pontos(&atualizada).await?;
        }
        Ok(atualizada)
    }

    /// Apaga a venda; por padrão devolve os pontos (exclusão por engano).
    pub async fn delete(&self, id: &str, restore_points: bool) -> Result<String, AppError> {
        let removida = self.vendas.remove(id).await?;
        if restore_points {
            self.creditar_pontos(&removida).await?;
        }
        Ok(removida.id)
    }

    async fn creditar_pontos(&self, venda: &Venda) -> Result<(), AppError> {
        let field = saldo_field(venda.cia);
        self.cedentes
            .mutate_lista(|cedentes| {
                if let Some(conta) = venda.conta_escolhida.as_ref().filter(|c| !c.id.is_empty()) {
                    ajustar_saldo(cedentes, field, &conta.id, venda.pontos);
                } else if !venda.sugestao_combinacao.is_empty() {
                    for parte in &venda.sugestao_combinacao {
                        ajustar_saldo(cedentes, field, &parte.id, parte.usar);
                    }
                }
            })
            .await
    }
}

fn agora_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Soma `delta` ao saldo do cedente (casado por identificador, sem diferenciar
/// caixa), nunca deixando o saldo negativo.
fn ajustar_saldo(cedentes: &mut [Value], field: &str, cedente_id: &str, delta: f64) {
    let alvo = cedente_id.to_uppercase();
    if let Some(c) = cedentes
        .iter_mut()
        .find(|c| identificador_up(c) == alvo)
        .and_then(Value::as_object_mut)
    {
        let antes = coerce::num(c.get(field));
        c.insert(field.to_string(), Value::from((antes + delta).max(0.0)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn service(dir: &std::path::Path) -> VendasService {
        VendasService::new(VendasRepo::new(dir), CedentesRepo::new(dir))
    }

    fn body_basico() -> NovaVenda {
        serde_json::from_value(json!({
            "data": "2025-09-22",
            "pontos": 10000,
            "cia": "latam",
            "totalCobrar": 800,
            "contaEscolhida": {"id": "ab1", "nome": "Ana", "usar": 10000, "disponivel": 15000, "leftover": 5000, "compraId": "0004"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn venda_debita_a_conta_escolhida() {
        let dir = tempdir().unwrap();
        let s = service(dir.path());
        s.cedentes
            .write_raw(&json!([{"identificador": "AB1", "latam": 15000, "smiles": 2000}]))
            .await
            .unwrap();

        let (_, cedentes) = s.create(body_basico()).await.unwrap();
        assert_eq!(cedentes[0]["latam"], json!(5000.0));
        // saldo da outra CIA intacto
        assert_eq!(cedentes[0]["smiles"], json!(2000));
    }

    #[tokio::test]
    async fn venda_com_combinacao_debita_cada_parte() {
        let dir = tempdir().unwrap();
        let s = service(dir.path());
        s.cedentes
            .write_raw(&json!([
                {"identificador": "AA", "smiles": 6000},
                {"identificador": "BB", "smiles": 9000}
            ]))
            .await
            .unwrap();

        let body: NovaVenda = serde_json::from_value(json!({
            "pontos": 10000,
            "cia": "smiles",
            "sugestaoCombinacao": [
                {"id": "aa", "nome": "A", "usar": 4000, "disp": 6000},
                {"id": "bb", "nome": "B", "usar": 6000, "disp": 9000}
            ]
        }))
        .unwrap();

        let (_, cedentes) = s.create(body).await.unwrap();
        assert_eq!(cedentes[0]["smiles"], json!(2000.0));
        assert_eq!(cedentes[1]["smiles"], json!(3000.0));
    }

    #[tokio::test]
    async fn saldo_nunca_fica_negativo() {
        let dir = tempdir().unwrap();
        let s = service(dir.path());
        s.cedentes
            .write_raw(&json!([{"identificador": "AB1", "latam": 4000}]))
            .await
            .unwrap();

        let (_, cedentes) = s.create(body_basico()).await.unwrap();
        assert_eq!(cedentes[0]["latam"], json!(0.0));
    }

    #[tokio::test]
    async fn snapshot_semeia_o_arquivo_na_primeira_venda() {
        let dir = tempdir().unwrap();
        let s = service(dir.path());

        let body: NovaVenda = serde_json::from_value(json!({
            "pontos": 1000,
            "cia": "latam",
            "contaEscolhida": {"id": "XY", "nome": "Xa", "usar": 1000, "disponivel": 3000, "leftover": 2000, "compraId": null},
            "cedentes": [{"identificador": "XY", "nome_completo": "Xavier", "latam": 3000}]
        }))
        .unwrap();

        let (_, cedentes) = s.create(body).await.unwrap();
        assert_eq!(cedentes[0]["latam"], json!(2000.0));

        let doc = s.cedentes.read_raw().await.unwrap().unwrap();
        assert!(doc.is_array());
    }

    #[tokio::test]
    async fn cancelamento_calcula_estorno_e_recredita() {
        let dir = tempdir().unwrap();
        let s = service(dir.path());
        s.cedentes
            .write_raw(&json!({"listaCedentes": [{"identificador": "AB1", "latam": 15000}]}))
            .await
            .unwrap();

        let (id, _) = s.create(body_basico()).await.unwrap();

        let cancelada = s
            .cancel(&id, 120.0, 80.0, true, Some("cliente desistiu".to_string()))
            .await
            .unwrap();
        let info = cancelada.cancel_info.unwrap();
        assert_eq!(info.refund, 600.0);
        assert!(info.recredit_points);

        // pontos de volta, preservando o envelope {listaCedentes}
        let doc = s.cedentes.read_raw().await.unwrap().unwrap();
        assert_eq!(doc["listaCedentes"][0]["latam"], json!(15000.0));
    }

    #[tokio::test]
    async fn excluir_devolve_pontos_por_padrao() {
        let dir = tempdir().unwrap();
        let s = service(dir.path());
        s.cedentes
            .write_raw(&json!([{"identificador": "AB1", "latam": 15000}]))
            .await
            .unwrap();

        let (id, _) = s.create(body_basico()).await.unwrap();
        let removido = s.delete(&id, true).await.unwrap();
        assert_eq!(removido, id);

        let doc = s.cedentes.read_raw().await.unwrap().unwrap();
        assert_eq!(doc[0]["latam"], json!(15000.0));
        assert!(s.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelar_venda_inexistente_e_not_found() {
        let dir = tempdir().unwrap();
        let s = service(dir.path());
        let res = s.cancel("V000", 0.0, 0.0, false, None).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }
}
