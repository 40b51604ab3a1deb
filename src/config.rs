// src/config.rs

use std::{env, path::PathBuf};

use crate::db::{CedentesRepo, ComissoesRepo, ComprasRepo, FinalizacoesRepo, ListaRepo, VendasRepo};
use crate::services::{ComprasService, VendasService};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub compras_service: ComprasService,
    pub vendas_service: VendasService,
    pub cedentes_repo: CedentesRepo,
    pub bloqueios_repo: ListaRepo,
    pub clientes_repo: ListaRepo,
    pub finalizacoes_repo: FinalizacoesRepo,
    pub comissoes_repo: ComissoesRepo,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        // Em produção o diretório vem do ambiente; local cai em ./data
        let data_dir = PathBuf::from(
            env::var("TRADEMILES_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
        );
        tracing::info!("✅ Diretório de dados: {}", data_dir.display());

        // --- Monta o gráfico de dependências ---
        let compras_repo = ComprasRepo::new(&data_dir);
        let cedentes_repo = CedentesRepo::new(&data_dir);
        let vendas_repo = VendasRepo::new(&data_dir);

        Ok(Self {
            compras_service: ComprasService::new(compras_repo),
            vendas_service: VendasService::new(vendas_repo, cedentes_repo.clone()),
            cedentes_repo,
            bloqueios_repo: ListaRepo::bloqueios(&data_dir),
            clientes_repo: ListaRepo::clientes(&data_dir),
            finalizacoes_repo: FinalizacoesRepo::new(&data_dir),
            comissoes_repo: ComissoesRepo::new(&data_dir),
        })
    }
}
