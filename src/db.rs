pub mod json_store;
pub use json_store::JsonStore;
pub mod compras_repo;
pub use compras_repo::ComprasRepo;
pub mod cedentes_repo;
pub use cedentes_repo::CedentesRepo;
pub mod vendas_repo;
pub use vendas_repo::VendasRepo;
pub mod comissoes_repo;
pub use comissoes_repo::ComissoesRepo;
pub mod finalizacoes_repo;
pub use finalizacoes_repo::FinalizacoesRepo;
pub mod listas_repo;
pub use listas_repo::ListaRepo;
