pub mod compras_service;
pub use compras_service::ComprasService;
pub mod vendas_service;
pub use vendas_service::VendasService;
