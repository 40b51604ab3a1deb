pub mod bloqueios;
pub mod cedentes;
pub mod clientes;
pub mod comissoes;
pub mod compras;
pub mod finalizacoes;
pub mod vendas;
