//src/main.rs

use axum::{
    Router,
    routing::{get, patch},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

mod common;
mod config;
mod db;
mod handlers;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new().expect("Falha ao inicializar o estado da aplicação.");

    let compras_routes = Router::new()
        .route(
            "/",
            get(handlers::compras::listar)
                .post(handlers::compras::salvar)
                .patch(handlers::compras::atualizar_por_query)
                .delete(handlers::compras::excluir_por_query),
        )
        .route("/next-id", get(handlers::compras::proximo_id))
        .route(
            "/{id}",
            get(handlers::compras::obter)
                .patch(handlers::compras::atualizar)
                .delete(handlers::compras::excluir),
        );

    let vendas_routes = Router::new().route(
        "/",
        get(handlers::vendas::listar)
            .post(handlers::vendas::criar)
            .patch(handlers::vendas::atualizar)
            .delete(handlers::vendas::excluir),
    );

    let cedentes_routes = Router::new().route(
        "/",
        get(handlers::cedentes::carregar).post(handlers::cedentes::salvar),
    );

    let bloqueios_routes = Router::new().route(
        "/",
        get(handlers::bloqueios::carregar).post(handlers::bloqueios::salvar),
    );

    let clientes_routes = Router::new().route(
        "/",
        get(handlers::clientes::carregar).post(handlers::clientes::salvar),
    );

    let finalizacoes_routes = Router::new().route(
        "/",
        get(handlers::finalizacoes::listar)
            .post(handlers::finalizacoes::criar)
            .patch(handlers::finalizacoes::atualizar)
            .delete(handlers::finalizacoes::excluir),
    );

    let comissoes_routes = Router::new()
        .route(
            "/",
            get(handlers::comissoes::listar).post(handlers::comissoes::salvar),
        )
        .route(
            "/{id}",
            patch(handlers::comissoes::atualizar).delete(handlers::comissoes::excluir),
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/compras", compras_routes)
        .nest("/api/vendas", vendas_routes)
        .nest("/api/cedentes", cedentes_routes)
        .nest("/api/bloqueios", bloqueios_routes)
        .nest("/api/clientes", clientes_routes)
        .nest("/api/finalizacoes", finalizacoes_routes)
        .nest("/api/comissoes", comissoes_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Inicia o servidor
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
