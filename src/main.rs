// src/main.rs

// --- Imports ---
use chamada::{
    config::{Config, DEFAULT_LOG_FILTER},
    db,
    state::AppState,
    store::{sqlite::SqliteRecordStore, SharedStore},
    web,
};
use axum::serve;
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower_cookies::Key;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                env::var("RUST_LOG")
                    .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
                    .into()
            }),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando servidor Chamada...");

    let config = Config::from_env().map_err(|e| {
        tracing::error!("❌ Configuração inválida: {}", e);
        anyhow::anyhow!("Configuração inválida: {}", e)
    })?;
    tracing::debug!("Configuração carregada: {:?}", config);

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    // --- Configuração das Sessões ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Falha ao criar session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao migrar tabela de sessões: {}", e))?;

    let cleanup_store = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = cleanup_store
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Erro na task de limpeza de sessões: {:?}", e);
        }
    });
    tracing::info!("🧹 Tarefa de limpeza de sessões iniciada.");

    // Assina os cookies flash
    let key = Key::from(config.session_secret.as_bytes());

    // --- Criação do Estado da Aplicação ---
    let store: SharedStore = Arc::new(SqliteRecordStore::new(db_pool));
    let app_state = AppState::new(store, key);

    // --- Listener ---
    tracing::info!("📡 Servidor escutando em http://{}", config.bind_addr);
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", config.bind_addr, e);
            return Err(e.into());
        }
    };

    // --- Router e camadas (trace, cookies, sessão) ---
    let app = web::routes::create_app(app_state, session_store, config.session_secure);
    tracing::info!("✅ Router e middlewares configurados.");

    tracing::info!("👂 Servidor pronto para aceitar conexões...");
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
