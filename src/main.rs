use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use user_crud::{
    config::load_config,
    create_routes,
    infrastructure::{database::DatabaseManager, logger::Logger},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = load_config().context("加载配置失败")?;
    let config = loaded.config;
    let _log_guard = Logger::init(&config.logging)?;

    match &loaded.source {
        Some(path) => info!(path = %path.display(), "从配置文件加载"),
        None => info!("未找到配置文件，使用默认配置"),
    }

    let db = DatabaseManager::new(&config.database).await.map_err(|e| {
        error!(error = %e, "Failed to initialize database");
        e
    })?;
    db.init_schema().await?;

    let cookie_key = config.session.cookie_key()?;
    let app = create_routes(AppState::from_database(&db).with_cookie_key(cookie_key));

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("无法绑定到 {}", config.socket_addr()))?;
    let addr = listener.local_addr()?;

    info!("🚀 User CRUD server running on http://{}", addr);
    info!("📖 Available endpoints:");
    info!("   GET       /                 - List users");
    info!("   GET/POST  /add              - Add user");
    info!("   GET       /view/:id         - View user");
    info!("   GET/POST  /update/:id       - Update user");
    info!("   GET       /delete/:id       - Delete user");
    info!("   GET       /search?query=    - Search by name or city");
    info!("   GET       /health           - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
