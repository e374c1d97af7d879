//! 主应用程序入口
//!
//! 启动 Axum Web API 服务。

use std::sync::Arc;

use application::{
    services::{
        ChatService, ChatServiceDependencies, ContactService, ContactServiceDependencies,
        UserService, UserServiceDependencies,
    },
    ConnectionRegistry, PresenceBroadcaster, SystemClock,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, LocalDiskBlobStore, PgContactRepository, PgMessageRepository, PgUserRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 存储适配器
    let users = Arc::new(PgUserRepository::new(pg_pool.clone()));
    let messages = Arc::new(PgMessageRepository::new(pg_pool.clone()));
    let contacts = Arc::new(PgContactRepository::new(pg_pool));
    let blob_store = Arc::new(LocalDiskBlobStore::new(
        config.blob.root_dir.as_str(),
        config.blob.public_base_url.as_str(),
    ));

    // 进程内核心：连接注册表与在线广播
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);
    let registry = Arc::new(ConnectionRegistry::new());
    let presence = Arc::new(PresenceBroadcaster::new(registry.clone()));

    // 应用层服务
    let user_service = UserService::new(UserServiceDependencies {
        users: users.clone(),
        registry: registry.clone(),
        clock: clock.clone(),
    });

    let chat_service = ChatService::new(ChatServiceDependencies {
        users: users.clone(),
        messages,
        registry: registry.clone(),
        clock: clock.clone(),
    });

    let contact_service = ContactService::new(ContactServiceDependencies {
        contacts,
        users,
        clock,
    });

    let state = AppState::new(
        Arc::new(user_service),
        Arc::new(chat_service),
        Arc::new(contact_service),
        presence,
        registry,
        blob_store,
        config.admin.secret.as_str(),
    );

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天服务器启动在 http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
