use comanda_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // dotenv、工作目录、tracing 都在这一步就绪
    setup_environment()?;
    print_banner();

    let config = Config::from_env();
    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        "Comanda server starting"
    );

    // 数据库连接、迁移、管理员播种
    let state = ServerState::initialize(&config).await?;

    // run() 自行拉起后台任务并处理优雅停机
    if let Err(e) = Server::with_state(config, state).run().await {
        tracing::error!("Server exited with error: {e}");
        return Err(e.into());
    }
    Ok(())
}
