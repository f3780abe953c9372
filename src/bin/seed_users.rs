//! 示例用户导入工具
//!
//! 重复运行是安全的：已存在的邮箱会被跳过。

use anyhow::Context;
use std::process::ExitCode;

use user_crud::{
    config::load_config,
    infrastructure::{database::DatabaseManager, logger::Logger},
    seed::{run_seed, seed_users},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = load_config().context("加载配置失败")?.config;
    Logger::init_console(&config.logging.level)?;

    let db = DatabaseManager::new(&config.database)
        .await
        .context("连接数据库失败")?;
    db.init_schema().await.context("创建数据库表失败")?;

    let state = AppState::from_database(&db);

    println!("Starting to add users to database...");
    println!("{}", "=".repeat(60));

    let report = run_seed(&state.user_service, &seed_users()).await;

    println!("{}", "=".repeat(60));
    println!(
        "Summary: {} users added, {} users skipped (already exist), {} failed",
        report.added, report.skipped, report.failed
    );

    if report.is_success() {
        println!("\n✅ Script completed successfully!");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("\n❌ Some users could not be added");
        Ok(ExitCode::FAILURE)
    }
}
