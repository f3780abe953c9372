//! # 用户管理 CRUD 服务
//!
//! 分层结构：
//! - `app`：路由与用户模块（模型、校验、存储、服务、处理器）
//! - `core`：错误、响应、提示消息、中间件
//! - `infrastructure`：数据库连接池与日志
//! - `seed`：示例数据导入
//! - `scan_gate`：ZAP 扫描报告门禁

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod scan_gate;
pub mod seed;

pub use app::create_routes;
pub use app::users::handler::AppState;
