//! 基础设施层：数据库、日志

pub mod database;
pub mod logger;
