//! 用户管理：模型、校验、存储、服务、处理器

pub mod error;
pub mod handler;
pub mod model;
pub mod service;
pub mod store;
pub mod validation;
