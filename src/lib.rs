//! Wren - Rust 任务型对话智能体
//!
//! 针对「查天气 / 查股价」这类槽位驱动的任务，跨多轮渐进收集参数，
//! 槽位齐备后恰好发起一次确定性外部查询，并以逐词流式回复。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **dialogue**: 对话核心：意图识别、槽位填充、会话状态机、任务分发
//! - **nlu**: 语言理解客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **services**: 外部数据服务（OpenWeather 天气 / TwelveData 行情）
//! - **web**: HTTP 接入层（axum，流式回复）

pub mod config;
pub mod dialogue;
pub mod nlu;
pub mod observability;
pub mod services;
pub mod web;
