//! NLU 客户端抽象
//!
//! 意图分类、槽位抽取与闲聊回复都由外部语言模型承担，但只通过本 trait
//! 暴露三个窄接口；下游的校验与状态机逻辑必须保持确定性，
//! 测试时用 ScriptedNlu 替换。

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::dialogue::Intent;

/// 槽位映射：参数名 -> 值
pub type SlotMap = HashMap<String, String>;

/// NLU 调用失败（请求失败或输出无法解析）
#[derive(Error, Debug)]
pub enum NluError {
    #[error("NLU request failed: {0}")]
    Api(String),

    #[error("NLU output parse error: {0}")]
    Parse(String),
}

/// NLU 客户端 trait：分类、抽取、闲聊
#[async_trait]
pub trait NluClient: Send + Sync {
    /// 意图分类：返回 weather / stock / unknown 之一
    async fn classify(&self, message: &str) -> Result<Intent, NluError>;

    /// 槽位抽取：针对给定意图从本轮输入抽取参数；known 为已累积槽位
    /// （渐进式填充的上下文）。返回值只包含本轮提到的参数；
    /// 缺省表示「本轮未提及」，从不表示「清除」。
    async fn extract(
        &self,
        message: &str,
        intent: Intent,
        known: &SlotMap,
    ) -> Result<SlotMap, NluError>;

    /// 自由对话回复：仅在意图无法识别时使用
    async fn small_talk(&self, message: &str) -> Result<String, NluError>;
}
