//! 意图识别
//!
//! 先做快速规则匹配（不触发 NLU），未命中再调用 NLU 分类；
//! NLU 出错时降级为 Unknown，绝不让单轮失败向上传播。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::nlu::NluClient;

/// 支持的任务意图；Unknown 表示未识别（走闲聊旁路，不参与槽位填充）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Weather,
    Stock,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Weather => "weather",
            Intent::Stock => "stock",
            Intent::Unknown => "unknown",
        }
    }

    /// 从分类标签解析；未知标签一律按 Unknown 处理
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "weather" => Intent::Weather,
            "stock" => Intent::Stock,
            _ => Intent::Unknown,
        }
    }

    /// 是否为受支持的任务（而非闲聊）
    pub fn is_task(&self) -> bool {
        !matches!(self, Intent::Unknown)
    }
}

/// 意图识别器：规则快匹配 + NLU 兜底
pub struct IntentRecognizer {
    nlu: Arc<dyn NluClient>,
    /// 启用快速规则匹配（不调用 NLU）
    enable_fast_match: bool,
}

impl IntentRecognizer {
    pub fn new(nlu: Arc<dyn NluClient>) -> Self {
        Self {
            nlu,
            enable_fast_match: true,
        }
    }

    /// 识别用户意图；分类失败降级为 Unknown
    pub async fn recognize(&self, user_input: &str) -> Intent {
        if self.enable_fast_match {
            if let Some(intent) = fast_match(user_input) {
                return intent;
            }
        }

        match self.nlu.classify(user_input).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!("intent classification failed, degrading to unknown: {e}");
                Intent::Unknown
            }
        }
    }
}

/// 快速规则匹配（不调用 NLU）；只认非常确定的措辞
fn fast_match(input: &str) -> Option<Intent> {
    let lower = input.to_lowercase();

    if lower.contains("weather")
        || lower.contains("temperature")
        || lower.contains("forecast")
        || lower.contains("天气")
    {
        return Some(Intent::Weather);
    }

    if lower.contains("stock")
        || lower.contains("share price")
        || lower.contains("ticker")
        || lower.contains("股价")
        || lower.contains("股票")
    {
        return Some(Intent::Stock);
    }

    None
}
