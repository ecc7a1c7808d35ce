//! Mock NLU 客户端（用于测试，无需 API）
//!
//! ScriptedNlu 按脚本逐轮返回意图与抽取结果，便于确定性地驱动对话状态机；
//! FailingNlu 三个接口全部报错，用于验证降级路径。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::dialogue::Intent;
use crate::nlu::{NluClient, NluError, SlotMap};

/// 脚本化 NLU：classify / extract 按轮次弹出脚本值，用尽后回落到默认值
pub struct ScriptedNlu {
    intents: Mutex<VecDeque<Intent>>,
    fallback_intent: Intent,
    extractions: Mutex<VecDeque<SlotMap>>,
    reply: String,
}

impl ScriptedNlu {
    pub fn new(fallback_intent: Intent) -> Self {
        Self {
            intents: Mutex::new(VecDeque::new()),
            fallback_intent,
            extractions: Mutex::new(VecDeque::new()),
            reply: "Hi! I can help with weather or stock prices.".to_string(),
        }
    }

    /// 追加一轮 classify 的脚本结果
    pub fn push_intent(self, intent: Intent) -> Self {
        self.intents.lock().unwrap().push_back(intent);
        self
    }

    /// 追加一轮 extract 的脚本结果
    pub fn push_extraction(self, pairs: &[(&str, &str)]) -> Self {
        let map: SlotMap = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.extractions.lock().unwrap().push_back(map);
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }
}

#[async_trait]
impl NluClient for ScriptedNlu {
    async fn classify(&self, _message: &str) -> Result<Intent, NluError> {
        Ok(self
            .intents
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback_intent))
    }

    async fn extract(
        &self,
        _message: &str,
        _intent: Intent,
        _known: &SlotMap,
    ) -> Result<SlotMap, NluError> {
        Ok(self
            .extractions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn small_talk(&self, _message: &str) -> Result<String, NluError> {
        Ok(self.reply.clone())
    }
}

/// 全接口报错的 NLU：验证「分类失败降级 unknown、抽取失败不丢旧槽位」
#[derive(Debug, Default)]
pub struct FailingNlu;

#[async_trait]
impl NluClient for FailingNlu {
    async fn classify(&self, _message: &str) -> Result<Intent, NluError> {
        Err(NluError::Api("scripted failure".to_string()))
    }

    async fn extract(
        &self,
        _message: &str,
        _intent: Intent,
        _known: &SlotMap,
    ) -> Result<SlotMap, NluError> {
        Err(NluError::Api("scripted failure".to_string()))
    }

    async fn small_talk(&self, _message: &str) -> Result<String, NluError> {
        Err(NluError::Api("scripted failure".to_string()))
    }
}
