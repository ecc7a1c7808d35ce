//! 对话编排器 —— 每回合的状态机
//!
//! 单回合顺序：意图分类 → unknown 走闲聊旁路（不触碰会话状态）→
//! 意图切换重置 → 槽位抽取与归一 → 合并 → 确定性校验 →
//! 澄清 或 分发（分发后无论成败都复位会话）→ 逐词流式输出。
//!
//! 每回合恰好产出一条外发消息；任何失败都落到一条固定话术，
//! 绝不向传输层抛错。

use std::sync::Arc;

use super::dispatch::{DispatchOutcome, TaskDispatcher};
use super::intent::{Intent, IntentRecognizer};
use super::reply::{failure_message, format_stock, format_weather, word_stream, ReplyStream};
use super::slots::{clarification, validate_slots, SlotExtractor};
use super::store::SessionStore;
use crate::nlu::NluClient;
use crate::services::{StockProvider, WeatherProvider};

/// 闲聊兜底：NLU 连自由回复都失败时使用
const SMALL_TALK_FALLBACK: &str =
    "I'm here to chat! I can also help you with weather forecasts or stock prices if you need them.";

/// 对话智能体：组合识别器、抽取器、分发器与会话存储
pub struct DialogueAgent {
    store: Arc<SessionStore>,
    intents: IntentRecognizer,
    extractor: SlotExtractor,
    dispatcher: TaskDispatcher,
    nlu: Arc<dyn NluClient>,
}

impl DialogueAgent {
    pub fn new(
        store: Arc<SessionStore>,
        nlu: Arc<dyn NluClient>,
        weather: Arc<dyn WeatherProvider>,
        stocks: Arc<dyn StockProvider>,
    ) -> Self {
        Self {
            intents: IntentRecognizer::new(nlu.clone()),
            extractor: SlotExtractor::new(nlu.clone()),
            dispatcher: TaskDispatcher::new(weather, stocks),
            store,
            nlu,
        }
    }

    /// 处理一个用户回合，产出一条逐词流式回复
    pub async fn process_message(&self, session_id: &str, message: &str) -> ReplyStream {
        let intent = self.intents.recognize(message).await;
        tracing::debug!(session_id, intent = intent.as_str(), "turn classified");

        // 闲聊旁路：不参与槽位填充，也不触碰会话状态
        if intent == Intent::Unknown {
            let reply = match self.nlu.small_talk(message).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!("small talk failed, using canned reply: {e}");
                    SMALL_TALK_FALLBACK.to_string()
                }
            };
            return word_stream(reply);
        }

        // 意图切换重置，并取当前槽位快照作为抽取上下文
        let known = self
            .store
            .with_session(session_id, |state| {
                state.update_intent(intent);
                state.slots.clone()
            })
            .await;

        let new_slots = self.extractor.extract(message, intent, &known).await;
        let slots = self
            .store
            .with_session(session_id, |state| {
                state.merge_slots(new_slots);
                state.slots.clone()
            })
            .await;

        let validation = validate_slots(&slots, intent);
        if !validation.valid {
            tracing::debug!(
                session_id,
                missing = ?validation.missing,
                "slots incomplete, asking clarification"
            );
            return word_stream(clarification(&validation.missing, intent));
        }

        let outcome = self.dispatcher.dispatch(intent, &slots).await;

        // 分发已完成（成功或已归类失败），复位会话避免残留的半填充槽位
        self.store.with_session(session_id, |state| state.reset()).await;

        let reply = match outcome {
            DispatchOutcome::Weather(report) => format_weather(&report),
            DispatchOutcome::Stock(quote) => format_stock(&quote),
            DispatchOutcome::Failed(kind) => failure_message(kind).to_string(),
        };
        word_stream(reply)
    }
}
