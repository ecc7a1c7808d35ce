//! 会话状态
//!
//! 槽位按意图隔离：切换到不同意图时原子地清空槽位，避免跨任务串扰；
//! 一次完成的分发（成功或失败）后整体复位，下一回合从头开始。

use chrono::{DateTime, Utc};

use crate::dialogue::Intent;
use crate::nlu::SlotMap;

/// 单个会话的对话状态；只由编排器变更
#[derive(Debug, Clone)]
pub struct SessionState {
    /// 会话 ID，创建后不可变
    pub session_id: String,
    /// 进行中的任务；None 表示空闲
    pub active_intent: Option<Intent>,
    /// 已累积的槽位（只含 active_intent 模式内的参数）
    pub slots: SlotMap,
    /// 最近一次变更时间（仅用于观测）
    pub last_updated: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            active_intent: None,
            slots: SlotMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// 切换意图：不同意图时清空槽位再切换；相同意图为 no-op
    pub fn update_intent(&mut self, intent: Intent) {
        if self.active_intent != Some(intent) {
            self.slots.clear();
            self.active_intent = Some(intent);
            self.touch();
        }
    }

    /// 浅合并新槽位，同名键以新值覆盖
    pub fn merge_slots(&mut self, new_slots: SlotMap) {
        self.slots.extend(new_slots);
        self.touch();
    }

    /// 复位：清空槽位并回到空闲
    pub fn reset(&mut self) {
        self.slots.clear();
        self.active_intent = None;
        self.touch();
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}
