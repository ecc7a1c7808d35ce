//! 对话核心：意图识别、槽位填充、会话状态机与任务分发
//!
//! 每个回合严格按「分类 → 切换重置 → 抽取合并 → 确定性校验 →
//! 澄清或分发 → 逐词流式输出」的顺序执行；校验与澄清是纯函数，
//! 绝不依赖 NLU。

pub mod dispatch;
pub mod intent;
pub mod orchestrator;
pub mod reply;
pub mod slots;
pub mod state;
pub mod store;

pub use dispatch::{DispatchOutcome, FailureKind, Resource, TaskDispatcher};
pub use intent::{Intent, IntentRecognizer};
pub use orchestrator::DialogueAgent;
pub use reply::{word_stream, ReplyStream};
pub use slots::{
    clarification, normalize_exchange, normalize_symbol, required_slots, validate_slots,
    SlotExtractor, ValidationResult,
};
pub use state::SessionState;
pub use store::SessionStore;
