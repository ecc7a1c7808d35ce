//! NLU 层：语言理解客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{FailingNlu, ScriptedNlu};
pub use openai::OpenAiNlu;
pub use traits::{NluClient, NluError, SlotMap};
