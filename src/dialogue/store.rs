//! 会话存储
//!
//! 显式构造、由宿主注入的实例（非全局单例），按 session_id 独立；
//! 同一会话的回合由调用方串行处理，这里用 RwLock 保证单次
//! 读-改-写的原子性。会话在首次引用时惰性创建，进程生存期内常驻，
//! 除非被外层会话管理显式清除。

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::state::SessionState;

/// 会话存储：session_id -> SessionState
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取或创建会话，返回当前状态快照
    pub async fn get_or_create(&self, session_id: &str) -> SessionState {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(session_id))
            .clone()
    }

    /// 在写锁内对会话执行一次变更（不存在则先创建），整体原子
    pub async fn with_session<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(session_id));
        f(state)
    }

    /// 移除一个会话（供外层会话管理调用）
    pub async fn clear_session(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// 活跃会话数
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
