use dashmap::DashSet;

/// # Summary
/// 每个会话的搜索等待状态。
///
/// # Invariants
/// - 标记只被消费一次：`take` 返回 true 后标记即被清除。
#[derive(Debug, Default)]
pub struct ChatSessions {
    awaiting_symbol: DashSet<i64>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 下一条文本消息视为代码查询。
    pub fn expect_symbol(&self, chat_id: i64) {
        self.awaiting_symbol.insert(chat_id);
    }

    /// 消费等待标记，返回此前是否处于等待状态。
    pub fn take(&self, chat_id: i64) -> bool {
        self.awaiting_symbol.remove(&chat_id).is_some()
    }

    pub fn clear(&self, chat_id: i64) {
        self.awaiting_symbol.remove(&chat_id);
    }

    pub fn is_awaiting(&self, chat_id: i64) -> bool {
        self.awaiting_symbol.contains(&chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_consumed_once() {
        let sessions = ChatSessions::new();
        sessions.expect_symbol(7);
        assert!(sessions.is_awaiting(7));
        assert!(!sessions.is_awaiting(8));

        assert!(sessions.take(7));
        assert!(!sessions.take(7));
    }

    #[test]
    fn test_clear() {
        let sessions = ChatSessions::new();
        sessions.expect_symbol(1);
        sessions.clear(1);
        assert!(!sessions.take(1));
    }
}
