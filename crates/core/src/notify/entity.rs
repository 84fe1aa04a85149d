use serde::{Deserialize, Serialize};

/// 内联按钮：点击后回传 `callback_data`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// # Summary
/// 消息下方的内联键盘，按行组织。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }

    /// 查找第一个具有指定回调数据的按钮。
    pub fn find(&self, callback_data: &str) -> Option<&InlineButton> {
        self.inline_keyboard
            .iter()
            .flatten()
            .find(|b| b.callback_data == callback_data)
    }
}

/// 文本消息的解析模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Html,
}

/// 已发送消息的定位信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}
