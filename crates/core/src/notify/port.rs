use crate::notify::entity::{InlineKeyboard, MessageRef, TextFormat};
use crate::notify::error::NotifyError;
use async_trait::async_trait;

/// # Summary
/// 聊天通道接口，屏蔽具体 IM 平台的传输细节。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 所有方法只做一次投递尝试，不做自动重试。
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// 发送文本消息，可附带内联键盘。
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, NotifyError>;

    /// 编辑已发送的文本消息。
    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), NotifyError>;

    /// # Summary
    /// 发送图片。
    ///
    /// # Arguments
    /// * `chat_id` - 目标会话。
    /// * `image` - 编码后的图片字节。
    /// * `content_type` - 图片 MIME 类型，决定以照片还是文件形式投递。
    /// * `caption` - 图片说明。
    /// * `keyboard` - 可选内联键盘。
    async fn send_image(
        &self,
        chat_id: i64,
        image: Vec<u8>,
        content_type: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, NotifyError>;

    /// 删除消息。
    async fn delete_message(&self, message: MessageRef) -> Result<(), NotifyError>;

    /// 应答按钮回调，消除客户端的加载状态。
    async fn answer_callback(&self, callback_id: &str) -> Result<(), NotifyError>;
}
