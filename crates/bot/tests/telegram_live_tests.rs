use kabu_bot::keyboard;
use kabu_bot::telegram::TelegramTransport;
use kabu_core::notify::entity::TextFormat;
use kabu_core::notify::port::ChatTransport;
use std::env;
use std::time::Duration;

/// # Summary
/// 集成测试：通过真实 Bot API 发送并删除一条带菜单的消息。
///
/// # Logic
/// 1. 加载 .env 环境变量。
/// 2. 从环境变量获取 Bot Token 和 Chat ID。
/// 3. 发送主菜单，再删除该消息。
#[tokio::test]
#[ignore = "requires a Telegram bot token"]
async fn test_telegram_send_and_delete() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
    dotenvy::dotenv().ok();
    let bot_token = env::var("KABU_TG_BOT_TOKEN")?;
    let chat_id: i64 = env::var("KABU_TG_CHAT_ID")?.parse()?;

    let transport = TelegramTransport::new(
        "https://api.telegram.org",
        &bot_token,
        Duration::from_secs(10),
    )?;
    let message = transport
        .send_text(
            chat_id,
            "kabu 集成测试",
            TextFormat::Plain,
            Some(&keyboard::main_menu()),
        )
        .await?;
    assert_eq!(message.chat_id, chat_id);

    transport.delete_message(message).await?;
    Ok(())
}
