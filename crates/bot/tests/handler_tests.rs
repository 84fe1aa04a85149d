use async_trait::async_trait;
use kabu_bot::command::Command;
use kabu_bot::format;
use kabu_bot::handler::{BotHandler, Inbound};
use kabu_cache::mem::MemCache;
use kabu_core::market::error::MarketError;
use kabu_core::notify::entity::{InlineKeyboard, MessageRef, TextFormat};
use kabu_core::notify::error::NotifyError;
use kabu_core::notify::port::ChatTransport;
use kabu_core::test_utils::{CountingRenderer, MockProvider};
use kabu_core::universe::error::UniverseError;
use kabu_core::universe::port::UniverseProvider;
use kabu_market::chart::ChartCache;
use kabu_market::history::HistoryCache;
use kabu_market::limiter::RateLimiter;
use kabu_market::performance::PerformanceEngine;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CHAT: i64 = 42;

/// 传输层记录的一次调用。
#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Text {
        message_id: i64,
        text: String,
        format: TextFormat,
        keyboard: Option<InlineKeyboard>,
    },
    Edit {
        message_id: i64,
        text: String,
        format: TextFormat,
        keyboard: Option<InlineKeyboard>,
    },
    Image {
        content_type: String,
        caption: String,
        bytes: Vec<u8>,
        keyboard: Option<InlineKeyboard>,
    },
    Delete {
        message_id: i64,
    },
    Answer {
        id: String,
    },
}

struct MockTransport {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
}

impl MockTransport {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
        }
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: Sent) {
        self.sent.lock().unwrap().push(call);
    }

    fn reference(&self, chat_id: i64) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        }
    }

    fn last_text(&self) -> String {
        match self.sent().last() {
            Some(Sent::Text { text, .. } | Sent::Edit { text, .. }) => text.clone(),
            other => panic!("last call was not a text message: {:?}", other),
        }
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, NotifyError> {
        let message = self.reference(chat_id);
        self.record(Sent::Text {
            message_id: message.message_id,
            text: text.to_string(),
            format,
            keyboard: keyboard.cloned(),
        });
        Ok(message)
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), NotifyError> {
        self.record(Sent::Edit {
            message_id: message.message_id,
            text: text.to_string(),
            format,
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn send_image(
        &self,
        chat_id: i64,
        image: Vec<u8>,
        content_type: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, NotifyError> {
        self.record(Sent::Image {
            content_type: content_type.to_string(),
            caption: caption.to_string(),
            bytes: image,
            keyboard: keyboard.cloned(),
        });
        Ok(self.reference(chat_id))
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), NotifyError> {
        self.record(Sent::Delete {
            message_id: message.message_id,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), NotifyError> {
        self.record(Sent::Answer {
            id: callback_id.to_string(),
        });
        Ok(())
    }
}

struct StaticUniverse(Vec<String>);

#[async_trait]
impl UniverseProvider for StaticUniverse {
    async fn symbols(&self) -> Result<Vec<String>, UniverseError> {
        Ok(self.0.clone())
    }
}

struct Fixture {
    transport: Arc<MockTransport>,
    renderer: Arc<CountingRenderer>,
    bot: BotHandler,
}

fn flat_then(last: f64) -> Vec<f64> {
    let mut closes = vec![100.0; 5];
    closes.push(last);
    closes
}

fn fixture(provider: MockProvider, universe: &[&str]) -> Fixture {
    let transport = Arc::new(MockTransport::new());
    let renderer = Arc::new(CountingRenderer::new());
    let universe: Arc<dyn UniverseProvider> = Arc::new(StaticUniverse(
        universe.iter().map(|s| s.to_string()).collect(),
    ));
    let history = Arc::new(HistoryCache::new(
        Arc::new(provider),
        Arc::new(MemCache::new(chrono::Duration::seconds(300))),
        Arc::new(RateLimiter::new(Duration::ZERO)),
    ));
    let performance = Arc::new(PerformanceEngine::new(
        history.clone(),
        Arc::new(MemCache::new(chrono::Duration::seconds(300))),
        universe.clone(),
    ));
    let charts = Arc::new(ChartCache::new(
        history,
        renderer.clone(),
        Arc::new(MemCache::new(chrono::Duration::seconds(900))),
    ));
    let bot = BotHandler::new(transport.clone(), performance, charts, universe);
    Fixture {
        transport,
        renderer,
        bot,
    }
}

fn market() -> MockProvider {
    MockProvider::new()
        .with_closes("AAPL", &flat_then(110.0))
        .with_closes("MSFT", &flat_then(90.0))
        .with_closes("TSLA", &flat_then(105.0))
        .with_error("GONE", MarketError::NotFound("GONE".into()))
}

fn callback(data: &str, message_id: i64, from_image: bool) -> Inbound {
    Inbound::Callback {
        id: format!("cb-{}", data),
        chat_id: CHAT,
        message: Some(MessageRef {
            chat_id: CHAT,
            message_id,
        }),
        from_image,
        data: data.to_string(),
    }
}

#[tokio::test]
async fn test_start_sends_welcome_menu() {
    let f = fixture(market(), &["AAPL"]);
    f.bot
        .handle(Inbound::Command {
            chat_id: CHAT,
            command: Command::Start,
        })
        .await
        .unwrap();

    let sent = f.transport.sent();
    assert_eq!(sent.len(), 1);
    let Sent::Text { text, keyboard, .. } = &sent[0] else {
        panic!("expected text, got {:?}", sent[0]);
    };
    assert_eq!(text, format::WELCOME);
    let keyboard = keyboard.as_ref().unwrap();
    assert!(keyboard.find("best").is_some());
    assert!(keyboard.find("worst").is_some());
    assert!(keyboard.find("search").is_some());
}

#[tokio::test]
async fn test_callback_answered_then_menu_edited() {
    let f = fixture(market(), &["AAPL"]);
    f.bot.handle(callback("worst", 5, false)).await.unwrap();

    let sent = f.transport.sent();
    assert_eq!(
        sent[0],
        Sent::Answer {
            id: "cb-worst".into()
        }
    );
    let Sent::Edit {
        message_id,
        text,
        keyboard,
        ..
    } = &sent[1]
    else {
        panic!("expected edit, got {:?}", sent[1]);
    };
    assert_eq!(*message_id, 5);
    assert_eq!(text, "📈 Worst Performers\n\nSelect timeframe:");
    assert!(keyboard.as_ref().unwrap().find("worst_7d").is_some());
}

#[tokio::test]
async fn test_unknown_callback_only_answered() {
    let f = fixture(market(), &["AAPL"]);
    f.bot.handle(callback("bogus:data", 5, false)).await.unwrap();
    assert_eq!(
        f.transport.sent(),
        vec![Sent::Answer {
            id: "cb-bogus:data".into()
        }]
    );
}

#[tokio::test]
async fn test_ranking_replaces_progress_with_result() {
    let f = fixture(market(), &["AAPL", "MSFT", "TSLA", "GONE"]);
    f.bot.handle(callback("best_7d_5", 9, false)).await.unwrap();

    let sent = f.transport.sent();
    assert_eq!(sent.len(), 3);
    assert!(matches!(&sent[1], Sent::Edit { message_id: 9, text, .. } if text.starts_with("⚡")));
    let Sent::Edit {
        message_id,
        text,
        keyboard,
        ..
    } = &sent[2]
    else {
        panic!("expected edit, got {:?}", sent[2]);
    };
    assert_eq!(*message_id, 9);
    assert_eq!(
        text,
        "📈 Top 5 Performers (7 Days)\n\n1. 🟢 AAPL: +10.0%\n2. 🟢 TSLA: +5.0%\n3. 🔴 MSFT: -10.0%"
    );
    assert!(keyboard.as_ref().unwrap().find("best").is_some());
}

#[tokio::test]
async fn test_ranking_without_data() {
    let f = fixture(market(), &["GONE"]);
    f.bot.handle(callback("worst_1y_10", 9, false)).await.unwrap();
    assert_eq!(
        f.transport.last_text(),
        "❌ No data available for 1 Year period."
    );
}

#[tokio::test]
async fn test_ranking_from_image_sends_new_message() {
    let f = fixture(market(), &["AAPL"]);
    f.bot.handle(callback("best_24h_5", 9, true)).await.unwrap();

    let sent = f.transport.sent();
    let Sent::Text { message_id, .. } = &sent[1] else {
        panic!("expected new message, got {:?}", sent[1]);
    };
    // 结果编辑的是新发出的进度消息，而不是图片
    assert!(matches!(&sent[2], Sent::Edit { message_id: edited, .. } if edited == message_id));
}

#[tokio::test]
async fn test_text_ignored_outside_search() {
    let f = fixture(market(), &["AAPL"]);
    f.bot
        .handle(Inbound::Text {
            chat_id: CHAT,
            text: "AAPL".into(),
        })
        .await
        .unwrap();
    assert!(f.transport.sent().is_empty());
}

#[tokio::test]
async fn test_search_then_lookup() {
    let f = fixture(market(), &["AAPL", "MSFT"]);
    f.bot.handle(callback("search", 3, false)).await.unwrap();
    assert!(f.bot.sessions().is_awaiting(CHAT));

    f.bot
        .handle(Inbound::Text {
            chat_id: CHAT,
            text: " $aapl ".into(),
        })
        .await
        .unwrap();

    assert!(!f.bot.sessions().is_awaiting(CHAT));
    let sent = f.transport.sent();
    let Some(Sent::Text {
        text,
        format,
        keyboard,
        ..
    }) = sent.last()
    else {
        panic!("expected summary message");
    };
    assert_eq!(*format, TextFormat::Html);
    assert!(text.starts_with("<b>AAPL</b>\nCurrent Price: $110.00\n\n"));
    assert!(text.contains("🟢 7 Days: +10.0%"));
    assert!(text.contains("🟢 24 Hours: +10.0%"));
    assert!(text.contains("⭕ 30 Days: No data"));
    let keyboard = keyboard.as_ref().unwrap();
    assert!(keyboard.find("chartselect:price:AAPL").is_some());
    assert!(keyboard.find("chartselect:indicators:AAPL").is_some());
}

#[tokio::test]
async fn test_lookup_outside_universe_returns_to_menu() {
    let f = fixture(market(), &["AAPL"]);
    f.bot.sessions().expect_symbol(CHAT);
    f.bot
        .handle(Inbound::Text {
            chat_id: CHAT,
            text: "zzzz".into(),
        })
        .await
        .unwrap();

    assert_eq!(
        f.transport.last_text(),
        "❌ ZZZZ not found in S&P 500. Try symbols like AAPL, MSFT, TSLA."
    );
    assert!(!f.bot.sessions().is_awaiting(CHAT));

    let sent = f.transport.sent();
    let Some(Sent::Text { keyboard, .. }) = sent.last() else {
        panic!("expected text reply");
    };
    let keyboard = keyboard.as_ref().unwrap();
    assert!(keyboard.find("best").is_some());
    assert!(keyboard.find("worst").is_some());
    assert!(keyboard.find("search").is_some());

    f.bot
        .handle(Inbound::Text {
            chat_id: CHAT,
            text: "aapl".into(),
        })
        .await
        .unwrap();
    assert_eq!(f.transport.sent().len(), sent.len());
}

#[tokio::test]
async fn test_lookup_failure_reports_not_found() {
    let f = fixture(market(), &["AAPL", "GONE"]);
    f.bot.handle(callback("stock_back:GONE", 4, false)).await.unwrap();

    let sent = f.transport.sent();
    let Some(Sent::Edit { text, keyboard, .. }) = sent.last() else {
        panic!("expected edit");
    };
    assert_eq!(text, "❌ Could not find data for GONE");
    assert!(keyboard.as_ref().unwrap().find("chartselect:price:GONE").is_none());
}

#[tokio::test]
async fn test_stock_back_from_chart_sends_new_summary() {
    let f = fixture(market(), &["MSFT"]);
    f.bot.handle(callback("stock_back:MSFT", 4, true)).await.unwrap();

    let sent = f.transport.sent();
    assert_eq!(sent.len(), 2);
    assert!(matches!(&sent[1], Sent::Text { text, .. } if text.starts_with("<b>MSFT</b>")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chart_delivered_and_menus_cleaned_up() {
    let f = fixture(market(), &["AAPL"]);
    f.bot
        .handle(callback("chart:price:AAPL:30d", 7, false))
        .await
        .unwrap();

    let sent = f.transport.sent();
    let Sent::Text {
        message_id: loading,
        text,
        ..
    } = &sent[1]
    else {
        panic!("expected loading message, got {:?}", sent[1]);
    };
    assert_eq!(text, "📈 Generating price chart for AAPL (30D)...");
    let Sent::Image {
        content_type,
        caption,
        bytes,
        keyboard,
    } = &sent[2]
    else {
        panic!("expected chart image, got {:?}", sent[2]);
    };
    assert_eq!(content_type, "text/plain");
    assert_eq!(caption, "AAPL - Price & Volume (30D)");
    assert_eq!(bytes, b"price:AAPL:30d:6:false");
    let keyboard = keyboard.as_ref().unwrap();
    assert!(keyboard.find("chart:price:AAPL:1d").is_some());
    assert!(keyboard.find("chart:price:AAPL:1y").is_some());
    assert!(keyboard.find("stock_back:AAPL").is_some());
    assert!(keyboard.find("chartselect:price:AAPL").is_none());
    assert_eq!(sent[3], Sent::Delete { message_id: *loading });
    assert_eq!(sent[4], Sent::Delete { message_id: 7 });
    assert_eq!(f.renderer.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chart_from_image_keeps_previous_chart() {
    let f = fixture(market(), &["AAPL"]);
    f.bot
        .handle(callback("chart:indicators:AAPL:7d", 7, true))
        .await
        .unwrap();

    let deletes: Vec<Sent> = f
        .transport
        .sent()
        .into_iter()
        .filter(|s| matches!(s, Sent::Delete { .. }))
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_ne!(deletes[0], Sent::Delete { message_id: 7 });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chart_failure_replaces_loading_message() {
    let f = fixture(market(), &["AAPL", "GONE"]);
    f.renderer.set_produce(false);
    f.bot
        .handle(callback("chart:price:AAPL:1y", 7, false))
        .await
        .unwrap();
    assert_eq!(f.transport.last_text(), format::CHART_FAILED);

    f.bot
        .handle(callback("chart:price:GONE:1y", 7, false))
        .await
        .unwrap();
    assert_eq!(f.transport.last_text(), format::CHART_FAILED);
    assert!(
        !f.transport
            .sent()
            .iter()
            .any(|s| matches!(s, Sent::Image { .. }))
    );
}
