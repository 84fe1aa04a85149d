use crate::command::{Callback, Command};
use crate::format;
use crate::keyboard;
use crate::session::ChatSessions;
use kabu_core::chart::entity::{ChartKind, ChartPeriod};
use kabu_core::common::normalize_symbol;
use kabu_core::notify::entity::{InlineKeyboard, MessageRef, TextFormat};
use kabu_core::notify::error::NotifyError;
use kabu_core::notify::port::ChatTransport;
use kabu_core::performance::entity::{Direction, Period};
use kabu_core::universe::port::UniverseProvider;
use kabu_market::chart::ChartCache;
use kabu_market::performance::PerformanceEngine;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// # Summary
/// 与平台无关的入站事件。
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// 斜杠命令。
    Command { chat_id: i64, command: Command },
    /// 普通文本消息。
    Text { chat_id: i64, text: String },
    /// 内联按钮点击。
    Callback {
        id: String,
        chat_id: i64,
        // 按钮所在的消息
        message: Option<MessageRef>,
        // 按钮所在的消息是图片，不能编辑为文本
        from_image: bool,
        data: String,
    },
}

/// 回复的投递位置：编辑原消息或发送新消息。
#[derive(Debug, Clone, Copy)]
struct Reply {
    chat_id: i64,
    edit: Option<MessageRef>,
}

impl Reply {
    fn new_message(chat_id: i64) -> Self {
        Self {
            chat_id,
            edit: None,
        }
    }

    fn from_callback(chat_id: i64, message: Option<MessageRef>, from_image: bool) -> Self {
        Self {
            chat_id,
            edit: message.filter(|_| !from_image),
        }
    }
}

/// # Summary
/// 聊天机器人的对话逻辑：菜单导航、排行查询、个股搜索与出图。
///
/// # Invariants
/// - 按钮回调总是先应答，再处理业务。
/// - 业务错误转换为用户可读的消息，只有传输错误向上返回。
pub struct BotHandler {
    transport: Arc<dyn ChatTransport>,
    performance: Arc<PerformanceEngine>,
    charts: Arc<ChartCache>,
    universe: Arc<dyn UniverseProvider>,
    sessions: ChatSessions,
}

impl BotHandler {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        performance: Arc<PerformanceEngine>,
        charts: Arc<ChartCache>,
        universe: Arc<dyn UniverseProvider>,
    ) -> Self {
        Self {
            transport,
            performance,
            charts,
            universe,
            sessions: ChatSessions::new(),
        }
    }

    pub fn sessions(&self) -> &ChatSessions {
        &self.sessions
    }

    /// # Summary
    /// 处理一个入站事件。
    ///
    /// # Returns
    /// 仅在聊天通道投递失败时返回错误。
    pub async fn handle(&self, event: Inbound) -> Result<(), NotifyError> {
        match event {
            Inbound::Command {
                chat_id,
                command: Command::Start,
            } => {
                self.sessions.clear(chat_id);
                self.transport
                    .send_text(
                        chat_id,
                        format::WELCOME,
                        TextFormat::Plain,
                        Some(&keyboard::main_menu()),
                    )
                    .await?;
                Ok(())
            }
            Inbound::Text { chat_id, text } => {
                if !self.sessions.take(chat_id) {
                    debug!(chat_id, "Ignoring text outside of a search");
                    return Ok(());
                }
                self.lookup(Reply::new_message(chat_id), &text).await
            }
            Inbound::Callback {
                id,
                chat_id,
                message,
                from_image,
                data,
            } => {
                if let Err(e) = self.transport.answer_callback(&id).await {
                    warn!(chat_id, error = %e, "Failed to answer callback");
                }
                let Some(callback) = Callback::parse(&data) else {
                    debug!(chat_id, data = %data, "Unknown callback data");
                    return Ok(());
                };
                let reply = Reply::from_callback(chat_id, message, from_image);
                self.on_callback(reply, callback).await
            }
        }
    }

    async fn on_callback(&self, reply: Reply, callback: Callback) -> Result<(), NotifyError> {
        let chat_id = reply.chat_id;
        match callback {
            Callback::Menu => {
                self.sessions.clear(chat_id);
                self.show(reply, format::MENU, TextFormat::Plain, keyboard::main_menu())
                    .await?;
            }
            Callback::Search => {
                self.sessions.expect_symbol(chat_id);
                self.show(
                    reply,
                    format::SEARCH_PROMPT,
                    TextFormat::Plain,
                    keyboard::search_prompt_menu(),
                )
                .await?;
            }
            Callback::Direction(direction) => {
                self.show(
                    reply,
                    &format::direction_prompt(direction),
                    TextFormat::Plain,
                    keyboard::timeframe_menu(direction),
                )
                .await?;
            }
            Callback::Timeframe(direction, period) => {
                self.show(
                    reply,
                    &format::limit_prompt(direction, period),
                    TextFormat::Plain,
                    keyboard::limit_menu(direction, period),
                )
                .await?;
            }
            Callback::Ranking(direction, period, limit) => {
                self.ranking(reply, direction, period, limit).await?;
            }
            Callback::ChartSelect(kind, symbol) => {
                self.show(
                    reply,
                    &format::chart_select(&symbol, kind),
                    TextFormat::Plain,
                    keyboard::chart_period_menu(&symbol, kind),
                )
                .await?;
            }
            Callback::Chart(kind, symbol, period) => {
                self.chart(chat_id, reply.edit, kind, &symbol, period)
                    .await?;
            }
            Callback::StockBack(symbol) => {
                self.lookup(reply, &symbol).await?;
            }
        }
        Ok(())
    }

    /// 编辑原消息，或在无法编辑时发送新消息。
    async fn show(
        &self,
        reply: Reply,
        text: &str,
        text_format: TextFormat,
        markup: InlineKeyboard,
    ) -> Result<MessageRef, NotifyError> {
        match reply.edit {
            Some(message) => {
                self.transport
                    .edit_text(message, text, text_format, Some(&markup))
                    .await?;
                Ok(message)
            }
            None => {
                self.transport
                    .send_text(reply.chat_id, text, text_format, Some(&markup))
                    .await
            }
        }
    }

    /// # Summary
    /// 排行流程：先显示进度，再把同一条消息替换为结果。
    async fn ranking(
        &self,
        reply: Reply,
        direction: Direction,
        period: Period,
        limit: usize,
    ) -> Result<(), NotifyError> {
        let progress = self
            .show(
                reply,
                &format::ranking_progress(period),
                TextFormat::Plain,
                InlineKeyboard::default(),
            )
            .await?;

        let entries = self
            .performance
            .rank_performers(direction, period, limit)
            .await;
        info!(
            chat_id = reply.chat_id,
            direction = %direction,
            period = %period,
            limit,
            returned = entries.len(),
            "Ranking delivered"
        );

        let text = if entries.is_empty() {
            format::no_data(period)
        } else {
            format::ranking(direction, period, limit, &entries)
        };
        self.transport
            .edit_text(
                progress,
                &text,
                TextFormat::Plain,
                Some(&keyboard::results_menu(direction)),
            )
            .await
    }

    /// # Summary
    /// 个股查询：校验标的池后返回价格与各周期表现。
    ///
    /// # Logic
    /// 1. 规范化输入并去除 `$`。
    /// 2. 不在标的池中时提示并结束搜索、回到主菜单；标的池不可用时跳过校验。
    /// 3. 查询成功显示摘要和图表入口，失败显示查无数据。
    async fn lookup(&self, reply: Reply, raw: &str) -> Result<(), NotifyError> {
        let symbol = normalize_symbol(&raw.replace('$', ""));
        if symbol.is_empty() {
            self.sessions.expect_symbol(reply.chat_id);
            self.show(
                reply,
                format::SEARCH_PROMPT,
                TextFormat::Plain,
                keyboard::search_prompt_menu(),
            )
            .await?;
            return Ok(());
        }

        match self.universe.symbols().await {
            Ok(known) if !known.contains(&symbol) => {
                debug!(chat_id = reply.chat_id, symbol = %symbol, "Symbol outside universe");
                self.sessions.clear(reply.chat_id);
                self.show(
                    reply,
                    &format::not_in_universe(&symbol),
                    TextFormat::Plain,
                    keyboard::main_menu(),
                )
                .await?;
                return Ok(());
            }
            Ok(_) => {}
            Err(e) => warn!(symbol = %symbol, error = %e, "Universe unavailable, skipping validation"),
        }

        match self.performance.stock_performance(&symbol).await {
            Ok(perf) => {
                self.show(
                    reply,
                    &format::stock_summary(&perf),
                    TextFormat::Html,
                    keyboard::stock_result_menu(&symbol, true),
                )
                .await?;
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Stock lookup failed");
                self.show(
                    reply,
                    &format::not_found(&symbol),
                    TextFormat::Plain,
                    keyboard::stock_result_menu(&symbol, false),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// # Summary
    /// 出图流程。
    ///
    /// # Logic
    /// 1. 发送“生成中”提示。
    /// 2. 成功时发送附带周期菜单的图片，删除提示和可编辑的原菜单。
    /// 3. 失败时把提示替换为错误信息。
    async fn chart(
        &self,
        chat_id: i64,
        origin: Option<MessageRef>,
        kind: ChartKind,
        symbol: &str,
        period: ChartPeriod,
    ) -> Result<(), NotifyError> {
        let loading = self
            .transport
            .send_text(
                chat_id,
                &format::chart_loading(symbol, kind, period),
                TextFormat::Plain,
                None,
            )
            .await?;

        let image = match self.charts.get_or_render(symbol, period, kind).await {
            Ok(image) => image,
            Err(e) => {
                warn!(symbol = %symbol, period = %period, kind = %kind, error = %e, "Chart history unavailable");
                None
            }
        };

        let Some(bytes) = image else {
            self.transport
                .edit_text(
                    loading,
                    format::CHART_FAILED,
                    TextFormat::Plain,
                    Some(&keyboard::stock_result_menu(symbol, false)),
                )
                .await?;
            return Ok(());
        };

        self.transport
            .send_image(
                chat_id,
                bytes,
                self.charts.content_type(),
                &format::chart_caption(symbol, kind, period),
                Some(&keyboard::chart_period_menu(symbol, kind)),
            )
            .await?;

        for stale in std::iter::once(loading).chain(origin) {
            if let Err(e) = self.transport.delete_message(stale).await {
                debug!(chat_id, error = %e, "Failed to delete message");
            }
        }
        Ok(())
    }
}
