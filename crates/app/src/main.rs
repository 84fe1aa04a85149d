use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use kabu_bot::handler::BotHandler;
use kabu_bot::telegram::{TelegramPoller, TelegramTransport};
use kabu_cache::mem::MemCache;
use kabu_chart::svg::SvgRenderer;
use kabu_core::config::{AppConfig, LogConfig};
use kabu_feed::wikipedia::WikipediaUniverseSource;
use kabu_feed::yahoo::YahooProvider;
use kabu_market::chart::ChartCache;
use kabu_market::history::HistoryCache;
use kabu_market::limiter::RateLimiter;
use kabu_market::performance::PerformanceEngine;
use kabu_market::warmer::Warmer;
use kabu_store::universe::FileUniverseStore;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// # Summary
/// 按“默认值 → 配置文件 → 环境变量”的顺序加载配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 作为最底层来源。
/// 2. 叠加可选的 `config/kabu.toml`。
/// 3. 叠加 `KABU__SECTION__KEY` 形式的环境变量，列表以逗号分隔。
/// 4. 未配置 Token 时回退到 `BOT_TOKEN`。
fn load_config() -> Result<AppConfig, config::ConfigError> {
    let settings = Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(File::with_name("config/kabu").required(false))
        .add_source(
            Environment::with_prefix("KABU")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("warmer.popular_symbols")
                .with_list_parse_key("warmer.chart_symbols")
                .try_parsing(true),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;
    if config.telegram.bot_token.is_empty()
        && let Ok(token) = std::env::var("BOT_TOKEN")
    {
        config.telegram.bot_token = token;
    }
    Ok(config)
}

/// # Summary
/// 初始化日志：控制台输出，外加按天滚动的文件日志。
///
/// # Returns
/// 文件日志的后台写入守卫，必须持有到进程退出；未配置目录时为 `None`。
fn init_tracing(log: &LogConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log.level.as_str()));

    let (file_layer, guard) = if log.dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&log.dir, "kabu.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            ),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    guard
}

fn ttl(secs: u64) -> Result<chrono::Duration, chrono::OutOfRangeError> {
    chrono::Duration::from_std(Duration::from_secs(secs))
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到机器人。
///
/// # Logic
/// 1. 加载 .env 与配置，初始化全局日志。
/// 2. 实例化基础设施层（Feed、Store、Cache）。
/// 3. 实例化领域层（History、Performance、Chart）。
/// 4. 建立聊天通道并启动后台预热。
/// 5. 运行 Telegram 轮询，直到收到退出信号。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    dotenvy::dotenv().ok();
    let config = load_config()?;
    let _log_guard = init_tracing(&config.log);
    info!("Kabu bot starting...");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
    kabu_store::config::set_root_dir(PathBuf::from(&config.storage.data_dir));

    // 2. 基础设施层
    let timeout = Duration::from_secs(config.upstream.timeout_secs);
    let provider = Arc::new(YahooProvider::new(&config.upstream.base_url, timeout)?);
    let source = Arc::new(WikipediaUniverseSource::new(
        &config.storage.universe_url,
        timeout,
    )?);
    let universe = Arc::new(FileUniverseStore::new(source));
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        config.upstream.min_interval_ms,
    )));

    // 3. 领域层，三级缓存各自独立
    let history = Arc::new(HistoryCache::new(
        provider,
        Arc::new(MemCache::new(ttl(config.cache.history_ttl_secs)?)),
        limiter,
    ));
    let performance = Arc::new(
        PerformanceEngine::new(
            history.clone(),
            Arc::new(MemCache::new(ttl(config.cache.result_ttl_secs)?)),
            universe.clone(),
        )
        .with_max_workers(config.performance.max_workers)
        .with_universe_size(config.performance.universe_size),
    );
    let charts = Arc::new(ChartCache::new(
        history.clone(),
        Arc::new(SvgRenderer::new()),
        Arc::new(MemCache::new(ttl(config.cache.chart_ttl_secs)?)),
    ));

    // 4. 聊天通道
    let transport = Arc::new(TelegramTransport::new(
        &config.telegram.api_url,
        &config.telegram.bot_token,
        timeout,
    )?);

    // 5. 后台预热
    let warmer = config.warmer.enabled.then(|| {
        Warmer::new(history.clone(), config.warmer.popular_symbols.clone())
            .with_charts(charts.clone(), config.warmer.chart_symbols.clone())
            .spawn()
    });

    let handler = Arc::new(BotHandler::new(
        transport.clone(),
        performance,
        charts,
        universe,
    ));
    let poller = TelegramPoller::new(
        transport,
        handler,
        Duration::from_secs(config.telegram.poll_timeout_secs),
    );

    info!("Bot initialized. Polling for updates...");
    let outcome = tokio::select! {
        _ = poller.run() => Ok(()),
        signal = tokio::signal::ctrl_c() => signal,
    };

    if let Some(handle) = warmer {
        handle.shutdown();
    }
    match outcome {
        Ok(()) => info!("Shutdown signal received. Exiting..."),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
    Ok(())
}
