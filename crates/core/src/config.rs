use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
    pub performance: PerformanceConfig,
    pub warmer: WarmerConfig,
    pub storage: StorageConfig,
    pub telegram: TelegramConfig,
    pub log: LogConfig,
}

/// 三级缓存各自的有效期（秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub history_ttl_secs: u64,
    pub result_ttl_secs: u64,
    pub chart_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    // 两次上游请求之间的最小间隔
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    // 扇出抓取的最大并发任务数
    pub max_workers: usize,
    // 参与排行的标的数量（取标的池前 N 个）
    pub universe_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmerConfig {
    pub enabled: bool,
    pub popular_symbols: Vec<String>,
    // 预渲染价格图的标的，空列表表示不预渲染
    pub chart_symbols: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub universe_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: String,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    // 为空时不写文件日志
    pub dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig {
                history_ttl_secs: 300,
                result_ttl_secs: 300,
                chart_ttl_secs: 900,
            },
            upstream: UpstreamConfig {
                min_interval_ms: 250,
                timeout_secs: 10,
                base_url: "https://query1.finance.yahoo.com".to_string(),
            },
            performance: PerformanceConfig {
                max_workers: 8,
                universe_size: 50,
            },
            warmer: WarmerConfig {
                enabled: true,
                popular_symbols: ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"]
                    .map(String::from)
                    .to_vec(),
                chart_symbols: ["AAPL", "TSLA", "NVDA"].map(String::from).to_vec(),
            },
            storage: StorageConfig {
                data_dir: "cache".to_string(),
                universe_url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies"
                    .to_string(),
            },
            telegram: TelegramConfig {
                bot_token: String::new(), // 必须通过环境变量或配置文件提供
                api_url: "https://api.telegram.org".to_string(),
                poll_timeout_secs: 30,
            },
            log: LogConfig {
                level: "info".to_string(),
                dir: "logs".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache.history_ttl_secs, 300);
        assert_eq!(config.cache.result_ttl_secs, 300);
        assert_eq!(config.cache.chart_ttl_secs, 900);
        assert_eq!(config.performance.max_workers, 8);
        assert_eq!(config.performance.universe_size, 50);
        assert_eq!(config.warmer.popular_symbols.len(), 5);
        assert!(config.telegram.bot_token.is_empty());
    }
}
