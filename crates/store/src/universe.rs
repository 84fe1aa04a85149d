use crate::config::universe_snapshot_path;
use async_trait::async_trait;
use kabu_core::universe::error::UniverseError;
use kabu_core::universe::port::{UniverseProvider, UniverseSource};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// # Summary
/// 基于本地 JSON 快照的标的池，快照缺失时回退到远端数据源并落盘。
///
/// # Invariants
/// - 快照格式为字符串数组，加载时去除 `$`。
/// - 进程生命周期内只加载一次，之后返回同一份列表。
pub struct FileUniverseStore {
    path: PathBuf,
    source: Arc<dyn UniverseSource>,
    loaded: OnceCell<Vec<String>>,
}

impl FileUniverseStore {
    /// 使用数据根目录下的 `sp500.json` 作为快照。
    pub fn new(source: Arc<dyn UniverseSource>) -> Self {
        Self::with_path(universe_snapshot_path(), source)
    }

    pub fn with_path(path: PathBuf, source: Arc<dyn UniverseSource>) -> Self {
        Self {
            path,
            source,
            loaded: OnceCell::new(),
        }
    }

    /// # Summary
    /// 读取本地快照。
    ///
    /// # Returns
    /// 文件不存在或为空时返回 `Ok(None)`。
    async fn read_snapshot(&self) -> Result<Option<Vec<String>>, UniverseError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(UniverseError::Io(e.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let symbols: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| UniverseError::Parse(e.to_string()))?;
        let cleaned: Vec<String> = symbols
            .iter()
            .map(|s| s.replace('$', ""))
            .filter(|s| !s.is_empty())
            .collect();

        if cleaned.is_empty() {
            return Ok(None);
        }
        Ok(Some(cleaned))
    }

    async fn write_snapshot(&self, symbols: &[String]) -> Result<(), UniverseError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| UniverseError::Io(e.to_string()))?;
        }
        let body =
            serde_json::to_vec_pretty(symbols).map_err(|e| UniverseError::Parse(e.to_string()))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| UniverseError::Io(e.to_string()))
    }

    /// # Summary
    /// 加载标的池。
    ///
    /// # Logic
    /// 1. 优先读取本地快照。快照损坏时记录警告并视为缺失。
    /// 2. 否则从远端抓取，写回快照（写入失败只记录警告）。
    async fn load(&self) -> Result<Vec<String>, UniverseError> {
        match self.read_snapshot().await {
            Ok(Some(symbols)) => {
                info!(count = symbols.len(), path = %self.path.display(), "Loaded universe snapshot");
                return Ok(symbols);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, path = %self.path.display(), "Universe snapshot unreadable"),
        }

        let symbols = self.source.fetch_symbols().await?;
        if symbols.is_empty() {
            return Err(UniverseError::Empty);
        }
        if let Err(e) = self.write_snapshot(&symbols).await {
            warn!(error = %e, path = %self.path.display(), "Failed to persist universe snapshot");
        }
        info!(count = symbols.len(), "Loaded universe from remote source");
        Ok(symbols)
    }
}

#[async_trait]
impl UniverseProvider for FileUniverseStore {
    async fn symbols(&self) -> Result<Vec<String>, UniverseError> {
        self.loaded
            .get_or_try_init(|| self.load())
            .await
            .cloned()
    }
}
