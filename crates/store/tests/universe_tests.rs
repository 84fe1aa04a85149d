use async_trait::async_trait;
use kabu_core::universe::error::UniverseError;
use kabu_core::universe::port::{UniverseProvider, UniverseSource};
use kabu_store::universe::FileUniverseStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

/// 记录调用次数的远端数据源。
struct StubSource {
    symbols: Vec<String>,
    calls: AtomicUsize,
}

impl StubSource {
    fn new(symbols: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UniverseSource for StubSource {
    async fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.symbols.clone())
    }
}

struct FailingSource;

#[async_trait]
impl UniverseSource for FailingSource {
    async fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError> {
        Err(UniverseError::Network("offline".into()))
    }
}

#[tokio::test]
async fn test_snapshot_strips_dollar_sign() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sp500.json");
    std::fs::write(&path, r#"["AAPL", "$BRKB", "MSFT$"]"#)?;

    let source = StubSource::new(&["SHOULD_NOT_BE_USED"]);
    let store = FileUniverseStore::with_path(path, source.clone());

    let symbols = store.symbols().await?;
    assert_eq!(symbols, vec!["AAPL", "BRKB", "MSFT"]);
    assert_eq!(source.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_snapshot_falls_back_and_persists() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("sp500.json");
    let source = StubSource::new(&["MMM", "AOS", "ABT"]);

    let store = FileUniverseStore::with_path(path.clone(), source.clone());
    assert_eq!(store.symbols().await?, vec!["MMM", "AOS", "ABT"]);
    assert_eq!(source.calls(), 1);

    // 快照已落盘
    let persisted: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(persisted, vec!["MMM", "AOS", "ABT"]);

    // 新实例直接读取快照
    let other = StubSource::new(&[]);
    let reloaded = FileUniverseStore::with_path(path, other.clone());
    assert_eq!(reloaded.symbols().await?.len(), 3);
    assert_eq!(other.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_snapshot_file_triggers_fallback() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sp500.json");
    std::fs::write(&path, "")?;

    let source = StubSource::new(&["NVDA"]);
    let store = FileUniverseStore::with_path(path, source.clone());
    assert_eq!(store.symbols().await?, vec!["NVDA"]);
    assert_eq!(source.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_symbols_loaded_once() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source = StubSource::new(&["AAPL", "TSLA"]);
    let store = FileUniverseStore::with_path(dir.path().join("u.json"), source.clone());

    assert_eq!(store.symbols().await?, vec!["AAPL", "TSLA"]);
    assert_eq!(store.symbols().await?, vec!["AAPL", "TSLA"]);
    assert_eq!(source.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_remote_failure_propagates() {
    let dir = tempdir().unwrap();
    let store = FileUniverseStore::with_path(dir.path().join("sp500.json"), Arc::new(FailingSource));
    let result = store.symbols().await;
    assert!(matches!(result, Err(UniverseError::Network(_))));
}

#[tokio::test]
async fn test_remote_empty_is_error() {
    let dir = tempdir().unwrap();
    let store = FileUniverseStore::with_path(dir.path().join("sp500.json"), StubSource::new(&[]));
    assert!(matches!(store.symbols().await, Err(UniverseError::Empty)));
}
