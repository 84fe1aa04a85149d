use crate::chart::entity::{ChartKind, ChartPeriod};
use crate::indicator::entity::IndicatorSeries;
use crate::market::entity::PriceSeries;

/// # Summary
/// 图表渲染器接口：序列 → 图片字节的纯函数边界。
///
/// # Invariants
/// - 实现必须无副作用、可重入；调用方负责缓存结果。
/// - 调用发生在阻塞线程池中，允许执行 CPU 密集的编码。
pub trait ChartRenderer: Send + Sync {
    /// # Summary
    /// 渲染指定种类的图表。
    ///
    /// # Arguments
    /// * `kind`: 图表种类。
    /// * `series`: 价格序列。
    /// * `indicators`: 指标序列，仅 `ChartKind::Indicators` 时提供。
    /// * `symbol`: 证券代码，用于标题。
    /// * `period`: 图表跨度，用于标题与坐标标签。
    ///
    /// # Returns
    /// 编码后的图片字节；数据不足以成图时返回 `None`。
    fn render(
        &self,
        kind: ChartKind,
        series: &PriceSeries,
        indicators: Option<&IndicatorSeries>,
        symbol: &str,
        period: ChartPeriod,
    ) -> Option<Vec<u8>>;

    /// 渲染结果的 MIME 类型。
    fn content_type(&self) -> &'static str;
}
