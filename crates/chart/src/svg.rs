use chrono::{DateTime, Datelike, Timelike, Utc};
use kabu_core::chart::entity::{ChartKind, ChartPeriod};
use kabu_core::chart::port::ChartRenderer;
use kabu_core::indicator::entity::IndicatorSeries;
use kabu_core::market::entity::{Candle, PriceSeries};
use std::fmt::Write;
use tracing::warn;

// 深色主题配色
const BACKGROUND: &str = "#0f0f23";
const GRID: &str = "#555555";
const LABEL: &str = "#cccccc";
const TITLE: &str = "#ffffff";
const BULL: &str = "#00d4aa";
const BEAR: &str = "#ff6b6b";
const RSI_LINE: &str = "#a78bfa";
const MACD_LINE: &str = "#38bdf8";
const SIGNAL_LINE: &str = "#fbbf24";
const ATR_LINE: &str = "#f472b6";

const WIDTH: f64 = 1000.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const TITLE_HEIGHT: f64 = 50.0;
const AXIS_HEIGHT: f64 = 30.0;
const PANEL_GAP: f64 = 30.0;

/// 将下标或数量转为浮点，图表的数据点数量远小于 u32 上限。
fn to_f64(n: usize) -> f64 {
    u32::try_from(n).map(f64::from).unwrap_or(f64::MAX)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// # Summary
/// 面板的纵向线性映射。
///
/// # Invariants
/// - `max > min`；数据为常量时上下各扩展 1%（或 1.0）。
struct Panel {
    top: f64,
    height: f64,
    min: f64,
    max: f64,
}

impl Panel {
    fn new(top: f64, height: f64, min: f64, max: f64) -> Self {
        let (min, max) = if max > min {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        } else {
            let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.01 };
            (min - pad, max + pad)
        };
        Self {
            top,
            height,
            min,
            max,
        }
    }

    /// 固定区间，不做额外留白（用于 RSI 的 0..100）。
    fn fixed(top: f64, height: f64, min: f64, max: f64) -> Self {
        Self {
            top,
            height,
            min,
            max,
        }
    }

    fn y(&self, value: f64) -> f64 {
        self.top + (self.max - value) / (self.max - self.min) * self.height
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// 横向布局：每根 K 线占据等宽槽位。
struct Columns {
    count: usize,
}

impl Columns {
    fn step(&self) -> f64 {
        (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / to_f64(self.count.max(1))
    }

    fn center(&self, index: usize) -> f64 {
        MARGIN_LEFT + self.step() * (to_f64(index) + 0.5)
    }

    /// K 线实体宽度：数据越密越窄。
    fn body_width(&self) -> f64 {
        let ratio = match self.count {
            0..=10 => 0.6,
            11..=30 => 0.5,
            31..=90 => 0.4,
            _ => 0.3,
        };
        (self.step() * ratio).max(1.0)
    }
}

/// # Summary
/// 计算横轴标签：在时间“桶”变化处打标签，首尾两根始终打标签。
///
/// # Logic
/// - 1d：每小时首根，首尾为 `HH:MM`。
/// - 7d：每天首根，`Mon 03`。
/// - 30d：每个 ISO 周首根，`MM/DD`。
/// - 3mo：每月首根，月份缩写。
/// - 1y：隔月打标签，月份缩写。
fn axis_labels(candles: &[Candle], period: ChartPeriod) -> Vec<(usize, String)> {
    let bucket = |t: &DateTime<Utc>| -> u32 {
        match period {
            ChartPeriod::Day1 => t.hour(),
            ChartPeriod::Day7 => t.ordinal(),
            ChartPeriod::Day30 => t.iso_week().week(),
            ChartPeriod::Month3 | ChartPeriod::Year1 => t.month(),
        }
    };
    let format = |t: &DateTime<Utc>, edge: bool| -> String {
        match period {
            ChartPeriod::Day1 if edge => t.format("%H:%M").to_string(),
            ChartPeriod::Day1 => t.format("%H:00").to_string(),
            ChartPeriod::Day7 => t.format("%a %d").to_string(),
            ChartPeriod::Day30 => t.format("%m/%d").to_string(),
            ChartPeriod::Month3 | ChartPeriod::Year1 => t.format("%b").to_string(),
        }
    };

    let last = candles.len().saturating_sub(1);
    let mut labels = Vec::new();
    let mut current: Option<u32> = None;
    let mut changes = 0usize;

    for (i, candle) in candles.iter().enumerate() {
        let key = bucket(&candle.time);
        let edge = i == 0 || i == last;
        let changed = current != Some(key);
        if changed {
            changes += 1;
            current = Some(key);
        }
        let show = edge
            || (changed
                && match period {
                    ChartPeriod::Year1 => changes % 2 == 1,
                    _ => true,
                });
        if show {
            labels.push((i, format(&candle.time, edge)));
        }
    }
    labels
}

fn short_number(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.2}", value)
    }
}

/// # Summary
/// 将可选值序列连接为折线，遇到空值断开。
fn polyline(
    out: &mut String,
    columns: &Columns,
    panel: &Panel,
    values: impl Iterator<Item = Option<f64>>,
    color: &str,
) -> std::fmt::Result {
    let mut segment: Vec<String> = Vec::new();
    let flush = |out: &mut String, segment: &mut Vec<String>| -> std::fmt::Result {
        if segment.len() >= 2 {
            writeln!(
                out,
                r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                color,
                segment.join(" ")
            )?;
        }
        segment.clear();
        Ok(())
    };

    for (i, value) in values.enumerate() {
        match value {
            Some(v) if v.is_finite() => {
                segment.push(format!("{:.2},{:.2}", columns.center(i), panel.y(v)));
            }
            _ => flush(out, &mut segment)?,
        }
    }
    flush(out, &mut segment)
}

/// 面板背景网格与纵轴刻度。
fn grid(out: &mut String, panel: &Panel, ticks: &[f64], caption: &str) -> std::fmt::Result {
    for &tick in ticks {
        let y = panel.y(tick);
        writeln!(
            out,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-opacity="0.3" stroke-dasharray="4 4"/>"#,
            MARGIN_LEFT,
            y,
            WIDTH - MARGIN_RIGHT,
            y,
            GRID
        )?;
        writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" font-size="11" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0,
            LABEL,
            short_number(tick)
        )?;
    }
    writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" fill="{}" font-size="12">{}</text>"#,
        MARGIN_LEFT,
        panel.top - 8.0,
        TITLE,
        escape(caption)
    )
}

fn ticks(panel: &Panel, count: usize) -> Vec<f64> {
    let span = panel.max - panel.min;
    let divisions = to_f64(count.max(1));
    (0..=count)
        .map(|i| panel.min + span * to_f64(i) / divisions)
        .collect()
}

fn x_axis(out: &mut String, columns: &Columns, labels: &[(usize, String)], y: f64) -> std::fmt::Result {
    for (i, text) in labels {
        writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" font-size="10" text-anchor="middle">{}</text>"#,
            columns.center(*i),
            y + 16.0,
            LABEL,
            escape(text)
        )?;
    }
    Ok(())
}

fn header(out: &mut String, height: f64, title: &str) -> std::fmt::Result {
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = height
    )?;
    writeln!(
        out,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        WIDTH, height, BACKGROUND
    )?;
    writeln!(
        out,
        r#"<text x="{:.2}" y="32" fill="{}" font-size="18" font-weight="bold" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        TITLE,
        escape(title)
    )
}

/// # Summary
/// K 线 + 成交量图，高度比 3:1。
fn price_volume(series: &PriceSeries, symbol: &str, period: ChartPeriod) -> Result<String, std::fmt::Error> {
    let candles = series.candles();
    let columns = Columns {
        count: candles.len(),
    };
    let height = 800.0;
    let usable = height - TITLE_HEIGHT - AXIS_HEIGHT - PANEL_GAP;
    let price_height = usable * 0.75;

    let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let high = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let price = Panel::new(TITLE_HEIGHT, price_height, low, high);

    let max_volume = candles.iter().map(|c| c.volume).fold(0.0, f64::max);
    let volume = Panel::fixed(
        price.bottom() + PANEL_GAP,
        usable - price_height,
        0.0,
        if max_volume > 0.0 { max_volume } else { 1.0 },
    );

    let mut out = String::new();
    let title = format!("{} Price Chart ({})", symbol, period);
    header(&mut out, height, &title)?;
    grid(&mut out, &price, &ticks(&price, 5), "Price ($)")?;
    grid(&mut out, &volume, &ticks(&volume, 2), "Volume")?;

    let body = columns.body_width();
    for (i, c) in candles.iter().enumerate() {
        let color = if c.close >= c.open { BULL } else { BEAR };
        let x = columns.center(i);
        writeln!(
            out,
            r#"<line x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
            price.y(c.high),
            price.y(c.low),
            color
        )?;
        let top = price.y(c.open.max(c.close));
        let bottom = price.y(c.open.min(c.close));
        writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="0.8"/>"#,
            x - body / 2.0,
            top,
            body,
            (bottom - top).max(1.0),
            color
        )?;
        let vy = volume.y(c.volume);
        writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="0.6"/>"#,
            x - body / 2.0,
            vy,
            body,
            (volume.bottom() - vy).max(0.0),
            color
        )?;
    }

    x_axis(&mut out, &columns, &axis_labels(candles, period), volume.bottom())?;
    out.push_str("</svg>\n");
    Ok(out)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// # Summary
/// RSI / MACD / ATR 三联面板。
fn indicator_panels(
    series: &PriceSeries,
    indicators: &IndicatorSeries,
    symbol: &str,
    period: ChartPeriod,
) -> Result<String, std::fmt::Error> {
    let candles = series.candles();
    let columns = Columns {
        count: candles.len(),
    };
    let height = 900.0;
    let panel_height = (height - TITLE_HEIGHT - AXIS_HEIGHT - PANEL_GAP * 2.0) / 3.0;

    let rsi = Panel::fixed(TITLE_HEIGHT, panel_height, 0.0, 100.0);

    let (macd_lo, macd_hi) = bounds(
        indicators
            .macd
            .iter()
            .chain(&indicators.macd_signal)
            .chain(&indicators.macd_histogram)
            .copied(),
    );
    let macd = Panel::new(
        rsi.bottom() + PANEL_GAP,
        panel_height,
        macd_lo.min(0.0),
        macd_hi.max(0.0),
    );

    let (atr_lo, atr_hi) = bounds(indicators.atr.iter().flatten().copied());
    let atr = if atr_lo.is_finite() {
        Panel::new(macd.bottom() + PANEL_GAP, panel_height, atr_lo, atr_hi)
    } else {
        Panel::new(macd.bottom() + PANEL_GAP, panel_height, 0.0, 1.0)
    };

    let mut out = String::new();
    let title = format!("{} Technical Indicators ({})", symbol, period);
    header(&mut out, height, &title)?;

    grid(&mut out, &rsi, &[30.0, 50.0, 70.0], "RSI (14)")?;
    polyline(&mut out, &columns, &rsi, indicators.rsi.iter().copied(), RSI_LINE)?;

    grid(&mut out, &macd, &ticks(&macd, 2), "MACD (12, 26, 9)")?;
    let body = columns.body_width();
    let zero = macd.y(0.0);
    for (i, &h) in indicators.macd_histogram.iter().enumerate() {
        let y = macd.y(h);
        writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="0.6"/>"#,
            columns.center(i) - body / 2.0,
            y.min(zero),
            body,
            (y - zero).abs(),
            if h >= 0.0 { BULL } else { BEAR }
        )?;
    }
    polyline(&mut out, &columns, &macd, indicators.macd.iter().map(|v| Some(*v)), MACD_LINE)?;
    polyline(
        &mut out,
        &columns,
        &macd,
        indicators.macd_signal.iter().map(|v| Some(*v)),
        SIGNAL_LINE,
    )?;

    grid(&mut out, &atr, &ticks(&atr, 2), "ATR (14)")?;
    polyline(&mut out, &columns, &atr, indicators.atr.iter().copied(), ATR_LINE)?;

    x_axis(&mut out, &columns, &axis_labels(candles, period), atr.bottom())?;
    out.push_str("</svg>\n");
    Ok(out)
}

/// # Summary
/// 深色主题 SVG 图表渲染器。
///
/// # Invariants
/// - 无状态，可在多个线程中同时调用。
/// - 输出为 UTF-8 编码的 SVG 文档。
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgRenderer;

impl SvgRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for SvgRenderer {
    fn render(
        &self,
        kind: ChartKind,
        series: &PriceSeries,
        indicators: Option<&IndicatorSeries>,
        symbol: &str,
        period: ChartPeriod,
    ) -> Option<Vec<u8>> {
        if series.len() < PriceSeries::MIN_BARS {
            return None;
        }

        let rendered = match (kind, indicators) {
            (ChartKind::PriceVolume, _) => price_volume(series, symbol, period),
            (ChartKind::Indicators, Some(ind)) if ind.len() == series.len() => {
                indicator_panels(series, ind, symbol, period)
            }
            (ChartKind::Indicators, _) => {
                warn!(symbol = %symbol, "Indicator chart requested without aligned indicators");
                return None;
            }
        };

        match rendered {
            Ok(svg) => Some(svg.into_bytes()),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "SVG formatting failed");
                None
            }
        }
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }
}
