//! 技术指标计算：纯函数，同一输入总是得到逐位相同的输出。

use kabu_core::indicator::entity::IndicatorSeries;
use kabu_core::market::entity::PriceSeries;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// 窗口长度转浮点，窗口长度恒为小常量。
fn span_f64(n: usize) -> f64 {
    u32::try_from(n).map(f64::from).unwrap_or(f64::MAX)
}

/// # Summary
/// 尾随窗口简单均值。
///
/// # Returns
/// 与输入等长；前 `period - 1` 个位置为 `None`。
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let divisor = span_f64(period);
    (0..values.len())
        .map(|i| {
            (i + 1 >= period).then(|| values[i + 1 - period..=i].iter().sum::<f64>() / divisor)
        })
        .collect()
}

/// # Summary
/// 指数移动平均。
///
/// # Logic
/// `alpha = 2 / (span + 1)`，以首个值为种子：
/// `v[0] = x[0]`，`v[i] = alpha * x[i] + (1 - alpha) * v[i-1]`。
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span_f64(span) + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let v = match prev {
            Some(p) => alpha * x + (1.0 - alpha) * p,
            None => x,
        };
        out.push(v);
        prev = Some(v);
    }
    out
}

/// # Summary
/// RSI（简单均值版本）。
///
/// # Logic
/// 1. `delta[0] = 0`，其余为相邻收盘价之差。
/// 2. 涨幅与跌幅分别取尾随 `period` 根的简单均值。
/// 3. `RSI = 100 - 100 / (1 + gain / loss)`。
///    跌幅均值为 0 时：涨幅为正记 100，否则无定义。
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let deltas: Vec<f64> = (0..closes.len())
        .map(|i| if i == 0 { 0.0 } else { closes[i] - closes[i - 1] })
        .collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    rolling_mean(&gains, period)
        .into_iter()
        .zip(rolling_mean(&losses, period))
        .map(|(gain, loss)| match (gain, loss) {
            (Some(g), Some(l)) if l > 0.0 => Some(100.0 - 100.0 / (1.0 + g / l)),
            (Some(g), Some(_)) if g > 0.0 => Some(100.0),
            _ => None,
        })
        .collect()
}

/// MACD 线、信号线与柱状图。
pub fn macd(closes: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast = ema(closes, MACD_FAST);
    let slow = ema(closes, MACD_SLOW);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, MACD_SIGNAL);
    let histogram = line.iter().zip(&signal).map(|(m, s)| m - s).collect();
    (line, signal, histogram)
}

/// # Summary
/// 平均真实波幅（简单均值版本）。
///
/// # Logic
/// `TR[0] = high - low`；
/// `TR[i] = max(high - low, |high - close[i-1]|, |low - close[i-1]|)`。
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = highs.len().min(lows.len()).min(closes.len());
    let true_ranges: Vec<f64> = (0..n)
        .map(|i| {
            let range = highs[i] - lows[i];
            if i == 0 {
                range
            } else {
                let prev = closes[i - 1];
                range
                    .max((highs[i] - prev).abs())
                    .max((lows[i] - prev).abs())
            }
        })
        .collect();
    rolling_mean(&true_ranges, period)
}

/// # Summary
/// 计算与价格序列逐根对齐的全部指标。
///
/// # Invariants
/// - 使用未复权的 OHLC。
/// - 输出各向量长度等于 `series.len()`。
pub fn compute_indicators(series: &PriceSeries) -> IndicatorSeries {
    let candles = series.candles();
    let closes = series.closes();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

    let (macd_line, macd_signal, macd_histogram) = macd(&closes);

    IndicatorSeries {
        rsi: rsi(&closes, RSI_PERIOD),
        macd: macd_line,
        macd_signal,
        macd_histogram,
        atr: atr(&highs, &lows, &closes, ATR_PERIOD),
    }
}
