//! ==============================================================================
//! dashboard.rs - server-side rendered dashboard
//! ==============================================================================
//!
//! purpose:
//!     turns a store snapshot into a single self-contained html page:
//!     one gauge card per metric, the last update time and a history table.
//!     the page reloads itself every `refresh_seconds`, which is all the
//!     "polling" the browser needs.
//!
//! helpers:
//!     - gauge_percent:    raw value -> 0..100 bar width, fixed per-metric range
//!     - format_timestamp: unix seconds -> "YYYY-mm-dd HH:MM:SS" local time
//!     - MetricStatus:     normal / low / high / too low / too high tag
//!     - sparkline:        inline svg trend line of the history per metric
//!
//! relationships:
//!     - used by: server.rs (dashboard_handler)
//!     - uses: domain.rs (LatestState, Reading)
//!
//! ==============================================================================

use std::str::FromStr;

use chrono::{Local, TimeZone, Timelike};

use crate::domain::{LatestState, Reading};

/// the three metrics the sensor board reports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Temp,
    Humi,
    Light,
}

/// range used for a metric name we do not know
pub const FALLBACK_RANGE: (f64, f64) = (0.0, 100.0);

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Temp, MetricKind::Humi, MetricKind::Light];

    /// gauge reference range (min, max)
    pub fn range(self) -> (f64, f64) {
        match self {
            MetricKind::Temp => (10.0, 40.0),
            MetricKind::Humi => (0.0, 100.0),
            MetricKind::Light => (0.0, 15000.0),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            MetricKind::Temp => "temp",
            MetricKind::Humi => "humi",
            MetricKind::Light => "light",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Temp => "Temperature",
            MetricKind::Humi => "Humidity",
            MetricKind::Light => "Light",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::Temp => "°C",
            MetricKind::Humi => "%",
            MetricKind::Light => "lux",
        }
    }

    fn thresholds(self, daytime: bool) -> Thresholds {
        match self {
            MetricKind::Temp => Thresholds { normal: (18.0, 28.0), warn: (10.0, 35.0) },
            MetricKind::Humi => Thresholds { normal: (40.0, 60.0), warn: (20.0, 80.0) },
            MetricKind::Light if daytime => {
                Thresholds { normal: (1000.0, 5000.0), warn: (500.0, 10000.0) }
            }
            MetricKind::Light => Thresholds { normal: (0.0, 500.0), warn: (500.0, 1000.0) },
        }
    }
}

impl FromStr for MetricKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temp" => Ok(MetricKind::Temp),
            "humi" | "humidity" => Ok(MetricKind::Humi),
            "light" => Ok(MetricKind::Light),
            _ => Err(()),
        }
    }
}

/// map a raw value onto 0..100 using the metric's reference range
///
/// unknown metric names use `FALLBACK_RANGE`; the result is clamped.
pub fn gauge_percent(value: f64, kind: &str) -> f64 {
    let (min, max) = kind
        .parse::<MetricKind>()
        .map(MetricKind::range)
        .unwrap_or(FALLBACK_RANGE);
    percent_in_range(value, min, max)
}

fn percent_in_range(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.0;
    }
    let percent = (value - min) / (max - min) * 100.0;
    percent.clamp(0.0, 100.0)
}

/// unix seconds -> local "YYYY-mm-dd HH:MM:SS"; 0 means no data yet
pub fn format_timestamp(ts: f64) -> String {
    if ts <= 0.0 {
        return "--".to_string();
    }
    let secs = ts.trunc() as i64;
    let nanos = (ts.fract() * 1e9) as u32;
    match Local.timestamp_opt(secs, nanos).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "--".to_string(),
    }
}

/// lights are judged against daylight thresholds between 06:00 and 17:59
pub fn is_daytime(hour: u32) -> bool {
    (6..18).contains(&hour)
}

struct Thresholds {
    normal: (f64, f64),
    warn: (f64, f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricStatus {
    Normal,
    Low,
    High,
    TooLow,
    TooHigh,
}

impl MetricStatus {
    pub fn classify(kind: MetricKind, value: f64, daytime: bool) -> Self {
        let Thresholds { normal, warn } = kind.thresholds(daytime);
        let below = value < normal.0;

        if value >= normal.0 && value <= normal.1 {
            MetricStatus::Normal
        } else if (value >= warn.0 && value < normal.0) || (value > normal.1 && value <= warn.1) {
            if below { MetricStatus::Low } else { MetricStatus::High }
        } else if below {
            MetricStatus::TooLow
        } else {
            MetricStatus::TooHigh
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricStatus::Normal => "normal",
            MetricStatus::Low => "low",
            MetricStatus::High => "high",
            MetricStatus::TooLow => "too low",
            MetricStatus::TooHigh => "too high",
        }
    }

    /// css class of the status tag
    pub fn css_class(self) -> &'static str {
        match self {
            MetricStatus::Normal => "status-normal",
            MetricStatus::Low | MetricStatus::High => "status-warning",
            MetricStatus::TooLow | MetricStatus::TooHigh => "status-danger",
        }
    }
}

fn metric_value(latest: &LatestState, kind: MetricKind) -> f64 {
    match kind {
        MetricKind::Temp => latest.temp,
        MetricKind::Humi => latest.humidity,
        MetricKind::Light => latest.light as f64,
    }
}

fn display_value(latest: &LatestState, kind: MetricKind) -> String {
    match kind {
        MetricKind::Light => latest.light.to_string(),
        _ => format!("{:.1}", metric_value(latest, kind)),
    }
}

fn reading_value(r: &Reading, kind: MetricKind) -> f64 {
    match kind {
        MetricKind::Temp => r.temperature,
        MetricKind::Humi => r.humidity,
        MetricKind::Light => r.light as f64,
    }
}

const SPARK_WIDTH: f64 = 200.0;
const SPARK_HEIGHT: f64 = 40.0;

/// inline svg polyline of `values`, scaled to their own min..max
///
/// empty input renders nothing; a single value or a flat series is drawn
/// as a horizontal line through the middle.
pub fn sparkline(values: &[f64], key: &str) -> String {
    if values.is_empty() {
        return String::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let y = |v: f64| {
        if max == min {
            SPARK_HEIGHT / 2.0
        } else {
            SPARK_HEIGHT - (v - min) / (max - min) * SPARK_HEIGHT
        }
    };

    let points: Vec<String> = if values.len() == 1 {
        vec![format!("0.0,{:.1}", y(values[0])), format!("{:.1},{:.1}", SPARK_WIDTH, y(values[0]))]
    } else {
        let step = SPARK_WIDTH / (values.len() - 1) as f64;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.1},{:.1}", i as f64 * step, y(*v)))
            .collect()
    };

    format!(
        r#"<svg class="spark {key}-spark" viewBox="0 0 {w} {h}" preserveAspectRatio="none"><polyline fill="none" points="{points}"/></svg>"#,
        key = key,
        w = SPARK_WIDTH,
        h = SPARK_HEIGHT,
        points = points.join(" "),
    )
}

/// current local hour -> daytime flag, for callers that render "now"
pub fn daytime_now() -> bool {
    is_daytime(Local::now().hour())
}

/// render the full dashboard page
pub fn render_page(
    title: &str,
    refresh_seconds: u64,
    latest: &LatestState,
    history: &[Reading],
    daytime: bool,
) -> String {
    let title = html_escape(title);
    let mut cards = String::new();
    for kind in MetricKind::ALL {
        let value = metric_value(latest, kind);
        let status = MetricStatus::classify(kind, value, daytime);
        let trend: Vec<f64> = history.iter().map(|r| reading_value(r, kind)).collect();
        cards.push_str(&format!(
            r#"
    <div class="card" id="{key}-card">
      <h2>{label}</h2>
      <div class="value"><span id="{key}-value">{display}</span> {unit}</div>
      <div class="gauge"><div class="{key}-gauge" style="width: {percent:.1}%"></div></div>
      <span id="{key}-status" class="status-tag {class}">{status}</span>
      {spark}
    </div>"#,
            key = kind.key(),
            label = kind.label(),
            display = display_value(latest, kind),
            unit = kind.unit(),
            percent = gauge_percent(value, kind.key()),
            class = status.css_class(),
            status = status.label(),
            spark = sparkline(&trend, kind.key()),
        ));
    }

    let mut rows = String::new();
    for r in history {
        rows.push_str(&format!(
            "\n      <tr><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td></tr>",
            format_timestamp(r.timestamp),
            r.temperature,
            r.humidity,
            r.light
        ));
    }
    if history.is_empty() {
        rows.push_str("\n      <tr><td colspan=\"4\">no readings yet</td></tr>");
    }

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <meta http-equiv="refresh" content="{refresh}">
  <title>{title}</title>
  <style>
    body {{ font-family: system-ui; padding: 2rem; background: #1a1a2e; color: #eee; }}
    .cards {{ display: flex; gap: 1rem; flex-wrap: wrap; }}
    .card {{ background: #16213e; padding: 1rem; border-radius: 8px; min-width: 14rem; }}
    .value {{ font-size: 2rem; margin: 0.5rem 0; }}
    .gauge {{ background: #0f3460; height: 0.5rem; border-radius: 4px; overflow: hidden; }}
    .gauge div {{ height: 100%; }}
    .temp-gauge {{ background: #ff6b6b; }}
    .humi-gauge {{ background: #4ecdc4; }}
    .light-gauge {{ background: #ffe66d; }}
    .spark {{ display: block; width: 100%; height: 2.5rem; margin-top: 0.5rem; }}
    .spark polyline {{ stroke-width: 2; }}
    .temp-spark polyline {{ stroke: #ff6b6b; }}
    .humi-spark polyline {{ stroke: #4ecdc4; }}
    .light-spark polyline {{ stroke: #ffe66d; }}
    .status-tag {{ display: inline-block; margin-top: 0.5rem; padding: 0 0.5rem; border-radius: 4px; }}
    .status-normal {{ background: #2e7d32; }}
    .status-warning {{ background: #f9a825; color: #000; }}
    .status-danger {{ background: #c62828; }}
    table {{ margin-top: 2rem; border-collapse: collapse; }}
    td, th {{ padding: 0.25rem 1rem; border-bottom: 1px solid #333; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p>last update: <span id="update-time">{updated}</span></p>
  <div class="cards">{cards}
  </div>
  <table>
    <thead><tr><th>time</th><th>temp (°C)</th><th>humidity (%)</th><th>light (lux)</th></tr></thead>
    <tbody>{rows}
    </tbody>
  </table>
</body>
</html>"#,
        refresh = refresh_seconds,
        title = title,
        updated = format_timestamp(latest.update_time),
        cards = cards,
        rows = rows,
    )
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_percent() {
        assert_eq!(gauge_percent(25.0, "temp"), 50.0);
        assert!((gauge_percent(100.0, "light") - 0.6667).abs() < 0.001);
        assert_eq!(gauge_percent(200.0, "humi"), 100.0);
        assert_eq!(gauge_percent(-5.0, "temp"), 0.0);
    }

    #[test]
    fn test_gauge_unknown_metric_uses_fallback() {
        assert_eq!(gauge_percent(42.0, "co2"), 42.0);
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(percent_in_range(5.0, 3.0, 3.0), 0.0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "--");

        let ts = 1_700_000_000.75;
        let expected = Local
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(format_timestamp(ts), expected);
        assert_eq!(format_timestamp(ts).len(), 19);
    }

    #[test]
    fn test_daytime_window() {
        assert!(!is_daytime(5));
        assert!(is_daytime(6));
        assert!(is_daytime(17));
        assert!(!is_daytime(18));
    }

    #[test]
    fn test_temperature_status() {
        use MetricStatus::*;
        let t = |v| MetricStatus::classify(MetricKind::Temp, v, true);
        assert_eq!(t(22.0), Normal);
        assert_eq!(t(18.0), Normal);
        assert_eq!(t(12.0), Low);
        assert_eq!(t(30.0), High);
        assert_eq!(t(5.0), TooLow);
        assert_eq!(t(38.0), TooHigh);
    }

    #[test]
    fn test_light_status_depends_on_daytime() {
        use MetricStatus::*;
        assert_eq!(MetricStatus::classify(MetricKind::Light, 300.0, true), TooLow);
        assert_eq!(MetricStatus::classify(MetricKind::Light, 300.0, false), Normal);
        assert_eq!(MetricStatus::classify(MetricKind::Light, 800.0, false), High);
        assert_eq!(MetricStatus::classify(MetricKind::Light, 12000.0, true), TooHigh);
    }

    #[test]
    fn test_render_page() {
        let latest = LatestState { temp: 25.0, humidity: 55.0, light: 1200, update_time: 1_700_000_000.0 };
        let history = vec![Reading { timestamp: 1_700_000_000.0, temperature: 25.0, humidity: 55.0, light: 1200 }];
        let html = render_page("<Greenhouse>", 5, &latest, &history, true);

        assert!(html.contains("&lt;Greenhouse&gt;"));
        assert!(html.contains(r#"content="5""#));
        assert!(html.contains(r#"<span id="temp-value">25.0</span>"#));
        assert!(html.contains(r#"class="temp-gauge" style="width: 50.0%""#));
        assert!(html.contains(r#"<span id="light-value">1200</span>"#));
        assert!(html.contains("status-normal"));
        assert!(html.contains("<td>1200</td>"));
    }

    #[test]
    fn test_sparkline_scales_to_range() {
        let svg = sparkline(&[10.0, 20.0, 30.0], "temp");
        assert!(svg.starts_with(r#"<svg class="spark temp-spark""#));
        assert!(svg.contains(r#"points="0.0,40.0 100.0,20.0 200.0,0.0""#));
    }

    #[test]
    fn test_sparkline_flat_and_empty() {
        assert_eq!(sparkline(&[], "light"), "");
        assert!(sparkline(&[5.0], "light").contains(r#"points="0.0,20.0 200.0,20.0""#));
        assert!(sparkline(&[7.0, 7.0], "humi").contains(r#"points="0.0,20.0 200.0,20.0""#));
    }

    #[test]
    fn test_render_page_has_trend_per_metric() {
        let history: Vec<Reading> = (0..3)
            .map(|i| Reading { timestamp: 1_700_000_000.0 + i as f64, temperature: 20.0 + i as f64, humidity: 50.0, light: 100 * i })
            .collect();
        let html = render_page("Monitor", 5, &LatestState::from(history[2]), &history, true);
        for key in ["temp", "humi", "light"] {
            assert!(html.contains(&format!("{}-spark", key)));
        }
        assert!(html.contains(r#"points="0.0,40.0 100.0,20.0 200.0,0.0""#));
    }

    #[test]
    fn test_render_empty_page() {
        let html = render_page("Monitor", 5, &LatestState::default(), &[], false);
        assert!(html.contains("no readings yet"));
        assert!(html.contains(r#"<span id="update-time">--</span>"#));
    }
}
