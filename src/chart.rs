//! Line charts rendered straight to SVG text.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use fib_core::Strategy;
use tokio::fs;

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::table::Table;

const WIDTH: f64 = 880.0;
const HEIGHT: f64 = 520.0;
const LEFT: f64 = 90.0;
const RIGHT: f64 = 260.0;
const TOP: f64 = 50.0;
const BOTTOM: f64 = 60.0;

pub const TIMING_CHART: &str = "timing_comparison.svg";
pub const OPERATIONS_CHART: &str = "operations_comparison.svg";

pub fn complexity_chart_name(implementation: &str) -> String {
    format!("complexity_{implementation}.svg")
}

fn color(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Iterative => "#1f77b4",
        Strategy::Recursive => "#d62728",
        Strategy::Memoized => "#2ca02c",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub color: String,
    pub dashed: bool,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub log_y: bool,
    pub series: Vec<ChartSeries>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Bounds {
    fn widen(min: f64, max: f64) -> (f64, f64) {
        if (max - min).abs() < f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        }
    }

    fn x(&self, x: f64) -> f64 {
        LEFT + (x - self.x_min) / (self.x_max - self.x_min) * (WIDTH - LEFT - RIGHT)
    }

    fn y(&self, y: f64) -> f64 {
        HEIGHT - BOTTOM - (y - self.y_min) / (self.y_max - self.y_min) * (HEIGHT - TOP - BOTTOM)
    }
}

impl Chart {
    /// Points actually drawn; log axes drop non-positive values.
    fn plotted(&self, series: &ChartSeries) -> Vec<(f64, f64)> {
        series
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .filter(|(_, y)| !self.log_y || *y > 0.0)
            .map(|&(x, y)| if self.log_y { (x, y.log10()) } else { (x, y) })
            .collect()
    }

    fn bounds(&self) -> Option<Bounds> {
        let points: Vec<(f64, f64)> = self.series.iter().flat_map(|s| self.plotted(s)).collect();
        if points.is_empty() {
            return None;
        }
        let fold = |f: fn(&(f64, f64)) -> f64| {
            points.iter().map(f).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
        };
        let (x_min, x_max) = fold(|p| p.0);
        let (y_min, y_max) = fold(|p| p.1);
        let (x_min, x_max) = Bounds::widen(x_min, x_max);
        let (y_min, y_max) = if self.log_y {
            Bounds::widen(y_min.floor(), y_max.ceil())
        } else {
            Bounds::widen(y_min.min(0.0), y_max)
        };
        Some(Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    fn y_tick_label(&self, value: f64) -> String {
        if self.log_y {
            format!("1e{}", value.round() as i64)
        } else if value.abs() >= 1000.0 || value.fract() == 0.0 {
            format!("{value:.0}")
        } else {
            format!("{value:.3}")
        }
    }

    pub fn render_svg(&self) -> String {
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="28" text-anchor="middle" font-size="16">{}</text>"#,
            (WIDTH - RIGHT + LEFT) / 2.0,
            escape(&self.title)
        );

        let plot_bottom = HEIGHT - BOTTOM;
        let plot_right = WIDTH - RIGHT;
        let _ = writeln!(
            svg,
            r#"<path d="M{LEFT} {TOP} V{plot_bottom} H{plot_right}" fill="none" stroke="black"/>"#
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
            (LEFT + plot_right) / 2.0,
            HEIGHT - 15.0,
            escape(&self.x_label)
        );
        let _ = writeln!(
            svg,
            r#"<text x="20" y="{mid}" text-anchor="middle" transform="rotate(-90 20 {mid})">{}</text>"#,
            escape(&self.y_label),
            mid = (TOP + plot_bottom) / 2.0
        );

        let Some(bounds) = self.bounds() else {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" text-anchor="middle">no data</text>"#,
                (LEFT + plot_right) / 2.0,
                (TOP + plot_bottom) / 2.0
            );
            svg.push_str("</svg>\n");
            return svg;
        };

        for i in 0..=5 {
            let x = bounds.x_min + (bounds.x_max - bounds.x_min) * i as f64 / 5.0;
            let px = bounds.x(x);
            let _ = writeln!(
                svg,
                r#"<text x="{px:.1}" y="{}" text-anchor="middle">{x:.0}</text>"#,
                plot_bottom + 18.0
            );
        }
        let y_ticks: Vec<f64> = if self.log_y {
            let (lo, hi) = (bounds.y_min.ceil() as i64, bounds.y_max.floor() as i64);
            let step = ((hi - lo) / 8).max(1);
            (lo..=hi).step_by(step as usize).map(|v| v as f64).collect()
        } else {
            (0..=5)
                .map(|i| bounds.y_min + (bounds.y_max - bounds.y_min) * i as f64 / 5.0)
                .collect()
        };
        for y in y_ticks {
            let py = bounds.y(y);
            let _ = writeln!(
                svg,
                r##"<line x1="{LEFT}" y1="{py:.1}" x2="{plot_right}" y2="{py:.1}" stroke="#e0e0e0"/>"##
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.1}" text-anchor="end">{}</text>"#,
                LEFT - 6.0,
                py + 4.0,
                self.y_tick_label(y)
            );
        }

        for (idx, series) in self.series.iter().enumerate() {
            let points = self.plotted(series);
            let dash = if series.dashed {
                r#" stroke-dasharray="6 4""#
            } else {
                ""
            };
            if !points.is_empty() {
                let coords: Vec<String> = points
                    .iter()
                    .map(|&(x, y)| format!("{:.1},{:.1}", bounds.x(x), bounds.y(y)))
                    .collect();
                let _ = writeln!(
                    svg,
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"{dash}/>"#,
                    coords.join(" "),
                    escape(&series.color)
                );
            }
            let ly = TOP + 10.0 + idx as f64 * 20.0;
            let _ = writeln!(
                svg,
                r#"<line x1="{}" y1="{ly}" x2="{}" y2="{ly}" stroke="{}" stroke-width="2"{dash}/>"#,
                plot_right + 15.0,
                plot_right + 45.0,
                escape(&series.color)
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}">{}</text>"#,
                plot_right + 52.0,
                ly + 4.0,
                escape(&series.label)
            );
        }
        svg.push_str("</svg>\n");
        svg
    }

    pub async fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render_svg())
            .await
            .map_err(|err| BenchError::Storage(format!("failed writing `{}`: {err}", path.display())))
    }
}

fn strategy_series(tables: &[(String, Table)]) -> Vec<ChartSeries> {
    let mut series = Vec::new();
    for (idx, (name, table)) in tables.iter().enumerate() {
        for strategy in Strategy::ALL {
            series.push(ChartSeries {
                label: format!("{name} {}", strategy.column()),
                color: color(strategy).to_string(),
                dashed: idx > 0,
                points: table
                    .series(strategy)
                    .into_iter()
                    .map(|(n, v)| (n as f64, v))
                    .collect(),
            });
        }
    }
    series
}

/// Every implementation and strategy on one log-scale timing chart.
pub fn timing_comparison(tables: &[(String, Table)]) -> Chart {
    Chart {
        title: "Timing comparison".into(),
        x_label: "N".into(),
        y_label: "Time (seconds)".into(),
        log_y: true,
        series: strategy_series(tables),
    }
}

pub fn operations_comparison(tables: &[(String, Table)]) -> Chart {
    Chart {
        title: "Operations count comparison".into(),
        x_label: "N".into(),
        y_label: "Operations".into(),
        log_y: false,
        series: strategy_series(tables),
    }
}

fn normalized(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let max = points.iter().map(|p| p.1).fold(0.0, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    points.into_iter().map(|(x, y)| (x, y / max)).collect()
}

/// Measured timings against O(n) and O(2^n), each scaled to its own maximum.
pub fn complexity(implementation: &str, timings: &Table) -> Chart {
    let ns: Vec<f64> = timings.rows.iter().map(|r| r.n as f64).collect();
    let n_max = ns.iter().copied().fold(0.0, f64::max);

    let mut series = Vec::new();
    for strategy in Strategy::ALL {
        let empirical = timings
            .series(strategy)
            .into_iter()
            .map(|(n, v)| (n as f64, v))
            .collect();
        series.push(ChartSeries {
            label: format!("Empirical {}", strategy.column()),
            color: color(strategy).to_string(),
            dashed: false,
            points: normalized(empirical),
        });
        let (label, theoretical): (&str, Vec<(f64, f64)>) = match strategy {
            Strategy::Recursive => (
                "O(2^n)",
                ns.iter().map(|&n| (n, (n - n_max).exp2())).collect(),
            ),
            _ => ("O(n)", normalized(ns.iter().map(|&n| (n, n)).collect())),
        };
        series.push(ChartSeries {
            label: format!("Theoretical {} {label}", strategy.column()),
            color: color(strategy).to_string(),
            dashed: true,
            points: theoretical,
        });
    }

    Chart {
        title: format!("{implementation}: theoretical vs empirical complexity"),
        x_label: "N".into(),
        y_label: "Normalized time".into(),
        log_y: true,
        series,
    }
}

/// Reads every collected table and writes all charts into the output
/// directory. Implementations without tables are skipped with a warning.
pub async fn render_all(config: &BenchConfig) -> Result<Vec<PathBuf>> {
    let mut timings = Vec::new();
    let mut ops = Vec::new();
    for implementation in &config.implementations {
        let name = implementation.name.clone();
        match Table::read(config.timings_path(&name)).await {
            Ok(table) => timings.push((name.clone(), table)),
            Err(err) => tracing::warn!(implementation = %name, error = %err, "no timing table"),
        }
        match Table::read(config.ops_path(&name)).await {
            Ok(table) => ops.push((name, table)),
            Err(err) => tracing::warn!(implementation = %name, error = %err, "no operations table"),
        }
    }
    if timings.is_empty() && ops.is_empty() {
        return Err(BenchError::Storage(format!(
            "no tables found in `{}`; run `collect` first",
            config.output.dir.display()
        )));
    }

    fs::create_dir_all(&config.output.dir).await?;
    let mut written = Vec::new();

    let path = config.output.dir.join(TIMING_CHART);
    timing_comparison(&timings).write(&path).await?;
    written.push(path);

    let path = config.output.dir.join(OPERATIONS_CHART);
    operations_comparison(&ops).write(&path).await?;
    written.push(path);

    for (name, table) in &timings {
        let path = config.output.dir.join(complexity_chart_name(name));
        complexity(name, table).write(&path).await?;
        written.push(path);
    }
    for path in &written {
        tracing::info!(path = %path.display(), "chart written");
    }
    Ok(written)
}
