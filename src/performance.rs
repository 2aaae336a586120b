//! Performance chart export
//!
//! Draws speed and energy over race time as an SVG line chart.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::game_server::race::TelemetrySample;

pub const PERFORMANCE_CHART_FILE: &str = "performance_last_race.svg";

/// Turns last-race telemetry into a chart artifact
pub trait PerformanceExporter {
    /// Write the chart; `Ok(None)` when there was nothing to draw
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    fn export(&self, samples: &[TelemetrySample]) -> Result<Option<PathBuf>>;
}

/// Skips chart output entirely
pub struct NoChart;

impl PerformanceExporter for NoChart {
    fn export(&self, _samples: &[TelemetrySample]) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

#[derive(Debug, Clone)]
pub struct SvgChartExporter {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl SvgChartExporter {
    const MARGIN_LEFT: f32 = 60.0;
    const MARGIN_RIGHT: f32 = 20.0;
    const MARGIN_TOP: f32 = 40.0;
    const MARGIN_BOTTOM: f32 = 50.0;
    const GRID_LINES: u32 = 5;
    const SPEED_COLOR: &'static str = "#1f77b4";
    const ENERGY_COLOR: &'static str = "#ff7f0e";

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            width: 800,
            height: 450,
        }
    }

    /// Default file name under `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PERFORMANCE_CHART_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the chart document
    pub fn render(&self, samples: &[TelemetrySample]) -> String {
        let width = self.width as f32;
        let height = self.height as f32;
        let plot_w = width - Self::MARGIN_LEFT - Self::MARGIN_RIGHT;
        let plot_h = height - Self::MARGIN_TOP - Self::MARGIN_BOTTOM;

        let t_max = samples.iter().map(|s| s.t).fold(0.0_f32, f32::max).max(1.0);
        let y_max = samples
            .iter()
            .flat_map(|s| [s.vel, s.eng])
            .fold(100.0_f32, f32::max);

        let to_x = |t: f32| Self::MARGIN_LEFT + t / t_max * plot_w;
        let to_y = |v: f32| Self::MARGIN_TOP + plot_h - v.max(0.0) / y_max * plot_h;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="24" text-anchor="middle" font-size="16">Race performance</text>"#,
            width / 2.0
        );

        for i in 0..=Self::GRID_LINES {
            let frac = i as f32 / Self::GRID_LINES as f32;
            let y = Self::MARGIN_TOP + plot_h - frac * plot_h;
            let x = Self::MARGIN_LEFT + frac * plot_w;
            let _ = writeln!(
                svg,
                r##"<line x1="{l}" y1="{y:.1}" x2="{r}" y2="{y:.1}" stroke="#ccc" stroke-dasharray="4 4"/>"##,
                l = Self::MARGIN_LEFT,
                r = Self::MARGIN_LEFT + plot_w,
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.1}" text-anchor="end">{:.0}</text>"#,
                Self::MARGIN_LEFT - 6.0,
                y + 4.0,
                frac * y_max
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{}" text-anchor="middle">{:.1}</text>"#,
                x,
                Self::MARGIN_TOP + plot_h + 18.0,
                frac * t_max
            );
        }

        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle">Time (s)</text>"#,
            Self::MARGIN_LEFT + plot_w / 2.0,
            height - 10.0
        );

        let series: [(&str, fn(&TelemetrySample) -> f32); 2] = [
            (Self::SPEED_COLOR, |s| s.vel),
            (Self::ENERGY_COLOR, |s| s.eng),
        ];
        for (color, value) in series {
            let points: Vec<String> = samples
                .iter()
                .map(|s| format!("{:.1},{:.1}", to_x(s.t), to_y(value(s))))
                .collect();
            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{}"/>"#,
                points.join(" ")
            );
        }

        let legend_x = Self::MARGIN_LEFT + 10.0;
        for (i, (color, label)) in [
            (Self::SPEED_COLOR, "Speed (virtual m/s)"),
            (Self::ENERGY_COLOR, "Energy (%)"),
        ]
        .into_iter()
        .enumerate()
        {
            let y = Self::MARGIN_TOP + 12.0 + i as f32 * 16.0;
            let _ = writeln!(
                svg,
                r#"<line x1="{legend_x}" y1="{y}" x2="{}" y2="{y}" stroke="{color}" stroke-width="2"/>"#,
                legend_x + 20.0
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}">{label}</text>"#,
                legend_x + 26.0,
                y + 4.0
            );
        }

        svg.push_str("</svg>\n");
        svg
    }
}

impl PerformanceExporter for SvgChartExporter {
    fn export(&self, samples: &[TelemetrySample]) -> Result<Option<PathBuf>> {
        if samples.is_empty() {
            return Ok(None);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, self.render(samples))?;
        log::info!("Performance chart saved to {}", self.path.display());
        Ok(Some(self.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<TelemetrySample> {
        (0..10)
            .map(|i| TelemetrySample {
                t: i as f32 * 0.2,
                vel: 5.0 + i as f32,
                eng: 100.0 - i as f32 * 3.0,
            })
            .collect()
    }

    #[test]
    fn empty_samples_are_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SvgChartExporter::in_dir(dir.path());
        assert_eq!(exporter.export(&[]).unwrap(), None);
        assert!(!exporter.path().exists());
    }

    #[test]
    fn writes_two_series() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SvgChartExporter::in_dir(dir.path());
        let path = exporter.export(&samples()).unwrap().unwrap();
        let svg = std::fs::read_to_string(path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("Energy (%)"));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let exporter = SvgChartExporter::new(blocker.join("chart.svg"));
        assert!(exporter.export(&samples()).is_err());
    }
}
