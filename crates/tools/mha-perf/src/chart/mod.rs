//! Grouped bar chart rendering.
//!
//! A [`BarChart`] owns everything needed for one figure: the two series, the
//! legend labels, and the [`ChartStyle`]. [`BarChart::render`] lays the
//! figure out on a fresh [`Canvas`], crops it to the drawn content, and
//! [`BarChart::save`] encodes the result as PNG.
//!
//! Layout sizes are specified in points and converted with the style's DPI,
//! so the same chart renders proportionally at any resolution.

pub mod canvas;
pub mod font;
pub mod png;

use std::io;
use std::path::Path;

use canvas::{Canvas, HAlign, Rect, TextStyle, VAlign};

use crate::compare::Comparison;
use crate::style::{ChartStyle, Rgb};

/// Title font size in points.
const TITLE_PT: f32 = 14.0;
/// Axis label font size in points.
const LABEL_PT: f32 = 12.0;
/// Legend font size in points.
const LEGEND_PT: f32 = 11.0;
/// Tick label font size in points.
const TICK_PT: f32 = 10.0;
/// Bar annotation font size in points.
const ANNOTATION_PT: f32 = 7.0;
/// Padding kept around the cropped figure, in inches.
const PAD_IN: f32 = 0.1;
/// Upper bound on the number of y-axis intervals.
const MAX_Y_TICKS: f64 = 8.0;
/// Hard cap on gridlines, including the one at zero.
const MAX_TICK_LINES: u32 = 10;
/// Headroom above the tallest bar.
const Y_MARGIN: f64 = 1.05;

const GRID_COLOR: Rgb = Rgb::new(0xb0, 0xb0, 0xb0);
const GRID_ALPHA: f32 = 0.3;
const LEGEND_EDGE: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

/// Summary of a written chart image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedChart {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Encoded file size in bytes.
    pub bytes: usize,
}

/// Builder for a two-series grouped bar chart.
#[derive(Debug, Clone)]
pub struct BarChart<'a> {
    style: &'a ChartStyle,
    title: String,
    labels: [String; 2],
    categories: Vec<i64>,
    series: [Vec<f64>; 2],
}

impl<'a> BarChart<'a> {
    /// Start an empty chart with legend labels for both series.
    pub fn new(style: &'a ChartStyle, label1: &str, label2: &str) -> Self {
        let title = style
            .title
            .clone()
            .unwrap_or_else(|| format!("MHA Performance Comparison: {label1} vs {label2}"));
        Self {
            style,
            title,
            labels: [label1.to_string(), label2.to_string()],
            categories: Vec::new(),
            series: [Vec::new(), Vec::new()],
        }
    }

    /// Build a chart with one bar pair per joined configuration.
    pub fn from_comparison(
        style: &'a ChartStyle,
        cmp: &Comparison,
        label1: &str,
        label2: &str,
    ) -> Self {
        let mut chart = Self::new(style, label1, label2);
        for row in &cmp.rows {
            chart.push(row.index, row.fwd_tflops_file1, row.fwd_tflops_file2);
        }
        chart
    }

    /// Append one bar pair.
    pub fn push(&mut self, index: i64, value1: f64, value2: f64) {
        self.categories.push(index);
        self.series[0].push(value1);
        self.series[1].push(value2);
    }

    /// Number of bar pairs.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns `true` if the chart has no bars.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Indices of the pairs that receive value annotations.
    pub fn annotated(&self) -> Vec<usize> {
        let threshold = self.style.annotate_threshold;
        (0..self.len())
            .step_by(self.style.annotate_every.max(1))
            .filter(|&i| self.series[0][i] > threshold || self.series[1][i] > threshold)
            .collect()
    }

    /// Render the chart and write it as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing the image fails.
    pub fn save(&self, path: &Path) -> io::Result<RenderedChart> {
        let canvas = self.render();
        let bytes = png::write_png(&canvas, self.style.dpi, path)?;
        Ok(RenderedChart {
            width: canvas.width(),
            height: canvas.height(),
            bytes,
        })
    }

    /// Draw the full figure and crop it to its content.
    #[allow(clippy::cast_precision_loss, clippy::too_many_lines)]
    pub fn render(&self) -> Canvas {
        let m = Metrics::new(self.style);
        let fig_w = m.inches(self.style.width_in).max(1);
        let fig_h = m.inches(self.style.height_in).max(1);
        let mut canvas = Canvas::new(fig_w, fig_h, Rgb::WHITE);

        let axis = YAxis::fit(self.max_value());
        let tick_labels: Vec<String> = axis.ticks().iter().map(|&v| axis.format(v)).collect();

        // Margins around the plot area, in pixels.
        let tick_style = TextStyle::new(m.font_scale(TICK_PT));
        let x_tick_style = tick_style.rotated(45.0).align(HAlign::Right, VAlign::Top);
        let label_style = TextStyle::new(m.font_scale(LABEL_PT)).bold();
        let title_style = TextStyle::new(m.font_scale(TITLE_PT)).bold();

        let y_tick_w = tick_labels
            .iter()
            .map(|s| Canvas::measure_text(s, &tick_style).0)
            .max()
            .unwrap_or(0);
        let x_tick_h = self
            .categories
            .iter()
            .map(|c| Canvas::measure_text(&c.to_string(), &x_tick_style).1)
            .max()
            .unwrap_or(0);
        let (_, label_h) = Canvas::measure_text("TFLOPS", &label_style);
        let (_, title_h) = Canvas::measure_text(&self.title, &title_style);

        let pad = m.inches(PAD_IN);
        let gap = m.points(4.0);
        let tick_len = m.points(3.5);

        let plot = Rect {
            x0: px(pad + label_h + gap + y_tick_w + gap + tick_len),
            y0: px(pad + title_h + gap * 2),
            x1: px(fig_w.saturating_sub(pad)),
            y1: px(fig_h.saturating_sub(pad + label_h + gap + x_tick_h + gap + tick_len)),
        };
        if plot.width() < 2 || plot.height() < 2 {
            return canvas;
        }

        let line = m.points(0.8);
        let y_of = |v: f64| -> i32 {
            let frac = (v / axis.top).clamp(0.0, 1.0);
            plot.y1 - round_px(frac * f64::from(plot.height()))
        };

        // Gridlines sit behind the bars.
        for &v in &axis.ticks() {
            let y = y_of(v);
            canvas.dashed_hline(
                plot.x0,
                plot.x1,
                y,
                line,
                m.points(3.7),
                m.points(1.6),
                GRID_COLOR,
                GRID_ALPHA,
            );
        }

        let n = self.len().max(1);
        let slot = f64::from(plot.width()) / n as f64;
        let bar_w = f64::from(self.style.bar_width) * slot;
        let center = |i: usize| f64::from(plot.x0) + (i as f64 + 0.5) * slot;

        for i in 0..self.len() {
            let c = center(i);
            for (s, offset) in [(0, -bar_w), (1, 0.0)] {
                let v = self.series[s][i];
                if !v.is_finite() || v <= 0.0 {
                    continue;
                }
                let x0 = round_px(c + offset);
                let x1 = round_px(c + offset + bar_w).max(x0 + 1);
                let rect = Rect {
                    x0,
                    y0: y_of(v),
                    x1,
                    y1: plot.y1,
                };
                canvas.fill_rect(rect, self.style.colors[s], self.style.bar_alpha);
            }
        }

        // Value annotations above selected bar pairs.
        let note_style = TextStyle::new(m.font_scale(ANNOTATION_PT))
            .rotated(90.0)
            .align(HAlign::Center, VAlign::Bottom);
        for i in self.annotated() {
            let c = center(i);
            for (s, offset) in [(0, -bar_w / 2.0), (1, bar_w / 2.0)] {
                let v = self.series[s][i];
                if !v.is_finite() {
                    continue;
                }
                let y = y_of(v.max(0.0)) - px(gap / 2);
                canvas.draw_text(round_px(c + offset), y, &format!("{v:.0}"), &note_style);
            }
        }

        // Frame.
        canvas.hline(plot.x0, plot.x1 + px(line), plot.y0, line, Rgb::BLACK);
        canvas.hline(plot.x0, plot.x1 + px(line), plot.y1, line, Rgb::BLACK);
        canvas.vline(plot.x0, plot.y0, plot.y1 + px(line), line, Rgb::BLACK);
        canvas.vline(plot.x1, plot.y0, plot.y1 + px(line), line, Rgb::BLACK);

        // Y ticks and labels.
        let y_tick_style = tick_style.align(HAlign::Right, VAlign::Center);
        for (&v, text) in axis.ticks().iter().zip(&tick_labels) {
            let y = y_of(v);
            canvas.hline(plot.x0 - px(tick_len), plot.x0, y, line, Rgb::BLACK);
            canvas.draw_text(plot.x0 - px(tick_len + gap), y, text, &y_tick_style);
        }

        // X ticks and rotated labels.
        for (i, index) in self.categories.iter().enumerate() {
            let x = round_px(center(i));
            canvas.vline(x, plot.y1, plot.y1 + px(tick_len), line, Rgb::BLACK);
            canvas.draw_text(x, plot.y1 + px(tick_len + gap), &index.to_string(), &x_tick_style);
        }

        // Axis labels and title.
        let x_label_y = plot.y1 + px(tick_len + gap + x_tick_h + gap);
        canvas.draw_text(
            (plot.x0 + plot.x1) / 2,
            x_label_y,
            "Configuration Index",
            &label_style.align(HAlign::Center, VAlign::Top),
        );
        canvas.draw_text(
            plot.x0 - px(tick_len + gap + y_tick_w + gap),
            (plot.y0 + plot.y1) / 2,
            "TFLOPS",
            &label_style.rotated(90.0).align(HAlign::Right, VAlign::Center),
        );
        canvas.draw_text(
            (plot.x0 + plot.x1) / 2,
            plot.y0 - px(gap),
            &self.title,
            &title_style.align(HAlign::Center, VAlign::Bottom),
        );

        self.draw_legend(&mut canvas, plot, &m);

        let bounds = canvas
            .content_bounds(Rgb::WHITE)
            .unwrap_or(Rect { x0: 0, y0: 0, x1: px(fig_w), y1: px(fig_h) });
        let p = px(pad);
        canvas.crop(
            Rect {
                x0: bounds.x0 - p,
                y0: bounds.y0 - p,
                x1: bounds.x1 + p,
                y1: bounds.y1 + p,
            },
            Rgb::WHITE,
        )
    }

    /// Draw the legend box in the upper-right corner of the plot.
    fn draw_legend(&self, canvas: &mut Canvas, plot: Rect, m: &Metrics) {
        let text_style = TextStyle::new(m.font_scale(LEGEND_PT)).align(HAlign::Left, VAlign::Center);
        let inset = px(m.points(6.0));
        let swatch_w = px(m.points(20.0));
        let swatch_h = px(m.points(7.0));
        let spacing = px(m.points(5.0));

        let sizes: Vec<(u32, u32)> = self
            .labels
            .iter()
            .map(|l| Canvas::measure_text(l, &text_style))
            .collect();
        let text_w = px(sizes.iter().map(|s| s.0).max().unwrap_or(0));
        let row_h = px(sizes.iter().map(|s| s.1).max().unwrap_or(0)).max(swatch_h) + spacing;

        let box_w = inset + swatch_w + spacing + text_w + inset;
        let box_h = inset + row_h * 2 - spacing + inset;
        let frame = Rect {
            x0: plot.x1 - inset - box_w,
            y0: plot.y0 + inset,
            x1: plot.x1 - inset,
            y1: plot.y0 + inset + box_h,
        };

        canvas.fill_rect(frame, Rgb::WHITE, 0.8);
        let edge = m.points(0.8);
        canvas.hline(frame.x0, frame.x1, frame.y0, edge, LEGEND_EDGE);
        canvas.hline(frame.x0, frame.x1, frame.y1 - px(edge), edge, LEGEND_EDGE);
        canvas.vline(frame.x0, frame.y0, frame.y1, edge, LEGEND_EDGE);
        canvas.vline(frame.x1 - px(edge), frame.y0, frame.y1, edge, LEGEND_EDGE);

        for (s, label) in self.labels.iter().enumerate() {
            let row_top = frame.y0 + inset + row_h * i32::try_from(s).unwrap_or(0);
            let mid = row_top + (row_h - spacing) / 2;
            let swatch = Rect {
                x0: frame.x0 + inset,
                y0: mid - swatch_h / 2,
                x1: frame.x0 + inset + swatch_w,
                y1: mid + swatch_h - swatch_h / 2,
            };
            canvas.fill_rect(swatch, self.style.colors[s], self.style.bar_alpha);
            canvas.draw_text(swatch.x1 + spacing, mid, label, &text_style);
        }
    }

    /// Largest finite value across both series.
    fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Point-to-pixel conversion for one DPI.
struct Metrics {
    dpi: f32,
}

impl Metrics {
    fn new(style: &ChartStyle) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let dpi = style.dpi as f32;
        Self { dpi }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn inches(&self, v: f32) -> u32 {
        (v * self.dpi).round().max(0.0) as u32
    }

    fn points(&self, v: f32) -> u32 {
        self.inches(v / 72.0).max(1)
    }

    /// Integer font magnification whose glyph cell approximates `pt`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn font_scale(&self, pt: f32) -> u32 {
        (pt * self.dpi / 72.0 / 10.0).round().max(1.0) as u32
    }
}

/// Linear y axis from zero to `top` with evenly spaced ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct YAxis {
    top: f64,
    step: f64,
}

impl YAxis {
    fn fit(max: f64) -> Self {
        let top = if max > 0.0 && max.is_finite() {
            (max * Y_MARGIN).min(f64::MAX)
        } else {
            1.0
        };
        let mut step = nice_step(top / MAX_Y_TICKS);
        if step <= 0.0 || !step.is_finite() {
            step = top;
        }
        Self { top, step }
    }

    fn ticks(&self) -> Vec<f64> {
        let limit = (self.top * (1.0 + 1e-9)).min(f64::MAX);
        (0..MAX_TICK_LINES)
            .map(|k| f64::from(k) * self.step)
            .take_while(|&v| v.is_finite() && v <= limit)
            .collect()
    }

    fn format(&self, v: f64) -> String {
        if self.step < 1e-4 || self.top >= 1e9 {
            format!("{v:.2e}")
        } else {
            format!("{v:.*}", decimals(self.step))
        }
    }
}

/// Round `raw` up to 1, 2, 2.5, 5, or 10 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let mag = 10f64.powf(raw.log10().floor());
    if mag <= 0.0 || !mag.is_finite() {
        return raw;
    }
    let norm = raw / mag;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 2.5 {
        2.5
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * mag
}

/// Fewest decimal places that print `step` exactly.
fn decimals(step: f64) -> usize {
    (0..6)
        .find(|&d| {
            let scaled = step * 10f64.powi(d);
            (scaled - scaled.round()).abs() < 1e-6 * scaled.abs().max(1.0)
        })
        .map_or(6, |d| usize::try_from(d).unwrap_or(6))
}

fn px(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> i32 {
    v.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::join;
    use crate::report::parse_str;

    fn small_style() -> ChartStyle {
        ChartStyle {
            width_in: 8.0,
            height_in: 5.0,
            dpi: 50,
            ..ChartStyle::default()
        }
    }

    fn sample_chart(style: &ChartStyle) -> BarChart<'_> {
        let mut chart = BarChart::new(style, "run_a", "run_b");
        for (i, (a, b)) in [(87.4, 95.0), (131.2, 150.9), (190.5, 176.0), (60.0, 80.0), (210.0, 250.0)]
            .into_iter()
            .enumerate()
        {
            chart.push(i64::try_from(i).unwrap(), a, b);
        }
        chart
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn nice_steps() {
        assert!(close(nice_step(0.7), 1.0));
        assert!(close(nice_step(17.0), 20.0));
        assert!(close(nice_step(22.0), 25.0));
        assert!(close(nice_step(31.0), 50.0));
        assert!(close(nice_step(60.0), 100.0));
        assert!(close(nice_step(0.0), 1.0));
    }

    #[test]
    fn axis_ticks_cover_range() {
        let axis = YAxis::fit(250.0);
        let ticks = axis.ticks();
        assert_eq!(ticks.first(), Some(&0.0));
        assert!(*ticks.last().unwrap() <= axis.top);
        assert!(*ticks.last().unwrap() + axis.step > axis.top);
        assert!(ticks.len() <= 9);
        assert_eq!(axis.format(50.0), "50");
    }

    #[test]
    fn subnormal_max_keeps_positive_step() {
        let axis = YAxis::fit(4e-323);
        assert!(axis.step > 0.0 && axis.step.is_finite());
        let ticks = axis.ticks();
        assert!(ticks.len() >= 2 && ticks.len() <= MAX_TICK_LINES as usize);
        assert!(ticks.iter().all(|&v| v <= axis.top));
        assert!(axis.format(axis.step).contains('e'));
    }

    #[test]
    fn near_max_float_stays_finite() {
        let axis = YAxis::fit(1.75e308);
        assert!(axis.top.is_finite() && axis.top >= 1.75e308);
        assert!(axis.step > 0.0 && axis.step.is_finite());
        let ticks = axis.ticks();
        assert!(ticks.len() >= 2 && ticks.len() <= MAX_TICK_LINES as usize);
        assert!(ticks.iter().all(|v| v.is_finite()));
        assert_eq!(axis.format(1.5e308), "1.50e308");
    }

    #[test]
    fn underflowing_magnitude_keeps_raw_step() {
        assert!(nice_step(5e-324) > 0.0);
        assert!(nice_step(1e-320) > 0.0);
    }

    #[test]
    fn extreme_values_render() {
        let style = small_style();
        for v in [4e-323, 1.75e308] {
            let mut chart = BarChart::new(&style, "a", "b");
            chart.push(0, v, v);
            let canvas = chart.render();
            assert!(canvas.width() > 0 && canvas.height() > 0);
        }
    }

    #[test]
    fn fractional_ticks_keep_decimals() {
        let axis = YAxis::fit(1.0);
        assert!(close(axis.step, 0.2));
        assert_eq!(axis.format(axis.step), "0.2");
        assert_eq!(YAxis { top: 1.0, step: 0.25 }.format(0.75), "0.75");
        assert_eq!(decimals(2.5), 1);
        assert_eq!(decimals(100.0), 0);
    }

    #[test]
    fn annotation_selection() {
        let style = small_style();
        let chart = sample_chart(&style);
        // Pairs 0 and 3 are below 100; pairs 1, 2, 4 are not on the stride.
        assert!(chart.annotated().is_empty());

        let mut chart = BarChart::new(&style, "a", "b");
        for i in 0..7 {
            chart.push(i, if i == 3 { 120.0 } else { 50.0 }, 60.0);
        }
        chart.push(7, 10.0, 10.0);
        chart.series[1][6] = 101.0;
        assert_eq!(chart.annotated(), vec![3, 6]);
    }

    #[test]
    fn title_uses_labels_unless_overridden() {
        let style = small_style();
        assert_eq!(
            BarChart::new(&style, "base", "tuned").title,
            "MHA Performance Comparison: base vs tuned"
        );
        let custom = ChartStyle {
            title: Some("gfx942".into()),
            ..small_style()
        };
        assert_eq!(BarChart::new(&custom, "base", "tuned").title, "gfx942");
    }

    #[test]
    fn render_crops_to_content() {
        let style = small_style();
        let canvas = sample_chart(&style).render();
        // Cropping adds at most the padding ring to the 400x250 figure.
        assert!(canvas.width() <= 410 && canvas.height() <= 260);
        assert!(canvas.width() > 200 && canvas.height() > 100);

        // Padding ring stays white.
        for x in 0..canvas.width() {
            assert_eq!(canvas.pixel(x, 0), Some(Rgb::WHITE));
        }
    }

    #[test]
    fn render_draws_both_series() {
        let style = small_style();
        let canvas = sample_chart(&style).render();
        let blended = [
            style.colors[0].blend_over(Rgb::WHITE, style.bar_alpha),
            style.colors[1].blend_over(Rgb::WHITE, style.bar_alpha),
        ];
        let mut seen = [false, false];
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                let p = canvas.pixel(x, y);
                for s in 0..2 {
                    seen[s] |= p == Some(blended[s]);
                }
            }
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn save_writes_png() {
        let a = parse_str("BATCH HQ\n0 1 16 16 1024 1024 87.4\n1 1 16 16 2048 2048 131.2\n");
        let b = parse_str("BATCH HQ\n0 1 16 16 1024 1024 95.0\n1 1 16 16 2048 2048 150.9\n");
        let cmp = join(&a.rows, &b.rows);
        let style = small_style();
        let chart = BarChart::from_comparison(&style, &cmp, "a", "b");
        assert_eq!(chart.len(), 2);

        let dir = std::env::temp_dir().join(format!("mha-perf-chart-{}", std::process::id()));
        let path = dir.join("chart.png");
        let rendered = chart.save(&path).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), rendered.bytes);
        assert_eq!(&data[..8], &png::SIGNATURE);
        assert_eq!(u32::from_be_bytes(data[16..20].try_into().unwrap()), rendered.width);
        assert_eq!(u32::from_be_bytes(data[20..24].try_into().unwrap()), rendered.height);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn zero_and_nan_values_render() {
        let style = small_style();
        let mut chart = BarChart::new(&style, "a", "b");
        chart.push(0, 0.0, f64::NAN);
        chart.push(1, -5.0, 3.0);
        let canvas = chart.render();
        assert!(canvas.width() > 0 && canvas.height() > 0);
    }
}
