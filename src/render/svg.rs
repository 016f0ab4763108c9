//! SVG Chart Markup
//!
//! Draws a [`ChartSpec`] as a standalone SVG document. Used by the headless
//! surface to keep a rendered copy of each chart and to rasterize it.

use super::{ChartSpec, Trace};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 450;

const MARGIN_TOP: f64 = 50.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 50.0;
const MARGIN_LEFT: f64 = 60.0;
const GRID_LINES: usize = 5;
const MAX_X_LABELS: usize = 10;

/// Plot area in pixel coordinates
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn full() -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: WIDTH as f64 - MARGIN_LEFT - MARGIN_RIGHT,
            height: HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM,
        }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Centre of category slot `i` out of `n`
    fn slot_x(&self, i: usize, n: usize) -> f64 {
        self.left + (i as f64 + 0.5) * self.slot_width(n)
    }

    fn slot_width(&self, n: usize) -> f64 {
        self.width / n.max(1) as f64
    }
}

/// Linear value axis
#[derive(Debug, Clone, Copy)]
struct Scale {
    min: f64,
    max: f64,
}

impl Scale {
    fn covering(values: impl Iterator<Item = f64>) -> Self {
        let (mut min, mut max) = (0.0_f64, 0.0_f64);
        for v in values.filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if (max - min).abs() < f64::EPSILON {
            max = min + 1.0;
        }
        Self { min, max }
    }

    fn y(&self, frame: &Frame, value: f64) -> f64 {
        frame.bottom() - (value - self.min) / (self.max - self.min) * frame.height
    }
}

/// Render a chart as an SVG document
pub fn render(chart: &ChartSpec) -> String {
    let theme = &chart.theme;
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}' viewBox='0 0 {w} {h}' font-family='sans-serif'>\n",
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        "  <rect width='{}' height='{}' fill='{}'/>\n",
        WIDTH, HEIGHT, theme.background
    ));
    svg.push_str(&format!(
        "  <text x='{}' y='30' fill='{}' font-size='18' text-anchor='middle'>{}</text>\n",
        WIDTH / 2,
        theme.text,
        escape(&chart.title)
    ));

    let frame = Frame::full();

    if chart.traces.iter().any(is_cartesian) {
        draw_cartesian(&mut svg, chart, &frame);
    }

    for trace in &chart.traces {
        match trace {
            Trace::Pie { labels, values, colors } => draw_pie(&mut svg, chart, labels, values, colors),
            Trace::Heatmap { x, y, z } => draw_heatmap(&mut svg, chart, &frame, x, y, z),
            _ => {}
        }
    }

    let polar: Vec<&Trace> = chart
        .traces
        .iter()
        .filter(|t| matches!(t, Trace::Polar { .. }))
        .collect();
    if !polar.is_empty() {
        draw_polar(&mut svg, chart, &polar);
    }

    svg.push_str("</svg>\n");
    svg
}

fn is_cartesian(trace: &Trace) -> bool {
    matches!(
        trace,
        Trace::Line { .. } | Trace::Bar { .. } | Trace::Waterfall { .. }
    )
}

fn draw_cartesian(svg: &mut String, chart: &ChartSpec, frame: &Frame) {
    let theme = &chart.theme;

    let values = chart.traces.iter().flat_map(|t| match t {
        Trace::Line { y, .. } | Trace::Bar { y, .. } => y.clone(),
        Trace::Waterfall { y, .. } => running_totals(y),
        _ => Vec::new(),
    });
    let scale = Scale::covering(values);

    let labels: &[String] = chart
        .traces
        .iter()
        .find_map(|t| match t {
            Trace::Line { x, .. } | Trace::Bar { x, .. } | Trace::Waterfall { x, .. } => {
                Some(x.as_slice())
            }
            _ => None,
        })
        .unwrap_or(&[]);
    let n = labels.len();

    // Grid and value ticks
    for i in 0..=GRID_LINES {
        let value = scale.min + (scale.max - scale.min) * i as f64 / GRID_LINES as f64;
        let y = scale.y(frame, value);
        svg.push_str(&format!(
            "  <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='1'/>\n",
            frame.left,
            y,
            frame.left + frame.width,
            y,
            theme.grid
        ));
        svg.push_str(&format!(
            "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='11' text-anchor='end'>{:.1}</text>\n",
            frame.left - 6.0,
            y + 4.0,
            theme.text,
            value
        ));
    }

    // Category labels, thinned out for long series
    let step = (n / MAX_X_LABELS).max(1);
    for (i, label) in labels.iter().enumerate().step_by(step) {
        svg.push_str(&format!(
            "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='11' text-anchor='middle'>{}</text>\n",
            frame.slot_x(i, n),
            frame.bottom() + 16.0,
            theme.text,
            escape(label)
        ));
    }

    draw_axis_titles(svg, chart, frame);

    for trace in &chart.traces {
        match trace {
            Trace::Line {
                y,
                color,
                width,
                marker_colors,
                ..
            } => {
                let points: Vec<(f64, f64)> = y
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (frame.slot_x(i, n), scale.y(frame, *v)))
                    .collect();
                let path: Vec<String> = points
                    .iter()
                    .map(|(x, y)| format!("{:.1},{:.1}", x, y))
                    .collect();
                svg.push_str(&format!(
                    "  <polyline points='{}' fill='none' stroke='{}' stroke-width='{}'/>\n",
                    path.join(" "),
                    color,
                    width
                ));
                for (i, (x, y)) in points.iter().enumerate() {
                    let marker = marker_colors
                        .as_ref()
                        .and_then(|m| m.get(i))
                        .unwrap_or(color);
                    svg.push_str(&format!(
                        "  <circle cx='{:.1}' cy='{:.1}' r='4' fill='{}'/>\n",
                        x, y, marker
                    ));
                }
            }
            Trace::Bar {
                y, colors, outline, ..
            } => {
                let bar_width = frame.slot_width(n) * 0.7;
                let zero = scale.y(frame, 0.0);
                for (i, v) in y.iter().enumerate() {
                    let top = scale.y(frame, *v);
                    let fill = colors
                        .get(i % colors.len().max(1))
                        .map(String::as_str)
                        .unwrap_or("#3498db");
                    svg.push_str(&format!(
                        "  <rect x='{:.1}' y='{:.1}' width='{:.1}' height='{:.1}' fill='{}'{}/>\n",
                        frame.slot_x(i, n) - bar_width / 2.0,
                        top.min(zero),
                        bar_width,
                        (zero - top).abs(),
                        fill,
                        outline
                            .as_ref()
                            .map(|o| format!(" stroke='{}' stroke-width='2'", o))
                            .unwrap_or_default()
                    ));
                }
            }
            Trace::Waterfall {
                y,
                increasing,
                decreasing,
                connector,
                ..
            } => {
                let bar_width = frame.slot_width(n) * 0.6;
                let mut level = 0.0;
                for (i, delta) in y.iter().enumerate() {
                    let next = level + delta;
                    let (from, to) = (scale.y(frame, level), scale.y(frame, next));
                    let fill = if *delta >= 0.0 { increasing } else { decreasing };
                    let x = frame.slot_x(i, n);
                    svg.push_str(&format!(
                        "  <rect x='{:.1}' y='{:.1}' width='{:.1}' height='{:.1}' fill='{}'/>\n",
                        x - bar_width / 2.0,
                        from.min(to),
                        bar_width,
                        (from - to).abs(),
                        fill
                    ));
                    if i + 1 < y.len() {
                        svg.push_str(&format!(
                            "  <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}'/>\n",
                            x + bar_width / 2.0,
                            to,
                            frame.slot_x(i + 1, n) - bar_width / 2.0,
                            to,
                            connector
                        ));
                    }
                    level = next;
                }
            }
            _ => {}
        }
    }
}

fn draw_axis_titles(svg: &mut String, chart: &ChartSpec, frame: &Frame) {
    let theme = &chart.theme;
    if let Some(title) = &chart.x_title {
        svg.push_str(&format!(
            "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='12' text-anchor='middle'>{}</text>\n",
            frame.left + frame.width / 2.0,
            HEIGHT as f64 - 10.0,
            theme.text,
            escape(title)
        ));
    }
    if let Some(title) = &chart.y_title {
        svg.push_str(&format!(
            "  <text x='14' y='{:.1}' fill='{}' font-size='12' text-anchor='middle' transform='rotate(-90 14 {:.1})'>{}</text>\n",
            frame.top + frame.height / 2.0,
            theme.text,
            frame.top + frame.height / 2.0,
            escape(title)
        ));
    }
}

fn draw_pie(svg: &mut String, chart: &ChartSpec, labels: &[String], values: &[f64], colors: &[String]) {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return;
    }

    let (cx, cy) = (WIDTH as f64 / 2.0, (HEIGHT as f64 + MARGIN_TOP) / 2.0);
    let radius = (HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM) / 2.0;
    let color = |i: usize| {
        colors
            .get(i % colors.len().max(1))
            .map(String::as_str)
            .unwrap_or("#3498db")
    };

    let mut angle = -std::f64::consts::FRAC_PI_2;
    for (i, value) in values.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }
        let share = value / total;
        if share >= 1.0 {
            svg.push_str(&format!(
                "  <circle cx='{:.1}' cy='{:.1}' r='{:.1}' fill='{}'/>\n",
                cx,
                cy,
                radius,
                color(i)
            ));
        } else {
            let sweep = share * std::f64::consts::TAU;
            let (x1, y1) = (cx + radius * angle.cos(), cy + radius * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
            let large_arc = if sweep > std::f64::consts::PI { 1 } else { 0 };
            svg.push_str(&format!(
                "  <path d='M {:.1} {:.1} L {:.1} {:.1} A {:.1} {:.1} 0 {} 1 {:.1} {:.1} Z' fill='{}'/>\n",
                cx, cy, x1, y1, radius, radius, large_arc, x2, y2,
                color(i)
            ));
        }

        let mid = angle + share * std::f64::consts::PI;
        if let Some(label) = labels.get(i) {
            svg.push_str(&format!(
                "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='12' text-anchor='middle'>{} ({:.0}%)</text>\n",
                cx + radius * 1.15 * mid.cos(),
                cy + radius * 1.15 * mid.sin(),
                chart.theme.text,
                escape(label),
                share * 100.0
            ));
        }
        angle += share * std::f64::consts::TAU;
    }
}

fn draw_heatmap(svg: &mut String, chart: &ChartSpec, frame: &Frame, x: &[String], y: &[String], z: &[Vec<f64>]) {
    let rows = z.len();
    let cols = x.len();
    if rows == 0 || cols == 0 {
        return;
    }

    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in z.iter().flatten() {
        min = min.min(*v);
        max = max.max(*v);
    }
    let span = if max > min { max - min } else { 1.0 };

    let cell_w = frame.width / cols as f64;
    let cell_h = frame.height / rows as f64;

    for (r, row) in z.iter().enumerate() {
        for (c, value) in row.iter().enumerate().take(cols) {
            svg.push_str(&format!(
                "  <rect x='{:.1}' y='{:.1}' width='{:.1}' height='{:.1}' fill='{}'/>\n",
                frame.left + c as f64 * cell_w,
                frame.top + r as f64 * cell_h,
                cell_w,
                cell_h,
                heat_color((value - min) / span)
            ));
        }
        if let Some(label) = y.get(r) {
            svg.push_str(&format!(
                "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='11' text-anchor='end'>{}</text>\n",
                frame.left - 6.0,
                frame.top + (r as f64 + 0.5) * cell_h + 4.0,
                chart.theme.text,
                escape(label)
            ));
        }
    }

    for (c, label) in x.iter().enumerate() {
        svg.push_str(&format!(
            "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='11' text-anchor='middle'>{}</text>\n",
            frame.left + (c as f64 + 0.5) * cell_w,
            frame.bottom() + 16.0,
            chart.theme.text,
            escape(label)
        ));
    }

    draw_axis_titles(svg, chart, frame);
}

fn draw_polar(svg: &mut String, chart: &ChartSpec, traces: &[&Trace]) {
    let theme = &chart.theme;
    let (cx, cy) = (WIDTH as f64 / 2.0, (HEIGHT as f64 + MARGIN_TOP) / 2.0);
    let radius = (HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM) / 2.0;

    let (theta, range) = match traces.first() {
        Some(Trace::Polar { theta, range, .. }) => (theta.as_slice(), *range),
        _ => return,
    };
    let spokes = theta.len();
    if spokes == 0 {
        return;
    }
    let span = if range.1 > range.0 { range.1 - range.0 } else { 1.0 };
    let point = |i: usize, value: f64| {
        let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::TAU / spokes as f64;
        let r = ((value - range.0) / span).clamp(0.0, 1.0) * radius;
        (cx + r * angle.cos(), cy + r * angle.sin())
    };

    for ring in 1..=GRID_LINES {
        svg.push_str(&format!(
            "  <circle cx='{:.1}' cy='{:.1}' r='{:.1}' fill='none' stroke='{}'/>\n",
            cx,
            cy,
            radius * ring as f64 / GRID_LINES as f64,
            theme.grid
        ));
    }
    for (i, label) in theta.iter().enumerate() {
        let (x, y) = point(i, range.1);
        svg.push_str(&format!(
            "  <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}'/>\n",
            cx, cy, x, y, theme.grid
        ));
        svg.push_str(&format!(
            "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='12' text-anchor='middle'>{}</text>\n",
            cx + (x - cx) * 1.12,
            cy + (y - cy) * 1.12,
            theme.text,
            escape(label)
        ));
    }

    for trace in traces {
        if let Trace::Polar { r, color, .. } = trace {
            let points: Vec<String> = r
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let (x, y) = point(i, *v);
                    format!("{:.1},{:.1}", x, y)
                })
                .collect();
            svg.push_str(&format!(
                "  <polygon points='{}' fill='{}' fill-opacity='0.3' stroke='{}' stroke-width='2'/>\n",
                points.join(" "),
                color,
                color
            ));
        }
    }
}

/// Cumulative levels reached by a waterfall, starting from zero
fn running_totals(deltas: &[f64]) -> Vec<f64> {
    let mut level = 0.0;
    let mut levels = Vec::with_capacity(deltas.len());
    for delta in deltas {
        level += delta;
        levels.push(level);
    }
    levels
}

/// Green to yellow to red, `t` in 0..=1
fn heat_color(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let (r, g, b) = if t < 0.5 {
        let k = t * 2.0;
        (26.0 + k * (254.0 - 26.0), 152.0 + k * (224.0 - 152.0), 80.0 + k * (139.0 - 80.0))
    } else {
        let k = (t - 0.5) * 2.0;
        (254.0 + k * (215.0 - 254.0), 224.0 + k * (48.0 - 224.0), 139.0 + k * (39.0 - 139.0))
    };
    format!("#{:02x}{:02x}{:02x}", r as u8, g as u8, b as u8)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}
