//! Inline SVG price chart for a checked position.

use crate::domain::position::PositionSpec;
use crate::domain::price_bar::PriceBar;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 350.0;
const PADDING: f64 = 40.0;

struct Scale {
    min: f64,
    max: f64,
    step_x: f64,
}

impl Scale {
    fn new(bars: &[PriceBar], levels: &[f64]) -> Self {
        let min = bars
            .iter()
            .map(|b| b.low)
            .chain(levels.iter().copied())
            .fold(f64::INFINITY, f64::min);
        let max = bars
            .iter()
            .map(|b| b.high)
            .chain(levels.iter().copied())
            .fold(f64::NEG_INFINITY, f64::max);
        let plot_width = WIDTH - 2.0 * PADDING;
        let step_x = if bars.len() > 1 {
            plot_width / (bars.len() - 1) as f64
        } else {
            0.0
        };
        Self { min, max, step_x }
    }

    fn x(&self, i: usize) -> f64 {
        PADDING + i as f64 * self.step_x
    }

    fn y(&self, price: f64) -> f64 {
        let plot_height = HEIGHT - 2.0 * PADDING;
        let range = self.max - self.min;
        if range > 0.0 {
            HEIGHT - PADDING - (price - self.min) / range * plot_height
        } else {
            HEIGHT / 2.0
        }
    }
}

fn polyline(bars: &[PriceBar], scale: &Scale, value: fn(&PriceBar) -> f64, style: &str) -> String {
    let points: Vec<String> = bars
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{:.1},{:.1}", scale.x(i), scale.y(value(b))))
        .collect();
    format!(
        r#"<polyline fill="none" {} points="{}"/>"#,
        style,
        points.join(" ")
    )
}

fn level_line(scale: &Scale, price: f64, color: &str, label: &str) -> String {
    let y = scale.y(price);
    format!(
        r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2" stroke-dasharray="6 4"/><text x="{:.1}" y="{:.1}" fill="{}" font-size="11">{}: {:.2}</text>"#,
        PADDING,
        y,
        WIDTH - PADDING,
        y,
        color,
        PADDING + 4.0,
        y - 4.0,
        color,
        label,
        price
    )
}

/// Close, high and low series with horizontal entry, target and stop levels.
pub fn price_chart_svg(bars: &[PriceBar], position: &PositionSpec) -> String {
    if bars.is_empty() {
        return "<p>No price data available.</p>".to_string();
    }

    let mut levels = vec![position.entry_price, position.target1, position.stop_price];
    levels.extend(position.target2);
    let scale = Scale::new(bars, &levels);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.0} {:.0}" width="{:.0}" height="{:.0}">"#,
        WIDTH, HEIGHT, WIDTH, HEIGHT
    );
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="20" font-size="14">{} {} position</text>"#,
        PADDING,
        position.symbol,
        position.direction()
    ));
    svg.push_str(&polyline(
        bars,
        &scale,
        |b| b.high,
        r#"stroke="green" stroke-opacity="0.5" stroke-dasharray="3 3""#,
    ));
    svg.push_str(&polyline(
        bars,
        &scale,
        |b| b.low,
        r#"stroke="red" stroke-opacity="0.5" stroke-dasharray="3 3""#,
    ));
    svg.push_str(&polyline(bars, &scale, |b| b.close, r#"stroke="blue" stroke-width="2""#));

    svg.push_str(&level_line(&scale, position.entry_price, "orange", "Entry"));
    svg.push_str(&level_line(&scale, position.target1, "green", "Target 1"));
    if let Some(t2) = position.target2 {
        svg.push_str(&level_line(&scale, t2, "teal", "Target 2"));
    }
    svg.push_str(&level_line(&scale, position.stop_price, "red", "Stop"));
    svg.push_str("</svg>");
    svg
}
