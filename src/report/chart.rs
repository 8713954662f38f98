//! Benford bar chart rendered as SVG and base64-encoded for transport

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::pipeline::BenfordAnalysis;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 60.0;
const EMPIRICAL_COLOR: &str = "#1f77b4";
const BENFORD_COLOR: &str = "#ff7f0e";

/// Grouped bar chart of empirical vs. Benford frequency (%) per leading digit.
pub fn render_benford_chart(analysis: &BenfordAnalysis, title: &str) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let max_pct = analysis
        .empirical_probs
        .values()
        .chain(analysis.benford_probs.values())
        .fold(0.0f64, |m, p| m.max(p * 100.0));
    // Round the axis up to the next multiple of 5%
    let y_max = ((max_pct / 5.0).ceil() * 5.0).max(5.0);
    let y_of = |pct: f64| MARGIN_TOP + plot_h - pct / y_max * plot_h;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = write!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = write!(
        svg,
        r#"<text x="{}" y="30" text-anchor="middle" font-size="18">{}</text>"#,
        WIDTH / 2.0,
        xml_escape(title)
    );

    // Horizontal grid lines with percentage labels
    let mut tick = 0.0;
    while tick <= y_max + 1e-9 {
        let y = y_of(tick);
        let _ = write!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#cccccc" stroke-dasharray="4 3"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="12">{tick:.0}</text>"##,
            MARGIN_LEFT + plot_w,
            MARGIN_LEFT - 8.0,
            y + 4.0
        );
        tick += 5.0;
    }

    let slot = plot_w / 9.0;
    let bar_w = slot * 0.35;
    for (i, (digit, benford)) in analysis.benford_probs.iter().enumerate() {
        let empirical = analysis.empirical_probs.get(digit).copied().unwrap_or(0.0);
        let center = MARGIN_LEFT + slot * (i as f64 + 0.5);

        for (x, prob, color) in [
            (center - bar_w, empirical, EMPIRICAL_COLOR),
            (center, *benford, BENFORD_COLOR),
        ] {
            let y = y_of(prob * 100.0);
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_w:.1}" height="{:.1}" fill="{color}"/>"#,
                MARGIN_TOP + plot_h - y
            );
        }
        let _ = write!(
            svg,
            r#"<text x="{center:.1}" y="{:.1}" text-anchor="middle" font-size="13">{digit}</text>"#,
            MARGIN_TOP + plot_h + 20.0
        );
    }

    let _ = write!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{0:.1}" x2="{1:.1}" y2="{0:.1}" stroke="black"/><line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{0:.1}" stroke="black"/>"#,
        MARGIN_TOP + plot_h,
        MARGIN_LEFT + plot_w
    );
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14">First digit</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 15.0
    );
    let _ = write!(
        svg,
        r#"<text x="20" y="{0:.1}" text-anchor="middle" font-size="14" transform="rotate(-90 20 {0:.1})">Frequency (%)</text>"#,
        MARGIN_TOP + plot_h / 2.0
    );

    // Legend
    let legend_x = MARGIN_LEFT + plot_w - 190.0;
    for (row, (label, color)) in [
        ("Empirical distribution", EMPIRICAL_COLOR),
        ("Benford distribution", BENFORD_COLOR),
    ]
    .iter()
    .enumerate()
    {
        let y = MARGIN_TOP + 10.0 + row as f64 * 20.0;
        let _ = write!(
            svg,
            r#"<rect x="{legend_x:.1}" y="{y:.1}" width="14" height="14" fill="{color}"/><text x="{:.1}" y="{:.1}" font-size="13">{label}</text>"#,
            legend_x + 20.0,
            y + 12.0
        );
    }

    svg.push_str("</svg>");
    svg
}

/// Base64 of the chart, as returned in the `plot` field of a Benford response.
pub fn encode_plot(svg: &str) -> String {
    STANDARD.encode(svg.as_bytes())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::benford::benford_distribution;

    fn analysis() -> BenfordAnalysis {
        BenfordAnalysis {
            empirical_probs: benford_distribution(),
            benford_probs: benford_distribution(),
            chi_stat: 0.0,
            p_value: 1.0,
            total_count: 100,
        }
    }

    #[test]
    fn test_chart_has_eighteen_bars() {
        let svg = render_benford_chart(&analysis(), "Amount");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches(EMPIRICAL_COLOR).count(), 10); // 9 bars + legend
        assert_eq!(svg.matches(BENFORD_COLOR).count(), 10);
    }

    #[test]
    fn test_title_is_escaped() {
        let svg = render_benford_chart(&analysis(), "P&L <net>");
        assert!(svg.contains("P&amp;L &lt;net&gt;"));
    }

    #[test]
    fn test_encode_plot_is_base64() {
        assert_eq!(encode_plot("<svg/>"), "PHN2Zy8+");
    }
}
