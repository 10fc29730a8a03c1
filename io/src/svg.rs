//! Profile rendering as SVG.
//!
//! Draws the mean-deviation curve over axial position with a translucent
//! ±1σ band, axes, and a light grid.

use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tireprof_profile::ProfileTable;

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 50.0;

/// Render a profile table as an SVG string.
pub fn profile_svg(profile: &ProfileTable, width: f64, height: f64) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">
  <style>
    .label {{ font-family: Arial, sans-serif; font-size: 12px; fill: #666; }}
    .grid {{ stroke: #e0e0e0; stroke-width: 0.5; }}
  </style>
"#,
        width, height
    ));

    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;

    // Data bounds including the ±1σ band
    let mut min_x = f64::MAX;
    let mut max_x = f64::MIN;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;
    for bin in &profile.bins {
        min_x = min_x.min(bin.axial_center);
        max_x = max_x.max(bin.axial_center);
        min_y = min_y.min(bin.mean_deviation - bin.std_deviation);
        max_y = max_y.max(bin.mean_deviation + bin.std_deviation);
    }
    if profile.is_empty() {
        min_x = 0.0;
        max_x = 1.0;
        min_y = 0.0;
        max_y = 1.0;
    }

    // Pad bounds so the curve does not touch the frame
    let x_pad = (max_x - min_x).max(1e-9) * 0.05;
    let y_pad = (max_y - min_y).max(1e-9) * 0.1;
    min_x -= x_pad;
    max_x += x_pad;
    min_y -= y_pad;
    max_y += y_pad;

    let to_px = |x: f64| MARGIN_LEFT + (x - min_x) / (max_x - min_x) * plot_width;
    let to_py = |y: f64| height - MARGIN_BOTTOM - (y - min_y) / (max_y - min_y) * plot_height;

    // Grid
    for i in 0..=5 {
        let x = MARGIN_LEFT + i as f64 / 5.0 * plot_width;
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" class=\"grid\"/>\n",
            x,
            MARGIN_TOP,
            x,
            height - MARGIN_BOTTOM
        ));
        let y = MARGIN_TOP + i as f64 / 5.0 * plot_height;
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" class=\"grid\"/>\n",
            MARGIN_LEFT,
            y,
            width - MARGIN_RIGHT,
            y
        ));
    }

    // ±1σ band: upper edge forward, lower edge backward
    if profile.len() > 1 {
        let mut band = String::new();
        for bin in &profile.bins {
            band.push_str(&format!(
                "{:.1},{:.1} ",
                to_px(bin.axial_center),
                to_py(bin.mean_deviation + bin.std_deviation)
            ));
        }
        for bin in profile.bins.iter().rev() {
            band.push_str(&format!(
                "{:.1},{:.1} ",
                to_px(bin.axial_center),
                to_py(bin.mean_deviation - bin.std_deviation)
            ));
        }
        svg.push_str(&format!(
            "  <polygon points=\"{}\" fill=\"#1f77b4\" opacity=\"0.2\"/>\n",
            band.trim()
        ));
    }

    // Mean-deviation polyline
    if profile.len() > 1 {
        let mut points = String::new();
        for bin in &profile.bins {
            points.push_str(&format!(
                "{:.1},{:.1} ",
                to_px(bin.axial_center),
                to_py(bin.mean_deviation)
            ));
        }
        svg.push_str(&format!(
            "  <polyline points=\"{}\" fill=\"none\" stroke=\"#1f77b4\" stroke-width=\"1.5\"/>\n",
            points.trim()
        ));
    }

    // Axes
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"black\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        height - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"black\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        height - MARGIN_BOTTOM,
        width - MARGIN_RIGHT,
        height - MARGIN_BOTTOM
    ));

    // Axis labels
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" class=\"label\" text-anchor=\"middle\">X (axial)</text>\n",
        width / 2.0,
        height - 10.0
    ));
    svg.push_str(&format!(
        "  <text x=\"15\" y=\"{}\" class=\"label\" text-anchor=\"middle\" transform=\"rotate(-90, 15, {})\">Z' (radial, rim-zero)</text>\n",
        height / 2.0,
        height / 2.0
    ));

    svg.push_str("</svg>");
    svg
}

/// Save the profile curve as an 800×400 SVG file.
pub fn save_profile_svg(path: &Path, profile: &ProfileTable) -> Result<()> {
    let svg = profile_svg(profile, 800.0, 400.0);
    let mut file = File::create(path)?;
    file.write_all(svg.as_bytes())?;
    Ok(())
}
