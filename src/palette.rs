// Color scheme handling for chart series and pie slices

use plotters::style::RGBColor;

/// Palette used when the AI reply carries no usable color scheme
pub const DEFAULT_PALETTE: [&str; 3] = ["#8884d8", "#82ca9d", "#ffc658"];

/// Pick the color for data point `index`, wrapping around the scheme.
pub fn color_at(scheme: &[String], index: usize) -> &str {
    if scheme.is_empty() {
        return DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()];
    }
    &scheme[index % scheme.len()]
}

/// Parse a color token into RGBColor, supporting hex (#RRGGBB, #RGB) and a few names
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "yellow" => Some(RGBColor(255, 255, 0)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "purple" => Some(RGBColor(128, 0, 128)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        _ => None,
    }
}

/// Like `parse_color`, but falls back to the first default palette color
pub fn resolve_color(color_str: &str) -> RGBColor {
    parse_color(color_str).unwrap_or(RGBColor(0x88, 0x84, 0xd8))
}

fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}
