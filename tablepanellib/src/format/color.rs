//! Threshold colors.

use crate::style::options::ColumnStyle;

/// Named palette: each hue from super-light to dark, primary in the middle.
const PALETTE: &[(&str, [&str; 5])] = &[
    ("red", ["#FF7383", "#F2495C", "#E02F44", "#C4162A", "#AD0317"]),
    ("orange", ["#FFB357", "#FF9830", "#FF780A", "#FA6400", "#E55400"]),
    ("yellow", ["#FFEE52", "#FADE2A", "#F2CC0C", "#E0B400", "#CC9D00"]),
    ("green", ["#96D98D", "#73BF69", "#56A64B", "#37872D", "#19730E"]),
    ("blue", ["#8AB8FF", "#5794F2", "#3274D9", "#1F60C4", "#1250B0"]),
    ("purple", ["#CA95E5", "#B877D9", "#A352CC", "#8F3BB8", "#7C2EA3"]),
];

const SHADE_PREFIXES: [&str; 5] = ["super-light-", "light-", "", "semi-dark-", "dark-"];

fn is_hex(color: &str) -> bool {
    color
        .strip_prefix('#')
        .map(|hex| matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Look up a palette color by name (`green`, `semi-dark-red`, ...).
pub fn named_color(name: &str) -> Option<&'static str> {
    PALETTE.iter().find_map(|(hue, shades)| {
        SHADE_PREFIXES
            .iter()
            .position(|prefix| {
                name.strip_prefix(prefix)
                    .map_or(false, |rest| rest == *hue)
            })
            .map(|idx| shades[idx])
    })
}

/// Hex and `rgb()`/`rgba()` colors pass through; palette names resolve to
/// hex; anything else is returned unchanged.
pub fn resolve_color(color: &str) -> String {
    if color.contains("rgb") || is_hex(color) {
        return color.to_string();
    }
    match named_color(color) {
        Some(hex) => hex.to_string(),
        None => {
            log::debug!("color: unknown color name '{}'", color);
            color.to_string()
        }
    }
}

/// Color for `value` under the style's thresholds.
///
/// Thresholds are walked from the highest down; the first one `value`
/// reaches picks `colors[i + 1]`, and values below all thresholds get
/// `colors[0]`. `None` when the style has no thresholds or the color slot
/// is missing.
pub fn color_for_value(value: f64, style: &ColumnStyle) -> Option<String> {
    let thresholds = style.thresholds.as_ref()?;
    let idx = thresholds
        .iter()
        .rposition(|&threshold| value >= threshold)
        .map_or(0, |pos| pos + 1);
    style.colors.get(idx).map(|color| resolve_color(color))
}
