//! Compact number formatting for the HUD.

const SUFFIXES: [(f64, &str); 5] = [
    (1e15, "Qa"),
    (1e12, "T"),
    (1e9, "B"),
    (1e6, "M"),
    (1e3, "K"),
];

/// Format `n` with a magnitude suffix and up to two decimals (trailing zeros
/// stripped). Below 1000 the value is floored, unless it is under
/// `decimals_below`, in which case one decimal is shown.
pub fn format_num(n: f64, decimals_below: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    let abs = n.abs();
    for (i, &(threshold, suffix)) in SUFFIXES.iter().enumerate() {
        if abs >= threshold {
            // 999_999 would print as "1000K"; move up to the next suffix.
            let (threshold, suffix) = match i.checked_sub(1) {
                Some(up) if ((abs / threshold) * 100.0).round() / 100.0 >= 1000.0 => SUFFIXES[up],
                _ => (threshold, suffix),
            };
            let val = n / threshold;
            let text = if val.fract() == 0.0 {
                format!("{val:.0}")
            } else {
                trim_zeros(format!("{val:.2}"))
            };
            return format!("{text}{suffix}");
        }
    }
    if decimals_below > 0.0 && abs < decimals_below {
        return format!("{n:.1}");
    }
    format!("{}", n.floor())
}

fn trim_zeros(text: String) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
