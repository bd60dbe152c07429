//! Unit-aware number formatting.
//!
//! Units are looked up by their dashboard id (`short`, `bytes`, `ms`, ...).
//! Scaling units divide by a fixed factor until the value fits and append the
//! matching suffix; time units step through ms/s/min/hour/day/week/year.

use crate::data::value::number_to_string;

const SHORT: &[&str] = &[
    "", " K", " Mil", " Bil", " Tri", " Quadr", " Quint", " Sext", " Sept",
];
const COUNT: &[&str] = &["", "K", "M", "B", "T"];
const IEC_BYTES: &[&str] = &[
    " B", " KiB", " MiB", " GiB", " TiB", " PiB", " EiB", " ZiB", " YiB",
];
const IEC_BITS: &[&str] = &[
    " b", " Kib", " Mib", " Gib", " Tib", " Pib", " Eib", " Zib", " Yib",
];
const SI_BYTES: &[&str] = &[" B", " kB", " MB", " GB", " TB", " PB", " EB", " ZB", " YB"];
const SI_BPS: &[&str] = &[
    " bps", " kbps", " Mbps", " Gbps", " Tbps", " Pbps", " Ebps", " Zbps", " Ybps",
];
const SI_BYTES_PER_SEC: &[&str] = &[
    " B/s", " kB/s", " MB/s", " GB/s", " TB/s", " PB/s", " EB/s", " ZB/s", " YB/s",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

/// A resolved value formatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueFormat {
    /// Fixed decimals plus an optional suffix
    Fixed(&'static str),
    /// Multiply by `scale`, fixed decimals, then suffix
    Scaled {
        scale: f64,
        suffix: &'static str,
    },
    /// Divide by `factor` while the value exceeds it
    Units {
        factor: f64,
        units: &'static [&'static str],
    },
    /// Count units with a trailing symbol (`1.5K ops`)
    Count(&'static str),
    /// Count units with a leading symbol (`$1.5K`)
    Currency(&'static str),
    Time(TimeUnit),
}

impl ValueFormat {
    /// Look up a unit id; unknown ids format as `none`.
    pub fn from_unit(unit: Option<&str>) -> Self {
        let unit = match unit {
            Some(u) if !u.is_empty() => u,
            _ => return ValueFormat::Fixed(""),
        };
        match unit {
            "none" => ValueFormat::Fixed(""),
            "short" => ValueFormat::Units {
                factor: 1000.0,
                units: SHORT,
            },
            "percent" => ValueFormat::Fixed("%"),
            "percentunit" => ValueFormat::Scaled {
                scale: 100.0,
                suffix: "%",
            },
            "humidity" => ValueFormat::Fixed(" %H"),
            "celsius" => ValueFormat::Fixed(" °C"),
            "fahrenheit" => ValueFormat::Fixed(" °F"),
            "bytes" => ValueFormat::Units {
                factor: 1024.0,
                units: IEC_BYTES,
            },
            "kbytes" => ValueFormat::Units {
                factor: 1024.0,
                units: &IEC_BYTES[1..],
            },
            "mbytes" => ValueFormat::Units {
                factor: 1024.0,
                units: &IEC_BYTES[2..],
            },
            "gbytes" => ValueFormat::Units {
                factor: 1024.0,
                units: &IEC_BYTES[3..],
            },
            "decbytes" => ValueFormat::Units {
                factor: 1000.0,
                units: SI_BYTES,
            },
            "deckbytes" => ValueFormat::Units {
                factor: 1000.0,
                units: &SI_BYTES[1..],
            },
            "decmbytes" => ValueFormat::Units {
                factor: 1000.0,
                units: &SI_BYTES[2..],
            },
            "decgbytes" => ValueFormat::Units {
                factor: 1000.0,
                units: &SI_BYTES[3..],
            },
            "bits" => ValueFormat::Units {
                factor: 1024.0,
                units: IEC_BITS,
            },
            "bps" => ValueFormat::Units {
                factor: 1000.0,
                units: SI_BPS,
            },
            "Bps" => ValueFormat::Units {
                factor: 1000.0,
                units: SI_BYTES_PER_SEC,
            },
            "ops" => ValueFormat::Count("ops"),
            "reqps" => ValueFormat::Count("reqps"),
            "currencyUSD" => ValueFormat::Currency("$"),
            "currencyEUR" => ValueFormat::Currency("€"),
            "ns" => ValueFormat::Time(TimeUnit::Nanoseconds),
            "µs" => ValueFormat::Time(TimeUnit::Microseconds),
            "ms" => ValueFormat::Time(TimeUnit::Milliseconds),
            "s" => ValueFormat::Time(TimeUnit::Seconds),
            "m" => ValueFormat::Time(TimeUnit::Minutes),
            "h" => ValueFormat::Time(TimeUnit::Hours),
            "d" => ValueFormat::Time(TimeUnit::Days),
            other => {
                log::debug!("units: unknown unit '{}', using none", other);
                ValueFormat::Fixed("")
            }
        }
    }

    /// Format `value` with `decimals` fraction digits (integer when `None`).
    pub fn format(&self, value: f64, decimals: Option<usize>) -> String {
        match *self {
            ValueFormat::Fixed(suffix) => format!("{}{}", to_fixed(value, decimals), suffix),
            ValueFormat::Scaled { scale, suffix } => {
                format!("{}{}", to_fixed(value * scale, decimals), suffix)
            }
            ValueFormat::Units { factor, units } => scaled_units(value, decimals, factor, units),
            ValueFormat::Count(symbol) => {
                format!("{} {}", scaled_units(value, decimals, 1000.0, COUNT), symbol)
            }
            ValueFormat::Currency(symbol) => {
                format!("{}{}", symbol, scaled_units(value, decimals, 1000.0, COUNT))
            }
            ValueFormat::Time(unit) => format_time(value, decimals, unit),
        }
    }
}

/// Round half up, the way `Math.round` does.
fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Fixed-point rendering.
///
/// Without `decimals` the value is rounded to an integer. With `decimals` the
/// result is rounded to that many places and padded with trailing zeros.
/// Zero and exponent forms are returned unpadded.
pub fn to_fixed(value: f64, decimals: Option<usize>) -> String {
    let factor = match decimals {
        Some(d) if d > 0 => 10f64.powi(d as i32),
        _ => 1.0,
    };
    let formatted = number_to_string(js_round(value * factor) / factor);
    if formatted.contains('e') || value == 0.0 || !value.is_finite() {
        return formatted;
    }

    if let Some(decimals) = decimals {
        let precision = formatted
            .find('.')
            .map_or(0, |pos| formatted.len() - pos - 1);
        if precision < decimals {
            let mut padded = formatted;
            if precision == 0 {
                padded.push('.');
            }
            padded.push_str(&"0".repeat(decimals - precision));
            return padded;
        }
    }
    formatted
}

fn scaled_units(value: f64, decimals: Option<usize>, factor: f64, units: &[&str]) -> String {
    let mut size = value;
    let mut steps = 0;
    while size.abs() >= factor {
        steps += 1;
        size /= factor;
        if steps >= units.len() {
            return "NA".to_string();
        }
    }
    format!("{}{}", to_fixed(size, decimals), units[steps])
}

fn with_suffix(value: f64, decimals: Option<usize>, suffix: &str) -> String {
    format!("{}{}", to_fixed(value, decimals), suffix)
}

fn format_time(value: f64, decimals: Option<usize>, unit: TimeUnit) -> String {
    let abs = value.abs();
    match unit {
        TimeUnit::Nanoseconds => {
            if abs < 1000.0 {
                with_suffix(value, decimals, " ns")
            } else if abs < 1e6 {
                with_suffix(value / 1e3, decimals, " µs")
            } else if abs < 1e9 {
                with_suffix(value / 1e6, decimals, " ms")
            } else if abs < 60e9 {
                with_suffix(value / 1e9, decimals, " s")
            } else {
                with_suffix(value / 60e9, decimals, " min")
            }
        }
        TimeUnit::Microseconds => {
            if abs < 1000.0 {
                with_suffix(value, decimals, " µs")
            } else if abs < 1e6 {
                with_suffix(value / 1e3, decimals, " ms")
            } else {
                with_suffix(value / 1e6, decimals, " s")
            }
        }
        TimeUnit::Milliseconds => {
            if abs < 1000.0 {
                with_suffix(value, decimals, " ms")
            } else if abs < 60_000.0 {
                with_suffix(value / 1000.0, decimals, " s")
            } else if abs < 3_600_000.0 {
                with_suffix(value / 60_000.0, decimals, " min")
            } else if abs < 86_400_000.0 {
                with_suffix(value / 3_600_000.0, decimals, " hour")
            } else if abs < 31_536_000_000.0 {
                with_suffix(value / 86_400_000.0, decimals, " day")
            } else {
                with_suffix(value / 31_536_000_000.0, decimals, " year")
            }
        }
        TimeUnit::Seconds => {
            if abs < 0.000_001 {
                with_suffix(value * 1e9, decimals, " ns")
            } else if abs < 0.001 {
                with_suffix(value * 1e6, decimals, " µs")
            } else if abs < 1.0 {
                with_suffix(value * 1e3, decimals, " ms")
            } else if abs < 60.0 {
                with_suffix(value, decimals, " s")
            } else if abs < 3600.0 {
                with_suffix(value / 60.0, decimals, " min")
            } else if abs < 86_400.0 {
                with_suffix(value / 3600.0, decimals, " hour")
            } else if abs < 604_800.0 {
                with_suffix(value / 86_400.0, decimals, " day")
            } else if abs < 31_536_000.0 {
                with_suffix(value / 604_800.0, decimals, " week")
            } else {
                with_suffix(value / 3.15569e7, decimals, " year")
            }
        }
        TimeUnit::Minutes => {
            if abs < 60.0 {
                with_suffix(value, decimals, " min")
            } else if abs < 1440.0 {
                with_suffix(value / 60.0, decimals, " hour")
            } else if abs < 10_080.0 {
                with_suffix(value / 1440.0, decimals, " day")
            } else if abs < 604_800.0 {
                with_suffix(value / 10_080.0, decimals, " week")
            } else {
                with_suffix(value / 5.25948e5, decimals, " year")
            }
        }
        TimeUnit::Hours => {
            if abs < 24.0 {
                with_suffix(value, decimals, " hour")
            } else if abs < 168.0 {
                with_suffix(value / 24.0, decimals, " day")
            } else if abs < 8760.0 {
                with_suffix(value / 168.0, decimals, " week")
            } else {
                with_suffix(value / 8760.0, decimals, " year")
            }
        }
        TimeUnit::Days => {
            if abs < 7.0 {
                with_suffix(value, decimals, " day")
            } else if abs < 365.0 {
                with_suffix(value / 7.0, decimals, " week")
            } else {
                with_suffix(value / 365.0, decimals, " year")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(unit: &str, value: f64, decimals: Option<usize>) -> String {
        ValueFormat::from_unit(Some(unit)).format(value, decimals)
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.5, None), "2");
        assert_eq!(to_fixed(2.5, None), "3");
        assert_eq!(to_fixed(-2.5, None), "-2");
        assert_eq!(to_fixed(3.14159, Some(2)), "3.14");
        assert_eq!(to_fixed(3.0, Some(2)), "3.00");
        assert_eq!(to_fixed(3.1, Some(3)), "3.100");
        assert_eq!(to_fixed(0.0, Some(2)), "0");
        assert_eq!(to_fixed(7.6, Some(0)), "8");
    }

    #[test]
    fn test_short() {
        assert_eq!(fmt("short", 1234.5, Some(2)), "1.23 K");
        assert_eq!(fmt("short", 999.0, None), "999");
        assert_eq!(fmt("short", 2_500_000.0, Some(1)), "2.5 Mil");
        assert_eq!(fmt("short", -1500.0, Some(1)), "-1.5 K");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(fmt("bytes", 1024.0, None), "1 KiB");
        assert_eq!(fmt("bytes", 512.0, None), "512 B");
        assert_eq!(fmt("kbytes", 2048.0, Some(1)), "2.0 MiB");
        assert_eq!(fmt("decbytes", 1500.0, Some(1)), "1.5 kB");
    }

    #[test]
    fn test_percent_units() {
        assert_eq!(fmt("percent", 42.0, Some(1)), "42.0%");
        assert_eq!(fmt("percentunit", 0.5, None), "50%");
    }

    #[test]
    fn test_counts_and_currency() {
        assert_eq!(fmt("ops", 1500.0, Some(1)), "1.5K ops");
        assert_eq!(fmt("currencyUSD", 1500.0, Some(2)), "$1.50K");
    }

    #[test]
    fn test_time_units() {
        assert_eq!(fmt("ms", 500.0, None), "500 ms");
        assert_eq!(fmt("ms", 1500.0, Some(1)), "1.5 s");
        assert_eq!(fmt("ms", 120_000.0, None), "2 min");
        assert_eq!(fmt("s", 0.5, None), "500 ms");
        assert_eq!(fmt("s", 7200.0, None), "2 hour");
        assert_eq!(fmt("h", 48.0, None), "2 day");
    }

    #[test]
    fn test_unknown_unit_is_none() {
        assert_eq!(fmt("furlongs", 12.345, Some(1)), "12.3");
        assert_eq!(ValueFormat::from_unit(None).format(5.0, None), "5");
    }
}
