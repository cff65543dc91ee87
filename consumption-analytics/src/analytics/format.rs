//! Human-readable magnitudes for axis labels and stat cards.

/// Values at or above this magnitude are shown in thousands with a `k` suffix.
pub const THOUSANDS_THRESHOLD: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec<'a> {
    /// Decimal places below the thousands threshold.
    pub decimals: usize,
    /// Decimal places for the `k` abbreviated branch.
    pub thousands_decimals: usize,
    /// Drop trailing zeros (and a dangling `.`) from the rendered number.
    pub trim_trailing_zeros: bool,
    pub unit: Option<&'a str>,
}

impl FormatSpec<'static> {
    /// Compact label for chart axes: `850`, `1.5k`, `12k`.
    pub const SHORT: Self = Self {
        decimals: 0,
        thousands_decimals: 1,
        trim_trailing_zeros: true,
        unit: None,
    };

    /// Stat card value: `850.0`, `1.5k`.
    pub const LONG: Self = Self {
        decimals: 1,
        thousands_decimals: 1,
        trim_trailing_zeros: false,
        unit: None,
    };
}

impl<'a> FormatSpec<'a> {
    pub fn with_unit(self, unit: &'a str) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }
}

pub fn format_value(value: f64, spec: &FormatSpec<'_>) -> String {
    let (scaled, decimals, suffix) = if value.abs() >= THOUSANDS_THRESHOLD {
        (value / 1000.0, spec.thousands_decimals, "k")
    } else {
        (value, spec.decimals, "")
    };

    let mut number = format!("{scaled:.decimals$}");
    if spec.trim_trailing_zeros && number.contains('.') {
        let trimmed = number.trim_end_matches('0').trim_end_matches('.').len();
        number.truncate(trimmed);
    }

    match spec.unit {
        Some(unit) if !unit.is_empty() => format!("{number}{suffix} {unit}"),
        _ => format!("{number}{suffix}"),
    }
}

pub fn format_short(value: f64) -> String {
    format_value(value, &FormatSpec::SHORT)
}

pub fn format_long(value: f64, unit: &str) -> String {
    format_value(value, &FormatSpec::LONG.with_unit(unit))
}
