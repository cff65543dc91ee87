//! Normalized plot geometry for consumption charts.
//!
//! Coordinates live in a `[0, 100] x [0, 100]` plot space so renderers can
//! scale them to any pixel size. The y axis follows SVG conventions: larger
//! values map to smaller `y`.

use std::{collections::BTreeSet, fmt::Write};

use serde::{Deserialize, Serialize};
use time::Date;

use super::format::format_short;

pub const PLOT_EXTENT: f64 = 100.0;

/// Fraction of the value range added above and below the data.
pub const VALUE_PADDING_RATIO: f64 = 0.1;

const TICK_FRACTIONS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: Date,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

impl ChartPoint {
    /// Height of a bar drawn from the bottom of the plot up to this point.
    pub fn bar_height(&self) -> f64 {
        PLOT_EXTENT - self.y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub value: f64,
    pub y: f64,
    pub label: String,
}

/// Padded value range backing the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueDomain {
    pub min: f64,
    pub max: f64,
}

impl ValueDomain {
    /// `None` for an empty input. A zero-width range is widened to 1 so a flat
    /// series sits at mid height.
    ///
    /// Range arithmetic runs on halved values so finite inputs near `f64::MAX`
    /// never produce an infinite domain.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values.into_iter().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })?;

        let half_range = max / 2.0 - min / 2.0;
        let half_range = if half_range == 0.0 { 0.5 } else { half_range };
        let padding = half_range * (2.0 * VALUE_PADDING_RATIO);

        Some(Self {
            min: (min - padding).max(f64::MIN),
            max: (max + padding).min(f64::MAX),
        })
    }

    fn half_span(&self) -> f64 {
        self.max / 2.0 - self.min / 2.0
    }

    /// Screen-space y for `value`, always inside `[0, PLOT_EXTENT]`.
    pub fn y_for(&self, value: f64) -> f64 {
        let half_span = self.half_span();
        if !(half_span > 0.0 && half_span.is_finite()) {
            return PLOT_EXTENT / 2.0;
        }
        let fraction = (value / 2.0 - self.min / 2.0) / half_span;
        (PLOT_EXTENT - fraction * PLOT_EXTENT).clamp(0.0, PLOT_EXTENT)
    }

    /// Ticks at 0/25/50/75/100% of the padded range, bottom to top.
    pub fn ticks(&self) -> Vec<AxisTick> {
        TICK_FRACTIONS
            .iter()
            .map(|&f| {
                let value = self.min * (1.0 - f) + self.max * f;
                AxisTick {
                    value,
                    y: PLOT_EXTENT - f * PLOT_EXTENT,
                    label: format_short(value),
                }
            })
            .collect()
    }
}

/// Horizontal position of slot `index` out of `count` evenly spaced slots.
pub fn x_at(index: usize, count: usize) -> f64 {
    if count > 1 {
        index as f64 / (count - 1) as f64 * PLOT_EXTENT
    } else {
        PLOT_EXTENT / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesGeometry {
    pub points: Vec<ChartPoint>,
    /// `points` as an SVG `polyline` attribute, for line charts.
    pub polyline: String,
    /// `bar_height` of each point, for bar charts.
    pub bar_heights: Vec<f64>,
    pub domain: Option<ValueDomain>,
    pub y_ticks: Vec<AxisTick>,
}

impl SeriesGeometry {
    fn new(points: Vec<ChartPoint>, domain: ValueDomain, y_ticks: Vec<AxisTick>) -> Self {
        Self {
            polyline: svg_points(&points),
            bar_heights: points.iter().map(ChartPoint::bar_height).collect(),
            points,
            domain: Some(domain),
            y_ticks,
        }
    }

    fn empty() -> Self {
        Self {
            points: Vec::new(),
            polyline: String::new(),
            bar_heights: Vec::new(),
            domain: None,
            y_ticks: Vec::new(),
        }
    }
}

/// Geometry for a single series, spaced by position in the input.
pub fn map_series(points: &[DataPoint]) -> SeriesGeometry {
    let Some(domain) = ValueDomain::from_values(points.iter().map(|p| p.value)) else {
        return SeriesGeometry::empty();
    };

    let n = points.len();
    let mapped = points
        .iter()
        .enumerate()
        .map(|(i, p)| ChartPoint {
            x: x_at(i, n),
            y: domain.y_for(p.value),
        })
        .collect();

    SeriesGeometry::new(mapped, domain, domain.ticks())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YDomain {
    /// One value range across every series, for overlays.
    #[default]
    Shared,
    /// Each series scaled to its own range, for side-by-side panels.
    Independent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub key: String,
    pub points: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedGeometry {
    pub key: String,
    pub geometry: SeriesGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonChart {
    pub y_domain: YDomain,
    /// Sorted union of every series' dates; index `i` sits at `x_at(i, dates.len())`.
    pub dates: Vec<Date>,
    pub series: Vec<KeyedGeometry>,
    /// Shared axis ticks. Empty for independent domains, where each series carries its own.
    pub y_ticks: Vec<AxisTick>,
}

/// Geometry for several series on a common date axis.
///
/// A point's x comes from its date's position in the union of all dates, so
/// a series missing a date simply has no point there.
pub fn map_comparison(series: &[Series], y_domain: YDomain) -> ComparisonChart {
    let dates: Vec<Date> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let shared = match y_domain {
        YDomain::Shared => ValueDomain::from_values(
            series.iter().flat_map(|s| s.points.iter().map(|p| p.value)),
        ),
        YDomain::Independent => None,
    };

    let mapped = series
        .iter()
        .map(|s| {
            let domain = match y_domain {
                YDomain::Shared => shared,
                YDomain::Independent => ValueDomain::from_values(s.points.iter().map(|p| p.value)),
            };
            let geometry = match domain {
                Some(domain) => {
                    let points = s
                        .points
                        .iter()
                        .filter_map(|p| {
                            let slot = dates.binary_search(&p.date).ok()?;
                            Some(ChartPoint {
                                x: x_at(slot, dates.len()),
                                y: domain.y_for(p.value),
                            })
                        })
                        .collect();
                    let y_ticks = match y_domain {
                        YDomain::Shared => Vec::new(),
                        YDomain::Independent => domain.ticks(),
                    };
                    SeriesGeometry::new(points, domain, y_ticks)
                }
                None => SeriesGeometry::empty(),
            };
            KeyedGeometry {
                key: s.key.clone(),
                geometry,
            }
        })
        .collect();

    ComparisonChart {
        y_domain,
        dates,
        series: mapped,
        y_ticks: shared.map(|d| d.ticks()).unwrap_or_default(),
    }
}

/// `x,y` pairs separated by spaces, as accepted by an SVG `polyline`.
pub fn svg_points(points: &[ChartPoint]) -> String {
    let mut out = String::new();
    for p in points {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{:.2},{:.2}", p.x, p.y);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn points(values: &[f64]) -> Vec<DataPoint> {
        let start = date!(2024 - 01 - 01);
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DataPoint {
                date: start + time::Duration::days(i as i64),
                value,
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn flat_series_sits_at_mid_height() {
        let g = map_series(&points(&[10.0, 10.0, 10.0]));
        let xs: Vec<f64> = g.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);
        assert!(g.points.iter().all(|p| approx(p.y, 50.0)));
    }

    #[test]
    fn single_point_is_centered() {
        let g = map_series(&points(&[7.0]));
        assert_eq!(g.points.len(), 1);
        assert_eq!(g.points[0].x, 50.0);
        assert!(approx(g.points[0].y, 50.0));
    }

    #[test]
    fn empty_series_has_no_geometry() {
        let g = map_series(&[]);
        assert!(g.points.is_empty());
        assert!(g.domain.is_none());
        assert!(g.y_ticks.is_empty());
    }

    #[test]
    fn padding_keeps_extremes_inside_plot() {
        let g = map_series(&points(&[0.0, 50.0, 100.0, 25.0]));
        for p in &g.points {
            assert!((0.0..=100.0).contains(&p.y));
        }
        // min maps to 100 - 10/120*100, max to 100 - 110/120*100
        assert!(approx(g.points[0].y, 100.0 - 10.0 / 120.0 * 100.0));
        assert!(approx(g.points[2].y, 100.0 - 110.0 / 120.0 * 100.0));
        assert!(g.points[2].y < g.points[0].y);
    }

    #[test]
    fn ticks_cover_padded_range() {
        let domain = ValueDomain::from_values([0.0, 1000.0]).unwrap();
        let ticks = domain.ticks();
        assert_eq!(ticks.len(), 5);
        assert!(approx(ticks[0].value, -100.0));
        assert_eq!(ticks[0].y, 100.0);
        assert!(approx(ticks[4].value, 1100.0));
        assert_eq!(ticks[4].y, 0.0);
        assert_eq!(ticks[2].label, "500");
        assert_eq!(ticks[4].label, "1.1k");
    }

    #[test]
    fn comparison_uses_union_of_dates() {
        let a = Series {
            key: "a".to_string(),
            points: vec![
                DataPoint {
                    date: date!(2024 - 01 - 01),
                    value: 10.0,
                },
                DataPoint {
                    date: date!(2024 - 03 - 01),
                    value: 30.0,
                },
            ],
        };
        let b = Series {
            key: "b".to_string(),
            points: vec![DataPoint {
                date: date!(2024 - 02 - 01),
                value: 20.0,
            }],
        };

        let chart = map_comparison(&[a, b], YDomain::Shared);
        assert_eq!(chart.dates.len(), 3);
        let a_xs: Vec<f64> = chart.series[0].geometry.points.iter().map(|p| p.x).collect();
        assert_eq!(a_xs, vec![0.0, 100.0]);
        assert_eq!(chart.series[1].geometry.points[0].x, 50.0);
        // shared domain: the middle value sits at mid height
        assert!(approx(chart.series[1].geometry.points[0].y, 50.0));
        assert_eq!(chart.y_ticks.len(), 5);
    }

    #[test]
    fn independent_domains_scale_each_series() {
        let small = Series {
            key: "small".to_string(),
            points: points(&[1.0, 2.0]),
        };
        let large = Series {
            key: "large".to_string(),
            points: points(&[1000.0, 2000.0]),
        };

        let chart = map_comparison(&[small, large], YDomain::Independent);
        assert!(chart.y_ticks.is_empty());
        for s in &chart.series {
            assert_eq!(s.geometry.y_ticks.len(), 5);
            let ys: Vec<f64> = s.geometry.points.iter().map(|p| p.y).collect();
            assert!(approx(ys[0], 100.0 - 10.0 / 120.0 * 100.0));
            assert!(approx(ys[1], 100.0 - 110.0 / 120.0 * 100.0));
        }
    }

    #[test]
    fn empty_series_in_comparison_is_kept_without_points() {
        let chart = map_comparison(
            &[
                Series {
                    key: "empty".to_string(),
                    points: Vec::new(),
                },
                Series {
                    key: "one".to_string(),
                    points: points(&[5.0]),
                },
            ],
            YDomain::Independent,
        );
        assert!(chart.series[0].geometry.points.is_empty());
        assert_eq!(chart.series[1].geometry.points[0].x, 50.0);
    }

    #[test]
    fn bars_grow_from_bottom() {
        let p = ChartPoint { x: 0.0, y: 30.0 };
        assert_eq!(p.bar_height(), 70.0);
    }

    #[test]
    fn extreme_finite_values_stay_on_the_plot() {
        let g = map_series(&points(&[-1e308, 1e308]));
        let domain = g.domain.unwrap();
        assert!(domain.min.is_finite() && domain.max.is_finite());
        for p in &g.points {
            assert!(p.y.is_finite());
            assert!((0.0..=100.0).contains(&p.y));
        }
        assert!(approx(g.points[0].y, 100.0 - 10.0 / 120.0 * 100.0));
        assert!(approx(g.points[1].y, 100.0 - 110.0 / 120.0 * 100.0));
        assert!(g.y_ticks.iter().all(|t| t.value.is_finite()));
    }

    #[test]
    fn values_at_the_f64_limits_are_clamped_into_the_plot() {
        let g = map_series(&points(&[f64::MIN, 0.0, f64::MAX]));
        for p in &g.points {
            assert!((0.0..=100.0).contains(&p.y));
        }
        assert!(approx(g.points[1].y, 50.0));

        let flat = map_series(&points(&[1e300, 1e300]));
        assert!(flat.points.iter().all(|p| approx(p.y, 50.0)));
    }

    #[test]
    fn geometry_carries_polyline_and_bar_heights() {
        let g = map_series(&points(&[10.0, 10.0]));
        assert_eq!(g.polyline, "0.00,50.00 100.00,50.00");
        assert_eq!(g.bar_heights.len(), 2);
        assert!(g.bar_heights.iter().all(|h| approx(*h, 50.0)));
        assert!(SeriesGeometry::empty().polyline.is_empty());
    }

    #[test]
    fn svg_points_are_space_separated_pairs() {
        let pts = [ChartPoint { x: 0.0, y: 50.0 }, ChartPoint { x: 100.0, y: 12.5 }];
        assert_eq!(svg_points(&pts), "0.00,50.00 100.00,12.50");
    }
}
