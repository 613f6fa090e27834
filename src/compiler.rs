use crate::infer::{infer_from_rows, AxisKeys};
use crate::ir::{BarPlan, ChartPlan, LinePlan, PiePlan, PieSlice, Placeholder};
use crate::model::{ChartSpec, Row};
use crate::palette::color_at;
use serde_json::Value;
use std::f64::consts::TAU;
use tracing::debug;

/// Curve samples drawn between two neighbouring line points
const CURVE_SAMPLES: usize = 16;
/// Largest magnitude a y-domain bound may take, so the span stays finite
const DOMAIN_LIMIT: f64 = f64::MAX / 4.0;

// =============================================================================
// Dispatch
// =============================================================================

/// Compile a chart spec into a render plan.
///
/// Empty rows and chart types other than bar/line/pie compile to a placeholder.
pub fn compile_chart(spec: &ChartSpec) -> ChartPlan {
    if spec.rows().is_empty() {
        return ChartPlan::Placeholder(Placeholder::NoData);
    }

    let keys = infer_from_rows(spec.rows());
    debug!(name_key = %keys.name_key, value_key = %keys.value_key, "inferred axis keys");

    match spec.chart_type().as_str().to_lowercase().as_str() {
        "bar" => ChartPlan::Bar(compile_bar(spec, keys)),
        "line" => ChartPlan::Line(compile_line(spec, keys)),
        "pie" => ChartPlan::Pie(compile_pie(spec, keys)),
        _ => ChartPlan::Placeholder(Placeholder::Unsupported(spec.chart_type().to_string())),
    }
}

fn compile_bar(spec: &ChartSpec, keys: AxisKeys) -> BarPlan {
    let (categories, values) = extract_series(spec.rows(), &keys);

    BarPlan {
        y_domain: value_domain(&values),
        categories,
        values,
        color: color_at(spec.color_scheme(), 0).to_string(),
        show_grid: true,
        keys,
    }
}

fn compile_line(spec: &ChartSpec, keys: AxisKeys) -> LinePlan {
    let (categories, values) = extract_series(spec.rows(), &keys);

    let segments = present_runs(&values)
        .iter()
        .map(|run| monotone_curve(run, CURVE_SAMPLES))
        .collect();

    LinePlan {
        y_domain: value_domain(&values),
        categories,
        values,
        segments,
        color: color_at(spec.color_scheme(), 0).to_string(),
        show_grid: true,
        keys,
    }
}

fn compile_pie(spec: &ChartSpec, keys: AxisKeys) -> PiePlan {
    let (names, values) = extract_series(spec.rows(), &keys);

    // Missing and negative magnitudes count as empty slices
    let magnitudes: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0).max(0.0)).collect();

    // Shares relative to the largest slice; summing raw values can overflow
    let largest = magnitudes.iter().copied().fold(0.0_f64, f64::max);
    let shares: Vec<f64> = magnitudes
        .iter()
        .map(|m| if largest > 0.0 { m / largest } else { 0.0 })
        .collect();
    let total: f64 = shares.iter().sum();

    let mut angle = 0.0;
    let slices = names
        .into_iter()
        .zip(magnitudes.into_iter().zip(shares))
        .enumerate()
        .map(|(index, (name, (value, share)))| {
            let percent = if total > 0.0 { share / total } else { 0.0 };
            let start_angle = angle;
            angle += percent * TAU;

            PieSlice {
                label: slice_label(&name, percent),
                name,
                value,
                percent,
                color: color_at(spec.color_scheme(), index).to_string(),
                start_angle,
                end_angle: angle,
            }
        })
        .collect();

    PiePlan { keys, slices }
}

/// `"<name> <percent>%"` with the percent rounded to a whole number
fn slice_label(name: &str, percent: f64) -> String {
    let whole = (percent * 100.0).round() as i64;
    if name.is_empty() {
        format!("{}%", whole)
    } else {
        format!("{} {}%", name, whole)
    }
}

// =============================================================================
// Data extraction helpers
// =============================================================================

/// Category labels and numeric values for every row
fn extract_series(rows: &[Row], keys: &AxisKeys) -> (Vec<String>, Vec<Option<f64>>) {
    rows.iter()
        .map(|row| {
            (
                category_label(row.get(&keys.name_key)),
                row.get(&keys.value_key).and_then(Value::as_f64),
            )
        })
        .unzip()
}

/// Label for the category axis; absent or structured values render unlabeled
fn category_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Y domain including zero (bars grow from the baseline), padded by 5% of the span.
/// Bounds are clamped to `DOMAIN_LIMIT` so the span is always finite.
fn value_domain(values: &[Option<f64>]) -> (f64, f64) {
    let present = values.iter().flatten().copied();
    let min = present.clone().fold(0.0_f64, f64::min);
    let max = present.fold(0.0_f64, f64::max);

    if min == max {
        return (min, max + 1.0);
    }

    let padding = max * 0.05 - min * 0.05;
    let low = if min < 0.0 { min - padding } else { min };
    let high = if max > 0.0 { max + padding } else { max };
    (
        low.clamp(-DOMAIN_LIMIT, DOMAIN_LIMIT),
        high.clamp(-DOMAIN_LIMIT, DOMAIN_LIMIT),
    )
}

/// Split a series into runs of consecutive present values (x = index)
fn present_runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(y) => current.push((i as f64, *y)),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

// =============================================================================
// Monotone cubic interpolation (Fritsch-Carlson, as in d3's monotoneX)
// =============================================================================

/// Sample a monotone cubic curve through `points` (x strictly increasing).
/// The curve never overshoots the data between neighbouring points.
/// Fewer than three points, or values too large to interpolate, produce
/// straight segments.
pub fn monotone_curve(points: &[(f64, f64)], samples_per_segment: usize) -> Vec<(f64, f64)> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let tangents = monotone_tangents(points);
    let steps = samples_per_segment.max(1);
    let mut curve = Vec::with_capacity((points.len() - 1) * steps + 1);
    curve.push(points[0]);

    for i in 0..points.len() - 1 {
        let (x0, y0) = points[i];
        let (x1, y1) = points[i + 1];
        let dx = (x1 - x0) / 3.0;
        let c0 = (x0 + dx, y0 + dx * tangents[i]);
        let c1 = (x1 - dx, y1 - dx * tangents[i + 1]);

        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            curve.push(cubic_bezier((x0, y0), c0, c1, (x1, y1), t));
        }
    }

    if curve.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return points.to_vec();
    }
    curve
}

fn monotone_tangents(points: &[(f64, f64)]) -> Vec<f64> {
    let n = points.len();
    let mut tangents = vec![0.0; n];

    for i in 1..n - 1 {
        tangents[i] = interior_slope(points[i - 1], points[i], points[i + 1]);
    }
    tangents[0] = end_slope(points[0], points[1], tangents[1]);
    tangents[n - 1] = end_slope(points[n - 2], points[n - 1], tangents[n - 2]);

    tangents
}

fn interior_slope(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let h0 = p1.0 - p0.0;
    let h1 = p2.0 - p1.0;
    if h0 == 0.0 || h1 == 0.0 {
        return 0.0;
    }

    let s0 = (p1.1 - p0.1) / h0;
    let s1 = (p2.1 - p1.1) / h1;
    let p = (s0 * h1 + s1 * h0) / (h0 + h1);
    let slope = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());

    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

/// Endpoint slope from the neighbouring tangent
fn end_slope(p0: (f64, f64), p1: (f64, f64), neighbour: f64) -> f64 {
    let h = p1.0 - p0.0;
    if h == 0.0 {
        neighbour
    } else {
        (3.0 * (p1.1 - p0.1) / h - neighbour) / 2.0
    }
}

fn sign(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn cubic_bezier(p0: (f64, f64), c0: (f64, f64), c1: (f64, f64), p1: (f64, f64), t: f64) -> (f64, f64) {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    (
        a * p0.0 + b * c0.0 + c * c1.0 + d * p1.0,
        a * p0.1 + b * c0.1 + c * c1.1 + d * p1.1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChartType;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn spec(chart_type: &str, data: Value) -> ChartSpec {
        ChartSpec::new(ChartType::parse(chart_type).unwrap(), rows(data))
    }

    #[test]
    fn test_compile_bar() {
        let plan = compile_chart(&spec("BAR", json!([{"region": "N", "q1": 5}, {"region": "S", "q1": 9}])));
        let ChartPlan::Bar(bar) = plan else {
            panic!("Expected bar plan");
        };
        assert_eq!(bar.keys.name_key, "region");
        assert_eq!(bar.keys.value_key, "q1");
        assert_eq!(bar.categories, vec!["N", "S"]);
        assert_eq!(bar.values, vec![Some(5.0), Some(9.0)]);
        assert_eq!(bar.color, "#8884d8");
        assert!(bar.show_grid);
        assert_eq!(bar.y_domain.0, 0.0);
        assert!(bar.y_domain.1 > 9.0);
    }

    #[test]
    fn test_compile_line_monotone() {
        let plan = compile_chart(&spec(
            "line",
            json!([{"m": "Jan", "v": 1}, {"m": "Feb", "v": 3}, {"m": "Mar", "v": 2}]),
        ));
        let ChartPlan::Line(line) = plan else {
            panic!("Expected line plan");
        };
        assert_eq!(line.segments.len(), 1);
        assert_eq!(line.markers(), vec![(0.0, 1.0), (1.0, 3.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_line_gaps_split_segments() {
        let plan = compile_chart(&spec(
            "line",
            json!([{"m": "a", "v": 1}, {"m": "b", "v": 2}, {"m": "c"}, {"m": "d", "v": 4}]),
        ));
        let ChartPlan::Line(line) = plan else {
            panic!("Expected line plan");
        };
        assert_eq!(line.segments.len(), 2);
        assert_eq!(line.segments[1], vec![(3.0, 4.0)]);
    }

    #[test]
    fn test_compile_pie_scenario() {
        let plan = compile_chart(&spec("pie", json!([{"city": "A", "sales": 10}, {"city": "B", "sales": 30}])));
        let ChartPlan::Pie(pie) = plan else {
            panic!("Expected pie plan");
        };
        assert_eq!(pie.keys.name_key, "city");
        assert_eq!(pie.keys.value_key, "sales");
        let labels: Vec<&str> = pie.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["A 25%", "B 75%"]);
        assert!((pie.slices[1].end_angle - TAU).abs() < 1e-9);
        assert_eq!(pie.slices[0].end_angle, pie.slices[1].start_angle);
    }

    #[test]
    fn test_pie_colors_cycle() {
        let data: Vec<Value> = (0..7).map(|i| json!({"k": format!("s{}", i), "v": 1})).collect();
        let colors = vec!["#111111".to_string(), "#222222".to_string(), "#333333".to_string()];
        let chart = ChartSpec::new(ChartType::Pie, rows(Value::Array(data))).with_color_scheme(colors.clone());
        let ChartPlan::Pie(pie) = compile_chart(&chart) else {
            panic!("Expected pie plan");
        };
        for (i, slice) in pie.slices.iter().enumerate() {
            assert_eq!(slice.color, colors[i % colors.len()]);
        }
    }

    #[test]
    fn test_pie_rounding_and_zero_total() {
        assert_eq!(slice_label("x", 1.0 / 3.0), "x 33%");
        assert_eq!(slice_label("x", 2.0 / 3.0), "x 67%");
        assert_eq!(slice_label("", 0.5), "50%");

        let plan = compile_chart(&spec("pie", json!([{"k": "a", "v": 0}, {"k": "b", "v": 0}])));
        let ChartPlan::Pie(pie) = plan else {
            panic!("Expected pie plan");
        };
        assert!(pie.slices.iter().all(|s| s.percent == 0.0 && s.label.ends_with(" 0%")));
    }

    #[test]
    fn test_empty_rows_placeholder() {
        let plan = compile_chart(&ChartSpec::new(ChartType::Bar, Vec::new()));
        assert_eq!(plan, ChartPlan::Placeholder(Placeholder::NoData));
    }

    #[test]
    fn test_scatter_not_supported() {
        let plan = compile_chart(&spec("scatter", json!([{"x": 1, "y": 2}])));
        let ChartPlan::Placeholder(placeholder) = plan else {
            panic!("Expected placeholder");
        };
        assert_eq!(placeholder.message(), "Chart type \"scatter\" not supported");
    }

    #[test]
    fn test_all_numeric_row_unlabeled() {
        let plan = compile_chart(&spec("bar", json!([{"x": 1, "y": 2}, {"x": 3, "y": 4}])));
        let ChartPlan::Bar(bar) = plan else {
            panic!("Expected bar plan");
        };
        assert_eq!(bar.keys.name_key, "name");
        assert_eq!(bar.categories, vec!["", ""]);
        assert_eq!(bar.values, vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn test_value_domain_negative() {
        let (low, high) = value_domain(&[Some(-10.0), Some(10.0)]);
        assert!(low < -10.0);
        assert!(high > 10.0);
        assert_eq!(value_domain(&[None]), (0.0, 1.0));
    }

    #[test]
    fn test_monotone_curve_passes_through_points() {
        let points = vec![(0.0, 0.0), (1.0, 5.0), (2.0, 5.5), (3.0, 20.0)];
        let curve = monotone_curve(&points, 8);
        assert_eq!(curve.len(), 3 * 8 + 1);
        for (i, point) in points.iter().enumerate() {
            let sampled = curve[i * 8];
            assert!((sampled.0 - point.0).abs() < 1e-9);
            assert!((sampled.1 - point.1).abs() < 1e-9);
        }
    }

    #[test]
    fn test_monotone_curve_no_overshoot() {
        let points = vec![(0.0, 0.0), (1.0, 10.0), (2.0, 10.0), (3.0, 11.0), (4.0, 30.0)];
        let curve = monotone_curve(&points, 10);
        for pair in curve.windows(2) {
            assert!(pair[1].1 >= pair[0].1 - 1e-9, "curve decreased: {:?}", pair);
        }
    }

    #[test]
    fn test_value_domain_extreme_values_stay_finite() {
        let (low, high) = value_domain(&[Some(1.7e308), Some(-1.7e308)]);
        assert!(low.is_finite() && high.is_finite());
        assert!((high - low).is_finite());
        assert!(low < 0.0 && high > 0.0);

        let (low, high) = value_domain(&[Some(1.7e308)]);
        assert_eq!(low, 0.0);
        assert!(high.is_finite() && high > 0.0);
    }

    #[test]
    fn test_pie_huge_values_keep_percentages() {
        let plan = compile_chart(&spec("pie", json!([{"k": "a", "v": 1e308}, {"k": "b", "v": 1e308}])));
        let ChartPlan::Pie(pie) = plan else {
            panic!("Expected pie plan");
        };
        let labels: Vec<&str> = pie.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["a 50%", "b 50%"]);
        assert_eq!(pie.slices[0].value, 1e308);
        assert!((pie.slices[1].end_angle - TAU).abs() < 1e-9);
    }

    #[test]
    fn test_monotone_curve_huge_values_fall_back_to_points() {
        let points = vec![(0.0, -1.7e308), (1.0, 1.7e308), (2.0, -1.7e308)];
        let curve = monotone_curve(&points, 4);
        assert!(curve.iter().all(|(x, y)| x.is_finite() && y.is_finite()));
    }

    #[test]
    fn test_monotone_curve_short_inputs() {
        assert_eq!(monotone_curve(&[(0.0, 1.0)], 4), vec![(0.0, 1.0)]);
        assert_eq!(monotone_curve(&[(0.0, 1.0), (1.0, 2.0)], 4), vec![(0.0, 1.0), (1.0, 2.0)]);
    }
}
