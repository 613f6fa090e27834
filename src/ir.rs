use crate::infer::AxisKeys;

// =============================================================================
// Render plan: what the canvas draws for one chart
// =============================================================================

/// A compiled chart, ready for the drawing backend.
/// The backend just executes these blindly.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPlan {
    Bar(BarPlan),
    Line(LinePlan),
    Pie(PiePlan),
    Placeholder(Placeholder),
}

/// Single-series bar chart over a categorical x-axis.
/// Bar `i` is centered on x = i.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPlan {
    pub keys: AxisKeys,
    pub categories: Vec<String>,
    /// None where the row has no numeric value under the value key
    pub values: Vec<Option<f64>>,
    pub y_domain: (f64, f64),
    pub color: String,
    pub show_grid: bool,
}

/// Single-series line chart over a categorical x-axis
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlan {
    pub keys: AxisKeys,
    pub categories: Vec<String>,
    pub values: Vec<Option<f64>>,
    /// Monotone cubic curve samples, one polyline per run of present values
    pub segments: Vec<Vec<(f64, f64)>>,
    pub y_domain: (f64, f64),
    pub color: String,
    pub show_grid: bool,
}

impl LinePlan {
    /// Data points (x = category index) that carry a value
    pub fn markers(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|y| (i as f64, y)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PiePlan {
    pub keys: AxisKeys,
    pub slices: Vec<PieSlice>,
}

/// One pie wedge. Angles are radians, counter-clockwise from 3 o'clock.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    /// Share of the total in 0..=1
    pub percent: f64,
    /// `"<name> <percent>%"`
    pub label: String,
    pub color: String,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl PieSlice {
    pub fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }
}

/// Shown instead of a chart; never an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    NoData,
    Unsupported(String),
}

impl Placeholder {
    pub fn message(&self) -> String {
        match self {
            Placeholder::NoData => "No data available".to_string(),
            Placeholder::Unsupported(chart_type) => {
                format!("Chart type \"{}\" not supported", chart_type)
            }
        }
    }
}
