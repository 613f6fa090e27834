use crate::ir::{BarPlan, ChartPlan, LinePlan, PiePlan, Placeholder};
use crate::model::ChartSpec;
use crate::palette::resolve_color;
use crate::{OutputFormat, RenderOptions};
use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Pie radius as a share of the smaller canvas side
const PIE_RADIUS_RATIO: f64 = 0.35;
/// Placeholder background (muted slate)
const MUTED: RGBColor = RGBColor(241, 245, 249);
const MUTED_TEXT: RGBColor = RGBColor(100, 116, 139);
/// Largest canvas side accepted, in pixels
const MAX_DIMENSION: u32 = 16_384;

/// Draw a compiled plan and encode it in the requested format
pub fn render_plan(plan: &ChartPlan, spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    check_canvas(options.width, options.height)?;
    match options.format {
        OutputFormat::Png => render_png(plan, spec, options),
        OutputFormat::Svg => render_svg(plan, spec, options),
    }
}

/// Reject empty canvases and ones too large to allocate
fn check_canvas(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(anyhow!("Image size {}x{} must be at least 1x1", width, height));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(anyhow!(
            "Image size {}x{} is too large (max {} per side)",
            width, height, MAX_DIMENSION
        ));
    }
    Ok(())
}

/// RGB buffer length for a canvas, None on overflow
fn rgb_buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
}

fn render_png(plan: &ChartPlan, spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    let (width, height) = (options.width, options.height);
    let len = rgb_buffer_len(width, height)
        .ok_or_else(|| anyhow!("Image size {}x{} is too large", width, height))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_plan(&root, plan, spec)?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn render_svg(plan: &ChartPlan, spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        draw_plan(&root, plan, spec)?;
    }
    Ok(svg.into_bytes())
}

fn draw_plan<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plan: &ChartPlan,
    spec: &ChartSpec,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    match plan {
        ChartPlan::Bar(bar) => draw_bar(root, bar, spec)?,
        ChartPlan::Line(line) => draw_line(root, line, spec)?,
        ChartPlan::Pie(pie) => draw_pie(root, pie, spec)?,
        ChartPlan::Placeholder(placeholder) => draw_placeholder(root, placeholder, spec)?,
    }

    root.present().context("Failed to present drawing")?;
    Ok(())
}

fn draw_bar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    bar: &BarPlan,
    spec: &ChartSpec,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let num_categories = bar.categories.len();
    let x_range = -0.5..(num_categories as f64 - 0.5);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(spec.title(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, bar.y_domain.0..bar.y_domain.1)
        .context("Failed to build chart")?;

    let formatter = |x: &f64| category_at(&bar.categories, *x);
    let mut mesh = chart.configure_mesh();
    mesh.x_labels(num_categories).x_label_formatter(&formatter);
    if !bar.show_grid {
        mesh.disable_mesh();
    }
    if let Some(label) = spec.x_axis_label() {
        mesh.x_desc(label);
    }
    if let Some(label) = spec.y_axis_label() {
        mesh.y_desc(label);
    }
    mesh.draw().context("Failed to draw mesh")?;

    let color = resolve_color(&bar.color);
    let half_width = 0.4;

    chart
        .draw_series(bar.values.iter().enumerate().filter_map(|(i, value)| {
            value.map(|y| {
                let x = i as f64;
                let y = clamp_to(bar.y_domain, y);
                Rectangle::new([(x - half_width, 0.0), (x + half_width, y)], color.filled())
            })
        }))
        .context("Failed to draw bars")?;

    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    line: &LinePlan,
    spec: &ChartSpec,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let num_categories = line.categories.len();
    let x_range = -0.5..(num_categories as f64 - 0.5);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(spec.title(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, line.y_domain.0..line.y_domain.1)
        .context("Failed to build chart")?;

    let formatter = |x: &f64| category_at(&line.categories, *x);
    let mut mesh = chart.configure_mesh();
    mesh.x_labels(num_categories).x_label_formatter(&formatter);
    if !line.show_grid {
        mesh.disable_mesh();
    }
    if let Some(label) = spec.x_axis_label() {
        mesh.x_desc(label);
    }
    if let Some(label) = spec.y_axis_label() {
        mesh.y_desc(label);
    }
    mesh.draw().context("Failed to draw mesh")?;

    let color = resolve_color(&line.color);

    let clamp = |(x, y): (f64, f64)| (x, clamp_to(line.y_domain, y));

    for segment in &line.segments {
        chart
            .draw_series(LineSeries::new(segment.iter().copied().map(clamp), color.stroke_width(2)))
            .context("Failed to draw line series")?;
    }

    chart
        .draw_series(
            line.markers()
                .into_iter()
                .map(|point| Circle::new(clamp(point), 3, color.filled())),
        )
        .context("Failed to draw line markers")?;

    Ok(())
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    pie: &PiePlan,
    spec: &ChartSpec,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let area = root
        .titled(spec.title(), ("sans-serif", 20))
        .context("Failed to draw title")?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 * PIE_RADIUS_RATIO;

    for slice in pie.slices.iter().filter(|s| s.end_angle > s.start_angle) {
        let points = wedge_points(center, radius, slice.start_angle, slice.end_angle);
        area.draw(&Polygon::new(points, resolve_color(&slice.color).filled()))
            .context("Failed to draw pie slice")?;
    }

    for slice in pie.slices.iter().filter(|s| s.end_angle > s.start_angle) {
        let angle = slice.mid_angle();
        let (x, y) = polar(center, radius * 1.15, angle);
        // Left-side labels end at the anchor instead of starting there
        let x = if angle.cos() < 0.0 {
            x - slice.label.chars().count() as i32 * 7
        } else {
            x
        };
        area.draw(&Text::new(slice.label.clone(), (x, y - 7), ("sans-serif", 14)))
            .context("Failed to draw pie label")?;
    }

    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    placeholder: &Placeholder,
    spec: &ChartSpec,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let area = root
        .titled(spec.title(), ("sans-serif", 20))
        .context("Failed to draw title")?;
    area.fill(&MUTED).context("Failed to fill placeholder")?;

    let message = placeholder.message();
    let (width, height) = area.dim_in_pixel();
    let x = width as i32 / 2 - message.chars().count() as i32 * 4;
    let y = height as i32 / 2 - 8;

    area.draw(&Text::new(message, (x, y), ("sans-serif", 16).into_font().color(&MUTED_TEXT)))
        .context("Failed to draw placeholder message")?;

    Ok(())
}

/// Keep a value inside the plotted domain; plotters overflows on far-out points
fn clamp_to(domain: (f64, f64), y: f64) -> f64 {
    y.clamp(domain.0, domain.1)
}

/// Category label for an axis tick; ticks between categories stay blank
fn category_at(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

/// Pixel position at `angle` (counter-clockwise from 3 o'clock)
fn polar(center: (f64, f64), radius: f64, angle: f64) -> (i32, i32) {
    (
        (center.0 + radius * angle.cos()).round() as i32,
        (center.1 - radius * angle.sin()).round() as i32,
    )
}

/// Polygon outline of a pie wedge: center, then the arc in ~2 degree steps
fn wedge_points(center: (f64, f64), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start).to_degrees() / 2.0 - 1e-9).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0.round() as i32, center.1.round() as i32));
    for step in 0..=steps {
        let angle = start + (end - start) * step as f64 / steps as f64;
        points.push(polar(center, radius, angle));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_chart;
    use crate::model::ChartType;
    use serde_json::json;
    use std::f64::consts::{FRAC_PI_2, TAU};

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    #[test]
    fn test_category_at() {
        let categories = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_at(&categories, 0.0), "a");
        assert_eq!(category_at(&categories, 1.0000000001), "b");
        assert_eq!(category_at(&categories, 0.5), "");
        assert_eq!(category_at(&categories, -1.0), "");
        assert_eq!(category_at(&categories, 2.0), "");
    }

    #[test]
    fn test_clamp_to_domain() {
        assert_eq!(clamp_to((0.0, 10.0), 1.7e308), 10.0);
        assert_eq!(clamp_to((-5.0, 10.0), -1.7e308), -5.0);
        assert_eq!(clamp_to((0.0, 10.0), 4.0), 4.0);
    }

    #[test]
    fn test_polar_directions() {
        assert_eq!(polar((100.0, 100.0), 10.0, 0.0), (110, 100));
        assert_eq!(polar((100.0, 100.0), 10.0, FRAC_PI_2), (100, 90));
    }

    #[test]
    fn test_wedge_points_full_circle() {
        let points = wedge_points((50.0, 50.0), 20.0, 0.0, TAU);
        assert_eq!(points[0], (50, 50));
        assert_eq!(points[1], points[points.len() - 1]);
        assert_eq!(points.len(), 180 + 2);
    }

    #[test]
    fn test_render_placeholder_svg() {
        let spec = ChartSpec::new(ChartType::Scatter, Vec::new());
        let plan = compile_chart(&spec);
        let options = RenderOptions {
            format: OutputFormat::Svg,
            ..RenderOptions::default()
        };
        let bytes = render_plan(&plan, &spec, &options).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("No data available"));
    }

    #[test]
    fn test_canvas_size_limits() {
        let spec = ChartSpec::new(ChartType::Bar, Vec::new());
        let plan = compile_chart(&spec);

        let huge = RenderOptions { width: 40_000, height: 40_000, ..RenderOptions::default() };
        let err = render_plan(&plan, &spec, &huge).unwrap_err();
        assert!(err.to_string().contains("too large"));

        let empty = RenderOptions { width: 0, format: OutputFormat::Svg, ..RenderOptions::default() };
        let err = render_plan(&plan, &spec, &empty).unwrap_err();
        assert!(err.to_string().contains("at least 1x1"));

        assert_eq!(rgb_buffer_len(800, 300), Some(720_000));
        assert_eq!(rgb_buffer_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_render_extreme_values_svg() {
        let rows = json!([{"k": "a", "v": 1.7e308}, {"k": "b", "v": -1.7e308}, {"k": "c", "v": 1.0}]);
        let rows: Vec<_> = rows.as_array().unwrap().iter().map(|r| r.as_object().unwrap().clone()).collect();
        let options = RenderOptions {
            format: OutputFormat::Svg,
            ..RenderOptions::default()
        };

        for chart_type in [ChartType::Bar, ChartType::Line, ChartType::Pie] {
            let spec = ChartSpec::new(chart_type, rows.clone());
            let plan = compile_chart(&spec);
            let bytes = render_plan(&plan, &spec, &options).unwrap();
            assert!(String::from_utf8(bytes).unwrap().contains("<svg"));
        }
    }

    #[test]
    fn test_render_bar_png() {
        let rows = json!([{"region": "N", "sales": 5}, {"region": "S", "sales": 9}]);
        let rows = rows.as_array().unwrap().iter().map(|r| r.as_object().unwrap().clone()).collect();
        let spec = ChartSpec::new(ChartType::Bar, rows);
        let plan = compile_chart(&spec);
        let bytes = render_plan(&plan, &spec, &RenderOptions::default()).unwrap();
        assert!(is_valid_png(&bytes));
    }
}
