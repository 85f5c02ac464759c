use crate::Result;
use crate::model::AggregatedTable;
use plotters::coord::Shift;
use plotters::prelude::*;

pub const TITLE: &str = "Memory latency per core and numa domain";
pub const Y_DESC: &str = "latency in CPU cycles";
pub const X_DESC: &str = "pyscpu";

/// Width of the strip right of the plot that holds the legend, in pixels.
const LEGEND_WIDTH: i32 = 120;
const LEGEND_ROW: i32 = 22;

/// Above this many cores only every n-th core is labelled.
const MAX_X_LABELS: usize = 32;

/// Share of one x unit covered by a bar group; the rest is the gap.
const GROUP_WIDTH: f64 = 0.8;

/// One bar in chart coordinates. The group of core `i` is centred at x = i.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub series: usize,
    pub x0: f64,
    pub x1: f64,
    pub height: f64,
}

/// Lay out one bar per present cell: groups by core, one slot per node.
pub fn layout_bars(table: &AggregatedTable) -> Vec<Bar> {
    let columns = table.columns();
    if columns.is_empty() {
        return vec![];
    }
    let width = GROUP_WIDTH / columns.len() as f64;

    let mut bars = Vec::new();
    for (group, cpu) in table.index().iter().enumerate() {
        let left = group as f64 - GROUP_WIDTH / 2.0;
        for (series, column) in columns.iter().enumerate() {
            if let Some(height) = table.get(cpu, &column.name) {
                let x0 = left + series as f64 * width;
                bars.push(Bar {
                    series,
                    x0,
                    x1: x0 + width,
                    height,
                });
            }
        }
    }
    bars
}

/// Y axis bounds: always includes zero, 10% headroom above the tallest bar.
pub fn y_bounds(table: &AggregatedTable) -> (f64, f64) {
    let (lo, hi) = match table.value_range() {
        Some((lo, hi)) => (lo.min(0.0), hi.max(0.0)),
        None => return (0.0, 1.0),
    };
    let span = hi - lo;
    if span <= 0.0 {
        return (lo, lo + 1.0);
    }
    let lo = if lo < 0.0 { lo - span * 0.1 } else { lo };
    (lo, hi + span * 0.1)
}

/// Label for an x key point: the core name at integer positions, blank elsewhere.
fn group_label(index: &[String], x: f64) -> String {
    let r = x.round();
    if (x - r).abs() > 1e-6 || r < 0.0 {
        return String::new();
    }
    index.get(r as usize).cloned().unwrap_or_default()
}

/// Number of x key points to request; plotters spaces them at whole-number steps.
fn x_label_count(groups: usize) -> usize {
    groups.clamp(1, MAX_X_LABELS)
}

fn series_style(series: usize) -> ShapeStyle {
    Palette99::pick(series).filled()
}

/// Draw the grouped bar chart onto `root`, legend in a strip on the right.
pub fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, table: &AggregatedTable) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (width, height) = root.dim_in_pixel();
    if table.is_empty() {
        log::debug!("drawing empty chart {}x{}", width, height);
    } else {
        log::debug!("drawing chart {}x{}", width, height);
    }
    let (plot_area, legend_area) = root.split_horizontally(width as i32 - LEGEND_WIDTH);

    let index = table.index();
    let groups = index.len().max(1);
    let (y_lo, y_hi) = y_bounds(table);

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(TITLE, ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(groups as f64 - 0.5), y_lo..y_hi)?;

    let label_of = |x: &f64| group_label(index, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(x_label_count(groups))
        .x_label_formatter(&label_of)
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .draw()?;

    chart.draw_series(layout_bars(table).into_iter().map(|bar| {
        Rectangle::new(
            [(bar.x0, 0.0), (bar.x1, bar.height)],
            series_style(bar.series),
        )
    }))?;

    draw_legend(&legend_area, &table.column_names())?;

    root.present()?;
    Ok(())
}

fn draw_legend<DB>(area: &DrawingArea<DB, Shift>, nodes: &[&str]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (_, height) = area.dim_in_pixel();
    let top = (height as i32 - nodes.len() as i32 * LEGEND_ROW) / 2;

    for (series, node) in nodes.iter().enumerate() {
        let y = top + series as i32 * LEGEND_ROW;
        area.draw(&Rectangle::new(
            [(8, y + 3), (24, y + 17)],
            series_style(series),
        ))?;
        area.draw(&Text::new(
            node.to_string(),
            (32, y + 3),
            ("sans-serif", 15).into_font(),
        ))?;
    }
    Ok(())
}
