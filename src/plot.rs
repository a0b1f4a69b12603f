//! Study Figure
//!
//! A 3x3 grid, one row per causal model:
//! 1. causal diagram of the generating model
//! 2. density of the X estimate, adjusted vs unadjusted
//! 3. density of the X standard error, adjusted vs unadjusted
//!
//! Columns 2 and 3 share one x-axis range across all rows so the models
//! can be compared by eye.

use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

use crate::causal_model::{CausalModel, Node};
use crate::density::{gaussian_kde, AxisRange, DensityCurve, DEFAULT_GRID_POINTS};
use crate::error::{Result, SimulationError};
use crate::replication::{ReplicateCollection, StudyResults};

pub const FIGURE_SIZE: (u32, u32) = (1500, 1200);

const ADJUSTED_COLOR: RGBColor = RED;
const UNADJUSTED_COLOR: RGBColor = BLUE;
const NODE_RADIUS: i32 = 22;
/// Fraction of an edge left bare at each end so arrows stop at the node rim.
const EDGE_INSET: f64 = 0.09;
const ARROW_HEAD: f64 = 0.04;

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for SimulationError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        SimulationError::Plot(err.to_string())
    }
}

/// Drawing surface split into the 3x3 panel grid.
pub struct Figure<DB: DrawingBackend> {
    root: DrawingArea<DB, Shift>,
    panels: Vec<DrawingArea<DB, Shift>>,
}

impl<'a> Figure<BitMapBackend<'a>> {
    pub fn bitmap(path: &'a Path) -> Result<Self> {
        Self::new(BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area())
    }
}

impl<DB: DrawingBackend> Figure<DB> {
    pub const ROWS: usize = 3;
    pub const COLS: usize = 3;

    pub fn new(root: DrawingArea<DB, Shift>) -> Result<Self> {
        root.fill(&WHITE)?;
        let panels = root.split_evenly((Self::ROWS, Self::COLS));
        Ok(Self { root, panels })
    }

    pub fn panel(&self, row: usize, col: usize) -> &DrawingArea<DB, Shift> {
        &self.panels[row * Self::COLS + col]
    }

    /// Flush everything drawn so far to the backend.
    pub fn present(&self) -> Result<()> {
        self.root.present()?;
        Ok(())
    }
}

/// Layout position of a node in the unit square of a diagram panel.
pub fn node_position(model: CausalModel, node: Node) -> (f64, f64) {
    let baseline = match model {
        CausalModel::CommonVariance => 0.3,
        _ => 0.45,
    };
    match node {
        Node::Predictor => (0.15, baseline),
        Node::Outcome => (0.5, baseline),
        Node::Covariate => (0.85, baseline),
        Node::Latent => (0.675, 0.8),
    }
}

/// Shaft and head polylines of an arrow from `from` to `to`.
pub fn arrow_paths(from: (f64, f64), to: (f64, f64)) -> [Vec<(f64, f64)>; 2] {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    let (ux, uy) = (dx / len, dy / len);

    let start = (from.0 + ux * EDGE_INSET, from.1 + uy * EDGE_INSET);
    let tip = (to.0 - ux * EDGE_INSET, to.1 - uy * EDGE_INSET);

    // head wings at +/- 30 degrees from the reversed direction
    let (cos, sin) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
    let wing = |s: f64| {
        let bx = -ux * cos + s * uy * sin;
        let by = -uy * cos - s * ux * sin;
        (tip.0 + bx * ARROW_HEAD, tip.1 + by * ARROW_HEAD)
    };

    [vec![start, tip], vec![wing(1.0), tip, wing(-1.0)]]
}

pub fn draw_causal_diagram<DB: DrawingBackend>(
    figure: &Figure<DB>,
    row: usize,
    model: CausalModel,
) -> Result<()> {
    let mut chart = ChartBuilder::on(figure.panel(row, 0))
        .caption(model.name(), ("sans-serif", 20))
        .margin(10)
        .build_cartesian_2d(0.0f64..1.0f64, 0.0f64..1.0f64)?;

    for &(from, to) in model.edges() {
        let style = if from.is_observed() {
            BLACK.stroke_width(2)
        } else {
            BLACK.mix(0.5).stroke_width(2)
        };
        for path in arrow_paths(node_position(model, from), node_position(model, to)) {
            chart.draw_series(std::iter::once(PathElement::new(path, style)))?;
        }
    }

    let label_style =
        TextStyle::from(("sans-serif", 20).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    for &node in model.nodes() {
        let pos = node_position(model, node);
        let outline = if node.is_observed() {
            BLACK.stroke_width(2)
        } else {
            BLACK.mix(0.5).stroke_width(2)
        };
        chart.draw_series(std::iter::once(Circle::new(pos, NODE_RADIUS, WHITE.filled())))?;
        chart.draw_series(std::iter::once(Circle::new(pos, NODE_RADIUS, outline)))?;
        chart.draw_series(std::iter::once(Text::new(node.label(), pos, label_style.clone())))?;
    }

    Ok(())
}

/// Which statistic a density panel shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Statistic {
    Estimate,
    StdError,
}

impl Statistic {
    fn column(&self) -> usize {
        match self {
            Self::Estimate => 1,
            Self::StdError => 2,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Estimate => "estimate of X",
            Self::StdError => "std. error of X",
        }
    }

    /// (adjusted, unadjusted) values of this statistic.
    pub fn values(&self, collection: &ReplicateCollection) -> (Vec<f64>, Vec<f64>) {
        match self {
            Self::Estimate => (collection.adjusted_estimates(), collection.unadjusted_estimates()),
            Self::StdError => (
                collection.adjusted_std_errors(),
                collection.unadjusted_std_errors(),
            ),
        }
    }
}

/// Axis range covering both specifications of every model.
pub fn shared_range(results: &StudyResults, statistic: Statistic) -> Option<AxisRange> {
    let columns: Vec<Vec<f64>> = results
        .iter()
        .flat_map(|c| {
            let (adjusted, unadjusted) = statistic.values(c);
            [adjusted, unadjusted]
        })
        .collect();
    AxisRange::spanning(columns.iter().map(Vec::as_slice))
}

pub fn draw_density_panel<DB: DrawingBackend>(
    figure: &Figure<DB>,
    row: usize,
    collection: &ReplicateCollection,
    statistic: Statistic,
    range: AxisRange,
    reference: Option<f64>,
) -> Result<()> {
    let (adjusted, unadjusted) = statistic.values(collection);
    let adjusted = gaussian_kde(&adjusted, range, DEFAULT_GRID_POINTS);
    let unadjusted = gaussian_kde(&unadjusted, range, DEFAULT_GRID_POINTS);
    let y_max = adjusted.peak().max(unadjusted.peak()).max(1e-9) * 1.1;

    let mut chart = ChartBuilder::on(figure.panel(row, statistic.column()))
        .caption(
            format!("{}: {}", collection.model.tag(), statistic.label()),
            ("sans-serif", 18),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(range.min..range.max, 0.0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(statistic.label())
        .y_desc("density")
        .draw()?;

    if let Some(x) = reference.filter(|x| *x >= range.min && *x <= range.max) {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, 0.0), (x, y_max)],
            BLACK.mix(0.3),
        )))?;
    }

    draw_curve(&mut chart, adjusted, ADJUSTED_COLOR, "Y ~ X + Z")?;
    draw_curve(&mut chart, unadjusted, UNADJUSTED_COLOR, "Y ~ X")?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_curve<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    curve: DensityCurve,
    color: RGBColor,
    label: &str,
) -> Result<()> {
    chart
        .draw_series(LineSeries::new(curve.points, color.stroke_width(2)))?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    Ok(())
}

/// Draw the full study onto `figure`. `true_effect` marks the estimate panels.
pub fn render_study<DB: DrawingBackend>(
    figure: &Figure<DB>,
    results: &StudyResults,
    true_effect: f64,
) -> Result<()> {
    if let Some(empty) = results.iter().find(|c| c.is_empty()) {
        return Err(SimulationError::Plot(format!(
            "no replicates to plot for {}",
            empty.model.tag()
        )));
    }

    let estimate_range = shared_range(results, Statistic::Estimate)
        .ok_or_else(|| SimulationError::Plot("no finite estimates to plot".to_string()))?;
    let se_range = shared_range(results, Statistic::StdError)
        .ok_or_else(|| SimulationError::Plot("no finite standard errors to plot".to_string()))?;
    debug!(?estimate_range, ?se_range, "shared axis ranges");

    for (row, collection) in results.iter().enumerate() {
        draw_causal_diagram(figure, row, collection.model)?;
        draw_density_panel(
            figure,
            row,
            collection,
            Statistic::Estimate,
            estimate_range,
            Some(true_effect),
        )?;
        draw_density_panel(figure, row, collection, Statistic::StdError, se_range, None)?;
    }

    figure.present()
}

/// Render the study figure to a PNG file.
pub fn save_study_png(path: &Path, results: &StudyResults, true_effect: f64) -> Result<()> {
    let figure = Figure::bitmap(path)?;
    render_study(&figure, results, true_effect)
}
