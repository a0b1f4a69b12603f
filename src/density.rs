//! Gaussian kernel density estimates for the sampling-distribution plots.

use std::f64::consts::PI;

pub const DEFAULT_GRID_POINTS: usize = 512;

/// Closed interval shared by every panel of one plot column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Global min/max over all finite values of all columns.
    pub fn spanning<'a>(columns: impl IntoIterator<Item = &'a [f64]>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in columns.into_iter().flatten() {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if !min.is_finite() {
            return None;
        }
        if max - min < 1e-12 {
            return Some(Self {
                min: min - 0.5,
                max: max + 0.5,
            });
        }
        Some(Self { min, max })
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// `points` evenly spaced values from `min` to `max` inclusive.
    pub fn grid(&self, points: usize) -> Vec<f64> {
        match points {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => {
                let step = self.width() / (points - 1) as f64;
                (0..points).map(|i| self.min + step * i as f64).collect()
            }
        }
    }
}

fn mean_and_sd(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if samples.len() < 2 {
        return (mean, 0.0);
    }
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

/// Linear-interpolated quantile of sorted data.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Silverman's rule of thumb: 0.9 * min(sd, IQR / 1.34) * n^(-1/5).
pub fn silverman_bandwidth(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 1.0;
    }
    let (_, sd) = mean_and_sd(samples);

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);

    let spread = match (sd > 0.0, iqr > 0.0) {
        (true, true) => sd.min(iqr / 1.34),
        (true, false) => sd,
        (false, true) => iqr / 1.34,
        (false, false) => 1.0,
    };
    0.9 * spread * (samples.len() as f64).powf(-0.2)
}

/// Density curve evaluated on an evenly spaced grid.
#[derive(Clone, Debug)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub points: Vec<(f64, f64)>,
}

impl DensityCurve {
    pub fn peak(&self) -> f64 {
        self.points.iter().map(|&(_, d)| d).fold(0.0, f64::max)
    }
}

/// Gaussian KDE of `samples` with Silverman bandwidth, evaluated on `range`.
pub fn gaussian_kde(samples: &[f64], range: AxisRange, grid_points: usize) -> DensityCurve {
    let bandwidth = silverman_bandwidth(samples);
    let norm = 1.0 / (samples.len().max(1) as f64 * bandwidth * (2.0 * PI).sqrt());

    let points = range
        .grid(grid_points)
        .into_iter()
        .map(|x| {
            let sum: f64 = samples
                .iter()
                .map(|s| {
                    let u = (x - s) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum();
            (x, sum * norm)
        })
        .collect();

    DensityCurve { bandwidth, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    fn trapezoid(points: &[(f64, f64)]) -> f64 {
        points
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum()
    }

    #[test]
    fn test_axis_range_spans_all_columns() {
        let a = [1.0, 2.0, 3.0];
        let b = [-4.0, 0.5];
        let c = [10.0, f64::NAN];
        let range = AxisRange::spanning([&a[..], &b[..], &c[..]]).unwrap();
        assert_eq!(
            range,
            AxisRange {
                min: -4.0,
                max: 10.0
            }
        );
        assert!(AxisRange::spanning(Vec::<&[f64]>::new()).is_none());
    }

    #[test]
    fn test_degenerate_range_padded() {
        let a = [2.0, 2.0];
        let range = AxisRange::spanning([&a[..]]).unwrap();
        assert_eq!(range, AxisRange { min: 1.5, max: 2.5 });
    }

    #[test]
    fn test_grid_endpoints() {
        let grid = AxisRange { min: 0.0, max: 1.0 }.grid(5);
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_silverman_known_value() {
        // sd = 1.5811, IQR = 2 -> 2 / 1.34 = 1.4925
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let expected = 0.9 * (2.0 / 1.34) * 5f64.powf(-0.2);
        assert!((silverman_bandwidth(&data) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_constant_data_bandwidth_positive() {
        assert!(silverman_bandwidth(&[3.0; 10]) > 0.0);
    }

    #[test]
    fn test_kde_integrates_to_one_and_peaks_near_mean() {
        let mut rng = SmallRng::seed_from_u64(42);
        let samples: Vec<f64> = (0..2_000)
            .map(|_| 1.0 + rng.sample::<f64, _>(StandardNormal))
            .collect();
        let range = AxisRange {
            min: -5.0,
            max: 7.0,
        };
        let curve = gaussian_kde(&samples, range, DEFAULT_GRID_POINTS);

        assert!((trapezoid(&curve.points) - 1.0).abs() < 0.01);

        let (mode, _) = curve
            .points
            .iter()
            .copied()
            .fold((0.0, f64::MIN), |best, p| if p.1 > best.1 { p } else { best });
        assert!((mode - 1.0).abs() < 0.3);
        // N(0,1) peak is 0.3989
        assert!((curve.peak() - 0.3989).abs() < 0.05);
    }
}
