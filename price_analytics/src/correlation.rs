//! Pearson correlation across the five numeric columns.

use market_data::models::{bar::Column, time_series::TimeSeries};
use serde::Serialize;
use tracing::debug;

use crate::metric::{Metric, Undefined};

const N: usize = Column::ALL.len();

/// Symmetric 5x5 matrix indexed by [`Column::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    /// Row and column labels, in index order.
    pub columns: [Column; N],
    /// `cells[i][j]` is the coefficient between `columns[i]` and `columns[j]`.
    pub cells: [[Metric<f64>; N]; N],
}

impl CorrelationMatrix {
    /// The coefficient between two columns.
    pub fn get(&self, a: Column, b: Column) -> Metric<f64> {
        self.cells[a.index()][b.index()]
    }

    /// Whether every cell holds a value.
    pub fn is_fully_defined(&self) -> bool {
        self.cells.iter().flatten().all(Metric::is_defined)
    }

    /// The first reason found among the off-diagonal cells, if any.
    pub fn undefined_reason(&self) -> Option<Undefined> {
        self.cells.iter().flatten().find_map(Metric::reason)
    }
}

/// Computes the correlation matrix of `series`.
///
/// Each pair uses the rows where both values are present. The diagonal is
/// always exactly 1.0. Fewer than two usable rows gives
/// [`Undefined::InsufficientData`]; a constant column gives
/// [`Undefined::ZeroVariance`]. Coefficients are clamped to `[-1, 1]` and
/// never infinite or NaN.
pub fn correlate(series: &TimeSeries) -> CorrelationMatrix {
    let values: Vec<Vec<Option<f64>>> = Column::ALL.iter().map(|&c| series.column(c)).collect();

    let mut cells = [[Metric::Defined(1.0); N]; N];
    for i in 0..N {
        for j in (i + 1)..N {
            let cell = pearson(
                (Column::ALL[i], &values[i]),
                (Column::ALL[j], &values[j]),
            );
            cells[i][j] = cell;
            cells[j][i] = cell;
        }
    }

    debug!(symbol = %series.symbol, rows = series.len(), "correlation computed");

    CorrelationMatrix {
        columns: Column::ALL,
        cells,
    }
}

fn pearson(a: (Column, &[Option<f64>]), b: (Column, &[Option<f64>])) -> Metric<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .1
        .iter()
        .zip(b.1)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    if xs.len() < 2 {
        return Metric::Undefined(Undefined::InsufficientData {
            required: 2,
            available: xs.len(),
        });
    }
    for (column, data) in [(a.0, &xs), (b.0, &ys)] {
        if data.iter().all(|v| *v == data[0]) {
            return Metric::Undefined(Undefined::ZeroVariance { column });
        }
    }

    // Scaled to [-1, 1] so squaring cannot overflow; r is scale-invariant.
    let xs = scaled(xs);
    let ys = scaled(ys);

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if !r.is_finite() {
        return Metric::Undefined(Undefined::NonFinite);
    }
    Metric::Defined(r.clamp(-1.0, 1.0))
}

fn scaled(mut values: Vec<f64>) -> Vec<f64> {
    let max = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max > 0.0 {
        values.iter_mut().for_each(|v| *v /= max);
    }
    values
}
