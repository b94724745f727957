//! Dynamic factor model measurements.
//!
//! Each observed series loads on a subset of the factors of a
//! [`VarDynamics`](crate::VarDynamics) state through a temporal pattern
//! applied to the factor's lags. The pattern describes how the series
//! relates to the factor: as a level, a flow cumulated over several
//! periods, an average, or a growth rate cumulated over a window.

use std::sync::OnceLock;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, s};

use crate::contract::{Loading, Measurements};
use crate::error::SsfError;

/// Temporal pattern applied to the lags of a factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    /// Current value only.
    Level,
    /// Triangular weights `1, 2, .., k, .., 2, 1` (length `2k - 1`): growth
    /// over `k` periods of a series observed as a `k`-period sum.
    CumulatedGrowth {
        /// Number of periods `k`.
        length: usize,
    },
    /// Flow summed over `length` periods.
    Cumulated {
        /// Number of periods.
        length: usize,
    },
    /// Mean over `length` periods.
    Average {
        /// Number of periods.
        length: usize,
    },
}

impl MeasurementKind {
    /// Number of lags touched by the pattern.
    pub fn pattern_len(&self) -> usize {
        match *self {
            MeasurementKind::Level => 1,
            MeasurementKind::CumulatedGrowth { length } => (2 * length).saturating_sub(1),
            MeasurementKind::Cumulated { length } | MeasurementKind::Average { length } => length,
        }
    }

    /// Weight of lag `l`.
    fn weight(&self, l: usize) -> f64 {
        match *self {
            MeasurementKind::Level => 1.0,
            MeasurementKind::CumulatedGrowth { length } => {
                let k = length as f64;
                k - (l as f64 + 1.0 - k).abs()
            }
            MeasurementKind::Cumulated { .. } => 1.0,
            MeasurementKind::Average { length } => 1.0 / length as f64,
        }
    }

    /// Writes the pattern into the first [`pattern_len`](Self::pattern_len)
    /// slots of `buffer`.
    pub fn fill(&self, buffer: &mut [f64]) {
        for (l, b) in buffer.iter_mut().take(self.pattern_len()).enumerate() {
            *b = self.weight(l);
        }
    }

    /// Weighted sum of the first [`pattern_len`](Self::pattern_len) lags in `x`.
    pub fn dot(&self, x: ArrayView1<f64>) -> f64 {
        match *self {
            MeasurementKind::Level => x[0],
            MeasurementKind::Cumulated { length } => x.iter().take(length).sum(),
            MeasurementKind::Average { length } => {
                x.iter().take(length).sum::<f64>() / length as f64
            }
            MeasurementKind::CumulatedGrowth { .. } => x
                .iter()
                .take(self.pattern_len())
                .enumerate()
                .map(|(l, v)| self.weight(l) * v)
                .sum(),
        }
    }
}

/// One observed series of a dynamic factor model.
///
/// `coefficients[g]` is the loading on factor `g`; NaN or an exact zero
/// means the series does not load on that factor.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementDescriptor {
    /// Temporal pattern.
    pub kind: MeasurementKind,
    /// Loading per factor.
    pub coefficients: Vec<f64>,
    /// Variance of the measurement error.
    pub var: f64,
}

impl MeasurementDescriptor {
    /// Builds a descriptor.
    pub fn new(kind: MeasurementKind, coefficients: Vec<f64>, var: f64) -> Self {
        Self {
            kind,
            coefficients,
            var,
        }
    }

    /// Returns `true` when the series loads on factor `g`.
    pub fn loads(&self, g: usize) -> bool {
        self.coefficients
            .get(g)
            .is_some_and(|c| !c.is_nan() && *c != 0.0)
    }
}

/// [`Loading`] of one [`MeasurementDescriptor`] on a companion state.
#[derive(Clone, Debug)]
pub struct DfmLoading {
    kind: MeasurementKind,
    nlx: usize,
    /// `(factor, coefficient)` of the active factors.
    factors: Vec<(usize, f64)>,
    /// Non-zero `(state index, weight)` entries of the row.
    entries: Vec<(usize, f64)>,
}

impl DfmLoading {
    fn new(desc: &MeasurementDescriptor, nlx: usize) -> Self {
        let factors: Vec<(usize, f64)> = desc
            .coefficients
            .iter()
            .enumerate()
            .filter(|&(g, _)| desc.loads(g))
            .map(|(g, &c)| (g, c))
            .collect();
        let mut pattern = vec![0.0; desc.kind.pattern_len()];
        desc.kind.fill(&mut pattern);
        let entries = factors
            .iter()
            .flat_map(|&(g, c)| {
                pattern
                    .iter()
                    .enumerate()
                    .map(move |(l, &w)| (g * nlx + l, c * w))
            })
            .collect();
        Self {
            kind: desc.kind,
            nlx,
            factors,
            entries,
        }
    }

    /// Indices of the factors this row loads on.
    pub fn factors(&self) -> impl Iterator<Item = usize> + '_ {
        self.factors.iter().map(|&(g, _)| g)
    }
}

impl Loading for DfmLoading {
    fn z(&self, _pos: usize, mut out: ArrayViewMut1<f64>) {
        out.fill(0.0);
        for &(i, w) in &self.entries {
            out[i] = w;
        }
    }

    fn zx(&self, _pos: usize, x: ArrayView1<f64>) -> f64 {
        let len = self.kind.pattern_len();
        self.factors
            .iter()
            .map(|&(g, c)| {
                let start = g * self.nlx;
                c * self.kind.dot(x.slice(s![start..start + len]))
            })
            .sum()
    }

    fn zvz(&self, _pos: usize, v: ArrayView2<f64>) -> f64 {
        let mut s = 0.0;
        for &(i, wi) in &self.entries {
            for &(j, wj) in &self.entries {
                s += wi * wj * v[[i, j]];
            }
        }
        s
    }

    fn vp_zd_z(&self, _pos: usize, mut v: ArrayViewMut2<f64>, d: f64) {
        for &(i, wi) in &self.entries {
            for &(j, wj) in &self.entries {
                v[[i, j]] += d * wi * wj;
            }
        }
    }

    fn xp_zd(&self, _pos: usize, mut x: ArrayViewMut1<f64>, d: f64) {
        for &(i, w) in &self.entries {
            x[i] += d * w;
        }
    }
}

/// Measurement equations of a dynamic factor model.
#[derive(Debug)]
pub struct DfmMeasurements {
    nf: usize,
    nlx: usize,
    descriptors: Vec<MeasurementDescriptor>,
    loadings: Vec<DfmLoading>,
    z: OnceLock<Array2<f64>>,
}

impl DfmMeasurements {
    /// Builds the measurements of `descriptors` on a state of `nf` factors
    /// with `nlx` lags each.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsfError::DimensionMismatch`] | a descriptor does not have `nf` coefficients |
    /// | [`SsfError::InvalidModel`] | a pattern is longer than `nlx`, is empty, or a variance is negative |
    pub fn new(
        nf: usize,
        nlx: usize,
        descriptors: Vec<MeasurementDescriptor>,
    ) -> Result<Self, SsfError> {
        for d in &descriptors {
            if d.coefficients.len() != nf {
                return Err(SsfError::DimensionMismatch {
                    what: "measurement coefficients",
                    expected: nf,
                    got: d.coefficients.len(),
                });
            }
            let len = d.kind.pattern_len();
            if len == 0 || len > nlx {
                return Err(SsfError::InvalidModel {
                    reason: format!("measurement pattern of length {len} does not fit {nlx} lags"),
                });
            }
            if !(d.var >= 0.0) || !d.var.is_finite() {
                return Err(SsfError::InvalidModel {
                    reason: format!("measurement variance must be finite and non-negative, got {}", d.var),
                });
            }
        }
        let loadings = descriptors.iter().map(|d| DfmLoading::new(d, nlx)).collect();
        Ok(Self {
            nf,
            nlx,
            descriptors,
            loadings,
            z: OnceLock::new(),
        })
    }

    /// Descriptors, in equation order.
    pub fn descriptors(&self) -> &[MeasurementDescriptor] {
        &self.descriptors
    }

    /// State dimension `nf * nlx`.
    pub fn state_dim(&self) -> usize {
        self.nf * self.nlx
    }

    /// Dense loading matrix (`count x nf * nlx`), built on first use.
    pub fn z_matrix(&self) -> &Array2<f64> {
        self.z.get_or_init(|| {
            let mut z = Array2::zeros((self.loadings.len(), self.state_dim()));
            for (row, loading) in z.rows_mut().into_iter().zip(&self.loadings) {
                loading.z(0, row);
            }
            z
        })
    }
}

impl Measurements for DfmMeasurements {
    fn count(&self) -> usize {
        self.loadings.len()
    }

    fn loading(&self, i: usize) -> &dyn Loading {
        &self.loadings[i]
    }

    fn error_variance(&self, _pos: usize, i: usize) -> f64 {
        self.descriptors[i].var
    }

    fn is_time_invariant(&self) -> bool {
        true
    }
}
