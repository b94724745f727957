//! Stationary initialization of VAR state vectors.
//!
//! The unconditional covariance `P` of a stable companion state solves the
//! discrete Lyapunov equation `P = T P T' + V`. It is computed once on the
//! `nf * nl` companion block and extended to the `nlx` lags of the state by
//! iterating the covariance recursion, since the extra lags are pure
//! copies of earlier slots. Independent factors are solved one block at a
//! time, so the cost grows linearly with their number.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use ndarray::{Array2, ArrayView2, ArrayViewMut1, ArrayViewMut2, s};
use parking_lot::Mutex;
use saga_math::{MathError, linalg};
use tracing::{debug, trace};

use crate::contract::{Dynamics, Initialization};
use crate::error::SsfError;
use crate::var::{VarDescriptor, VarDynamics};

/// Default number of covariance matrices kept by a [`CovarianceCache`].
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Solves `P = T P T' + Q` for symmetric `P`.
///
/// The `n (n + 1) / 2` upper-triangular entries are the unknowns of a dense
/// linear system solved by Gaussian elimination.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SsfError::DimensionMismatch`] | `t` and `q` are not square of the same size |
/// | [`SsfError::Singular`] | `T` has an eigenvalue pair with product 1 (unit root) |
pub fn solve_lyapunov(t: ArrayView2<f64>, q: ArrayView2<f64>) -> Result<Array2<f64>, SsfError> {
    let n = t.nrows();
    for (what, (rows, cols)) in [("transition", t.dim()), ("innovation covariance", q.dim())] {
        if rows != n || cols != n {
            return Err(SsfError::DimensionMismatch {
                what,
                expected: n,
                got: if rows != n { rows } else { cols },
            });
        }
    }

    let m = n * (n + 1) / 2;
    let idx = |i: usize, j: usize| -> usize {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        i * n - i * (i + 1) / 2 + j
    };

    let mut a = Array2::<f64>::zeros((m, m));
    let mut b = vec![0.0; m];
    for i in 0..n {
        for j in i..n {
            let r = idx(i, j);
            a[[r, r]] += 1.0;
            b[r] = q[[i, j]];
            for k in 0..n {
                let tik = t[[i, k]];
                if tik == 0.0 {
                    continue;
                }
                for l in 0..n {
                    let w = tik * t[[j, l]];
                    if w != 0.0 {
                        a[[r, idx(k, l)]] -= w;
                    }
                }
            }
        }
    }

    let x = linalg::solve(a.view(), &b).map_err(|e| match e {
        MathError::Singular { .. } => SsfError::Singular,
        other => SsfError::Math(other),
    })?;

    let mut p = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let v = x[idx(i, j)];
            p[[i, j]] = v;
            p[[j, i]] = v;
        }
    }
    Ok(p)
}

/// Unconditional covariance of the state of `dynamics`.
///
/// # Errors
///
/// [`SsfError::Singular`] when the VAR is not stationary.
pub fn steady_state_covariance(dynamics: &VarDynamics) -> Result<Array2<f64>, SsfError> {
    let (nf, nl, nlx) = (dynamics.nf(), dynamics.nl(), dynamics.nlx());
    let desc = dynamics.descriptor();
    let pc = if is_decoupled(desc) {
        let mut pc = Array2::zeros((nf * nl, nf * nl));
        for f in 0..nf {
            let own = VarDescriptor::new(
                1,
                nl,
                desc.coefficients().slice(s![f..=f, f * nl..(f + 1) * nl]).to_owned(),
                desc.innovations().slice(s![f..=f, f..=f]).to_owned(),
            )?;
            let block = companion_covariance(&own)?;
            pc.slice_mut(s![f * nl..(f + 1) * nl, f * nl..(f + 1) * nl])
                .assign(&block);
        }
        pc
    } else {
        companion_covariance(desc)?
    };

    let n = dynamics.dim();
    let mut p = Array2::zeros((n, n));
    for g in 0..nf {
        for h in 0..nf {
            for l in 0..nl {
                for m in 0..nl {
                    p[[g * nlx + l, h * nlx + m]] = pc[[g * nl + l, h * nl + m]];
                }
            }
        }
    }
    for _ in nl..nlx {
        dynamics.tvt(0, p.view_mut());
        dynamics.add_v(0, p.view_mut());
    }
    linalg::symmetrize(p.view_mut());
    trace!(nf, nl, nlx, "steady-state covariance computed");
    Ok(p)
}

/// Lyapunov solution on the `nf * nl` companion block of `desc`.
fn companion_covariance(desc: &VarDescriptor) -> Result<Array2<f64>, SsfError> {
    let core = VarDynamics::new(desc.clone(), desc.nl())?;
    let nc = core.dim();
    let mut t = Array2::zeros((nc, nc));
    core.t(0, t.view_mut());
    let mut q = Array2::zeros((nc, nc));
    core.v(0, q.view_mut());
    solve_lyapunov(t.view(), q.view())
}

/// No cross-factor coefficient and uncorrelated innovations: the factors
/// are independent and each block can be solved on its own.
fn is_decoupled(desc: &VarDescriptor) -> bool {
    let (nf, nl) = (desc.nf(), desc.nl());
    nf > 1
        && (0..nf).all(|f| {
            (0..nf).filter(|&g| g != f).all(|g| {
                desc.innovations()[[f, g]] == 0.0
                    && (1..=nl).all(|lag| desc.coefficient(f, g, lag) == 0.0)
            })
        })
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    nf: usize,
    nl: usize,
    nlx: usize,
    bits: Vec<u64>,
}

impl CacheKey {
    fn new(dynamics: &VarDynamics) -> Self {
        let desc = dynamics.descriptor();
        let bits = desc
            .coefficients()
            .iter()
            .chain(desc.innovations().iter())
            .map(|v| v.to_bits())
            .collect();
        Self {
            nf: desc.nf(),
            nl: desc.nl(),
            nlx: dynamics.nlx(),
            bits,
        }
    }
}

/// Snapshot of [`CovarianceCache`] usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to solve the Lyapunov equation.
    pub misses: u64,
    /// Entries currently held.
    pub len: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheInner {
    entries: LruCache<CacheKey, Arc<Array2<f64>>>,
    hits: u64,
    misses: u64,
}

/// Bounded, thread-safe memo of steady-state covariances keyed by the
/// exact values of the VAR parameters and the number of lags.
///
/// Owned by the caller and shared by reference (or `Arc`) between the
/// processors that need it.
pub struct CovarianceCache {
    inner: Mutex<CacheInner>,
}

impl std::fmt::Debug for CovarianceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CovarianceCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for CovarianceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CovarianceCache {
    /// Creates a cache holding at most `capacity` matrices (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Returns the steady-state covariance of `dynamics`, computing it on a miss.
    pub fn get_or_compute(&self, dynamics: &VarDynamics) -> Result<Arc<Array2<f64>>, SsfError> {
        let key = CacheKey::new(dynamics);
        {
            let mut inner = self.inner.lock();
            if let Some(p) = inner.entries.get(&key).cloned() {
                inner.hits += 1;
                return Ok(p);
            }
            inner.misses += 1;
        }
        debug!(dim = dynamics.dim(), "covariance cache miss");
        let p = Arc::new(steady_state_covariance(dynamics)?);
        self.inner.lock().entries.put(key, Arc::clone(&p));
        Ok(p)
    }

    /// Usage counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            len: inner.entries.len(),
        }
    }

    /// Drops all entries and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }
}

/// Zero-mean initial state with the unconditional covariance of a VAR.
#[derive(Clone, Debug)]
pub struct SteadyStateInitialization {
    p0: Arc<Array2<f64>>,
}

impl SteadyStateInitialization {
    /// Solves for the covariance of `dynamics`.
    pub fn new(dynamics: &VarDynamics) -> Result<Self, SsfError> {
        Ok(Self {
            p0: Arc::new(steady_state_covariance(dynamics)?),
        })
    }

    /// Looks the covariance up in `cache`, solving only on a miss.
    pub fn cached(dynamics: &VarDynamics, cache: &CovarianceCache) -> Result<Self, SsfError> {
        Ok(Self {
            p0: cache.get_or_compute(dynamics)?,
        })
    }

    /// Initial covariance.
    pub fn covariance(&self) -> &Array2<f64> {
        &self.p0
    }
}

impl Initialization for SteadyStateInitialization {
    fn dim(&self) -> usize {
        self.p0.nrows()
    }

    fn a0(&self, mut out: ArrayViewMut1<f64>) {
        out.fill(0.0);
    }

    fn pf0(&self, mut out: ArrayViewMut2<f64>) {
        out.assign(&self.p0);
    }
}
