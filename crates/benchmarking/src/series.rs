//! Regular time series: frequencies, periods, domains and data.

use std::fmt;

use crate::constraint::Aggregation;
use crate::error::BenchmarkError;

/// Number of periods per year of a regular series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TsFrequency {
    /// One period per year.
    Yearly,
    /// Two periods per year.
    HalfYearly,
    /// Three periods per year.
    QuadriMonthly,
    /// Four periods per year.
    Quarterly,
    /// Six periods per year.
    BiMonthly,
    /// Twelve periods per year.
    Monthly,
}

impl TsFrequency {
    /// Periods per year.
    pub fn periods_per_year(self) -> usize {
        match self {
            TsFrequency::Yearly => 1,
            TsFrequency::HalfYearly => 2,
            TsFrequency::QuadriMonthly => 3,
            TsFrequency::Quarterly => 4,
            TsFrequency::BiMonthly => 6,
            TsFrequency::Monthly => 12,
        }
    }

    /// Frequency with `n` periods per year, if supported.
    pub fn from_periods_per_year(n: usize) -> Option<Self> {
        match n {
            1 => Some(TsFrequency::Yearly),
            2 => Some(TsFrequency::HalfYearly),
            3 => Some(TsFrequency::QuadriMonthly),
            4 => Some(TsFrequency::Quarterly),
            6 => Some(TsFrequency::BiMonthly),
            12 => Some(TsFrequency::Monthly),
            _ => None,
        }
    }

    /// Number of periods of `self` in one period of `lower`, when `self`
    /// is a multiple of `lower`.
    pub fn ratio(self, lower: TsFrequency) -> Option<usize> {
        let (hi, lo) = (self.periods_per_year(), lower.periods_per_year());
        (hi % lo == 0).then_some(hi / lo)
    }
}

impl fmt::Display for TsFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TsFrequency::Yearly => "yearly",
            TsFrequency::HalfYearly => "half-yearly",
            TsFrequency::QuadriMonthly => "quadri-monthly",
            TsFrequency::Quarterly => "quarterly",
            TsFrequency::BiMonthly => "bi-monthly",
            TsFrequency::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

/// One period of a regular series, numbered from year 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TsPeriod {
    freq: TsFrequency,
    index: i64,
}

impl TsPeriod {
    /// Period `position` (0-based) of `year`.
    pub fn new(freq: TsFrequency, year: i32, position: usize) -> Self {
        let ppy = freq.periods_per_year() as i64;
        Self {
            freq,
            index: i64::from(year) * ppy + position as i64,
        }
    }

    /// Frequency.
    pub fn freq(&self) -> TsFrequency {
        self.freq
    }

    /// Absolute index `year * ppy + position`.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Calendar year.
    pub fn year(&self) -> i64 {
        self.index.div_euclid(self.freq.periods_per_year() as i64)
    }

    /// Position in the year (0-based).
    pub fn position(&self) -> usize {
        self.index.rem_euclid(self.freq.periods_per_year() as i64) as usize
    }

    /// Period `n` steps later (earlier when negative).
    pub fn plus(&self, n: i64) -> Self {
        Self {
            freq: self.freq,
            index: self.index + n,
        }
    }

    /// Number of periods from `other` to `self`; both must share a frequency.
    pub fn minus(&self, other: &TsPeriod) -> i64 {
        self.index - other.index
    }

    /// The period of the lower frequency `freq` containing `self`.
    pub fn to_lower(&self, freq: TsFrequency) -> Option<TsPeriod> {
        let k = self.freq.ratio(freq)? as i64;
        Some(TsPeriod {
            freq,
            index: self.index.div_euclid(k),
        })
    }

    /// First period of the higher frequency `freq` inside `self`.
    pub fn first_of(&self, freq: TsFrequency) -> Option<TsPeriod> {
        let k = freq.ratio(self.freq)? as i64;
        Some(TsPeriod {
            freq,
            index: self.index * k,
        })
    }
}

impl fmt::Display for TsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.freq {
            TsFrequency::Yearly => write!(f, "{}", self.year()),
            TsFrequency::Monthly => write!(f, "{}-{:02}", self.year(), self.position() + 1),
            TsFrequency::Quarterly => write!(f, "{}-Q{}", self.year(), self.position() + 1),
            _ => write!(f, "{}-{}", self.year(), self.position() + 1),
        }
    }
}

/// Contiguous range of periods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TsDomain {
    start: TsPeriod,
    len: usize,
}

impl TsDomain {
    /// `len` periods starting at `start`.
    pub fn new(start: TsPeriod, len: usize) -> Self {
        Self { start, len }
    }

    /// Periods from `start` (inclusive) to `end` (exclusive).
    pub fn range(start: TsPeriod, end: TsPeriod) -> Self {
        let len = end.minus(&start).max(0) as usize;
        Self { start, len }
    }

    /// Frequency.
    pub fn freq(&self) -> TsFrequency {
        self.start.freq
    }

    /// First period.
    pub fn start(&self) -> TsPeriod {
        self.start
    }

    /// Period following the last one.
    pub fn end(&self) -> TsPeriod {
        self.start.plus(self.len as i64)
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the domain has no period.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Period `i`.
    pub fn get(&self, i: usize) -> TsPeriod {
        self.start.plus(i as i64)
    }

    /// Position of `p` in the domain.
    pub fn index_of(&self, p: &TsPeriod) -> Option<usize> {
        if p.freq != self.freq() {
            return None;
        }
        let i = p.minus(&self.start);
        (0..self.len as i64).contains(&i).then_some(i as usize)
    }

    /// Returns `true` when `p` belongs to the domain.
    pub fn contains(&self, p: &TsPeriod) -> bool {
        self.index_of(p).is_some()
    }

    /// Common periods of two domains of the same frequency (possibly empty).
    pub fn intersection(&self, other: &TsDomain) -> TsDomain {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        TsDomain::range(start, end.max(start))
    }
}

/// Values on a [`TsDomain`]; NaN marks a missing value.
#[derive(Clone, Debug, PartialEq)]
pub struct TsData {
    domain: TsDomain,
    values: Vec<f64>,
}

impl TsData {
    /// Series starting at `start`.
    pub fn new(start: TsPeriod, values: Vec<f64>) -> Self {
        Self {
            domain: TsDomain::new(start, values.len()),
            values,
        }
    }

    /// Domain.
    pub fn domain(&self) -> TsDomain {
        self.domain
    }

    /// Frequency.
    pub fn freq(&self) -> TsFrequency {
        self.domain.freq()
    }

    /// Values in domain order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `p`, if inside the domain.
    pub fn get(&self, p: &TsPeriod) -> Option<f64> {
        self.domain.index_of(p).map(|i| self.values[i])
    }

    /// Values on `domain` (same frequency), NaN outside the series.
    pub fn fit_to(&self, domain: &TsDomain) -> TsData {
        let values = (0..domain.len())
            .map(|i| self.get(&domain.get(i)).unwrap_or(f64::NAN))
            .collect();
        TsData {
            domain: *domain,
            values,
        }
    }

    /// Restriction to the common periods with `domain`.
    pub fn window(&self, domain: &TsDomain) -> TsData {
        self.fit_to(&self.domain.intersection(domain))
    }

    /// Aggregates to the lower frequency `freq`, keeping complete periods only.
    ///
    /// # Errors
    ///
    /// [`BenchmarkError::IncompatibleFrequency`] when the frequency of the
    /// series is not a multiple of `freq`.
    pub fn aggregate(&self, freq: TsFrequency, aggregation: Aggregation) -> Result<TsData, BenchmarkError> {
        let k = self.freq().ratio(freq).ok_or(BenchmarkError::IncompatibleFrequency {
            name: String::new(),
            detail: self.freq().periods_per_year(),
            aggregate: freq.periods_per_year(),
        })?;
        let (Some(first), Some(last)) = (
            self.domain.start().plus(k as i64 - 1).to_lower(freq),
            self.domain.end().to_lower(freq),
        ) else {
            return Ok(TsData::new(TsPeriod::new(freq, 0, 0), Vec::new()));
        };
        let lower = TsDomain::range(first, last);
        let values = (0..lower.len())
            .map(|j| {
                let mut sub = [0.0; 12];
                let start = lower.get(j).first_of(self.freq()).unwrap_or(self.domain.start());
                for (l, s) in sub.iter_mut().enumerate().take(k) {
                    *s = self.get(&start.plus(l as i64)).unwrap_or(f64::NAN);
                }
                aggregation.apply(&sub[..k])
            })
            .collect();
        Ok(TsData {
            domain: lower,
            values,
        })
    }
}
