//! Benchmarking constraints.
//!
//! Contemporaneous constraints tie series of the same frequency at every
//! period (`t = a + 2*b - c`); temporal constraints tie a series to a
//! lower-frequency aggregate (`y = sum(x)`).

use std::fmt;
use std::str::FromStr;

use crate::error::BenchmarkError;

/// How sub-periods combine into one aggregate period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// Flow: sum of the sub-periods.
    #[default]
    Sum,
    /// Mean of the sub-periods.
    Average,
    /// Stock at the beginning of the period.
    First,
    /// Stock at the end of the period.
    Last,
}

impl Aggregation {
    /// Weight of sub-period lag `l` (0 = last sub-period) among `k`.
    pub fn weight(self, l: usize, k: usize) -> f64 {
        match self {
            Aggregation::Sum => 1.0,
            Aggregation::Average => 1.0 / k as f64,
            Aggregation::First => {
                if l + 1 == k {
                    1.0
                } else {
                    0.0
                }
            }
            Aggregation::Last => {
                if l == 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Aggregates `values` (chronological order).
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::First => values.first().copied().unwrap_or(f64::NAN),
            Aggregation::Last => values.last().copied().unwrap_or(f64::NAN),
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Average => "average",
            Aggregation::First => "first",
            Aggregation::Last => "last",
        }
    }
}

impl FromStr for Aggregation {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "average" | "avg" | "mean" => Ok(Aggregation::Average),
            "first" => Ok(Aggregation::First),
            "last" => Ok(Aggregation::Last),
            other => Err(BenchmarkError::InvalidSpec {
                reason: format!("unknown aggregation '{other}'"),
            }),
        }
    }
}

/// Left-hand side of a contemporaneous constraint.
#[derive(Clone, Debug, PartialEq)]
pub enum Total {
    /// A benchmark series.
    Series(String),
    /// A fixed value.
    Constant(f64),
}

/// `total = Σ weight * component`, components possibly given by a prefix
/// wildcard (`reg*`).
#[derive(Clone, Debug, PartialEq)]
pub struct ContemporaneousConstraint {
    text: String,
    total: Total,
    components: Vec<(f64, String)>,
}

impl ContemporaneousConstraint {
    /// Parses `total = [w *] name (+|-) [w *] name ...`.
    ///
    /// ```
    /// use saga_benchmarking::{ContemporaneousConstraint, Total};
    ///
    /// let c = ContemporaneousConstraint::parse("t = a + 2*b - c").unwrap();
    /// assert_eq!(c.total(), &Total::Series("t".to_string()));
    /// assert_eq!(c.components()[1], (2.0, "b".to_string()));
    /// assert_eq!(c.components()[2], (-1.0, "c".to_string()));
    /// ```
    ///
    /// # Errors
    ///
    /// [`BenchmarkError::InvalidConstraint`] on malformed input.
    pub fn parse(text: &str) -> Result<Self, BenchmarkError> {
        let invalid = |reason: &str| BenchmarkError::InvalidConstraint {
            constraint: text.to_string(),
            reason: reason.to_string(),
        };
        let (lhs, rhs) = text.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let lhs = lhs.trim();
        let total = match lhs.parse::<f64>() {
            Ok(v) if v.is_finite() => Total::Constant(v),
            _ if is_name(lhs) => Total::Series(lhs.to_string()),
            _ => return Err(invalid("left-hand side must be a series name or a number")),
        };

        let mut components = Vec::new();
        for (sign, term) in split_terms(rhs).map_err(|reason| invalid(&reason))? {
            let (weight, name) = match term.split_once('*') {
                Some((w, n)) if !n.trim().is_empty() => {
                    let w = w
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|w| w.is_finite())
                        .ok_or_else(|| invalid("bad weight"))?;
                    (w, n.trim())
                }
                _ => (1.0, term.as_str()),
            };
            let pattern = name.strip_suffix('*').unwrap_or(name);
            if !is_name(pattern) {
                return Err(invalid("bad component name"));
            }
            components.push((sign * weight, name.to_string()));
        }
        if components.is_empty() {
            return Err(invalid("empty right-hand side"));
        }
        Ok(Self {
            text: text.trim().to_string(),
            total,
            components,
        })
    }

    /// Total side.
    pub fn total(&self) -> &Total {
        &self.total
    }

    /// `(weight, name)` terms as written; wildcard names end with `*`.
    pub fn components(&self) -> &[(f64, String)] {
        &self.components
    }

    /// Source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Resolves wildcards against `names`, excluding the total itself.
    ///
    /// # Errors
    ///
    /// [`BenchmarkError::InvalidConstraint`] when a wildcard matches nothing.
    pub fn expand<'a, I>(&self, names: I) -> Result<Self, BenchmarkError>
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let total_name = match &self.total {
            Total::Series(n) => Some(n.as_str()),
            Total::Constant(_) => None,
        };
        let mut components = Vec::with_capacity(self.components.len());
        for (w, name) in &self.components {
            match name.strip_suffix('*') {
                Some(prefix) => {
                    let before = components.len();
                    for candidate in names.clone() {
                        if candidate.starts_with(prefix) && Some(candidate) != total_name {
                            components.push((*w, candidate.to_string()));
                        }
                    }
                    if components.len() == before {
                        return Err(BenchmarkError::InvalidConstraint {
                            constraint: self.text.clone(),
                            reason: format!("wildcard '{name}' matches no series"),
                        });
                    }
                }
                None => components.push((*w, name.clone())),
            }
        }
        Ok(Self {
            text: self.text.clone(),
            total: self.total.clone(),
            components,
        })
    }
}

impl fmt::Display for ContemporaneousConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Splits `a + 2*b - c` into signed terms.
fn split_terms(rhs: &str) -> Result<Vec<(f64, String)>, String> {
    let mut terms = Vec::new();
    let mut sign = 1.0;
    let mut current = String::new();
    let mut pending_sign = true;
    for c in rhs.chars() {
        match c {
            '+' | '-' => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    if !pending_sign {
                        return Err("dangling operator".to_string());
                    }
                } else {
                    terms.push((sign, trimmed.to_string()));
                    current.clear();
                    sign = 1.0;
                }
                if c == '-' {
                    sign = -sign;
                }
                pending_sign = false;
            }
            _ => {
                if !c.is_whitespace() {
                    pending_sign = true;
                }
                current.push(c);
            }
        }
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        if !terms.is_empty() || !pending_sign {
            return Err("dangling operator".to_string());
        }
    } else {
        terms.push((sign, trimmed.to_string()));
    }
    Ok(terms)
}

/// `aggregate = aggregation(detail)`: the low-frequency series `aggregate`
/// is the aggregation of `detail`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TemporalConstraint {
    /// High-frequency series to benchmark.
    pub detail: String,
    /// Low-frequency benchmark series.
    pub aggregate: String,
    /// Aggregation rule.
    pub aggregation: Aggregation,
}

impl TemporalConstraint {
    /// Builds a constraint.
    pub fn new(detail: impl Into<String>, aggregate: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            detail: detail.into(),
            aggregate: aggregate.into(),
            aggregation,
        }
    }

    /// Parses `aggregate = sum(detail)` (also `average`, `first`, `last`).
    ///
    /// # Errors
    ///
    /// [`BenchmarkError::InvalidConstraint`] on malformed input.
    pub fn parse(text: &str) -> Result<Self, BenchmarkError> {
        let invalid = |reason: &str| BenchmarkError::InvalidConstraint {
            constraint: text.to_string(),
            reason: reason.to_string(),
        };
        let (lhs, rhs) = text.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let aggregate = lhs.trim();
        if !is_name(aggregate) {
            return Err(invalid("left-hand side must be a series name"));
        }
        let rhs = rhs.trim();
        let (func, rest) = rhs.split_once('(').ok_or_else(|| invalid("expected 'aggregation(series)'"))?;
        let detail = rest
            .strip_suffix(')')
            .map(str::trim)
            .ok_or_else(|| invalid("missing ')'"))?;
        if !is_name(detail) {
            return Err(invalid("bad series name"));
        }
        let aggregation = func.parse::<Aggregation>().map_err(|_| invalid("unknown aggregation"))?;
        Ok(Self::new(detail, aggregate, aggregation))
    }
}

impl fmt::Display for TemporalConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}({})", self.aggregate, self.aggregation.keyword(), self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let c = ContemporaneousConstraint::parse("t = a + 2*b - c").unwrap();
        assert_eq!(c.total(), &Total::Series("t".to_string()));
        assert_eq!(
            c.components(),
            &[
                (1.0, "a".to_string()),
                (2.0, "b".to_string()),
                (-1.0, "c".to_string())
            ]
        );
    }

    #[test]
    fn parse_constant_total_and_leading_sign() {
        let c = ContemporaneousConstraint::parse("0 = -a + 0.5 * b").unwrap();
        assert_eq!(c.total(), &Total::Constant(0.0));
        assert_eq!(c.components()[0], (-1.0, "a".to_string()));
        assert_eq!(c.components()[1], (0.5, "b".to_string()));
    }

    #[test]
    fn parse_errors() {
        for bad in ["t a + b", "t = ", "t = a +", "t = a + + b", "t = 2x*a", "1t = a", "t = a b"] {
            assert!(
                matches!(
                    ContemporaneousConstraint::parse(bad),
                    Err(BenchmarkError::InvalidConstraint { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn wildcard_expansion() {
        let c = ContemporaneousConstraint::parse("reg = reg*").unwrap();
        let names = ["reg", "reg1", "reg2", "other"];
        let e = c.expand(names.iter().copied()).unwrap();
        assert_eq!(
            e.components(),
            &[(1.0, "reg1".to_string()), (1.0, "reg2".to_string())]
        );
        let none = ContemporaneousConstraint::parse("t = zz*").unwrap();
        assert!(none.expand(names.iter().copied()).is_err());
    }

    #[test]
    fn temporal_parse() {
        let t = TemporalConstraint::parse("y = sum(x)").unwrap();
        assert_eq!(t, TemporalConstraint::new("x", "y", Aggregation::Sum));
        assert_eq!(t.to_string(), "y = sum(x)");
        let t = TemporalConstraint::parse("Y = Average( x1 )").unwrap();
        assert_eq!(t.aggregation, Aggregation::Average);
        assert_eq!(t.detail, "x1");
        assert!(TemporalConstraint::parse("y = median(x)").is_err());
        assert!(TemporalConstraint::parse("y = sum(x").is_err());
    }

    #[test]
    fn aggregation_weights() {
        assert_eq!(Aggregation::Sum.weight(2, 3), 1.0);
        assert_eq!(Aggregation::Average.weight(0, 4), 0.25);
        assert_eq!(Aggregation::First.weight(2, 3), 1.0);
        assert_eq!(Aggregation::First.weight(0, 3), 0.0);
        assert_eq!(Aggregation::Last.weight(0, 3), 1.0);
        assert_eq!(Aggregation::Last.apply(&[1.0, 2.0]), 2.0);
        assert_eq!(Aggregation::First.apply(&[1.0, 2.0]), 1.0);
    }
}
