//! Classification of a numeric series into class breaks, plus interval labels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification scheme for binned legends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    /// k equal-count bins over the sorted series.
    Quantiles,
    /// k equal-width bins spanning [min, max].
    EqualInterval,
    /// Fisher-Jenks optimal-variance partition.
    NaturalBreaks,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("unsupported classification scheme: {0}")]
    UnsupportedScheme(String),
}

impl Scheme {
    /// Parse a scheme name, accepting the common aliases case-insensitively.
    pub fn parse(name: &str) -> Result<Scheme, ClassifyError> {
        match name.to_ascii_lowercase().as_str() {
            "quantile" | "quantiles" | "q" => Ok(Scheme::Quantiles),
            "equal" | "equalinterval" | "e" => Ok(Scheme::EqualInterval),
            "natural" | "fisherjenks" | "jenks" | "fj" => Ok(Scheme::NaturalBreaks),
            _ => Err(ClassifyError::UnsupportedScheme(name.to_string())),
        }
    }
}

impl std::str::FromStr for Scheme {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::parse(s)
    }
}

/// Compute class break boundaries for `values` under `scheme`.
///
/// Missing and non-finite values are dropped first. An empty series yields an
/// empty break list; callers must treat that as "no legend possible", not an
/// error. Otherwise the result has exactly `k + 1` non-decreasing boundaries:
/// the true series minimum, the scheme's k-1 inner boundaries, and the true
/// series maximum (raised if the scheme's last boundary undershoots it).
pub fn compute_breaks(values: &[Option<f64>], scheme: Scheme, k: usize) -> Vec<f64> {
    let mut s: Vec<f64> = values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect();
    if s.is_empty() || k == 0 {
        return Vec::new();
    }
    s.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let lower = s[0];
    let upper = s[s.len() - 1];

    let inner = match scheme {
        Scheme::Quantiles => quantile_boundaries(&s, k),
        Scheme::EqualInterval => equal_interval_boundaries(lower, upper, k),
        Scheme::NaturalBreaks => jenks_boundaries(&s, k),
    };

    let mut bounds = Vec::with_capacity(k + 1);
    bounds.push(lower);
    bounds.extend(inner);
    bounds.push(upper);
    // guard against a scheme whose last inner boundary exceeds the true max
    for b in bounds.iter_mut() {
        if *b > upper {
            *b = upper;
        }
    }
    bounds
}

/// k-1 inner boundaries at the i/k quantiles, linearly interpolated.
fn quantile_boundaries(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    (1..k)
        .map(|i| {
            let pos = (i as f64 / k as f64) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let frac = pos - lo as f64;
            if lo + 1 < n {
                sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
            } else {
                sorted[lo]
            }
        })
        .collect()
}

fn equal_interval_boundaries(lower: f64, upper: f64, k: usize) -> Vec<f64> {
    let width = (upper - lower) / k as f64;
    (1..k).map(|i| lower + width * i as f64).collect()
}

/// Fisher-Jenks: minimize within-class sum of squared deviations via the
/// classic O(k*n^2) dynamic program over prefix sums. Returns the upper value
/// of each of the first k-1 classes. Fewer values than classes pads with the
/// maximum so the caller's k+1 invariant still holds.
fn jenks_boundaries(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    let upper = sorted[n - 1];
    if k == 1 {
        return Vec::new();
    }
    if n <= k {
        let mut inner: Vec<f64> = sorted[..n - 1].to_vec();
        inner.resize(k - 1, upper);
        return inner;
    }

    // prefix sums of x and x^2 for O(1) class cost
    let mut s1 = vec![0.0; n + 1];
    let mut s2 = vec![0.0; n + 1];
    for (i, &x) in sorted.iter().enumerate() {
        s1[i + 1] = s1[i] + x;
        s2[i + 1] = s2[i] + x * x;
    }
    let cost = |i: usize, j: usize| -> f64 {
        // sum of squared deviations of sorted[i..j]
        let cnt = (j - i) as f64;
        let sum = s1[j] - s1[i];
        (s2[j] - s2[i]) - sum * sum / cnt
    };

    // dp[m][j]: best cost splitting the first j values into m classes
    let mut dp = vec![vec![f64::INFINITY; n + 1]; k + 1];
    let mut split = vec![vec![0usize; n + 1]; k + 1];
    for j in 1..=n {
        dp[1][j] = cost(0, j);
    }
    for m in 2..=k {
        for j in m..=n {
            for i in (m - 1)..j {
                let c = dp[m - 1][i] + cost(i, j);
                if c < dp[m][j] {
                    dp[m][j] = c;
                    split[m][j] = i;
                }
            }
        }
    }

    // walk the split points back; each class's upper value is a boundary
    let mut ends = vec![0usize; k + 1];
    ends[k] = n;
    for m in (2..=k).rev() {
        ends[m - 1] = split[m][ends[m]];
    }
    (1..k).map(|m| sorted[ends[m] - 1]).collect()
}

/// One label per adjacent break pair, joined with an en-dash.
///
/// Integer-valued boundaries print as plain integers, everything else as a
/// two-significant-figure compact number.
pub fn interval_labels(breaks: &[f64]) -> Vec<String> {
    breaks
        .windows(2)
        .map(|w| format!("{}\u{2013}{}", fmt_number(w[0]), fmt_number(w[1])))
        .collect()
}

/// Integer boundaries print plain, everything else as two significant figures.
pub(crate) fn fmt_number(x: f64) -> String {
    if (x - x.round()).abs() < 1e-9 {
        return format!("{}", x.round() as i64);
    }
    // round to two significant figures
    let mag = x.abs().log10().floor() as i32;
    let factor = 10f64.powi(1 - mag);
    let rounded = (x * factor).round() / factor;
    let decimals = (1 - mag).max(0) as usize;
    let s = format!("{:.*}", decimals, rounded);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
