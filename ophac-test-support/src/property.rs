//! Property-test run profile and input strategies.
//!
//! Suites read the case count and fork mode through [`proptest_config`], so
//! CI can widen or narrow every property at once through the environment.

use std::{env, ops::RangeInclusive};

use proptest::{prelude::*, test_runner::Config};

/// Environment variable overriding the number of cases per property.
pub const OPHAC_PBT_CASES_ENV_KEY: &str = "OPHAC_PBT_CASES";
/// Environment variable enabling forked proptest execution.
pub const OPHAC_PBT_FORK_ENV_KEY: &str = "OPHAC_PBT_FORK";

/// Case count and fork mode for one property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunProfile {
    cases: u32,
    fork: bool,
}

impl RunProfile {
    /// Resolves the profile from the environment, falling back to the given
    /// defaults for missing or malformed overrides.
    ///
    /// # Examples
    /// ```
    /// use ophac_test_support::property::RunProfile;
    ///
    /// let profile = RunProfile::load(32, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self::resolve(default_cases, default_fork, |key| env::var(key).ok())
    }

    fn resolve<F>(default_cases: u32, default_fork: bool, lookup: F) -> Self
    where
        F: Fn(&'static str) -> Option<String>,
    {
        Self {
            cases: override_or(&lookup, OPHAC_PBT_CASES_ENV_KEY, default_cases, parse_cases),
            fork: override_or(&lookup, OPHAC_PBT_FORK_ENV_KEY, default_fork, parse_switch),
        }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub const fn cases(self) -> u32 {
        self.cases
    }

    /// Whether each case runs in a forked subprocess.
    #[must_use]
    pub const fn fork(self) -> bool {
        self.fork
    }
}

/// Builds a proptest configuration from the environment profile.
#[must_use]
pub fn proptest_config(default_cases: u32) -> Config {
    let profile = RunProfile::load(default_cases, false);
    Config {
        cases: profile.cases(),
        fork: profile.fork(),
        ..Config::default()
    }
}

fn override_or<T, L, P>(lookup: &L, key: &'static str, default: T, parse: P) -> T
where
    L: Fn(&'static str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    parse(raw.trim()).unwrap_or_else(|| {
        tracing::warn!(env = key, raw = %raw, "ignoring malformed property-test override");
        default
    })
}

fn parse_cases(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|&cases| cases > 0)
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Symmetric, zero-diagonal rows over `items` whose off-diagonal entries are
/// drawn from `1..=levels`.
///
/// Few levels produce many ties, which is where the search branches.
pub fn tied_rows(
    items: RangeInclusive<usize>,
    levels: u32,
) -> impl Strategy<Value = Vec<Vec<f64>>> {
    let top = levels.max(1);
    items.prop_flat_map(move |size| {
        proptest::collection::vec(1..=top, pair_count(size))
            .prop_map(move |upper| rows_from_upper(size, upper.into_iter().map(f64::from)))
    })
}

/// Symmetric, zero-diagonal rows over `items` with entries in `(0, 100)`.
pub fn real_rows(items: RangeInclusive<usize>) -> impl Strategy<Value = Vec<Vec<f64>>> {
    items.prop_flat_map(|size| {
        proptest::collection::vec(0.001_f64..100.0, pair_count(size))
            .prop_map(move |upper| rows_from_upper(size, upper))
    })
}

/// Edges `(a, b)` with `a < b` over `nodes` items; always acyclic.
pub fn forward_edges(nodes: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    let candidates: Vec<(usize, usize)> = (0..nodes)
        .flat_map(|a| (a + 1..nodes).map(move |b| (a, b)))
        .collect();
    let count = candidates.len();
    proptest::collection::vec(any::<bool>(), count).prop_map(move |keep| {
        candidates
            .iter()
            .zip(keep)
            .filter_map(|(&edge, kept)| kept.then_some(edge))
            .collect()
    })
}

/// Number of unordered pairs over `size` items.
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "n(n - 1) is always even"
)]
pub(crate) const fn pair_count(size: usize) -> usize {
    size * size.saturating_sub(1) / 2
}

pub(crate) fn rows_from_upper(size: usize, upper: impl IntoIterator<Item = f64>) -> Vec<Vec<f64>> {
    let mut rows = vec![vec![0.0; size]; size];
    let mut values = upper.into_iter();
    for i in 0..size {
        for j in i + 1..size {
            let value = values.next().unwrap_or(0.0);
            set(&mut rows, i, j, value);
            set(&mut rows, j, i, value);
        }
    }
    rows
}

fn set(rows: &mut [Vec<f64>], row: usize, col: usize, value: f64) {
    if let Some(slot) = rows.get_mut(row).and_then(|cells| cells.get_mut(col)) {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use rstest::rstest;

    fn resolve_with(overrides: &[(&'static str, &str)]) -> RunProfile {
        let env: HashMap<&'static str, String> = overrides
            .iter()
            .map(|&(key, value)| (key, value.to_owned()))
            .collect();
        RunProfile::resolve(64, false, |key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_overrides() {
        assert_eq!(
            resolve_with(&[]),
            RunProfile {
                cases: 64,
                fork: false
            }
        );
    }

    #[rstest]
    #[case("8", 8)]
    #[case(" 512 ", 512)]
    #[case("0", 64)]
    #[case("-3", 64)]
    #[case("many", 64)]
    fn case_overrides(#[case] raw: &str, #[case] expected: u32) {
        assert_eq!(resolve_with(&[(OPHAC_PBT_CASES_ENV_KEY, raw)]).cases(), expected);
    }

    #[rstest]
    #[case("on", true)]
    #[case("YES", true)]
    #[case("0", false)]
    #[case("sometimes", false)]
    fn fork_overrides(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(resolve_with(&[(OPHAC_PBT_FORK_ENV_KEY, raw)]).fork(), expected);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(4, 6)]
    fn pairs_cover_the_upper_triangle(#[case] size: usize, #[case] expected: usize) {
        assert_eq!(pair_count(size), expected);
    }

    #[test]
    fn rows_mirror_the_upper_triangle() {
        let rows = rows_from_upper(3, [1.0, 2.0, 3.0]);
        assert_eq!(
            rows,
            vec![
                vec![0.0, 1.0, 2.0],
                vec![1.0, 0.0, 3.0],
                vec![2.0, 3.0, 0.0],
            ]
        );
    }
}
