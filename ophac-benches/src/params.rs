//! Benchmark parameter types.

use std::fmt;

/// Parameters for one generation benchmark.
#[derive(Clone, Copy, Debug)]
pub struct GenerateBenchParams {
    /// Number of items in the dissimilarity matrix.
    pub items: usize,
    /// Number of distinct dissimilarity levels; `None` draws distinct values.
    pub levels: Option<u32>,
    /// Probability that a forward pair is ordered.
    pub order_density: f64,
}

impl fmt::Display for GenerateBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.levels {
            Some(levels) => write!(f, "n={},levels={levels}", self.items)?,
            None => write!(f, "n={},distinct", self.items)?,
        }
        if self.order_density > 0.0 {
            write!(f, ",order={}", self.order_density)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(Some(2), 0.0, "n=5,levels=2")]
    #[case(None, 0.0, "n=5,distinct")]
    #[case(Some(3), 0.25, "n=5,levels=3,order=0.25")]
    fn labels_name_the_workload(
        #[case] levels: Option<u32>,
        #[case] order_density: f64,
        #[case] expected: &str,
    ) {
        let params = GenerateBenchParams {
            items: 5,
            levels,
            order_density,
        };
        assert_eq!(params.to_string(), expected);
    }
}
