//! Pairwise distance matrices between two tables' columns.

use serde::Serialize;

/// Distances from every source column (rows) to every target column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    sources: Vec<String>,
    targets: Vec<String>,
    /// Row-major, `sources.len() * targets.len()` entries.
    distances: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds a matrix by evaluating `distance(source_index, target_index)`.
    pub fn from_fn(
        sources: Vec<String>,
        targets: Vec<String>,
        mut distance: impl FnMut(usize, usize) -> f64,
    ) -> Self {
        let mut distances = Vec::with_capacity(sources.len() * targets.len());
        for row in 0..sources.len() {
            for col in 0..targets.len() {
                distances.push(distance(row, col));
            }
        }
        Self {
            sources,
            targets,
            distances,
        }
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn get(&self, source: &str, target: &str) -> Option<f64> {
        let row = self.source_index(source)?;
        let col = self.targets.iter().position(|t| t == target)?;
        self.distances.get(row * self.targets.len() + col).copied()
    }

    /// Distances from `source` to each target, in target order.
    pub fn row(&self, source: &str) -> Option<&[f64]> {
        let row = self.source_index(source)?;
        let width = self.targets.len();
        self.distances.get(row * width..(row + 1) * width)
    }

    /// The closest target to `source`.
    ///
    /// Equal distances are broken by the lexicographically smallest target
    /// name. Returns `None` for unknown sources and when there are no targets.
    pub fn nearest(&self, source: &str) -> Option<(&str, f64)> {
        let row = self.row(source)?;
        self.targets
            .iter()
            .zip(row)
            .min_by(|(a_name, a), (b_name, b)| a.total_cmp(b).then_with(|| a_name.cmp(b_name)))
            .map(|(name, distance)| (name.as_str(), *distance))
    }

    fn source_index(&self, source: &str) -> Option<usize> {
        self.sources.iter().position(|s| s == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_lookup() {
        let matrix = DistanceMatrix::from_fn(names(&["a", "b"]), names(&["x", "y", "z"]), |r, c| {
            (r * 10 + c) as f64
        });
        assert_eq!(matrix.get("b", "y"), Some(11.0));
        assert_eq!(matrix.row("a"), Some([0.0, 1.0, 2.0].as_slice()));
        assert_eq!(matrix.get("c", "x"), None);
        assert_eq!(matrix.nearest("b"), Some(("x", 10.0)));
    }

    #[test]
    fn test_nearest_tie_break() {
        let matrix =
            DistanceMatrix::from_fn(names(&["a"]), names(&["zeta", "beta", "alpha"]), |_, c| {
                if c == 0 { 0.1 } else { 0.3 }
            });
        assert_eq!(matrix.nearest("a"), Some(("zeta", 0.1)));

        let tied = DistanceMatrix::from_fn(names(&["a"]), names(&["zeta", "beta", "alpha"]), |_, _| 0.5);
        assert_eq!(tied.nearest("a"), Some(("alpha", 0.5)));
    }

    #[test]
    fn test_no_targets() {
        let matrix = DistanceMatrix::from_fn(names(&["a"]), Vec::new(), |_, _| 0.0);
        assert!(matrix.row("a").is_some_and(<[f64]>::is_empty));
        assert_eq!(matrix.nearest("a"), None);
    }
}
