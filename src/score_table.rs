//! The 2D (distance, alignment) score lookup table.

use crate::error::NblastError;

/// A lookup table mapping (distance, unsigned tangent alignment) to a score.
///
/// The table stores one score per (distance breakpoint, alignment breakpoint)
/// pair, row-major with distance as the row axis. Scores are
/// log-likelihood-ratio-like quantities fit against matched and random neuron
/// pairs; they carry no unit and are frequently negative.
///
/// `lookup` interpolates bilinearly between grid values and clamps queries
/// outside the breakpoint range to the boundary cells, so a distance past the
/// last breakpoint scores exactly like the last breakpoint. The table is
/// immutable after construction and safe to share across scoring threads.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    dist_breaks: Vec<f32>,
    dot_breaks: Vec<f32>,
    /// Row-major `dist_breaks.len() * dot_breaks.len()` grid.
    values: Vec<f32>,
}

impl ScoreTable {
    /// Build a table from numeric breakpoints and a row-major value grid.
    ///
    /// Both breakpoint sequences must be non-empty, finite, and strictly
    /// ascending, and `values` must hold exactly
    /// `dist_breaks.len() * dot_breaks.len()` entries.
    pub fn new(
        dist_breaks: Vec<f32>,
        dot_breaks: Vec<f32>,
        values: Vec<f32>,
    ) -> Result<Self, NblastError> {
        validate_breaks("distance", &dist_breaks)?;
        validate_breaks("alignment", &dot_breaks)?;
        let expected = dist_breaks.len() * dot_breaks.len();
        if values.len() != expected {
            return Err(NblastError::MalformedTable(format!(
                "expected {} values for a {}x{} grid, got {}",
                expected,
                dist_breaks.len(),
                dot_breaks.len(),
                values.len()
            )));
        }
        Ok(Self {
            dist_breaks,
            dot_breaks,
            values,
        })
    }

    /// Build a table from textual bin labels, as found in score matrix files.
    ///
    /// Each label describes one bin and its lower bound becomes a breakpoint.
    /// Accepted forms: `"0,500"`, the R interval style `"(0,0.75]"`, the
    /// open-ended `"40,"`, and a bare number. Row labels describe distance
    /// bins, column labels alignment bins; `values` is row-major as in `new`.
    pub fn from_bin_labels<R, C>(
        row_labels: &[R],
        col_labels: &[C],
        values: Vec<f32>,
    ) -> Result<Self, NblastError>
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        let dist_breaks = row_labels
            .iter()
            .map(|l| parse_lower_bound(l.as_ref()))
            .collect::<Result<Vec<f32>, NblastError>>()?;
        let dot_breaks = col_labels
            .iter()
            .map(|l| parse_lower_bound(l.as_ref()))
            .collect::<Result<Vec<f32>, NblastError>>()?;
        Self::new(dist_breaks, dot_breaks, values)
    }

    /// Distance breakpoints, ascending.
    #[inline]
    pub fn dist_breaks(&self) -> &[f32] {
        &self.dist_breaks
    }

    /// Alignment breakpoints, ascending, within [0, 1] for fitted tables.
    #[inline]
    pub fn dot_breaks(&self) -> &[f32] {
        &self.dot_breaks
    }

    /// Look up the score for a (distance, unsigned alignment) pair.
    ///
    /// `dot` is clamped into [0, 1] first; callers normally pass
    /// `|dot(tangent_a, tangent_b)|` already. Each axis is then bracketed by
    /// binary search and the four surrounding grid values are combined
    /// bilinearly. Queries below the first breakpoint or at/past the last one
    /// clamp to the boundary cell rather than extrapolating, and a query
    /// exactly on a breakpoint degenerates to that row/column's values.
    pub fn lookup(&self, distance: f32, dot: f32) -> f32 {
        let dot = dot.clamp(0.0, 1.0);
        let (r0, r1, tr) = bracket(&self.dist_breaks, distance);
        let (c0, c1, tc) = bracket(&self.dot_breaks, dot);
        let w = self.dot_breaks.len();
        let v00 = self.values[r0 * w + c0];
        let v01 = self.values[r0 * w + c1];
        let v10 = self.values[r1 * w + c0];
        let v11 = self.values[r1 * w + c1];
        let low = v00 + (v01 - v00) * tc;
        let high = v10 + (v11 - v10) * tc;
        low + (high - low) * tr
    }
}

fn validate_breaks(axis: &str, breaks: &[f32]) -> Result<(), NblastError> {
    if breaks.is_empty() {
        return Err(NblastError::MalformedTable(format!(
            "{} axis has no breakpoints",
            axis
        )));
    }
    if breaks.iter().any(|b| !b.is_finite()) {
        return Err(NblastError::MalformedTable(format!(
            "{} breakpoints must be finite",
            axis
        )));
    }
    // Strict ascent; equal neighbors would make a zero-width bin.
    if breaks.windows(2).any(|w| w[1] <= w[0]) {
        return Err(NblastError::MalformedTable(format!(
            "{} breakpoints must be strictly ascending",
            axis
        )));
    }
    Ok(())
}

/// Extract the lower bound from a bin label such as `"0,500"` or `"(0,0.75]"`.
fn parse_lower_bound(label: &str) -> Result<f32, NblastError> {
    let trimmed = label.trim();
    let body = trimmed
        .strip_prefix(['(', '['])
        .unwrap_or(trimmed);
    let lower = match body.split_once(',') {
        Some((lower, _)) => lower,
        None => body.trim_end_matches([')', ']']),
    };
    lower.trim().parse::<f32>().map_err(|_| {
        NblastError::MalformedTable(format!("cannot parse bin label {:?}", label))
    })
}

/// Bracket `v` between two breakpoints, returning `(lo, hi, t)` with
/// `t` the fractional position of `v` between `breaks[lo]` and `breaks[hi]`.
/// Out-of-range values clamp to `(i, i, 0.0)` at the matching end.
fn bracket(breaks: &[f32], v: f32) -> (usize, usize, f32) {
    let last = breaks.len() - 1;
    if v <= breaks[0] {
        return (0, 0, 0.0);
    }
    if v >= breaks[last] {
        return (last, last, 0.0);
    }
    let hi = breaks.partition_point(|b| *b <= v);
    let lo = hi - 1;
    let t = (v - breaks[lo]) / (breaks[hi] - breaks[lo]);
    debug_assert!((0.0..1.0).contains(&t), "interpolation weight out of range");
    (lo, hi, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> ScoreTable {
        // 3 distance rows x 2 alignment columns.
        ScoreTable::new(
            vec![0.0, 10.0, 20.0],
            vec![0.0, 1.0],
            vec![
                1.0, 2.0, // d = 0
                3.0, 4.0, // d = 10
                -5.0, -6.0, // d = 20
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_grid_points() {
        let t = small_table();
        assert_eq!(t.lookup(0.0, 0.0), 1.0);
        assert_eq!(t.lookup(0.0, 1.0), 2.0);
        assert_eq!(t.lookup(10.0, 0.0), 3.0);
        assert_eq!(t.lookup(20.0, 1.0), -6.0);
    }

    #[test]
    fn test_interpolation_between_rows() {
        let t = small_table();
        // Halfway between d=0 and d=10 at a=0: halfway between 1 and 3.
        assert!((t.lookup(5.0, 0.0) - 2.0).abs() < 1e-6);
        // Quarter of the way between d=10 and d=20 at a=1: 4 + 0.25 * (-10).
        assert!((t.lookup(12.5, 1.0) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_bilinear_center() {
        let t = small_table();
        // Center of the first cell block averages all four corners.
        let expected = (1.0 + 2.0 + 3.0 + 4.0) / 4.0;
        assert!((t.lookup(5.0, 0.5) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_clamping() {
        let t = small_table();
        // Below the first distance breakpoint and far past the last.
        assert_eq!(t.lookup(-3.0, 0.0), 1.0);
        assert_eq!(t.lookup(1.0e9, 1.0), -6.0);
        assert_eq!(t.lookup(20.0, 1.0), t.lookup(7.0e7, 1.0));
        // Alignment is clamped into [0, 1].
        assert_eq!(t.lookup(0.0, -0.5), 1.0);
        assert_eq!(t.lookup(0.0, 1.7), 2.0);
    }

    #[test]
    fn test_single_breakpoint_axis() {
        let t = ScoreTable::new(vec![0.0], vec![0.0, 1.0], vec![7.0, 9.0]).unwrap();
        assert_eq!(t.lookup(123.0, 0.0), 7.0);
        assert_eq!(t.lookup(123.0, 0.5), 8.0);
    }

    #[test]
    fn test_label_parsing() {
        let t = ScoreTable::from_bin_labels(
            &["0,10", "(10,20]", "20,"],
            &["[0,0.5)", "0.5"],
            vec![1.0, 2.0, 3.0, 4.0, -5.0, -6.0],
        )
        .unwrap();
        assert_eq!(t.dist_breaks(), &[0.0, 10.0, 20.0]);
        assert_eq!(t.dot_breaks(), &[0.0, 0.5]);
        assert_eq!(t.lookup(10.0, 0.0), 3.0);
    }

    #[test]
    fn test_rejects_bad_labels() {
        let err = ScoreTable::from_bin_labels(&["zero,10"], &["0,1"], vec![1.0]);
        assert!(matches!(err, Err(NblastError::MalformedTable(_))));
    }

    #[test]
    fn test_rejects_non_ascending() {
        let err = ScoreTable::new(vec![0.0, 10.0, 10.0], vec![0.0], vec![1.0, 2.0, 3.0]);
        assert!(matches!(err, Err(NblastError::MalformedTable(_))));
        let err = ScoreTable::new(vec![10.0, 0.0], vec![0.0], vec![1.0, 2.0]);
        assert!(matches!(err, Err(NblastError::MalformedTable(_))));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let err = ScoreTable::new(vec![0.0, 10.0], vec![0.0, 1.0], vec![1.0, 2.0, 3.0]);
        assert!(matches!(err, Err(NblastError::MalformedTable(_))));
    }

    #[test]
    fn test_rejects_empty_axis() {
        let err = ScoreTable::new(vec![], vec![0.0], vec![]);
        assert!(matches!(err, Err(NblastError::MalformedTable(_))));
    }

    #[test]
    fn test_rejects_nan_breakpoint() {
        let err = ScoreTable::new(vec![0.0, f32::NAN], vec![0.0], vec![1.0, 2.0]);
        assert!(matches!(err, Err(NblastError::MalformedTable(_))));
    }

    #[test]
    fn test_continuity_across_breakpoint() {
        let t = small_table();
        let eps = 1e-3;
        let below = t.lookup(10.0 - eps, 0.25);
        let at = t.lookup(10.0, 0.25);
        let above = t.lookup(10.0 + eps, 0.25);
        assert!((below - at).abs() < 1e-2);
        assert!((above - at).abs() < 1e-2);
    }
}
