//! Distances over partially observed rows

/// Euclidean distance that skips coordinates missing in either row.
///
/// The squared sum over shared coordinates is rescaled by
/// `total / shared` so rows with fewer shared coordinates are not favoured.
/// Returns `None` when the rows share no observed coordinate.
pub fn nan_euclidean(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let total = a.len().min(b.len());
    let mut shared = 0usize;
    let mut sum_sq = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            shared += 1;
            sum_sq += (x - y).powi(2);
        }
    }

    if shared == 0 {
        return None;
    }

    Some((sum_sq * total as f64 / shared as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_observed_is_plain_euclidean() {
        let d = nan_euclidean(&[Some(0.0), Some(3.0)], &[Some(4.0), Some(0.0)]).unwrap();
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_coordinates_are_rescaled() {
        // One shared coordinate out of two: sqrt(2 * 3^2)
        let d = nan_euclidean(&[Some(1.0), None], &[Some(4.0), Some(7.0)]).unwrap();
        assert!((d - 18.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_no_shared_coordinates() {
        assert!(nan_euclidean(&[Some(1.0), None], &[None, Some(2.0)]).is_none());
    }
}
