/// Splits `values` into overlapping windows of `size`, sliding by one.
///
/// A series shorter than `size` yields a single window holding the whole series. Otherwise
/// `values.len() - size` windows are produced; the last full-length window is never emitted.
pub fn chunk(values: &[f64], size: usize) -> Vec<&[f64]> {
    if values.len() < size {
        return vec![values];
    }

    (0..values.len() - size)
        .map(|start| &values[start..start + size])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_series_is_a_single_window() {
        let values = [1.0, 2.0, 3.0];
        let windows = chunk(&values, 10);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], &values[..]);
    }

    #[test]
    fn test_window_count_and_length() {
        let values: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let windows = chunk(&values, 10);

        assert_eq!(windows.len(), 15);
        assert!(windows.iter().all(|w| w.len() == 10));
        assert_eq!(windows[0][0], 0.0);
        assert_eq!(windows[14][0], 14.0);
    }

    #[test]
    fn test_final_full_window_is_not_produced() {
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let windows = chunk(&values, 10);

        // values[2..12] would be the last full window; only starts 0 and 1 are emitted
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].last(), Some(&10.0));
    }

    #[test]
    fn test_series_equal_to_size_yields_no_windows() {
        let values = [1.0; 10];
        assert!(chunk(&values, 10).is_empty());
    }
}
