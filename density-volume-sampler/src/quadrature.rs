//! Evenly spaced grids and trapezoidal integration.

/// `count` evenly spaced values over the closed interval `[start, stop]`.
/// The last value is exactly `stop`.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
            values[count - 1] = stop;
            values
        }
    }
}

/// Trapezoidal rule over samples `y` taken at abscissae `x`.
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    debug_assert_eq!(y.len(), x.len());

    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) * 0.5)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linspace_hits_both_ends() {
        let values = linspace(-1.0, 1.0, 11);
        assert_eq!(values.len(), 11);
        assert_eq!(values[0], -1.0);
        assert_eq!(values[10], 1.0);
        assert_relative_eq!(values[5], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
    }

    #[test]
    fn trapezoid_is_exact_for_linear_functions() {
        let x = linspace(0.0, 2.0, 5);
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        assert_relative_eq!(trapezoid(&y, &x), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn trapezoid_converges_for_cubic_weight() {
        let x = linspace(0.0, 5.0, 1000);
        let y: Vec<f64> = x.iter().map(|r| r * r).collect();
        assert_relative_eq!(trapezoid(&y, &x), 125.0 / 3.0, max_relative = 1e-5);
    }
}
