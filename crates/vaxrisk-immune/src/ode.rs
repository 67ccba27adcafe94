//! Fixed-step RK4 integration for scalar ODEs on smooth segments.

/// Advances `dy/dt = f(t, y)` from `(t0, y0)` to `t1` with classical RK4.
///
/// The interval is split into the smallest number of equal steps not exceeding
/// `max_step`. `f` must be smooth on the open interval; callers place
/// discontinuities of the right-hand side at segment boundaries.
pub fn rk4<F>(f: F, t0: f64, y0: f64, t1: f64, max_step: f64) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    let span = t1 - t0;
    if span <= 0.0 {
        return y0;
    }
    let steps = (span / max_step).ceil().max(1.0) as usize;
    let h = span / steps as f64;
    let mut y = y0;
    for step in 0..steps {
        let t = t0 + step as f64 * h;
        let k1 = f(t, y);
        let k2 = f(t + 0.5 * h, y + 0.5 * h * k1);
        let k3 = f(t + 0.5 * h, y + 0.5 * h * k2);
        let k4 = f(t + h, y + h * k3);
        y += h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
    }
    y
}

#[cfg(test)]
mod tests {
    use super::rk4;

    #[test]
    fn integrates_linear_decay() {
        let y = rk4(|_, y| -0.5 * y, 0.0, 2.0, 4.0, 0.1);
        assert!((y - 2.0 * (-2.0f64).exp()).abs() < 1e-7);
    }

    #[test]
    fn empty_span_returns_initial_value() {
        assert_eq!(rk4(|_, _| 1.0, 3.0, 1.5, 3.0, 0.1), 1.5);
    }
}
