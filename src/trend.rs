#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares fit of y on x.
pub fn fit_trend(points: &[(f64, f64)]) -> Option<TrendLine> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    if sxx <= f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        let pts = [(4.0, 1.0), (6.0, 2.0), (8.0, 3.0), (10.0, 4.0)];
        let line = fit_trend(&pts).unwrap();
        assert!((line.slope - 0.5).abs() < 1e-12);
        assert!((line.intercept + 1.0).abs() < 1e-12);
        assert!((line.at(12.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_have_no_trend() {
        assert!(fit_trend(&[]).is_none());
        assert!(fit_trend(&[(5.0, 1.0)]).is_none());
        assert!(fit_trend(&[(5.0, 1.0), (5.0, 3.0)]).is_none());
    }
}
