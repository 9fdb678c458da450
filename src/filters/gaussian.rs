// Copyright @yucwang 2026

use crate::core::rfilter::ReconstructionFilter;
use crate::math::constants::Float;

/// Truncated Gaussian, shifted so that it reaches zero at 4 sigma.
pub struct GaussianFilter {
    stddev: Float,
    radius: Float,
    alpha: Float,
    bias: Float,
}

impl GaussianFilter {
    pub fn new(stddev: Float) -> Self {
        let radius = 4.0 * stddev;
        let alpha = -1.0 / (2.0 * stddev * stddev);
        let bias = (alpha * radius * radius).exp();
        Self { stddev, radius, alpha, bias }
    }
}

impl ReconstructionFilter for GaussianFilter {
    fn radius(&self) -> Float {
        self.radius
    }

    fn eval(&self, x: Float) -> Float {
        ((self.alpha * x * x).exp() - self.bias).max(0.0)
    }

    fn describe(&self) -> String {
        format!("GaussianFilter[stddev = {}]", self.stddev)
    }
}

#[cfg(test)]
mod tests {
    use super::GaussianFilter;
    use crate::core::rfilter::ReconstructionFilter;

    #[test]
    fn test_gaussian_filter_support() {
        let filter = GaussianFilter::new(0.5);
        assert_eq!(filter.radius(), 2.0);
        assert_eq!(filter.border_size(), 2);
        assert!(filter.eval(0.0) > filter.eval(0.5));
        assert_eq!(filter.eval(2.0), 0.0);
        assert_eq!(filter.eval(3.0), 0.0);
    }
}
