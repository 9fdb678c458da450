// Copyright @yucwang 2026

use crate::core::rfilter::ReconstructionFilter;
use crate::math::constants::Float;

/// Unit box: each sample lands in exactly the pixel that contains it.
pub struct BoxFilter;

impl BoxFilter {
    pub fn new() -> Self {
        BoxFilter
    }
}

impl ReconstructionFilter for BoxFilter {
    fn radius(&self) -> Float {
        0.5
    }

    fn eval(&self, x: Float) -> Float {
        if x.abs() <= 0.5 { 1.0 } else { 0.0 }
    }

    fn describe(&self) -> String {
        String::from("BoxFilter")
    }
}

#[cfg(test)]
mod tests {
    use super::BoxFilter;
    use crate::core::rfilter::ReconstructionFilter;

    #[test]
    fn test_box_filter() {
        let filter = BoxFilter::new();
        assert_eq!(filter.border_size(), 0);
        assert_eq!(filter.eval(0.0), 1.0);
        assert_eq!(filter.eval(0.5), 1.0);
        assert_eq!(filter.eval(0.51), 0.0);
    }
}
