// Copyright @yucwang 2026

pub mod box_filter;
pub mod gaussian;

use crate::core::error::RenderError;
use crate::core::properties::Properties;
use crate::core::rfilter::ReconstructionFilter;
use std::sync::Arc;

pub fn create_filter(props: &Properties) -> Result<Arc<dyn ReconstructionFilter>, RenderError> {
    match props.plugin_type() {
        "box" => Ok(Arc::new(box_filter::BoxFilter::new())),
        "gaussian" => Ok(Arc::new(gaussian::GaussianFilter::new(props.float_("stddev", 0.5)?))),
        other => Err(RenderError::Config(format!("unsupported reconstruction filter: {}", other))),
    }
}
