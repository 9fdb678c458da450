// Copyright @yucwang 2026

use crate::core::error::RenderError;
use crate::core::properties::Properties;
use crate::core::sampler::Sampler;
use crate::math::ray::RayDifferential3f;
use crate::math::spectrum::RGBSpectrum;

/// Light-transport estimator driven by `SamplingIntegrator`: one radiance
/// estimate per primary ray.
pub trait Integrator: Sync {
    type Scene: ?Sized + Sync;

    /// Estimate the radiance arriving along `ray`. The returned mask tells
    /// whether the estimate is valid. Errors abort the whole render.
    fn sample(&self,
              scene: &Self::Scene,
              sampler: &mut dyn Sampler,
              ray: &RayDifferential3f,
              active: bool) -> Result<(RGBSpectrum, bool), RenderError>;

    fn describe(&self) -> String {
        String::from("Integrator")
    }
}

/// Depth limits every recursive path estimator has to honour.
///
/// Depth counts scattering events: the first surface seen by the camera ray
/// is at depth 0. With `max_depth = Some(0)` only directly visible emission
/// contributes, `Some(1)` adds single-bounce direct illumination, and `None`
/// leaves paths unbounded. Past `rr_depth`, Russian roulette may end a path;
/// for unbounded paths it is the only terminator besides leaving the scene,
/// so estimators must apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloSettings {
    rr_depth: u32,
    max_depth: Option<u32>,
}

impl Default for MonteCarloSettings {
    fn default() -> Self {
        Self { rr_depth: 5, max_depth: None }
    }
}

impl MonteCarloSettings {
    /// `max_depth = -1` means unbounded.
    pub fn new(rr_depth: i64, max_depth: i64) -> Result<Self, RenderError> {
        if rr_depth <= 0 {
            return Err(RenderError::Config(
                "\"rr_depth\" must be set to a value greater than zero!".to_string()));
        }
        if max_depth < 0 && max_depth != -1 {
            return Err(RenderError::Config(
                "\"max_depth\" must be set to -1 (infinite) or a value >= 0".to_string()));
        }
        Ok(Self {
            rr_depth: rr_depth.min(u32::MAX as i64) as u32,
            max_depth: if max_depth == -1 { None } else { Some(max_depth.min(u32::MAX as i64) as u32) },
        })
    }

    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        Self::new(props.int_("rr_depth", 5)?, props.int_("max_depth", -1)?)
    }

    pub fn rr_depth(&self) -> u32 {
        self.rr_depth
    }

    pub fn max_depth(&self) -> Option<u32> {
        self.max_depth
    }

    /// Whether a vertex at `depth` may spawn another bounce.
    pub fn can_scatter(&self, depth: u32) -> bool {
        match self.max_depth {
            Some(max_depth) => depth < max_depth,
            None => true,
        }
    }

    /// Whether Russian roulette applies to a vertex at `depth`.
    pub fn roulette_active(&self, depth: u32) -> bool {
        depth >= self.rr_depth
    }
}
