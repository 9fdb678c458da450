// Copyright @yucwang 2026

use crate::core::film::Film;
use crate::core::sampler::Sampler;
use crate::math::constants::{Float, Vector2f};
use crate::math::ray::RayDifferential3f;
use crate::math::spectrum::RGBSpectrum;

pub trait Sensor: Sync {
    fn film(&self) -> &Film;

    /// Prototype sampler; workers render with clones of it.
    fn sampler(&self) -> &dyn Sampler;

    fn needs_aperture_sample(&self) -> bool {
        false
    }

    fn shutter_open(&self) -> Float {
        0.0
    }

    /// Duration the shutter stays open. Zero disables motion sampling.
    fn shutter_open_time(&self) -> Float {
        0.0
    }

    /// Importance-sample a primary ray. `position_sample` is normalised to
    /// the film's crop window; the returned spectrum is the ray weight.
    fn sample_ray_differential(&self,
                               time: Float,
                               wavelength_sample: Float,
                               position_sample: &Vector2f,
                               aperture_sample: &Vector2f) -> (RayDifferential3f, RGBSpectrum);

    fn describe(&self) -> String {
        String::from("Sensor")
    }
}
