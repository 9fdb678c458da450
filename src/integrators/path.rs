// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::RenderError;
use crate::core::integrator::{Integrator, MonteCarloSettings};
use crate::core::properties::Properties;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::math::constants::Float;
use crate::math::frame::Frame;
use crate::math::ray::{Ray3f, RayDifferential3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::sample_cosine_hemisphere;

const RAY_OFFSET: Float = 1e-4;
const MAX_SURVIVAL: Float = 0.95;

/// Unidirectional path tracer over diffuse surfaces. Emission is collected
/// at every vertex; paths continue by cosine-weighted hemisphere sampling.
pub struct PathIntegrator {
    id: String,
    settings: MonteCarloSettings,
}

impl PathIntegrator {
    pub fn new(settings: MonteCarloSettings) -> Self {
        Self { id: generate_node_id("path"), settings }
    }

    pub fn from_properties(props: &Properties) -> Result<Self, RenderError> {
        Ok(Self::new(MonteCarloSettings::from_properties(props)?))
    }

    pub fn settings(&self) -> &MonteCarloSettings {
        &self.settings
    }

    fn trace_path(&self, scene: &Scene, sampler: &mut dyn Sampler, mut ray: Ray3f, active: bool) -> RGBSpectrum {
        let mut radiance = RGBSpectrum::default();
        let mut throughput = RGBSpectrum::splat(1.0);
        let mut depth: u32 = 0;

        loop {
            let intersection = match scene.ray_intersection(&ray) {
                Some(h) => h,
                None => {
                    radiance += throughput * scene.background();
                    break;
                }
            };

            radiance += throughput * intersection.le();

            if !self.settings.can_scatter(depth) {
                break;
            }

            // Shade on the side the ray arrived from.
            let mut n = intersection.geo_normal();
            if n.dot(&ray.dir()) > 0.0 {
                n = -n;
            }
            let frame = Frame::from_normal(&n);
            let wi_local = sample_cosine_hemisphere(&sampler.next_2d(active));
            if wi_local.z <= 0.0 {
                break;
            }

            // Lambertian: cosine and pdf cancel, leaving the albedo.
            throughput = throughput * intersection.albedo();
            depth += 1;

            if self.settings.roulette_active(depth) {
                let survival = throughput.max_component().min(MAX_SURVIVAL);
                if sampler.next_1d(active) >= survival {
                    break;
                }
                throughput = throughput / survival;
            }

            if throughput.is_black() {
                break;
            }

            let wi_world = frame.from_local(wi_local);
            let origin = intersection.p() + n * RAY_OFFSET;
            ray = Ray3f::new(origin, wi_world, Some(RAY_OFFSET), None);
        }

        radiance
    }
}

impl Integrator for PathIntegrator {
    type Scene = Scene;

    fn sample(&self,
              scene: &Scene,
              sampler: &mut dyn Sampler,
              ray: &RayDifferential3f,
              active: bool) -> Result<(RGBSpectrum, bool), RenderError> {
        if !active {
            return Ok((RGBSpectrum::default(), false));
        }
        let radiance = self.trace_path(scene, sampler, ray.ray, active);
        if !radiance.is_valid() {
            log::warn!("PathIntegrator: invalid radiance {:?} along ray {:?}", radiance, ray.ray.dir());
            return Ok((RGBSpectrum::default(), false));
        }
        Ok((radiance, true))
    }

    fn describe(&self) -> String {
        ComputationNode::to_string(self)
    }
}

impl ComputationNode for PathIntegrator {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        let max_depth = match self.settings.max_depth() {
            Some(depth) => depth.to_string(),
            None => String::from("-1"),
        };
        format!("PathIntegrator[max_depth = {}, rr_depth = {}]", max_depth, self.settings.rr_depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneObject;
    use crate::math::constants::Vector3f;
    use crate::math::spectrum::Wavelengths;
    use crate::samplers::independent::IndependentSampler;
    use crate::shapes::sphere::Sphere;
    use std::sync::Arc;

    fn camera_ray(dir: Vector3f) -> RayDifferential3f {
        RayDifferential3f::new(Ray3f::new(Vector3f::zeros(), dir, None, None), 0.0, Wavelengths::zeros())
    }

    /// Camera inside a closed emissive sphere: every path keeps hitting it.
    fn furnace(albedo: Float) -> Scene {
        let sphere = Arc::new(Sphere::new(Vector3f::zeros(), 10.0));
        Scene::with_objects(vec![
            SceneObject::new(sphere, RGBSpectrum::splat(albedo)).with_emission(RGBSpectrum::splat(1.0)),
        ])
    }

    #[test]
    fn test_miss_returns_background() {
        let mut scene = Scene::new();
        scene.set_background(RGBSpectrum::new(0.25, 0.5, 1.0));
        let integrator = PathIntegrator::new(MonteCarloSettings::default());
        let mut sampler = IndependentSampler::new(1, 0);
        let (value, valid) = integrator.sample(&scene, &mut sampler, &camera_ray(Vector3f::z()), true).unwrap();
        assert!(valid);
        assert_eq!(value, RGBSpectrum::new(0.25, 0.5, 1.0));
    }

    #[test]
    fn test_max_depth_zero_is_direct_emission_only() {
        let integrator = PathIntegrator::new(MonteCarloSettings::new(5, 0).unwrap());
        let mut sampler = IndependentSampler::new(1, 0);
        let (value, _) = integrator.sample(&furnace(0.5), &mut sampler, &camera_ray(Vector3f::z()), true).unwrap();
        assert_eq!(value, RGBSpectrum::splat(1.0));
    }

    #[test]
    fn test_bounded_depth_in_furnace() {
        let integrator = PathIntegrator::new(MonteCarloSettings::new(100, 2).unwrap());
        let scene = furnace(0.5);
        let mut sampler = IndependentSampler::new(1, 0);
        for seed in 0..16 {
            sampler.seed(seed);
            let (value, _) = integrator.sample(&scene, &mut sampler, &camera_ray(Vector3f::x()), true).unwrap();
            assert!((value[0] - 1.75).abs() < 1e-5);
        }
    }

    #[test]
    fn test_roulette_terminates_unbounded_paths() {
        let integrator = PathIntegrator::new(MonteCarloSettings::new(1, -1).unwrap());
        let scene = furnace(0.5);
        let mut sampler = IndependentSampler::new(1, 7);
        let count = 4000;
        let mut mean = 0.0;
        for seed in 0..count {
            sampler.seed(seed);
            let (value, valid) = integrator.sample(&scene, &mut sampler, &camera_ray(Vector3f::y()), true).unwrap();
            assert!(valid);
            mean += value[1] / count as Float;
        }
        // Geometric series 1 + 1/2 + 1/4 + ... = 2.
        assert!((mean - 2.0).abs() < 0.1, "mean = {}", mean);
    }

    #[test]
    fn test_inactive_lane_is_invalid() {
        let integrator = PathIntegrator::new(MonteCarloSettings::default());
        let mut sampler = IndependentSampler::new(1, 0);
        let (value, valid) = integrator.sample(&furnace(0.5), &mut sampler, &camera_ray(Vector3f::z()), false).unwrap();
        assert!(!valid);
        assert!(value.is_black());
    }
}
