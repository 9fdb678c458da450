// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::RenderError;
use crate::core::film::Film;
use crate::core::properties::Properties;
use crate::core::sampler::Sampler;
use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::{Ray3f, RayDifferential3f};
use crate::math::spectrum::{RGBSpectrum, Wavelengths};
use crate::math::warp::sample_uniform_disk_concentric;

/// Pinhole camera, or a thin lens when `aperture_radius` is positive.
pub struct PerspectiveCamera {
    id: String,
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_y: Float,
    aspect: Float,
    near_clip: Float,
    far_clip: Float,
    aperture_radius: Float,
    focus_distance: Float,
    shutter_open: Float,
    shutter_open_time: Float,
    film: Film,
    sampler: Box<dyn Sampler>,
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_radians: Float,
               film: Film,
               sampler: Box<dyn Sampler>) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();
        let size = film.size();

        Self {
            id: generate_node_id("perspective"),
            origin,
            forward,
            right,
            up,
            tan_half_fov_y: (0.5 * fov_y_radians).tan(),
            aspect: size.x as Float / size.y as Float,
            near_clip: 1e-2,
            far_clip: 1e4,
            aperture_radius: 0.0,
            focus_distance: 1.0,
            shutter_open: 0.0,
            shutter_open_time: 0.0,
            film,
            sampler,
        }
    }

    pub fn with_clip(mut self, near_clip: Float, far_clip: Float) -> Self {
        self.near_clip = near_clip;
        self.far_clip = far_clip;
        self
    }

    pub fn with_aperture(mut self, aperture_radius: Float, focus_distance: Float) -> Self {
        self.aperture_radius = aperture_radius;
        self.focus_distance = focus_distance;
        self
    }

    pub fn with_shutter(mut self, shutter_open: Float, shutter_open_time: Float) -> Self {
        self.shutter_open = shutter_open;
        self.shutter_open_time = shutter_open_time;
        self
    }

    pub fn from_properties(props: &Properties, film: Film, sampler: Box<dyn Sampler>) -> Result<Self, RenderError> {
        let fov = props.float_("fov", 45.0)?;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(RenderError::Config(format!("fov must be in (0, 180), got {}", fov)));
        }
        let origin = props.vector_("origin", Vector3f::zeros())?;
        let target = props.vector_("target", Vector3f::new(0.0, 0.0, 1.0))?;
        let up = props.vector_("up", Vector3f::new(0.0, 1.0, 0.0))?;
        if (target - origin).norm() == 0.0 {
            return Err(RenderError::Config("camera origin and target coincide".to_string()));
        }

        let shutter_open = props.float_("shutter_open", 0.0)?;
        let shutter_close = props.float_("shutter_close", shutter_open)?;
        if shutter_close < shutter_open {
            return Err(RenderError::Config(format!(
                "shutter_close ({}) precedes shutter_open ({})", shutter_close, shutter_open)));
        }
        let aperture_radius = props.float_("aperture_radius", 0.0)?;
        if aperture_radius < 0.0 {
            return Err(RenderError::Config("aperture_radius must be non-negative".to_string()));
        }

        Ok(Self::new(origin, target, up, fov.to_radians(), film, sampler)
            .with_clip(props.float_("near_clip", 1e-2)?, props.float_("far_clip", 1e4)?)
            .with_aperture(aperture_radius, props.float_("focus_distance", 1.0)?)
            .with_shutter(shutter_open, shutter_close - shutter_open))
    }

    /// Mutable access to the prototype sampler, e.g. to override its sample count.
    pub fn sampler_mut(&mut self) -> &mut dyn Sampler {
        self.sampler.as_mut()
    }

    /// Camera-space direction through a point given in full-film [0, 1]^2.
    fn camera_direction(&self, u: Float, v: Float) -> Vector3f {
        let px = (2.0 * u - 1.0) * self.aspect * self.tan_half_fov_y;
        let py = (1.0 - 2.0 * v) * self.tan_half_fov_y;
        Vector3f::new(px, py, 1.0).normalize()
    }

    fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.right * v.x + self.up * v.y + self.forward * v.z
    }

    /// World-space ray for a film point and a camera-space lens point.
    fn generate_ray(&self, u: Float, v: Float, lens: &Vector2f) -> (Vector3f, Vector3f, Float) {
        let d_camera = self.camera_direction(u, v);
        let (o_camera, d_camera) = if self.aperture_radius > 0.0 {
            let focus = d_camera * (self.focus_distance / d_camera.z);
            let o = Vector3f::new(lens.x, lens.y, 0.0);
            (o, (focus - o).normalize())
        } else {
            (Vector3f::zeros(), d_camera)
        };
        let inv_z = if d_camera.z != 0.0 { 1.0 / d_camera.z } else { std::f32::MAX };
        (self.origin + self.to_world(&o_camera), self.to_world(&d_camera).normalize(), inv_z)
    }
}

impl ComputationNode for PerspectiveCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        let size = self.film.size();
        format!("PerspectiveCamera[{}x{}, aperture_radius = {}, shutter = {}+{}]",
                size.x, size.y, self.aperture_radius, self.shutter_open, self.shutter_open_time)
    }
}

impl Sensor for PerspectiveCamera {
    fn film(&self) -> &Film {
        &self.film
    }

    fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }

    fn needs_aperture_sample(&self) -> bool {
        self.aperture_radius > 0.0
    }

    fn shutter_open(&self) -> Float {
        self.shutter_open
    }

    fn shutter_open_time(&self) -> Float {
        self.shutter_open_time
    }

    fn sample_ray_differential(&self,
                               time: Float,
                               _wavelength_sample: Float,
                               position_sample: &Vector2f,
                               aperture_sample: &Vector2f) -> (RayDifferential3f, RGBSpectrum) {
        let size = self.film.size();
        let crop_offset = self.film.crop_offset();
        let crop_size = self.film.crop_size();
        let u = (crop_offset.x as Float + position_sample.x * crop_size.x as Float) / size.x as Float;
        let v = (crop_offset.y as Float + position_sample.y * crop_size.y as Float) / size.y as Float;

        let lens = sample_uniform_disk_concentric(aperture_sample) * self.aperture_radius;
        let (origin, dir, inv_z) = self.generate_ray(u, v, &lens);
        let near_t = self.near_clip * inv_z;
        let far_t = self.far_clip * inv_z;
        let ray = Ray3f::new(origin, dir, Some(near_t), Some(far_t));

        let du = 1.0 / size.x as Float;
        let dv = 1.0 / size.y as Float;
        let (o_x, d_x, _) = self.generate_ray(u + du, v, &lens);
        let (o_y, d_y, _) = self.generate_ray(u, v + dv, &lens);

        let ray = RayDifferential3f::new(ray, time, Wavelengths::zeros())
            .with_differentials(o_x, o_y, d_x, d_y);
        (ray, RGBSpectrum::splat(1.0))
    }

    fn describe(&self) -> String {
        ComputationNode::to_string(self)
    }
}
