// Copyright @yucwang 2023

use crate::math::constants::{ Float, Vector3f };
use crate::math::spectrum::RGBSpectrum;

/// Closest hit of a ray against the scene.
#[derive(Debug, Clone)]
pub struct SurfaceIntersection {
    p: Vector3f,
    geo_normal: Vector3f,
    t: Float,
    le: RGBSpectrum,
    albedo: RGBSpectrum,
    object_index: Option<usize>,
}

impl SurfaceIntersection {
    pub fn new(new_p: Vector3f,
               new_geo_normal: Vector3f,
               new_t: Float) -> Self {
        Self { p: new_p, geo_normal: new_geo_normal, t: new_t,
               le: RGBSpectrum::default(), albedo: RGBSpectrum::default(), object_index: None }
    }

    pub fn t(&self) -> Float {
        self.t
    }

    pub fn p(&self) -> Vector3f {
        self.p
    }

    pub fn geo_normal(&self) -> Vector3f {
        self.geo_normal
    }

    /// Radiance emitted by the surface.
    pub fn le(&self) -> RGBSpectrum {
        self.le
    }

    /// Diffuse reflectance of the surface.
    pub fn albedo(&self) -> RGBSpectrum {
        self.albedo
    }

    pub fn object_index(&self) -> Option<usize> {
        self.object_index
    }

    pub fn with_le(mut self, new_le: RGBSpectrum) -> Self {
        self.le = new_le;
        self
    }

    pub fn with_albedo(mut self, new_albedo: RGBSpectrum) -> Self {
        self.albedo = new_albedo;
        self
    }

    pub fn with_object_index(mut self, object_index: Option<usize>) -> Self {
        self.object_index = object_index;
        self
    }
}
