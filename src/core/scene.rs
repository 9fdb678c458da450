// Copyright @yucwang 2026

use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::Shape;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use std::sync::Arc;

pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub albedo: RGBSpectrum,
    pub emission: RGBSpectrum,
    pub name: Option<String>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, albedo: RGBSpectrum) -> Self {
        Self { shape, albedo, emission: RGBSpectrum::default(), name: None }
    }

    pub fn with_emission(mut self, emission: RGBSpectrum) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }
}

/// Diffuse objects under a constant background. Intersection is a linear
/// scan over all objects.
pub struct Scene {
    objects: Vec<SceneObject>,
    background: RGBSpectrum,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self { objects: Vec::new(), background: RGBSpectrum::default() }
    }

    pub fn with_objects(objects: Vec<SceneObject>) -> Self {
        Self { objects, background: RGBSpectrum::default() }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &Vec<SceneObject> {
        &self.objects
    }

    /// Radiance of rays that leave the scene.
    pub fn background(&self) -> RGBSpectrum {
        self.background
    }

    pub fn set_background(&mut self, background: RGBSpectrum) {
        self.background = background;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let mut ray = *ray;
        let mut closest: Option<(usize, SurfaceIntersection)> = None;
        for (idx, object) in self.objects.iter().enumerate() {
            if let Some(hit) = object.shape.ray_intersection(&ray) {
                if ray.update(hit.t()) {
                    closest = Some((idx, hit));
                }
            }
        }

        closest.map(|(idx, hit)| {
            let object = &self.objects[idx];
            hit.with_le(object.emission)
               .with_albedo(object.albedo)
               .with_object_index(Some(idx))
        })
    }

    pub fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.objects.iter().any(|object| object.shape.ray_intersection_t(ray))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;
    use crate::shapes::sphere::Sphere;

    #[test]
    fn test_scene_ray_intersection_closest_hit() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 0.5)),
                                          RGBSpectrum::splat(0.1)));
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 2.0), 0.5)),
                                          RGBSpectrum::splat(0.2))
                             .with_emission(RGBSpectrum::splat(3.0)));
        scene.add_object(SceneObject::new(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 10.0), 0.5)),
                                          RGBSpectrum::splat(0.3)));

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = scene.ray_intersection(&ray).expect("expected intersection");

        assert!((hit.t() - 1.5).abs() < 1e-5);
        assert_eq!(hit.object_index(), Some(1));
        assert_eq!(hit.le(), RGBSpectrum::splat(3.0));
        assert_eq!(hit.albedo(), RGBSpectrum::splat(0.2));
        assert!(scene.ray_intersection_t(&ray));
    }

    #[test]
    fn test_empty_scene_misses() {
        let mut scene = Scene::new();
        scene.set_background(RGBSpectrum::new(0.1, 0.2, 0.3));
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), None, None);
        assert!(scene.ray_intersection(&ray).is_none());
        assert!(scene.is_empty());
        assert_eq!(scene.background(), RGBSpectrum::new(0.1, 0.2, 0.3));
    }
}
