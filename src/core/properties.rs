// Copyright @yucwang 2026

use crate::core::error::RenderError;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Integer(i64),
    Float(Float),
    Bool(bool),
    String(String),
    Vector(Vector3f),
    Rgb(RGBSpectrum),
}

impl Property {
    fn type_name(&self) -> &'static str {
        match self {
            Property::Integer(_) => "integer",
            Property::Float(_) => "float",
            Property::Bool(_) => "boolean",
            Property::String(_) => "string",
            Property::Vector(_) => "vector",
            Property::Rgb(_) => "rgb",
        }
    }
}

/// Named, typed parameters of one scene object (`<integrator>`, `<film>`, ...).
#[derive(Debug, Clone, Default)]
pub struct Properties {
    plugin_type: String,
    values: HashMap<String, Property>,
}

impl Properties {
    pub fn new(plugin_type: &str) -> Self {
        Self { plugin_type: plugin_type.to_string(), values: HashMap::new() }
    }

    pub fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    pub fn set(&mut self, name: &str, value: Property) {
        self.values.insert(name.to_string(), value);
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.values.get(name)
    }

    pub fn int_opt(&self, name: &str) -> Result<Option<i64>, RenderError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Property::Integer(v)) => Ok(Some(*v)),
            Some(other) => Err(self.type_error(name, "integer", other)),
        }
    }

    pub fn int_(&self, name: &str, default: i64) -> Result<i64, RenderError> {
        Ok(self.int_opt(name)?.unwrap_or(default))
    }

    /// Non-negative integer. Negative values are rejected.
    pub fn size_opt(&self, name: &str) -> Result<Option<usize>, RenderError> {
        match self.int_opt(name)? {
            None => Ok(None),
            Some(v) if v >= 0 => Ok(Some(v as usize)),
            Some(v) => Err(RenderError::Config(format!(
                "property \"{}\" of {} must be non-negative, got {}", name, self.plugin_type, v))),
        }
    }

    pub fn size_(&self, name: &str, default: usize) -> Result<usize, RenderError> {
        Ok(self.size_opt(name)?.unwrap_or(default))
    }

    /// Integers are accepted where a float is expected.
    pub fn float_opt(&self, name: &str) -> Result<Option<Float>, RenderError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Property::Float(v)) => Ok(Some(*v)),
            Some(Property::Integer(v)) => Ok(Some(*v as Float)),
            Some(other) => Err(self.type_error(name, "float", other)),
        }
    }

    pub fn float_(&self, name: &str, default: Float) -> Result<Float, RenderError> {
        Ok(self.float_opt(name)?.unwrap_or(default))
    }

    pub fn bool_(&self, name: &str, default: bool) -> Result<bool, RenderError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Property::Bool(v)) => Ok(*v),
            Some(other) => Err(self.type_error(name, "boolean", other)),
        }
    }

    pub fn string_(&self, name: &str, default: &str) -> Result<String, RenderError> {
        match self.values.get(name) {
            None => Ok(default.to_string()),
            Some(Property::String(v)) => Ok(v.clone()),
            Some(other) => Err(self.type_error(name, "string", other)),
        }
    }

    pub fn vector_(&self, name: &str, default: Vector3f) -> Result<Vector3f, RenderError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Property::Vector(v)) => Ok(*v),
            Some(other) => Err(self.type_error(name, "vector", other)),
        }
    }

    /// A bare float is promoted to a grey spectrum.
    pub fn rgb_(&self, name: &str, default: RGBSpectrum) -> Result<RGBSpectrum, RenderError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Property::Rgb(v)) => Ok(*v),
            Some(Property::Float(v)) => Ok(RGBSpectrum::splat(*v)),
            Some(other) => Err(self.type_error(name, "rgb", other)),
        }
    }

    fn type_error(&self, name: &str, expected: &str, found: &Property) -> RenderError {
        RenderError::Config(format!(
            "property \"{}\" of {} has type {}, expected {}",
            name, self.plugin_type, found.type_name(), expected))
    }
}

#[cfg(test)]
mod tests {
    use super::{Properties, Property};
    use crate::math::spectrum::RGBSpectrum;

    #[test]
    fn test_properties_defaults_and_lookup() {
        let mut props = Properties::new("path");
        props.set("max_depth", Property::Integer(8));
        props.set("timeout", Property::Float(2.5));

        assert_eq!(props.plugin_type(), "path");
        assert_eq!(props.int_("max_depth", -1).unwrap(), 8);
        assert_eq!(props.int_("rr_depth", 5).unwrap(), 5);
        assert_eq!(props.float_("timeout", -1.0).unwrap(), 2.5);
        assert_eq!(props.float_("max_depth", 0.0).unwrap(), 8.0);
        assert_eq!(props.rgb_("missing", RGBSpectrum::splat(0.5)).unwrap(), RGBSpectrum::splat(0.5));
    }

    #[test]
    fn test_properties_type_mismatch() {
        let mut props = Properties::new("film");
        props.set("width", Property::String("wide".to_string()));
        props.set("height", Property::Integer(-4));
        assert!(props.int_("width", 0).is_err());
        assert!(props.size_("height", 0).is_err());
        assert!(props.bool_("width", false).is_err());
    }
}
