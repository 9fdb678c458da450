// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::error::RenderError;
use crate::core::film::Film;
use crate::core::properties::{Properties, Property};
use crate::core::scene::{Scene, SceneObject};
use crate::filters::create_filter;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::samplers::independent::IndependentSampler;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::sphere::Sphere;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    Property(RenderError),
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "scene i/o error: {}", err),
            SceneLoadError::Parse(msg) => write!(f, "scene parse error: {}", msg),
            SceneLoadError::MissingField(field) => write!(f, "scene is missing {}", field),
            SceneLoadError::Property(err) => write!(f, "invalid scene parameter: {}", err),
        }
    }
}

impl std::error::Error for SceneLoadError {}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl From<RenderError> for SceneLoadError {
    fn from(err: RenderError) -> Self {
        SceneLoadError::Property(err)
    }
}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub sensor: PerspectiveCamera,
    /// Parameters of `<integrator>`: estimator depths plus the block size,
    /// samples per pass and timeout of the render driver.
    pub integrator: Properties,
}

/// Load a scene file. `defines` take precedence over `<default>` entries.
pub fn load_scene_with_settings<P: AsRef<Path>>(path: P, defines: &HashMap<String, String>)
                                                -> Result<SceneLoadResult, SceneLoadError> {
    let xml = fs::read_to_string(path.as_ref())?;
    parse_scene(&xml, defines)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Integrator,
    Sensor,
    Film,
    Sampler,
    RFilter,
    Shape,
    Bsdf,
    Emitter,
    Background,
    Transform,
}

impl NodeKind {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"integrator" => Some(NodeKind::Integrator),
            b"sensor" => Some(NodeKind::Sensor),
            b"film" => Some(NodeKind::Film),
            b"sampler" => Some(NodeKind::Sampler),
            b"rfilter" => Some(NodeKind::RFilter),
            b"shape" => Some(NodeKind::Shape),
            b"bsdf" => Some(NodeKind::Bsdf),
            b"emitter" => Some(NodeKind::Emitter),
            b"background" => Some(NodeKind::Background),
            b"transform" => Some(NodeKind::Transform),
            _ => None,
        }
    }
}

struct OpenNode {
    kind: NodeKind,
    props: Properties,
}

#[derive(Default)]
struct SceneParser {
    defaults: HashMap<String, String>,
    stack: Vec<OpenNode>,
    integrator: Option<Properties>,
    sensor: Option<Properties>,
    film: Option<Properties>,
    sampler: Option<Properties>,
    rfilter: Option<Properties>,
    shapes: Vec<Properties>,
    background: Option<RGBSpectrum>,
}

fn parse_scene(xml: &str, defines: &HashMap<String, String>) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut parser = SceneParser { defaults: defines.clone(), ..Default::default() };
    let overridden: Vec<String> = defines.keys().cloned().collect();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => parser.start(&e, &overridden)?,
            Ok(Event::Empty(e)) => {
                parser.start(&e, &overridden)?;
                parser.end(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => parser.end(e.name().as_ref())?,
            Err(e) => {
                return Err(SceneLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    parser.finish()
}

impl SceneParser {
    fn attributes(&self, e: &BytesStart) -> Result<HashMap<String, String>, SceneLoadError> {
        let mut attrs = HashMap::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|e| SceneLoadError::Parse(e.to_string()))?;
            attrs.insert(key, resolve_value(&value, &self.defaults));
        }
        Ok(attrs)
    }

    fn top(&mut self, tag: &str) -> Result<&mut OpenNode, SceneLoadError> {
        self.stack.last_mut()
            .ok_or_else(|| SceneLoadError::Parse(format!("<{}> outside of an object", tag)))
    }

    fn start(&mut self, e: &BytesStart, overridden: &[String]) -> Result<(), SceneLoadError> {
        let tag = e.name();
        let tag = tag.as_ref();
        let attrs = self.attributes(e)?;

        if let Some(kind) = NodeKind::from_tag(tag) {
            let plugin_type = attrs.get("type").map(String::as_str)
                .or(attrs.get("name").map(String::as_str))
                .unwrap_or("");
            let mut props = Properties::new(plugin_type);
            if let Some(id) = attrs.get("id") {
                props.set("id", Property::String(id.clone()));
            }
            self.stack.push(OpenNode { kind, props });
            return Ok(());
        }

        let name = attrs.get("name").cloned();
        match tag {
            b"scene" => {}
            b"default" => {
                let name = name.ok_or(SceneLoadError::MissingField("default.name"))?;
                let value = attrs.get("value").cloned().ok_or(SceneLoadError::MissingField("default.value"))?;
                if !overridden.contains(&name) {
                    self.defaults.insert(name, value);
                }
            }
            b"integer" | b"float" | b"boolean" | b"string" | b"rgb" | b"vector" | b"point" => {
                let tag_name = String::from_utf8_lossy(tag).to_string();
                let name = name.ok_or(SceneLoadError::MissingField("property name"))?;
                let value = parse_property(tag, &attrs)?;
                self.top(&tag_name)?.props.set(&name, value);
            }
            b"lookat" => {
                let node = self.top("lookat")?;
                if node.kind != NodeKind::Transform {
                    return Err(SceneLoadError::Parse("<lookat> must be inside <transform>".to_string()));
                }
                let origin = attrs.get("origin").ok_or(SceneLoadError::MissingField("lookat.origin"))?;
                let target = attrs.get("target").ok_or(SceneLoadError::MissingField("lookat.target"))?;
                node.props.set("origin", Property::Vector(parse_vec3(origin)?));
                node.props.set("target", Property::Vector(parse_vec3(target)?));
                if let Some(up) = attrs.get("up") {
                    node.props.set("up", Property::Vector(parse_vec3(up)?));
                }
            }
            other => {
                log::warn!("Ignoring unknown scene element <{}>", String::from_utf8_lossy(other));
            }
        }
        Ok(())
    }

    fn end(&mut self, tag: &[u8]) -> Result<(), SceneLoadError> {
        let kind = match NodeKind::from_tag(tag) {
            Some(kind) => kind,
            None => return Ok(()),
        };
        let node = match self.stack.pop() {
            Some(node) if node.kind == kind => node,
            _ => return Err(SceneLoadError::Parse(
                format!("unbalanced </{}>", String::from_utf8_lossy(tag)))),
        };
        let parent = self.stack.last().map(|n| n.kind);

        match kind {
            NodeKind::Integrator => self.integrator = Some(node.props),
            NodeKind::Sensor => self.sensor = Some(node.props),
            NodeKind::Film => self.film = Some(node.props),
            NodeKind::Sampler => self.sampler = Some(node.props),
            NodeKind::RFilter => self.rfilter = Some(node.props),
            NodeKind::Shape => self.shapes.push(node.props),
            NodeKind::Transform => {
                if node.props.plugin_type() != "to_world" {
                    return Err(SceneLoadError::Parse(
                        format!("unsupported transform: {}", node.props.plugin_type())));
                }
                let target = self.top("transform")?;
                for key in ["origin", "target", "up"] {
                    if let Some(value) = node.props.get(key) {
                        target.props.set(key, value.clone());
                    }
                }
            }
            NodeKind::Bsdf => {
                if node.props.plugin_type() != "diffuse" {
                    return Err(SceneLoadError::Parse(
                        format!("unsupported bsdf: {}", node.props.plugin_type())));
                }
                let albedo = node.props.rgb_("reflectance", RGBSpectrum::splat(0.5))?;
                match parent {
                    Some(NodeKind::Shape) => self.top("bsdf")?.props.set("albedo", Property::Rgb(albedo)),
                    _ => return Err(SceneLoadError::Parse("<bsdf> must be inside <shape>".to_string())),
                }
            }
            NodeKind::Emitter => {
                let radiance = node.props.rgb_("radiance", RGBSpectrum::splat(1.0))?;
                match (parent, node.props.plugin_type()) {
                    (Some(NodeKind::Shape), "area") => {
                        self.top("emitter")?.props.set("emission", Property::Rgb(radiance));
                    }
                    (None, "constant") => self.background = Some(radiance),
                    (_, other) => return Err(SceneLoadError::Parse(format!("unsupported emitter: {}", other))),
                }
            }
            NodeKind::Background => {
                self.background = Some(node.props.rgb_("radiance", RGBSpectrum::default())?);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<SceneLoadResult, SceneLoadError> {
        if let Some(node) = self.stack.last() {
            return Err(SceneLoadError::Parse(format!("unclosed {:?} element", node.kind)));
        }

        let integrator = self.integrator.unwrap_or_else(|| Properties::new("path"));
        if integrator.plugin_type() != "path" {
            return Err(SceneLoadError::Parse(format!("unsupported integrator: {}", integrator.plugin_type())));
        }

        let sensor_props = self.sensor.ok_or(SceneLoadError::MissingField("sensor"))?;
        if sensor_props.plugin_type() != "perspective" {
            return Err(SceneLoadError::Parse(format!("unsupported sensor: {}", sensor_props.plugin_type())));
        }

        let filter = create_filter(&self.rfilter.unwrap_or_else(|| Properties::new("gaussian")))?;
        let film = Film::from_properties(&self.film.unwrap_or_else(|| Properties::new("hdrfilm")), filter)?;

        let sampler_props = self.sampler.unwrap_or_else(|| Properties::new("independent"));
        if sampler_props.plugin_type() != "independent" {
            return Err(SceneLoadError::Parse(format!("unsupported sampler: {}", sampler_props.plugin_type())));
        }
        let sampler = IndependentSampler::from_properties(&sampler_props)?;
        let sensor = PerspectiveCamera::from_properties(&sensor_props, film, Box::new(sampler))?;

        let mut scene = Scene::new();
        for props in &self.shapes {
            if props.plugin_type() != "sphere" {
                return Err(SceneLoadError::Parse(format!("unsupported shape: {}", props.plugin_type())));
            }
            let sphere = Arc::new(Sphere::from_properties(props)?);
            let mut object = SceneObject::new(sphere, props.rgb_("albedo", RGBSpectrum::splat(0.5))?)
                .with_emission(props.rgb_("emission", RGBSpectrum::default())?);
            if props.has("id") {
                object = object.with_name(props.string_("id", "")?);
            }
            scene.add_object(object);
        }
        if let Some(background) = self.background {
            scene.set_background(background);
        }

        Ok(SceneLoadResult { scene, sensor, integrator })
    }
}

fn parse_property(tag: &[u8], attrs: &HashMap<String, String>) -> Result<Property, SceneLoadError> {
    if matches!(tag, b"vector" | b"point") && !attrs.contains_key("value") {
        let component = |key: &str| -> Result<Float, SceneLoadError> {
            attrs.get(key).map(|v| parse_float(v)).unwrap_or(Ok(0.0))
        };
        return Ok(Property::Vector(Vector3f::new(component("x")?, component("y")?, component("z")?)));
    }

    let value = attrs.get("value").ok_or(SceneLoadError::MissingField("property value"))?;
    match tag {
        b"integer" => Ok(Property::Integer(parse_i64(value)?)),
        b"float" => Ok(Property::Float(parse_float(value)?)),
        b"boolean" => match value.as_str() {
            "true" => Ok(Property::Bool(true)),
            "false" => Ok(Property::Bool(false)),
            _ => Err(SceneLoadError::Parse(format!("invalid boolean: {}", value))),
        },
        b"string" => Ok(Property::String(value.clone())),
        b"rgb" => Ok(Property::Rgb(parse_vec3_spectrum(value)?)),
        _ => Ok(Property::Vector(parse_vec3(value)?)),
    }
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_i64(value: &str) -> Result<i64, SceneLoadError> {
    value.trim().parse::<i64>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let mut parts = value.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty());
    let x = parts.next().ok_or_else(|| SceneLoadError::Parse(format!("invalid vec3: {}", value)))?;
    let y = parts.next().ok_or_else(|| SceneLoadError::Parse(format!("invalid vec3: {}", value)))?;
    let z = parts.next().ok_or_else(|| SceneLoadError::Parse(format!("invalid vec3: {}", value)))?;
    Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?))
}

/// A single value is a grey spectrum.
fn parse_vec3_spectrum(value: &str) -> Result<RGBSpectrum, SceneLoadError> {
    if let Ok(v) = parse_float(value) {
        return Ok(RGBSpectrum::splat(v));
    }
    Ok(RGBSpectrum::from_vec(parse_vec3(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sensor::Sensor;
    use crate::math::constants::Vector2u;

    const SCENE: &str = r#"
        <scene version="3.0.0">
            <default name="spp" value="16"/>
            <default name="res" value="32"/>
            <integrator type="path">
                <integer name="max_depth" value="4"/>
                <integer name="block_size" value="12"/>
                <integer name="samples_per_pass" value="4"/>
            </integrator>
            <sensor type="perspective">
                <float name="fov" value="40"/>
                <transform name="to_world">
                    <lookat origin="0, 0, -5" target="0, 0, 0" up="0, 1, 0"/>
                </transform>
                <sampler type="independent">
                    <integer name="sample_count" value="$spp"/>
                </sampler>
                <film type="hdrfilm">
                    <integer name="width" value="$res"/>
                    <integer name="height" value="24"/>
                    <rfilter type="box"/>
                </film>
            </sensor>
            <shape type="sphere" id="light">
                <point name="center" x="0" y="3" z="0"/>
                <float name="radius" value="0.5"/>
                <emitter type="area">
                    <rgb name="radiance" value="10"/>
                </emitter>
            </shape>
            <shape type="sphere">
                <point name="center" value="0 0 0"/>
                <bsdf type="diffuse">
                    <rgb name="reflectance" value="0.2, 0.4, 0.6"/>
                </bsdf>
            </shape>
            <emitter type="constant">
                <rgb name="radiance" value="0.1"/>
            </emitter>
        </scene>
    "#;

    #[test]
    fn test_parse_scene() {
        let result = parse_scene(SCENE, &HashMap::new()).unwrap();
        assert_eq!(result.integrator.int_("max_depth", -1).unwrap(), 4);
        assert_eq!(result.integrator.size_("block_size", 32).unwrap(), 12);

        let film = result.sensor.film();
        assert_eq!(film.size(), Vector2u::new(32, 24));
        assert_eq!(film.reconstruction_filter().radius(), 0.5);
        assert_eq!(result.sensor.sampler().sample_count(), 16);

        let objects = result.scene.objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name.as_deref(), Some("light"));
        assert_eq!(objects[0].emission, RGBSpectrum::splat(10.0));
        assert_eq!(objects[1].albedo, RGBSpectrum::new(0.2, 0.4, 0.6));
        assert!(objects[1].emission.is_black());
        assert_eq!(result.scene.background(), RGBSpectrum::splat(0.1));
    }

    #[test]
    fn test_defines_override_defaults() {
        let mut defines = HashMap::new();
        defines.insert("spp".to_string(), "64".to_string());
        let result = parse_scene(SCENE, &defines).unwrap();
        assert_eq!(result.sensor.sampler().sample_count(), 64);
        assert_eq!(result.sensor.film().size().x, 32);
    }

    #[test]
    fn test_unsupported_integrator() {
        let xml = r#"<scene><integrator type="volpath"/><sensor type="perspective"/></scene>"#;
        assert!(matches!(parse_scene(xml, &HashMap::new()), Err(SceneLoadError::Parse(_))));
    }

    #[test]
    fn test_missing_sensor() {
        let xml = r#"<scene><integrator type="path"/></scene>"#;
        assert!(matches!(parse_scene(xml, &HashMap::new()), Err(SceneLoadError::MissingField("sensor"))));
    }

    #[test]
    fn test_invalid_values() {
        let xml = r#"<scene><sensor type="perspective"><float name="fov" value="wide"/></sensor></scene>"#;
        assert!(matches!(parse_scene(xml, &HashMap::new()), Err(SceneLoadError::Parse(_))));

        let xml = r#"<scene><sensor type="perspective"><float name="fov" value="200"/></sensor></scene>"#;
        assert!(matches!(parse_scene(xml, &HashMap::new()), Err(SceneLoadError::Property(_))));
    }

    #[test]
    fn test_minimal_scene_uses_defaults() {
        let xml = r#"<scene><sensor type="perspective"/></scene>"#;
        let result = parse_scene(xml, &HashMap::new()).unwrap();
        assert_eq!(result.integrator.plugin_type(), "path");
        assert_eq!(result.sensor.film().size(), Vector2u::new(768, 576));
        assert_eq!(result.sensor.sampler().sample_count(), 4);
        assert!(result.scene.is_empty());
    }
}
