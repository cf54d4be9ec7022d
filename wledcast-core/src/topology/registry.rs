//! Static registry of node names.
//!
//! Each name maps to a constructor that turns the node's remaining
//! YAML arguments into a typed variant. Lookup happens once, while the
//! topology is parsed.

use std::path::PathBuf;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping as YamlMap, Value};

use crate::error::CastError;
use crate::geometry::{self, Corner, LedPoint};

// ── Argument structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixArgs {
    pub width: u32,
    pub height: u32,
    #[serde(default, alias = "first_corner")]
    pub firstled: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingArgs {
    #[serde(alias = "count")]
    pub length: u32,
    pub diameter: f64,
    #[serde(default, alias = "start_angle")]
    pub angle: f64,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub crop: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeArgs {
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateArgs {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotateArgs {
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleArgs {
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupArgs {}

// ── Node kinds ───────────────────────────────────────────────────

/// A leaf node: produces points on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Matrix { width: u32, height: u32, first: Corner },
    Ring(RingArgs),
    /// Splice in another topology file.
    Include(IncludeArgs),
}

impl Shape {
    /// Points of a geometric shape. `Include` is resolved by the loader
    /// and yields nothing here.
    pub fn generate(&self) -> Vec<LedPoint> {
        match self {
            Shape::Matrix {
                width,
                height,
                first,
            } => geometry::matrix(*width, *height, *first),
            Shape::Ring(a) => geometry::ring(a.length, a.diameter, a.angle, a.reverse, a.crop),
            Shape::Include(_) => Vec::new(),
        }
    }
}

/// An inner node: rewrites the concatenated points of its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Translate(TranslateArgs),
    Rotate(RotateArgs),
    Scale(ScaleArgs),
    Group,
}

impl Transform {
    pub fn apply(&self, points: Vec<LedPoint>) -> Vec<LedPoint> {
        match self {
            Transform::Translate(a) => geometry::translate(points, a.x, a.y),
            Transform::Rotate(a) => geometry::rotate(points, a.angle),
            Transform::Scale(a) => geometry::scale(points, a.factor),
            Transform::Group => points,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Shape(Shape),
    Transform(Transform),
}

// ── Registry ─────────────────────────────────────────────────────

type Constructor = fn(&str, YamlMap) -> Result<NodeKind, CastError>;

const REGISTRY: &[(&str, Constructor)] = &[
    ("matrix", matrix),
    ("line", matrix),
    ("ring", ring),
    ("include", include),
    ("translate", translate),
    ("rotate", rotate),
    ("scale", scale),
    ("group", group),
];

/// Build the typed node for `name` from its arguments.
pub fn construct(name: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    let (_, ctor) = REGISTRY
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| CastError::UnknownShape(name.to_string()))?;
    ctor(name, args)
}

fn parse_args<T: DeserializeOwned>(node: &str, args: YamlMap) -> Result<T, CastError> {
    serde_yaml::from_value(Value::Mapping(args)).map_err(|e| CastError::invalid_argument(node, e))
}

fn matrix(node: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    let a: MatrixArgs = parse_args(node, args)?;
    let first = match a.firstled.as_deref() {
        Some(corner) => corner.parse()?,
        None => Corner::default(),
    };
    Ok(NodeKind::Shape(Shape::Matrix {
        width: a.width,
        height: a.height,
        first,
    }))
}

fn ring(node: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    let a: RingArgs = parse_args(node, args)?;
    if !a.diameter.is_finite() || a.diameter < 0.0 {
        return Err(CastError::invalid_argument(
            node,
            format!("diameter must be a non-negative number, got {}", a.diameter),
        ));
    }
    Ok(NodeKind::Shape(Shape::Ring(a)))
}

fn include(node: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    Ok(NodeKind::Shape(Shape::Include(parse_args(node, args)?)))
}

fn translate(node: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    Ok(NodeKind::Transform(Transform::Translate(parse_args(node, args)?)))
}

fn rotate(node: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    Ok(NodeKind::Transform(Transform::Rotate(parse_args(node, args)?)))
}

fn scale(node: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    Ok(NodeKind::Transform(Transform::Scale(parse_args(node, args)?)))
}

fn group(node: &str, args: YamlMap) -> Result<NodeKind, CastError> {
    let GroupArgs {} = parse_args(node, args)?;
    Ok(NodeKind::Transform(Transform::Group))
}
