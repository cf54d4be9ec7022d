//! Topology loader.
//!
//! Reads a YAML description of the physical LED layout and flattens it
//! into a [`Mapping`]:
//!
//! ```yaml
//! controller:
//!   - ddp: { id: ring, host: wled-ring.local }
//! mapping:
//!   - translate:
//!       x: 8
//!       y: 8
//!       controller: { id: ring }
//!       items:
//!         - ring: { length: 24, diameter: 16 }
//!         - ring: { length: 12, diameter: 8, disabled: true }
//!   - matrix: { width: 16, height: 1, firstled: topleft }
//! ```
//!
//! Each entry under `mapping` is a single-key map naming a shape or
//! transform. Nodes with `items` are transforms applied to the
//! concatenation of their children; nodes without are shapes. The
//! control keys `controller`, `disabled`, `items` and `name` are
//! stripped before the rest is handed to the node.

pub mod controller;
pub mod registry;

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping as YamlMap, Value};
use tracing::{debug, info};

use crate::error::CastError;
use crate::geometry::{DestinationId, LedPoint, tag_untagged};
use crate::mapping::Mapping;

pub use controller::{ControllerKind, ControllerSpec};
pub use registry::{NodeKind, Shape, Transform};

/// Deepest `include` chain accepted before assuming a cycle.
const MAX_INCLUDE_DEPTH: usize = 16;

/// A loaded topology: the flattened mapping plus declared controllers.
#[derive(Debug, Clone)]
pub struct Topology {
    mapping: Mapping,
    controllers: Vec<ControllerSpec>,
}

impl Topology {
    /// Load and resolve the topology file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CastError> {
        let path = path.as_ref();
        let text = read_file(path)?;
        let topology = Self::from_yaml_str(&text, parent_dir(path))?;
        info!(
            "Loaded topology {}: {}, {} controllers",
            path.display(),
            topology.mapping,
            topology.controllers.len()
        );
        Ok(topology)
    }

    /// Resolve a topology document. `include` paths are taken relative
    /// to `base_dir`.
    pub fn from_yaml_str(text: &str, base_dir: impl AsRef<Path>) -> Result<Self, CastError> {
        let mut resolver = Resolver::default();
        let points = resolver.document(text, base_dir.as_ref(), 0)?;
        Ok(Self {
            mapping: Mapping::new(points),
            controllers: resolver.controllers,
        })
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Controllers in declaration order, included files last.
    pub fn controllers(&self) -> &[ControllerSpec] {
        &self.controllers
    }

    pub fn into_parts(self) -> (Mapping, Vec<ControllerSpec>) {
        (self.mapping, self.controllers)
    }
}

fn read_file(path: &Path) -> Result<String, CastError> {
    std::fs::read_to_string(path)
        .map_err(|e| CastError::Config(format!("cannot read {}: {e}", path.display())))
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

// ── Resolver ─────────────────────────────────────────────────────

/// Control keys pulled off a node before its arguments are parsed.
struct Controls {
    controller: Option<DestinationId>,
    disabled: bool,
    items: Option<Vec<Value>>,
    label: Option<String>,
}

#[derive(Default)]
struct Resolver {
    controllers: Vec<ControllerSpec>,
}

impl Resolver {
    fn document(
        &mut self,
        text: &str,
        base_dir: &Path,
        depth: usize,
    ) -> Result<Vec<LedPoint>, CastError> {
        let doc: Value = serde_yaml::from_str(text)?;
        let root = match doc {
            Value::Null => return Ok(Vec::new()),
            Value::Mapping(root) => root,
            other => {
                return Err(CastError::Config(format!(
                    "topology must be a map with `mapping` and `controller` keys, got {other:?}"
                )));
            }
        };

        if let Some(list) = root.get("controller") {
            for entry in sequence(list, "controller")? {
                controller::declare(&mut self.controllers, controller::parse_entry(entry)?)?;
            }
        }

        let mut points = Vec::new();
        if let Some(list) = root.get("mapping") {
            for node in sequence(list, "mapping")? {
                points.extend(self.node(node, base_dir, depth)?);
            }
        }
        Ok(points)
    }

    fn node(
        &mut self,
        node: &Value,
        base_dir: &Path,
        depth: usize,
    ) -> Result<Vec<LedPoint>, CastError> {
        let (name, args) = single_entry(node)?;

        let mut args = match args {
            Value::Mapping(m) if !m.is_empty() => m.clone(),
            Value::Null | Value::Mapping(_) => {
                return Err(CastError::Parse(format!(
                    "no arguments for {name:?}, please check indentation"
                )));
            }
            other => {
                return Err(CastError::Parse(format!(
                    "arguments of {name:?} must be a map, got {other:?}"
                )));
            }
        };
        let controls = take_controls(name, &mut args)?;
        let kind = registry::construct(name, args)?;

        if controls.disabled {
            debug!("{} disabled", controls.label.as_deref().unwrap_or(name));
            return Ok(Vec::new());
        }

        let mut points = match (kind, controls.items) {
            (NodeKind::Transform(transform), Some(items)) => {
                let mut children = Vec::new();
                for child in &items {
                    children.extend(self.node(child, base_dir, depth)?);
                }
                transform.apply(children)
            }
            (NodeKind::Transform(_), None) => {
                return Err(CastError::invalid_argument(name, "transform needs `items`"));
            }
            (NodeKind::Shape(_), Some(_)) => {
                return Err(CastError::invalid_argument(name, "shapes do not take `items`"));
            }
            (NodeKind::Shape(Shape::Include(inc)), None) => {
                self.include(&base_dir.join(&inc.file), depth)?
            }
            (NodeKind::Shape(shape), None) => shape.generate(),
        };

        if let Some(id) = &controls.controller {
            tag_untagged(&mut points, id);
        }
        debug!(
            "{}: {} points",
            controls.label.as_deref().unwrap_or(name),
            points.len()
        );
        Ok(points)
    }

    fn include(&mut self, path: &Path, depth: usize) -> Result<Vec<LedPoint>, CastError> {
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(CastError::Config(format!(
                "include of {} nested deeper than {MAX_INCLUDE_DEPTH} levels",
                path.display()
            )));
        }
        let text = read_file(path)?;
        self.document(&text, &parent_dir(path), depth + 1)
    }
}

fn sequence<'a>(value: &'a Value, key: &str) -> Result<&'a [Value], CastError> {
    match value {
        Value::Null => Ok(&[][..]),
        Value::Sequence(items) => Ok(items.as_slice()),
        other => Err(CastError::Config(format!(
            "`{key}` must be a list, got {other:?}"
        ))),
    }
}

fn single_entry(node: &Value) -> Result<(&str, &Value), CastError> {
    let entry = node
        .as_mapping()
        .filter(|m| m.len() == 1)
        .and_then(|m| m.iter().next());
    match entry {
        Some((Value::String(name), args)) => Ok((name.as_str(), args)),
        _ => Err(CastError::Parse(format!(
            "each node must be a single `name: {{args}}` entry, got {node:?}"
        ))),
    }
}

fn take_controls(name: &str, args: &mut YamlMap) -> Result<Controls, CastError> {
    let controller = match args.remove("controller") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(DestinationId::new(id)),
        Some(Value::Mapping(m)) => match m.get("id") {
            Some(Value::String(id)) => Some(DestinationId::new(id.as_str())),
            _ => {
                return Err(CastError::Config(format!(
                    "controller binding on {name:?} needs a string `id`"
                )));
            }
        },
        Some(other) => {
            return Err(CastError::Config(format!(
                "controller binding on {name:?} must be a map, got {other:?}"
            )));
        }
    };

    let disabled = match args.remove("disabled") {
        None => false,
        Some(Value::Bool(b)) => b,
        Some(other) => {
            return Err(CastError::invalid_argument(
                name,
                format!("`disabled` must be true or false, got {other:?}"),
            ));
        }
    };

    let items = match args.remove("items") {
        None => None,
        Some(Value::Sequence(items)) => Some(items),
        Some(other) => {
            return Err(CastError::invalid_argument(
                name,
                format!("`items` must be a list, got {other:?}"),
            ));
        }
    };

    let label = match args.remove("name") {
        None => None,
        Some(Value::String(label)) => Some(label),
        Some(other) => {
            return Err(CastError::invalid_argument(
                name,
                format!("`name` must be a string, got {other:?}"),
            ));
        }
    };

    Ok(Controls {
        controller,
        disabled,
        items,
        label,
    })
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn load(text: &str) -> Result<Topology, CastError> {
        Topology::from_yaml_str(text, ".")
    }

    #[test]
    fn top_level_nodes_concatenate_in_file_order() {
        let topo = load(
            "mapping:
  - matrix: {width: 2, height: 1}
  - translate:
      y: 5
      items:
        - matrix: {width: 1, height: 1}
",
        )
        .unwrap();
        assert_eq!(
            topo.mapping().positions(),
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 5.0)]
        );
        assert!(topo.mapping().points().iter().all(|p| p.destination.is_null()));
    }

    #[test]
    fn inner_binding_overrides_outer() {
        let topo = load(
            "mapping:
  - group:
      controller: {id: outer}
      items:
        - matrix: {width: 1, height: 1}
        - matrix: {width: 1, height: 1, controller: {id: inner}}
",
        )
        .unwrap();
        let ids: Vec<&str> = topo
            .mapping()
            .points()
            .iter()
            .map(|p| p.destination.as_str())
            .collect();
        assert_eq!(ids, vec!["outer", "inner"]);
    }

    #[test]
    fn transforms_run_before_tagging() {
        let topo = load(
            "mapping:
  - translate:
      x: 10
      controller: {id: a}
      items:
        - translate:
            x: 1
            controller: b
            items:
              - matrix: {width: 1, height: 1}
",
        )
        .unwrap();
        let p = &topo.mapping().points()[0];
        assert_eq!(p.position, Point::new(11.0, 0.0));
        assert_eq!(p.destination.as_str(), "b");
    }

    #[test]
    fn disabled_subtree_contributes_nothing() {
        let topo = load(
            "mapping:
  - ring: {length: 8, diameter: 4, disabled: true}
  - group:
      disabled: true
      items:
        - matrix: {width: 3, height: 3}
  - matrix: {width: 2, height: 1}
",
        )
        .unwrap();
        assert_eq!(topo.mapping().len(), 2);
    }

    #[test]
    fn missing_arguments_is_parse_error() {
        let err = load("mapping:\n  - matrix:\n").unwrap_err();
        assert!(matches!(err, CastError::Parse(_)));
    }

    #[test]
    fn unknown_node_is_rejected() {
        let err = load("mapping:\n  - hexagon: {size: 3}\n").unwrap_err();
        assert!(matches!(err, CastError::UnknownShape(ref n) if n == "hexagon"));
    }

    #[test]
    fn transform_without_items_is_invalid() {
        let err = load("mapping:\n  - translate: {x: 1}\n").unwrap_err();
        assert!(matches!(err, CastError::InvalidArgument { .. }));
    }

    #[test]
    fn name_must_be_a_string() {
        let topo = load("mapping:\n  - matrix: {width: 1, height: 1, name: panel}\n").unwrap();
        assert_eq!(topo.mapping().len(), 1);

        let err = load("mapping:\n  - matrix: {width: 1, height: 1, name: 5}\n").unwrap_err();
        assert!(matches!(err, CastError::InvalidArgument { .. }));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn controllers_are_collected() {
        let topo = load(
            "controller:
  - ddp: {id: ring, host: 127.0.0.1}
  - ddp: {host: 127.0.0.2}
mapping:
  - ring: {length: 4, diameter: 2, controller: {id: ring}}
",
        )
        .unwrap();
        let ids: Vec<&str> = topo.controllers().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ring", "127.0.0.2"]);
        assert_eq!(topo.mapping().destinations()[0].id.as_str(), "ring");
    }

    #[test]
    fn conflicting_controllers_fail() {
        let err = load(
            "controller:
  - ddp: {id: ring, host: 127.0.0.1}
  - ddp: {id: ring, host: 127.0.0.9}
",
        )
        .unwrap_err();
        assert!(matches!(err, CastError::Config(_)));
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        assert!(load("").unwrap().mapping().is_empty());
        assert!(load("controller: []\n").unwrap().mapping().is_empty());
    }

    #[test]
    fn include_is_relative_to_including_file() {
        let dir = std::env::temp_dir().join(format!("wledcast-include-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("parts")).unwrap();
        std::fs::write(
            dir.join("parts/strip.yaml"),
            "controller:\n  - ddp: {id: strip, host: 127.0.0.1}\nmapping:\n  - matrix: {width: 3, height: 1, controller: {id: strip}}\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("main.yaml"),
            "mapping:\n  - translate:\n      y: 2\n      items:\n        - include: {file: parts/strip.yaml}\n",
        )
        .unwrap();

        let topo = Topology::load(dir.join("main.yaml")).unwrap();
        assert_eq!(topo.mapping().len(), 3);
        assert_eq!(topo.mapping().points()[2].position, Point::new(2.0, 2.0));
        assert_eq!(topo.controllers()[0].id.as_str(), "strip");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn self_include_is_caught() {
        let dir = std::env::temp_dir().join(format!("wledcast-cycle-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("loop.yaml"),
            "mapping:\n  - include: {file: loop.yaml}\n",
        )
        .unwrap();

        let err = Topology::load(dir.join("loop.yaml")).unwrap_err();
        assert!(matches!(err, CastError::Config(_)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
