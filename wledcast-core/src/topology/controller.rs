//! Controller declarations from the `controller:` section of a topology file.
//!
//! ```yaml
//! controller:
//!   - ddp: { id: ring, host: wled-ring.local }
//!   - ddp: { host: 192.168.1.40, port: 4048 }
//!   - none: { id: spare }
//! ```

use serde::Deserialize;
use serde_yaml::Value;
use tracing::warn;

use crate::ddp::DDP_PORT;
use crate::error::CastError;
use crate::geometry::DestinationId;

/// How a destination is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerKind {
    /// DDP over UDP to `host:port`.
    Ddp { host: String, port: u16 },
    /// Accepts and discards.
    Null,
}

/// One declared controller, bound to a destination id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSpec {
    pub id: DestinationId,
    pub kind: ControllerKind,
}

impl ControllerSpec {
    /// A DDP controller on the standard port.
    pub fn ddp(id: impl Into<DestinationId>, host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ControllerKind::Ddp {
                host: host.into(),
                port: DDP_PORT,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DdpDecl {
    id: Option<String>,
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NullDecl {
    id: String,
}

fn default_port() -> u16 {
    DDP_PORT
}

/// Parse one `{type: {args}}` entry of the `controller:` list.
pub fn parse_entry(entry: &Value) -> Result<ControllerSpec, CastError> {
    let map = entry
        .as_mapping()
        .filter(|m| m.len() == 1)
        .ok_or_else(|| CastError::Config(format!("controller entry must be a single-key map: {entry:?}")))?;
    let Some((kind, args)) = map.iter().next() else {
        return Err(CastError::Config("empty controller entry".into()));
    };
    let kind = kind
        .as_str()
        .ok_or_else(|| CastError::Config(format!("controller type must be a string: {kind:?}")))?;

    match kind {
        "ddp" => {
            let decl: DdpDecl = serde_yaml::from_value(args.clone())
                .map_err(|e| CastError::Config(format!("ddp controller: {e}")))?;
            let id = decl.id.unwrap_or_else(|| decl.host.clone());
            Ok(ControllerSpec {
                id: id.into(),
                kind: ControllerKind::Ddp {
                    host: decl.host,
                    port: decl.port,
                },
            })
        }
        "none" => {
            let decl: NullDecl = serde_yaml::from_value(args.clone())
                .map_err(|e| CastError::Config(format!("null controller: {e}")))?;
            Ok(ControllerSpec {
                id: decl.id.into(),
                kind: ControllerKind::Null,
            })
        }
        other => Err(CastError::Config(format!("unknown controller type {other:?}"))),
    }
}

/// Append `spec` to `declared`, rejecting a second, different definition
/// of the same id. An identical repeat is ignored.
pub fn declare(declared: &mut Vec<ControllerSpec>, spec: ControllerSpec) -> Result<(), CastError> {
    match declared.iter().find(|c| c.id == spec.id) {
        Some(existing) if *existing == spec => {
            warn!("controller {} declared twice", spec.id);
            Ok(())
        }
        Some(existing) => Err(CastError::Config(format!(
            "duplicate id for controller {}: {:?} vs {:?}",
            spec.id, existing.kind, spec.kind
        ))),
        None => {
            declared.push(spec);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn id_defaults_to_host() {
        let spec = parse_entry(&entry("ddp: {host: 10.0.0.7}")).unwrap();
        assert_eq!(spec, ControllerSpec::ddp("10.0.0.7", "10.0.0.7"));
    }

    #[test]
    fn explicit_id_and_port() {
        let spec = parse_entry(&entry("ddp: {id: ring, host: wled.local, port: 5000}")).unwrap();
        assert_eq!(spec.id.as_str(), "ring");
        assert_eq!(
            spec.kind,
            ControllerKind::Ddp {
                host: "wled.local".into(),
                port: 5000
            }
        );
    }

    #[test]
    fn missing_host_is_config_error() {
        let err = parse_entry(&entry("ddp: {id: ring}")).unwrap_err();
        assert!(matches!(err, CastError::Config(_)));
    }

    #[test]
    fn unknown_type_is_config_error() {
        assert!(matches!(
            parse_entry(&entry("artnet: {host: x}")),
            Err(CastError::Config(_))
        ));
    }

    #[test]
    fn conflicting_duplicate_rejected() {
        let mut declared = Vec::new();
        declare(&mut declared, ControllerSpec::ddp("ring", "a.local")).unwrap();
        declare(&mut declared, ControllerSpec::ddp("ring", "a.local")).unwrap();
        assert_eq!(declared.len(), 1);

        let err = declare(&mut declared, ControllerSpec::ddp("ring", "b.local")).unwrap_err();
        assert!(err.to_string().contains("ring"));
    }
}
