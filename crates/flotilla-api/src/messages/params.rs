//! Argument types for batch and administrative operations.

use flotilla_core::EntityStatus;
use serde::Deserialize;
use serde::Serialize;

/// One target entity, by tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityArg {
    pub tag: String,
}

impl EntityArg {
    pub fn new(tag: impl Into<String>) -> EntityArg {
        EntityArg { tag: tag.into() }
    }
}

/// The universal batch argument: an ordered list of target tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub entities: Vec<EntityArg>,
}

impl Entities {
    /// Build from tag strings, preserving order.
    pub fn from_tags<I, S>(tags: I) -> Entities
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Entities {
            entities: tags.into_iter().map(|t| EntityArg::new(t)).collect(),
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// One status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusArg {
    pub tag: String,
    pub status: EntityStatus,
    /// Free-form operator-visible detail, e.g. an error description.
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetStatusArgs {
    pub entities: Vec<SetStatusArg>,
}

/// Arguments for the bulk machine destroy convenience command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyMachinesArgs {
    pub machine_ids: Vec<String>,
}

/// Arguments for the bulk unit destroy convenience command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyUnitsArgs {
    pub unit_names: Vec<String>,
}

/// Arguments for full control-plane self-destruction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestroySystemArgs {
    /// When set, every principal unit is destroyed first and the call
    /// waits up to this budget for each unit's removal before the
    /// environment is marked dead.
    #[serde(default)]
    pub drain_timeout_ms: Option<u64>,
}

/// Arguments for targeted remote command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArgs {
    /// Target machine/unit tags.
    pub targets: Vec<String>,
    pub commands: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for cluster-wide remote command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOnAllMachinesArgs {
    pub commands: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_preserve_order() {
        let args = Entities::from_tags(["machine-1", "machine-0", "machine-42"]);
        let tags: Vec<&str> = args.tags().collect();
        assert_eq!(tags, vec!["machine-1", "machine-0", "machine-42"]);
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn entities_deserialize_from_wire_shape() {
        let json = r#"{"entities":[{"tag":"unit-wordpress-0"}]}"#;
        let args: Entities = serde_json::from_str(json).unwrap();
        assert_eq!(args.entities[0].tag, "unit-wordpress-0");
    }
}
