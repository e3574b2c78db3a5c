//! Entity tags.
//!
//! A tag is the self-describing string identifier of one cluster entity:
//! `<kind>-<id>`, e.g. `machine-0`, `unit-wordpress-0`, `service-mysql`,
//! `user-admin`, `environment-11f9...`. The kind is derived purely from the
//! tag's syntax, never from a lookup.
//!
//! Unit names embed a `/` (`wordpress/0`); inside a tag the slash becomes a
//! dash (`unit-wordpress-0`). [`Tag::unit_name`] reverses the mapping.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;

/// The kind of entity a tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Machine,
    Unit,
    Service,
    User,
    Environment,
    Relation,
    Action,
}

impl TagKind {
    /// The wire spelling of this kind, as it appears in tag strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Machine => "machine",
            TagKind::Unit => "unit",
            TagKind::Service => "service",
            TagKind::User => "user",
            TagKind::Environment => "environment",
            TagKind::Relation => "relation",
            TagKind::Action => "action",
        }
    }

    fn from_prefix(s: &str) -> Option<TagKind> {
        match s {
            "machine" => Some(TagKind::Machine),
            "unit" => Some(TagKind::Unit),
            "service" => Some(TagKind::Service),
            "user" => Some(TagKind::User),
            "environment" => Some(TagKind::Environment),
            "relation" => Some(TagKind::Relation),
            "action" => Some(TagKind::Action),
            _ => None,
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed entity tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    kind: TagKind,
    id: String,
}

impl Tag {
    /// Build a tag from a kind and an already-embedded id.
    ///
    /// The id must be in embedded form (no `/`); use [`Tag::unit`] to build
    /// a unit tag from a unit name.
    pub fn new(kind: TagKind, id: impl Into<String>) -> Tag {
        Tag { kind, id: id.into() }
    }

    /// Tag for a machine id, e.g. `machine("0")` -> `machine-0`.
    pub fn machine(id: impl Into<String>) -> Tag {
        Tag::new(TagKind::Machine, id)
    }

    /// Tag for a unit name, mapping `wordpress/0` to `unit-wordpress-0`.
    pub fn unit(name: &str) -> Tag {
        Tag::new(TagKind::Unit, name.replace('/', "-"))
    }

    /// Tag for a service name.
    pub fn service(name: impl Into<String>) -> Tag {
        Tag::new(TagKind::Service, name)
    }

    /// Tag for a user name.
    pub fn user(name: impl Into<String>) -> Tag {
        Tag::new(TagKind::User, name)
    }

    /// Tag for the environment with the given UUID.
    pub fn environment(uuid: impl Into<String>) -> Tag {
        Tag::new(TagKind::Environment, uuid)
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// The embedded id portion of the tag (`wordpress-0` for a unit tag).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Recover the unit name from a unit tag (`unit-wordpress-0` ->
    /// `wordpress/0`). Returns `None` for non-unit tags.
    ///
    /// The last dash separates the unit ordinal from the service name, so
    /// service names containing dashes round-trip correctly
    /// (`unit-mysql-db-0` -> `mysql-db/0`).
    pub fn unit_name(&self) -> Option<String> {
        if self.kind != TagKind::Unit {
            return None;
        }
        let (service, ordinal) = self.id.rsplit_once('-')?;
        Some(format!("{service}/{ordinal}"))
    }

    /// Parse a tag string, failing with [`Error::InvalidTag`] if the string
    /// is not `<known-kind>-<nonempty-id>`.
    pub fn parse(s: &str) -> Result<Tag, Error> {
        let invalid = || Error::InvalidTag { tag: s.to_string() };
        let (prefix, id) = s.split_once('-').ok_or_else(invalid)?;
        let kind = TagKind::from_prefix(prefix).ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        Ok(Tag::new(kind, id))
    }

    /// Parse a tag string and require it to be of the expected kind.
    pub fn parse_kind(s: &str, expected: TagKind) -> Result<Tag, Error> {
        let tag = Tag::parse(s)?;
        if tag.kind != expected {
            return Err(Error::InvalidTag { tag: s.to_string() });
        }
        Ok(tag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Tag, Error> {
        Tag::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_machine_tag() {
        let tag = Tag::parse("machine-0").unwrap();
        assert_eq!(tag.kind(), TagKind::Machine);
        assert_eq!(tag.id(), "0");
        assert_eq!(tag.to_string(), "machine-0");
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let err = Tag::parse("blimp-0").unwrap_err();
        assert!(matches!(err, Error::InvalidTag { .. }));
    }

    #[test]
    fn parse_rejects_missing_id() {
        assert!(Tag::parse("machine-").is_err());
        assert!(Tag::parse("machine").is_err());
        assert!(Tag::parse("").is_err());
    }

    #[test]
    fn parse_kind_mismatch() {
        assert!(Tag::parse_kind("machine-0", TagKind::Unit).is_err());
        assert!(Tag::parse_kind("unit-wordpress-0", TagKind::Unit).is_ok());
    }

    #[test]
    fn unit_tag_embeds_slash_as_dash() {
        let tag = Tag::unit("wordpress/0");
        assert_eq!(tag.to_string(), "unit-wordpress-0");
        assert_eq!(tag.unit_name().unwrap(), "wordpress/0");
    }

    #[test]
    fn unit_name_round_trips_dashed_service_names() {
        let tag = Tag::unit("mysql-db/12");
        assert_eq!(tag.to_string(), "unit-mysql-db-12");
        assert_eq!(tag.unit_name().unwrap(), "mysql-db/12");
    }

    #[test]
    fn unit_name_is_none_for_other_kinds() {
        assert_eq!(Tag::machine("0").unit_name(), None);
    }

    #[test]
    fn environment_tag_display() {
        let tag = Tag::environment("3fe11c6c");
        assert_eq!(tag.to_string(), "environment-3fe11c6c");
        let parsed = Tag::parse("environment-3fe11c6c").unwrap();
        assert_eq!(parsed, tag);
    }
}
