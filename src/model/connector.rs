//! Synapse annotations ("connectors") attached to skeleton nodes.

use crate::geometry::Point;
use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a connector.
pub type ConnectorId = i64;

// =#========================================================================#=
// CONNECTOR KIND
// =#========================================================================#=
/// Role of a connector at its node.
///
/// Parsed from the labels `pre`/`0` and `post`/`1`; anything else is kept
/// verbatim as [ConnectorKind::Other].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    /// Presynapse (output)
    Pre,
    /// Postsynapse (input)
    Post,
    /// Any other role (e.g. gap junction)
    Other(String),
}

impl ConnectorKind {
    /// Parses a connector label (case-insensitive, surrounding whitespace ignored).
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "pre" | "0" | "presynapse" => ConnectorKind::Pre,
            "post" | "1" | "postsynapse" => ConnectorKind::Post,
            _ => ConnectorKind::Other(trimmed.to_string()),
        }
    }

    /// Returns `true` for presynapses.
    pub fn is_pre(&self) -> bool {
        matches!(self, ConnectorKind::Pre)
    }

    /// Returns `true` for postsynapses.
    pub fn is_post(&self) -> bool {
        matches!(self, ConnectorKind::Post)
    }
}

impl From<&str> for ConnectorKind {
    fn from(label: &str) -> Self {
        ConnectorKind::parse(label)
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectorKind::Pre => write!(f, "pre"),
            ConnectorKind::Post => write!(f, "post"),
            ConnectorKind::Other(label) => write!(f, "{label}"),
        }
    }
}

// =#========================================================================#=
// CONNECTOR
// =#========================================================================#=
/// A connector record.
///
/// `node_id` must reference an existing node of the owning skeleton; the
/// skeleton prunes (or reattaches) connectors whose node disappears.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    /// Connector id
    pub connector_id: ConnectorId,
    /// Id of the node this connector is attached to
    pub node_id: NodeId,
    /// Position of the connector
    pub position: Point,
    /// Role at the node
    pub kind: ConnectorKind,
}

impl Connector {
    /// Creates a new connector.
    pub fn new(
        connector_id: ConnectorId,
        node_id: NodeId,
        position: Point,
        kind: impl Into<ConnectorKind>,
    ) -> Self {
        Connector {
            connector_id,
            node_id,
            position,
            kind: kind.into(),
        }
    }
}
