//! Column-oriented node and connector tables as handed over by an I/O layer.
//!
//! The engine does not parse files. It receives pre-parsed tables, resolves
//! column aliases (e.g. `treenode_id` → `node_id`), coerces id columns to
//! integers and raises [SkeletonError::Schema] on anything it cannot use.

use crate::error::{Result, SkeletonError};
use crate::model::connector::{Connector, ConnectorKind};
use crate::model::node::{Node, NodeId};

/// Accepted names for the node id column, in lookup order.
const NODE_ID_ALIASES: &[&str] = &["node_id", "treenode_id", "PointNo", "id"];
/// Accepted names for the parent id column, in lookup order.
const PARENT_ID_ALIASES: &[&str] = &["parent_id", "parent", "parent_treenode_id", "Parent"];
/// Accepted names for the radius column, in lookup order.
const RADIUS_ALIASES: &[&str] = &["radius", "r", "Radius"];
/// Accepted names for the connector id column, in lookup order.
const CONNECTOR_ID_ALIASES: &[&str] = &["connector_id", "id"];
/// Accepted names for the connector type column, in lookup order.
const CONNECTOR_TYPE_ALIASES: &[&str] = &["type", "relation", "label", "prepost"];

// =#========================================================================#=
// COLUMN
// =#========================================================================#=
/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Integer values
    Int(Vec<i64>),
    /// Floating point values
    Float(Vec<f64>),
    /// String values
    Text(Vec<String>),
}

impl Column {
    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coerces this column to integers.
    ///
    /// Floats must be finite, integral and within the `i64` range, strings
    /// must parse as integers.
    fn to_ids(&self, name: &str) -> Result<Vec<i64>> {
        match self {
            Column::Int(v) => Ok(v.clone()),
            Column::Float(v) => v
                .iter()
                .map(|f| {
                    // i64::MAX as f64 rounds up to 2^63, which is out of range
                    let in_range = *f >= i64::MIN as f64 && *f < i64::MAX as f64;
                    if f.is_finite() && f.fract() == 0.0 && in_range {
                        Ok(*f as i64)
                    } else {
                        Err(SkeletonError::Schema(format!(
                            "column \"{name}\" holds value {f} which is not an integer id"
                        )))
                    }
                })
                .collect(),
            Column::Text(v) => v
                .iter()
                .map(|s| {
                    s.trim().parse::<i64>().map_err(|_| {
                        SkeletonError::Schema(format!(
                            "column \"{name}\" holds non-integer value \"{s}\""
                        ))
                    })
                })
                .collect(),
        }
    }

    /// Coerces this column to floats.
    fn to_floats(&self, name: &str) -> Result<Vec<f64>> {
        match self {
            Column::Int(v) => Ok(v.iter().map(|i| *i as f64).collect()),
            Column::Float(v) => Ok(v.clone()),
            Column::Text(v) => v
                .iter()
                .map(|s| {
                    s.trim().parse::<f64>().map_err(|_| {
                        SkeletonError::Schema(format!(
                            "column \"{name}\" holds non-numeric value \"{s}\""
                        ))
                    })
                })
                .collect(),
        }
    }

    /// Coerces this column to strings.
    fn to_labels(&self) -> Vec<String> {
        match self {
            Column::Int(v) => v.iter().map(|i| i.to_string()).collect(),
            Column::Float(v) => v.iter().map(|f| f.to_string()).collect(),
            Column::Text(v) => v.clone(),
        }
    }
}

// =#========================================================================#=
// TABLE
// =#========================================================================#=
/// Ordered set of named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
}

/// Node table: requires `node_id`, `parent_id`, `x`, `y`, `z`;
/// `radius` is optional.
pub type NodeTable = Table;

/// Connector table: requires `connector_id`, `node_id`, `x`, `y`, `z`, `type`.
pub type ConnectorTable = Table;

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Table::default()
    }

    /// Adds (or replaces) a column, builder style.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.insert(name, column);
        self
    }

    /// Adds (or replaces) a column.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name, column)),
        }
    }

    /// Returns the column with exactly this name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Returns the column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Returns the number of rows (0 for a table without columns).
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    /// Returns the first column matching any alias, with its actual name.
    fn resolve(&self, aliases: &[&str]) -> Option<(&str, &Column)> {
        aliases.iter().find_map(|alias| {
            self.columns
                .iter()
                .find(|(n, _)| n == alias)
                .map(|(n, c)| (n.as_str(), c))
        })
    }

    fn require(&self, aliases: &[&str]) -> Result<(&str, &Column)> {
        self.resolve(aliases)
            .ok_or_else(|| SkeletonError::missing_column(aliases[0]))
    }

    fn check_lengths(&self) -> Result<()> {
        let rows = self.num_rows();
        for (name, column) in &self.columns {
            if column.len() != rows {
                return Err(SkeletonError::Schema(format!(
                    "column \"{name}\" has {} rows, expected {rows}",
                    column.len()
                )));
            }
        }
        Ok(())
    }

    /// Converts this table into node records.
    ///
    /// # Errors
    /// [SkeletonError::Schema] if a required column is missing, columns differ
    /// in length, ids are not integers, or node ids are negative.
    pub fn to_nodes(&self) -> Result<Vec<Node>> {
        self.check_lengths()?;
        let (id_name, id_col) = self.require(NODE_ID_ALIASES)?;
        let (parent_name, parent_col) = self.require(PARENT_ID_ALIASES)?;
        let ids = id_col.to_ids(id_name)?;
        let parents = parent_col.to_ids(parent_name)?;
        let [xs, ys, zs] = self.coordinates()?;
        let radii = match self.resolve(RADIUS_ALIASES) {
            Some((name, col)) => col.to_floats(name)?,
            None => vec![-1.0; ids.len()],
        };

        let mut nodes = Vec::with_capacity(ids.len());
        for i in 0..ids.len() {
            if ids[i] < 0 {
                return Err(SkeletonError::Schema(format!(
                    "node ids must be non-negative, got {}",
                    ids[i]
                )));
            }
            let parent = (parents[i] >= 0).then_some(parents[i]);
            nodes.push(Node::new(ids[i], parent, [xs[i], ys[i], zs[i]], Some(radii[i])));
        }
        Ok(nodes)
    }

    /// Converts this table into connector records.
    ///
    /// # Errors
    /// [SkeletonError::Schema] if a required column is missing or malformed.
    pub fn to_connectors(&self) -> Result<Vec<Connector>> {
        self.check_lengths()?;
        let (cid_name, cid_col) = self.require(CONNECTOR_ID_ALIASES)?;
        let (nid_name, nid_col) = self.require(NODE_ID_ALIASES)?;
        let (_, kind_col) = self.require(CONNECTOR_TYPE_ALIASES)?;
        let connector_ids = cid_col.to_ids(cid_name)?;
        let node_ids = nid_col.to_ids(nid_name)?;
        let kinds = kind_col.to_labels();
        let [xs, ys, zs] = self.coordinates()?;

        Ok((0..connector_ids.len())
            .map(|i| Connector {
                connector_id: connector_ids[i],
                node_id: node_ids[i],
                position: [xs[i], ys[i], zs[i]],
                kind: ConnectorKind::parse(&kinds[i]),
            })
            .collect())
    }

    fn coordinates(&self) -> Result<[Vec<f64>; 3]> {
        let (xn, xc) = self.require(&["x", "X"])?;
        let (yn, yc) = self.require(&["y", "Y"])?;
        let (zn, zc) = self.require(&["z", "Z"])?;
        Ok([xc.to_floats(xn)?, yc.to_floats(yn)?, zc.to_floats(zn)?])
    }

    /// Builds a node table from node records (canonical column names).
    pub fn from_nodes(nodes: &[Node]) -> Self {
        Table::new()
            .with_column("node_id", Column::Int(nodes.iter().map(Node::id).collect()))
            .with_column(
                "parent_id",
                Column::Int(nodes.iter().map(Node::parent_id).collect()),
            )
            .with_column("x", Column::Float(nodes.iter().map(|n| n.position()[0]).collect()))
            .with_column("y", Column::Float(nodes.iter().map(|n| n.position()[1]).collect()))
            .with_column("z", Column::Float(nodes.iter().map(|n| n.position()[2]).collect()))
            .with_column(
                "radius",
                Column::Float(nodes.iter().map(|n| n.radius().unwrap_or(-1.0)).collect()),
            )
            .with_column(
                "type",
                Column::Text(nodes.iter().map(|n| n.node_type().to_string()).collect()),
            )
    }

    /// Builds a connector table from connector records (canonical column names).
    pub fn from_connectors(connectors: &[Connector]) -> Self {
        Table::new()
            .with_column(
                "connector_id",
                Column::Int(connectors.iter().map(|c| c.connector_id).collect()),
            )
            .with_column(
                "node_id",
                Column::Int(connectors.iter().map(|c| c.node_id).collect::<Vec<NodeId>>()),
            )
            .with_column("x", Column::Float(connectors.iter().map(|c| c.position[0]).collect()))
            .with_column("y", Column::Float(connectors.iter().map(|c| c.position[1]).collect()))
            .with_column("z", Column::Float(connectors.iter().map(|c| c.position[2]).collect()))
            .with_column(
                "type",
                Column::Text(connectors.iter().map(|c| c.kind.to_string()).collect()),
            )
    }
}
