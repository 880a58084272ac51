//! Synapse-flow based polarity analysis.
//!
//! * [flow] - per-node synapse counts and flow centrality
//! * [segregation] - segregation index of a partition into fragments
//! * [split] - labelling nodes as axon, dendrite, linker or cell body fiber,
//!   and splitting a skeleton into those compartments
//!
//! All analyses need a single tree whose connectors are all pre- or
//! postsynapses.

pub mod flow;
pub mod segregation;
pub mod split;

pub use flow::{FlowMode, SynapseCounts};
pub use segregation::segregation_index;
pub use split::{CompartmentSplit, SplitMethod, SplitOptions};
