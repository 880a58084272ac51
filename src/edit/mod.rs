//! Topology editing operations on a [Skeleton](crate::model::Skeleton).
//!
//! Every operation is implemented as a method on `Skeleton` and follows the
//! same protocol: acquire the [MutationGuard](crate::model::MutationGuard),
//! compute the new node table from the current (valid) state, then hand it
//! to the skeleton's commit, which validates and swaps it in. An operation
//! returning an error leaves the skeleton unchanged.
//!
//! | Module | Operations |
//! |------|---------------|
//! | [reroot] | `reroot`, `reroot_to_tag` |
//! | [cut] | `cut`, `cut_at` |
//! | [subset] | `subset`, `subset_by`, `subset_mask`, `connected_superset` |
//! | [nodes] | `insert_nodes`, `remove_nodes` |
//! | [prune] | `prune_by_strahler`, `prune_twigs`, `prune_by_longest_neurite`, `prune_by_volume` |
//! | [rewire] | `rewire`, `to_undirected`, `merge_duplicate_nodes` |

pub mod cut;
pub mod nodes;
pub mod prune;
pub mod reroot;
pub mod rewire;
pub mod subset;

pub use nodes::InsertPosition;
pub use prune::{StrahlerCut, TwigOptions, VolumeSide};
pub use subset::SubsetOptions;
