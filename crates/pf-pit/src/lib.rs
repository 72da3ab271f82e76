//! pf-pit: internal tables of the pipeflow solver.
//!
//! Provides:
//! - `Pit`: one dense `f64` table per kind (nodes, branches) with a fixed
//!   column layout (`columns::node`, `columns::branch`)
//! - lookups: table name/id registry, row ranges and element index maps
//! - connectivity analysis per mode (graph reachability from slack nodes)
//! - table reduction to the active rows and scatter back to the full tables
//!
//! # Example
//!
//! ```
//! use pf_pit::{Pit, columns::node};
//!
//! let mut pit = Pit::nan(3, node::COUNT);
//! pit.set(1, node::PINIT, 5.0);
//! assert_eq!(pit.get(1, node::PINIT), 5.0);
//! assert!(pit.get(0, node::PINIT).is_nan());
//! ```

pub mod columns;
pub mod connectivity;
pub mod error;
pub mod lookup;
pub mod pit;
pub mod reduce;
pub mod types;

// Re-exports for ergonomics
pub use connectivity::{Connectivity, ConnectivityOptions, heat_connectivity, hydraulic_connectivity};
pub use error::{PitError, PitResult};
pub use lookup::{ActiveLookups, FromTo, IndexLookup, Lookups, TableLookup, TableRegistry};
pub use pit::{Pit, PitSliceMut};
pub use reduce::{ReducedView, reduce_pit, scatter_back};
pub use types::{BranchType, Mode, NodeType, NodeTypeT};
