//! pf-components: component contributors of the pipeflow solver.
//!
//! Every element table of a [`pf_net::Net`] is backed by one [`Component`]
//! that knows how to
//! - allot and fill its rows of the node/branch pits
//! - override its Jacobian rows after the generic derivative pass
//! - turn the solved pits into a [`ResultTable`]
//!
//! [`ComponentRegistry::standard`] returns all components in the order the
//! pits are laid out: node tables first, then branch tables, then node elements.

pub mod circulation_pump;
pub mod common;
pub mod context;
pub mod error;
pub mod ext_grid;
pub mod flow_control;
pub mod heat_exchanger;
pub mod junction;
pub mod pipe;
pub mod pressure_control;
pub mod pump;
pub mod registry;
pub mod results;
pub mod sink_source;
pub mod traits;
pub mod valve;

// Re-exports
pub use context::{BuildContext, ComponentSettings, ResultContext};
pub use error::{ComponentError, ComponentResult};
pub use registry::ComponentRegistry;
pub use results::ResultTable;
pub use traits::{Component, ComponentKind, DType};
