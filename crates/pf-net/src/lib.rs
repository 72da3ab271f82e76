//! pf-net: input tables of a pipe network.
//!
//! Provides:
//! - `Table<T>`: ordered rows with explicit (possibly sparse) element indices
//! - one plain element type per component (junction, pipe, valve, ...)
//! - `Net`: the collection of all tables plus reference validation
//!
//! # Example
//!
//! ```
//! use pf_core::units::{bar, k, kgps, km, m};
//! use pf_net::{ExtGrid, ExtGridType, Junction, Net, Pipe, Sink};
//!
//! let mut net = Net::new("two junctions");
//! let j0 = net.junction.push(Junction::new(bar(5.0), k(360.0)));
//! let j1 = net.junction.push(Junction::new(bar(5.0), k(360.0)));
//! net.pipe.push(Pipe::new(j0, j1, km(0.1), m(0.05)));
//! net.ext_grid.push(ExtGrid::new(j0, bar(5.0), k(360.0), ExtGridType::Pt));
//! net.sink.push(Sink::new(j1, kgps(1.0)));
//! net.validate().unwrap();
//! ```

pub mod elements;
pub mod error;
pub mod net;
pub mod table;

// Re-exports for ergonomics
pub use elements::*;
pub use error::{NetError, NetResult};
pub use net::Net;
pub use table::Table;
