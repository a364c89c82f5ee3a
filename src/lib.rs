pub mod as_graph;
pub mod as_graph_generators;
pub mod io;
pub mod shared;
pub mod simulation_engine;

// Commonly used types, re-exported at the crate root.
pub use as_graph::{ASGraph, ASN, AS};
pub use shared::{Relationships, SimulatorError};
pub use simulation_engine::{Announcement, Policy, Prefix};
