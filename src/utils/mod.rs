//! Utility modules
//!
//! - `analysis/` - Dependency graph, import ranks and impact analysis

pub mod analysis;

pub use analysis::dependencies;
pub use analysis::graph;
pub use analysis::impact;
pub use analysis::imports;
pub use analysis::rank;
