//! SPARQL algebra: the operator tree, its builder, executor, and optimizer.
//!
//! Trees are built once from nested list/atom forms and never mutated;
//! `optimize` returns a new, semantically-equivalent tree.

pub mod builder;
pub mod executor;
pub mod node;
pub mod optimizer;

pub use builder::{build_plan, BuildContext};
pub use executor::{ExecContext, QueryResult};
pub use node::{Algebra, DatasetSource, OrderKey};
