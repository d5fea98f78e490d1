pub mod engine;
pub mod node;
pub mod routing_table;

pub use engine::*;
pub use node::*;
pub use routing_table::*;
