//! Story graph entities.

mod adventure;
mod link;
mod node;

pub use adventure::Adventure;
pub use link::Link;
pub use node::{Node, NodeImage};
