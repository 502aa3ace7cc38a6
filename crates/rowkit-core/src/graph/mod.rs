//! Relation graph between populated tables and the deletion order derived
//! from it.

pub mod dag;
pub mod topo;

pub use topo::deletion_order;
