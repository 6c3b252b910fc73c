pub mod pagerank;
pub mod signals;
pub mod view;
