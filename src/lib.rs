pub mod agents;
pub mod app;
pub mod drag;
pub mod events;
pub mod generation;
pub mod project;
pub mod reach;
pub mod store;
pub mod tree;
