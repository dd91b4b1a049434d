//! Runtime entity descriptors.
//!
//! Every domain shape exposes one static [`EntityModel`](entity::EntityModel),
//! generated once by `#[derive(Entity)]`. The model answers the two questions
//! storage and query translation ask about a shape: which storage fields it
//! declares (and their primitive kinds), and whether it supports soft
//! deletion.
//!
//! Models are pure data; nothing here performs I/O.

pub mod entity;
pub mod field;

#[cfg(test)]
mod tests;
