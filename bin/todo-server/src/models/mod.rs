//! Domain types shared by the store, handlers and routes.

pub mod object_id;
pub mod payload;
pub mod rules;
pub mod variant;

pub use object_id::ObjectId;
pub use payload::Payload;
pub use variant::Variant;
