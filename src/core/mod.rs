pub mod error;
pub mod types;
pub mod value;

pub use error::{ReconcileError, Result};
pub use types::{Entity, EntityId, FieldKey};
pub use value::Value;
