pub mod memory;

pub use memory::InMemoryEntityStore;
