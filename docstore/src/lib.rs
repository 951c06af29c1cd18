pub mod client;
pub mod config;
pub mod memory;
pub mod rest;

pub use client::{CollectionRef, Document, DocumentRef, DocumentStore, Store, StoreError, connect};
pub use memory::MemoryStore;
