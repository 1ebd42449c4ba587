//! Object store provider implementations.

pub mod local;
pub mod supabase;

pub use local::LocalObjectStore;
pub use supabase::SupabaseObjectStore;
