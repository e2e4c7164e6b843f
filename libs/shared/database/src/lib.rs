pub mod memory;
pub mod store;
pub mod supabase;
pub mod supabase_store;

pub use memory::InMemoryStore;
pub use store::{SchedulingStore, StoreError};
pub use supabase::SupabaseClient;
pub use supabase_store::SupabaseStore;
