pub mod memory;
pub mod postgrest;
pub mod storage;
pub mod store;
pub mod supabase;

pub use memory::InMemoryRecordStore;
pub use postgrest::SupabaseRecordStore;
pub use storage::{storage_key, FileStorage, LocalFileStorage, StorageError};
pub use store::{RecordStore, StoreError};
pub use supabase::SupabaseClient;
