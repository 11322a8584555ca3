pub mod connection;
pub mod memory;
pub mod store;
pub mod supabase;

pub use connection::StoreConnection;
pub use memory::InMemoryStore;
pub use store::{
    decode, encode, Collection, DocumentStore, Filter, FilterOp, Query, SortDirection, StoreError,
    CONNECTION_LOST_MESSAGE,
};
pub use supabase::SupabaseStore;
