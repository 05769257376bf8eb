pub mod supabase;

pub use supabase::{StoreError, SupabaseStore};
