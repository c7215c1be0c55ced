pub mod api_key;
pub mod cache_policy;

pub use api_key::RequireApiKey;
pub use cache_policy::{apply_cache_policy, CachePolicy, CacheStrategy};
