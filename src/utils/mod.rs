pub mod cache;
pub mod format;

pub use cache::Cache;
pub use format::{
    format_address, is_token_bonded, is_valid_url, prettify_number, token_links,
    total_transactions, TokenLinks,
};
