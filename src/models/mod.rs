pub mod pool;
pub mod token;

pub use pool::{Audit, BaseAsset, FirstPool, Pool, PoolResponse, SocialLinks, TokenStats24h};
pub use token::{
    map_pool_to_token, Category, FairlyToken, FeedSnapshot, FeedUpdate, InitialPools, MyToken,
    TokenWithPool, UpdateKind,
};
