//! Clients for the HTTP services the launchpad depends on: the pool
//! aggregator and the IPFS pinning service.

pub mod jupiter;
pub mod pinata;

pub use jupiter::{JupiterClient, PoolSource};
pub use pinata::{MetadataUploader, PinataClient, TokenMetadata, UploadRequest, UploadResponse};
