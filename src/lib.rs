// Blob codec and derivation-facing adapters for the rollup DA layer
pub mod blob;
pub mod crypto;
pub mod derivation;
