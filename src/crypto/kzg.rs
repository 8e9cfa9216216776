// KZG helper functions
use alloy::primitives::B256;
use anyhow::Error;
use c_kzg::{Bytes48, KzgCommitment, KzgProof, KzgSettings};
use sha2::{Digest, Sha256};

use crate::blob::Blob;

/// Version tag of a blob-tx versioned hash.
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// Hands the raw blob bytes to the KZG library as its own blob type.
fn kzg_blob(blob: &Blob) -> Result<c_kzg::Blob, Error> {
    Ok(c_kzg::Blob::from_bytes(blob.as_slice())?)
}

pub fn blob_to_kzg_commitment(
    blob: &Blob,
    kzg_settings: &KzgSettings,
) -> Result<KzgCommitment, Error> {
    Ok(kzg_settings.blob_to_kzg_commitment(&kzg_blob(blob)?)?)
}

pub fn compute_blob_kzg_proof(
    blob: &Blob,
    commitment: &KzgCommitment,
    kzg_settings: &KzgSettings,
) -> Result<KzgProof, Error> {
    let commitment = Bytes48::from_bytes(commitment.as_ref())?;

    Ok(kzg_settings.compute_blob_kzg_proof(&kzg_blob(blob)?, &commitment)?)
}

pub fn verify_blob_kzg_proof(
    blob: &Blob,
    commitment: &KzgCommitment,
    proof: &KzgProof,
    kzg_settings: &KzgSettings,
) -> Result<bool, Error> {
    let commitment = Bytes48::from_bytes(commitment.as_ref())?;
    let proof = Bytes48::from_bytes(proof.as_ref())?;

    Ok(kzg_settings.verify_blob_kzg_proof(&kzg_blob(blob)?, &commitment, &proof)?)
}

/// The versioned hash a blob tx references for a commitment: the sha256 of
/// the commitment with the first byte replaced by the version tag.
pub fn kzg_to_versioned_hash(commitment: &KzgCommitment) -> B256 {
    let mut hash: [u8; 32] = Sha256::digest(commitment.as_ref()).into();
    hash[0] = VERSIONED_HASH_VERSION_KZG;
    B256::from(hash)
}
