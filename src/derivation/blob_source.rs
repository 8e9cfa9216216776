use std::{collections::VecDeque, sync::Arc};

use alloy::{
    consensus::{Transaction, TxEnvelope, transaction::SignerRecoverable},
    primitives::{Address, B256},
};
use anyhow::anyhow;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{
    error::{DerivationError, FetchError},
    types::{BlockRef, IndexedDataHash},
};
use crate::blob::{Blob, BlobDecoder, Data};

/// Returns a block's info and transactions given its hash.
#[async_trait]
pub trait BlockFetcher: Send + Sync {
    async fn info_and_txs_by_hash(
        &self,
        block_hash: B256,
    ) -> Result<(BlockRef, Vec<TxEnvelope>), FetchError>;
}

/// Resolves data hashes within a block to the blobs they commit to, in the
/// exact order of the supplied hashes.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn blobs_by_ref_and_indexed_data_hashes(
        &self,
        block_ref: &BlockRef,
        data_hashes: &[IndexedDataHash],
    ) -> Result<Vec<Blob>, FetchError>;
}

#[derive(Debug, Clone, Copy)]
pub struct DataSourceConfig {
    pub batch_inbox_address: Address,
    pub batcher_address: Address,
}

/// Lazy, single-consumer source of decoded blob payloads for one parent
/// chain block.
///
/// The block is fetched on the first pull and its batcher blob hashes are
/// collected; the blobs themselves are fetched once, on the first pull that
/// needs them. Both steps are idempotent on retry.
pub struct BlobDataSource<F, B> {
    open: bool,
    data_hashes: Vec<IndexedDataHash>,
    blobs: Option<VecDeque<Blob>>,
    block_ref: BlockRef,
    cfg: DataSourceConfig,
    fetcher: Arc<F>,
    blobs_fetcher: Arc<B>,
    cancel_token: CancellationToken,
}

impl<F: BlockFetcher, B: BlobFetcher> BlobDataSource<F, B> {
    pub fn new(
        cfg: DataSourceConfig,
        fetcher: Arc<F>,
        blobs_fetcher: Arc<B>,
        block_ref: BlockRef,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            open: false,
            data_hashes: Vec::new(),
            blobs: None,
            block_ref,
            cfg,
            fetcher,
            blobs_fetcher,
            cancel_token,
        }
    }

    /// Returns the next decoded payload, or `None` once every blob in the
    /// block has been consumed.
    ///
    /// A missing block or missing blob yields [`DerivationError::Reset`]; any
    /// other fetch failure, or a cancelled pull, yields
    /// [`DerivationError::Temporary`]. A blob that fails to decode is skipped
    /// with a warning rather than failing the stream.
    pub async fn next(&mut self) -> Result<Option<Data>, DerivationError> {
        if !self.open {
            let txs = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    return Err(DerivationError::Temporary(anyhow!(
                        "blob data source cancelled"
                    )));
                }
                result = self.fetcher.info_and_txs_by_hash(self.block_ref.hash) => match result {
                    Ok((_, txs)) => txs,
                    Err(FetchError::NotFound) => {
                        return Err(DerivationError::Reset(anyhow!(
                            "failed to open blob data source: block {} not found",
                            self.block_ref
                        )));
                    }
                    Err(FetchError::Other(err)) => {
                        return Err(DerivationError::Temporary(
                            err.context("failed to open blob data source"),
                        ));
                    }
                },
            };
            self.open = true;
            self.data_hashes = blob_hashes_from_transactions(&self.cfg, &txs);
        }

        if self.data_hashes.is_empty() {
            return Ok(None);
        }

        if self.blobs.is_none() {
            let blobs = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    return Err(DerivationError::Temporary(anyhow!(
                        "blob data source cancelled"
                    )));
                }
                result = self
                    .blobs_fetcher
                    .blobs_by_ref_and_indexed_data_hashes(&self.block_ref, &self.data_hashes) =>
                {
                    match result {
                        Ok(blobs) => blobs,
                        Err(FetchError::NotFound) => {
                            // the block itself was seen, so its blobs must exist too
                            return Err(DerivationError::Reset(anyhow!(
                                "failed to find blobs for {}",
                                self.block_ref
                            )));
                        }
                        Err(FetchError::Other(err)) => {
                            return Err(DerivationError::Temporary(
                                err.context("failed to fetch blobs"),
                            ));
                        }
                    }
                }
            };
            self.blobs = Some(blobs.into());
        }

        if let Some(blobs) = self.blobs.as_mut() {
            while let Some(blob) = blobs.pop_front() {
                match BlobDecoder::decode(&blob) {
                    Ok(data) => return Ok(Some(data)),
                    Err(err) => {
                        warn!(origin = %self.block_ref, %err, "ignoring blob due to parse failure");
                    }
                }
            }
        }
        Ok(None)
    }
}

/// Collects, in transaction and then blob-index order, the data hashes of
/// every blob posted to the batch inbox by the batcher. Blobs of other
/// transactions still advance the index so indices stay correct within the
/// block.
pub fn blob_hashes_from_transactions(
    cfg: &DataSourceConfig,
    txs: &[TxEnvelope],
) -> Vec<IndexedDataHash> {
    let mut data_hashes = Vec::new();
    let mut blob_index = 0u64;
    for tx in txs {
        let blob_hashes = tx.blob_versioned_hashes().unwrap_or_default();
        if tx.to() != Some(cfg.batch_inbox_address) || !is_valid_batch_tx(tx, cfg.batcher_address) {
            blob_index += blob_hashes.len() as u64;
            continue;
        }
        if !tx.input().is_empty() {
            // calldata is reserved for the fallback data source
            warn!("blob tx has calldata, which will be ignored");
        }
        for hash in blob_hashes {
            data_hashes.push(IndexedDataHash {
                index: blob_index,
                data_hash: *hash,
            });
            blob_index += 1;
        }
    }
    data_hashes
}

fn is_valid_batch_tx(tx: &TxEnvelope, batcher_address: Address) -> bool {
    match tx.recover_signer() {
        Ok(sender) => sender == batcher_address,
        Err(err) => {
            warn!(%err, "tx in inbox with invalid signature");
            false
        }
    }
}
