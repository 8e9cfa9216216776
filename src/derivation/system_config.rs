use alloy::{
    primitives::{Address, B256, U256},
    rpc::types::{Log, TransactionReceipt},
    sol,
    sol_types::SolEvent,
};
use anyhow::anyhow;

use super::error::DerivationError;

sol! {
    /// Emitted by the parent-chain system-config contract on every
    /// parameter change.
    event ConfigUpdate(uint256 indexed version, uint8 indexed updateType, bytes data);
}

/// Topic-0 of the config-update event, for log filters.
pub const CONFIG_UPDATE_TOPIC: B256 = ConfigUpdate::SIGNATURE_HASH;

const UPDATE_TYPE_BATCHER: u8 = 0;
const UPDATE_TYPE_GAS_CONFIG: u8 = 1;
const UPDATE_TYPE_GAS_LIMIT: u8 = 2;
const UPDATE_TYPE_UNSAFE_BLOCK_SIGNER: u8 = 3;

/// Rollup system configuration as derived from parent-chain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemConfig {
    pub batcher_addr: Address,
    pub batcher_hash_version: u8,
    pub blobs_allowed: bool,
    pub overhead: B256,
    pub scalar: B256,
    pub gas_limit: u64,
}

/// Applies every config update found in the given receipts.
///
/// Failed receipts are skipped. A malformed log does not stop later updates
/// from applying; all failures are returned combined as a critical error.
pub fn update_system_config_from_receipts(
    sys_cfg: &mut SystemConfig,
    receipts: &[TransactionReceipt],
    system_config_address: Address,
) -> Result<(), DerivationError> {
    let mut failures = Vec::new();
    for (i, receipt) in receipts.iter().enumerate() {
        if !receipt.status() {
            continue;
        }
        for (j, log) in receipt.inner.logs().iter().enumerate() {
            if log.inner.address != system_config_address
                || log.inner.data.topics().first() != Some(&CONFIG_UPDATE_TOPIC)
            {
                continue;
            }
            if let Err(err) = process_config_update_log(sys_cfg, log) {
                failures.push(format!(
                    "malformed system config log in receipt {i}, log {j}: {err}"
                ));
            }
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(DerivationError::Critical(anyhow!(failures.join("; "))))
    }
}

/// Decodes one config-update event and applies it to `sys_cfg`.
pub fn process_config_update_log(
    sys_cfg: &mut SystemConfig,
    log: &Log,
) -> Result<(), DerivationError> {
    let event = ConfigUpdate::decode_log(&log.inner)
        .map_err(|err| DerivationError::Critical(anyhow!("invalid config update event: {err}")))?
        .data;

    if event.version != U256::ZERO {
        return Err(DerivationError::Critical(anyhow!(
            "unrecognized config update event version: {}",
            event.version
        )));
    }

    let payload = event.data.as_ref();
    match event.updateType {
        UPDATE_TYPE_BATCHER => {
            if payload.len() != 32 {
                return Err(DerivationError::Critical(anyhow!(
                    "invalid versioned batcher hash length: {}",
                    payload.len()
                )));
            }
            let word = B256::from_slice(payload);
            let (version, addr, blobs_allowed) = read_versioned_batcher_hash(&word)?;
            sys_cfg.batcher_hash_version = version;
            sys_cfg.batcher_addr = addr;
            sys_cfg.blobs_allowed = blobs_allowed;
            Ok(())
        }
        UPDATE_TYPE_GAS_CONFIG => {
            if payload.len() != 64 {
                return Err(DerivationError::Critical(anyhow!(
                    "invalid gas config length: {}",
                    payload.len()
                )));
            }
            sys_cfg.overhead = B256::from_slice(&payload[..32]);
            sys_cfg.scalar = B256::from_slice(&payload[32..]);
            Ok(())
        }
        UPDATE_TYPE_GAS_LIMIT => {
            if payload.len() != 32 {
                return Err(DerivationError::Critical(anyhow!(
                    "invalid gas limit length: {}",
                    payload.len()
                )));
            }
            if payload[..24].iter().any(|b| *b != 0) {
                return Err(DerivationError::Critical(anyhow!("gas limit out of range")));
            }
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&payload[24..]);
            sys_cfg.gas_limit = u64::from_be_bytes(raw);
            Ok(())
        }
        // applies to runtime configuration outside of derivation
        UPDATE_TYPE_UNSAFE_BLOCK_SIGNER => Ok(()),
        other => Err(DerivationError::Critical(anyhow!(
            "unrecognized config update type: {other}"
        ))),
    }
}

/// Versioned batcher hash layout: 12 bytes of padding, then the 20-byte
/// address. Padding byte 0 is the version. For version 1, byte 1 selects
/// whether batch transactions may carry blobs and bytes [2..12] must be
/// zero; version 0 has all padding zero.
fn read_versioned_batcher_hash(word: &B256) -> Result<(u8, Address, bool), DerivationError> {
    let padding = &word[..12];
    let addr = Address::from_slice(&word[12..]);
    if padding.iter().all(|b| *b == 0) {
        return Ok((0, addr, false));
    }
    if padding[0] != 0x01 {
        return Err(DerivationError::Critical(anyhow!(
            "unknown batcher hash version: {}",
            padding[0]
        )));
    }
    let blobs_allowed = match padding[1] {
        0 => false,
        1 => true,
        other => {
            return Err(DerivationError::Critical(anyhow!(
                "unknown blobs-allowed flag in v1 batcher hash: {other}"
            )));
        }
    };
    if padding[2..].iter().any(|b| *b != 0) {
        return Err(DerivationError::Critical(anyhow!(
            "v1 batcher hash padding not empty"
        )));
    }
    Ok((1, addr, blobs_allowed))
}

#[cfg(test)]
mod tests {
    use alloy::{
        consensus::{Receipt, ReceiptEnvelope, ReceiptWithBloom},
        primitives::Bytes,
    };

    use super::*;

    const SYSTEM_CONFIG_ADDR: Address = Address::repeat_byte(0x53);

    fn config_log(version: U256, update_type: u8, payload: &[u8]) -> Log {
        let event = ConfigUpdate {
            version,
            updateType: update_type,
            data: Bytes::copy_from_slice(payload),
        };
        Log {
            inner: alloy::primitives::Log {
                address: SYSTEM_CONFIG_ADDR,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    fn batcher_word(padding: [u8; 12], addr: Address) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[..12].copy_from_slice(&padding);
        word[12..].copy_from_slice(addr.as_slice());
        word
    }

    #[test]
    fn applies_v0_batcher_update() {
        let mut sys_cfg = SystemConfig::default();
        let addr = Address::repeat_byte(0xB0);
        let log = config_log(
            U256::ZERO,
            UPDATE_TYPE_BATCHER,
            &batcher_word([0u8; 12], addr),
        );

        process_config_update_log(&mut sys_cfg, &log).unwrap();
        assert_eq!(sys_cfg.batcher_addr, addr);
        assert_eq!(sys_cfg.batcher_hash_version, 0);
        assert!(!sys_cfg.blobs_allowed);
    }

    #[test]
    fn applies_v1_batcher_update_with_blobs() {
        let mut sys_cfg = SystemConfig::default();
        let addr = Address::repeat_byte(0xB1);
        let mut padding = [0u8; 12];
        padding[0] = 0x01;
        padding[1] = 0x01;
        let log = config_log(U256::ZERO, UPDATE_TYPE_BATCHER, &batcher_word(padding, addr));

        process_config_update_log(&mut sys_cfg, &log).unwrap();
        assert_eq!(sys_cfg.batcher_addr, addr);
        assert_eq!(sys_cfg.batcher_hash_version, 1);
        assert!(sys_cfg.blobs_allowed);

        // byte 1 = 0 turns blobs back off
        padding[1] = 0x00;
        let log = config_log(U256::ZERO, UPDATE_TYPE_BATCHER, &batcher_word(padding, addr));
        process_config_update_log(&mut sys_cfg, &log).unwrap();
        assert!(!sys_cfg.blobs_allowed);
    }

    #[test]
    fn rejects_malformed_batcher_hashes() {
        let mut sys_cfg = SystemConfig::default();
        let addr = Address::repeat_byte(0xB2);

        // unknown version byte
        let mut padding = [0u8; 12];
        padding[0] = 0x02;
        let log = config_log(U256::ZERO, UPDATE_TYPE_BATCHER, &batcher_word(padding, addr));
        assert!(matches!(
            process_config_update_log(&mut sys_cfg, &log),
            Err(DerivationError::Critical(_))
        ));

        // bad blobs flag
        let mut padding = [0u8; 12];
        padding[0] = 0x01;
        padding[1] = 0x02;
        let log = config_log(U256::ZERO, UPDATE_TYPE_BATCHER, &batcher_word(padding, addr));
        assert!(matches!(
            process_config_update_log(&mut sys_cfg, &log),
            Err(DerivationError::Critical(_))
        ));

        // dirty padding tail
        let mut padding = [0u8; 12];
        padding[0] = 0x01;
        padding[11] = 0x01;
        let log = config_log(U256::ZERO, UPDATE_TYPE_BATCHER, &batcher_word(padding, addr));
        assert!(matches!(
            process_config_update_log(&mut sys_cfg, &log),
            Err(DerivationError::Critical(_))
        ));

        // wrong payload length
        let log = config_log(U256::ZERO, UPDATE_TYPE_BATCHER, &[0u8; 31]);
        assert!(matches!(
            process_config_update_log(&mut sys_cfg, &log),
            Err(DerivationError::Critical(_))
        ));

        assert_eq!(sys_cfg, SystemConfig::default());
    }

    #[test]
    fn applies_gas_config_update() {
        let mut sys_cfg = SystemConfig::default();
        let mut payload = [0u8; 64];
        payload[..32].copy_from_slice(B256::repeat_byte(0x0A).as_slice());
        payload[32..].copy_from_slice(B256::repeat_byte(0x0B).as_slice());
        let log = config_log(U256::ZERO, UPDATE_TYPE_GAS_CONFIG, &payload);

        process_config_update_log(&mut sys_cfg, &log).unwrap();
        assert_eq!(sys_cfg.overhead, B256::repeat_byte(0x0A));
        assert_eq!(sys_cfg.scalar, B256::repeat_byte(0x0B));
    }

    #[test]
    fn applies_gas_limit_update() {
        let mut sys_cfg = SystemConfig::default();
        let mut payload = [0u8; 32];
        payload[24..].copy_from_slice(&30_000_000u64.to_be_bytes());
        let log = config_log(U256::ZERO, UPDATE_TYPE_GAS_LIMIT, &payload);

        process_config_update_log(&mut sys_cfg, &log).unwrap();
        assert_eq!(sys_cfg.gas_limit, 30_000_000);

        // a value wider than 64 bits is rejected
        let mut payload = [0u8; 32];
        payload[0] = 0x01;
        let log = config_log(U256::ZERO, UPDATE_TYPE_GAS_LIMIT, &payload);
        assert!(matches!(
            process_config_update_log(&mut sys_cfg, &log),
            Err(DerivationError::Critical(_))
        ));
    }

    #[test]
    fn ignores_unsafe_block_signer_updates() {
        let mut sys_cfg = SystemConfig::default();
        let log = config_log(U256::ZERO, UPDATE_TYPE_UNSAFE_BLOCK_SIGNER, &[0u8; 32]);

        process_config_update_log(&mut sys_cfg, &log).unwrap();
        assert_eq!(sys_cfg, SystemConfig::default());
    }

    #[test]
    fn rejects_unknown_versions_and_types() {
        let mut sys_cfg = SystemConfig::default();

        let log = config_log(U256::from(1), UPDATE_TYPE_GAS_LIMIT, &[0u8; 32]);
        assert!(matches!(
            process_config_update_log(&mut sys_cfg, &log),
            Err(DerivationError::Critical(_))
        ));

        let log = config_log(U256::ZERO, 9, &[0u8; 32]);
        assert!(matches!(
            process_config_update_log(&mut sys_cfg, &log),
            Err(DerivationError::Critical(_))
        ));
    }

    fn receipt_with_logs(success: bool, logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            inner: ReceiptEnvelope::Eip1559(ReceiptWithBloom {
                receipt: Receipt {
                    status: success.into(),
                    cumulative_gas_used: 0,
                    logs,
                },
                logs_bloom: Default::default(),
            }),
            transaction_hash: B256::ZERO,
            transaction_index: None,
            block_hash: None,
            block_number: None,
            gas_used: 0,
            effective_gas_price: 0,
            blob_gas_used: None,
            blob_gas_price: None,
            from: Address::ZERO,
            to: None,
            contract_address: None,
        }
    }

    #[test]
    fn receipts_filter_applies_matching_logs_only() {
        let mut sys_cfg = SystemConfig::default();
        let addr = Address::repeat_byte(0xB3);

        let mut gas_limit_payload = [0u8; 32];
        gas_limit_payload[24..].copy_from_slice(&25_000_000u64.to_be_bytes());

        // a log from another contract must be ignored
        let mut foreign = config_log(U256::ZERO, UPDATE_TYPE_GAS_LIMIT, &[0xFFu8; 32]);
        foreign.inner.address = Address::repeat_byte(0x99);

        // a log inside a failed receipt must be ignored
        let failed = receipt_with_logs(
            false,
            vec![config_log(U256::ZERO, UPDATE_TYPE_GAS_LIMIT, &[0xFFu8; 32])],
        );
        let applied = receipt_with_logs(
            true,
            vec![
                foreign,
                config_log(
                    U256::ZERO,
                    UPDATE_TYPE_BATCHER,
                    &batcher_word([0u8; 12], addr),
                ),
                config_log(U256::ZERO, UPDATE_TYPE_GAS_LIMIT, &gas_limit_payload),
            ],
        );

        update_system_config_from_receipts(
            &mut sys_cfg,
            &[failed, applied],
            SYSTEM_CONFIG_ADDR,
        )
        .unwrap();
        assert_eq!(sys_cfg.batcher_addr, addr);
        assert_eq!(sys_cfg.gas_limit, 25_000_000);
    }

    #[test]
    fn receipts_filter_reports_malformed_logs_but_keeps_applying() {
        let mut sys_cfg = SystemConfig::default();
        let addr = Address::repeat_byte(0xB4);

        let receipt = receipt_with_logs(
            true,
            vec![
                // truncated batcher payload
                config_log(U256::ZERO, UPDATE_TYPE_BATCHER, &[0u8; 16]),
                config_log(
                    U256::ZERO,
                    UPDATE_TYPE_BATCHER,
                    &batcher_word([0u8; 12], addr),
                ),
            ],
        );

        let result =
            update_system_config_from_receipts(&mut sys_cfg, &[receipt], SYSTEM_CONFIG_ADDR);
        assert!(matches!(result, Err(DerivationError::Critical(_))));
        // the well-formed update still applied
        assert_eq!(sys_cfg.batcher_addr, addr);
    }
}
