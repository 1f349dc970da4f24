//! Cairo `u256` encoding: a 256-bit integer carried as two 128-bit felts.

use crate::error::{ChainError, ChainResult};
use alloy::primitives::U256;
use starknet::core::types::Felt;

/// Split `value` into `(low, high)` with `value == low + high * 2^128`.
pub fn split(value: U256) -> (u128, u128) {
    let bytes = value.to_be_bytes::<32>();
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&bytes[..16]);
    low.copy_from_slice(&bytes[16..]);

    (u128::from_be_bytes(low), u128::from_be_bytes(high))
}

/// Rebuild a value from its low and high words.
pub fn join(low: u128, high: u128) -> U256 {
    U256::from(low) | (U256::from(high) << 128)
}

/// Encode `value` as the `[low, high]` calldata pair.
pub fn to_felts(value: U256) -> [Felt; 2] {
    let (low, high) = split(value);
    [Felt::from(low), Felt::from(high)]
}

/// Decode a `[low, high]` felt pair. Each word must fit in 128 bits.
pub fn from_felts(low: &Felt, high: &Felt) -> ChainResult<U256> {
    Ok(join(felt_to_u128(low, "low")?, felt_to_u128(high, "high")?))
}

fn felt_to_u128(felt: &Felt, word: &str) -> ChainResult<u128> {
    let bytes = felt.to_bytes_be();
    if bytes[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::UnexpectedResponse(format!(
            "u256 {} word {} exceeds 128 bits",
            word,
            felt.to_hex_string()
        )));
    }

    let mut word_bytes = [0u8; 16];
    word_bytes.copy_from_slice(&bytes[16..]);
    Ok(u128::from_be_bytes(word_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_join() {
        let samples = [
            U256::ZERO,
            U256::from(1u64),
            U256::from(u128::MAX),
            U256::from(u128::MAX) + U256::from(1u64),
            U256::from(1_500_000_000_000_000_000u128),
            (U256::from(7u64) << 200) + U256::from(12345u64),
            U256::MAX,
        ];

        for value in samples {
            let (low, high) = split(value);
            assert_eq!(join(low, high), value);
        }
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split(U256::from(5u64)), (5, 0));
        assert_eq!(split(U256::from(1u64) << 128), (0, 1));
        assert_eq!(split(U256::MAX), (u128::MAX, u128::MAX));
    }

    #[test]
    fn test_felt_encoding() {
        let value = (U256::from(3u64) << 128) + U256::from(9u64);
        let [low, high] = to_felts(value);

        assert_eq!(low, Felt::from(9u64));
        assert_eq!(high, Felt::from(3u64));
        assert_eq!(from_felts(&low, &high).unwrap(), value);
    }

    #[test]
    fn test_rejects_oversized_word() {
        let oversized = Felt::from(u128::MAX) + Felt::ONE;
        let err = from_felts(&oversized, &Felt::ZERO).unwrap_err();

        assert!(matches!(err, ChainError::UnexpectedResponse(_)));
    }
}
