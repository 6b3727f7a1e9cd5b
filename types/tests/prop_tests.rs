use proptest::prelude::*;

use weave_types::{Account, BlockHash};

proptest! {
    /// BlockHash roundtrip: new -> as_bytes -> new produces identical hash.
    #[test]
    fn block_hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Account ordering matches the lexicographic order of its key bytes,
    /// which is the order the store iterates accounts in.
    #[test]
    fn account_ordering_is_byte_order(a in prop::array::uniform32(0u8..), b in prop::array::uniform32(0u8..)) {
        let aa = Account::new(a);
        let ab = Account::new(b);
        prop_assert_eq!(aa.cmp(&ab), a.cmp(&b));
    }

    /// Account from_slice accepts exactly 32 bytes.
    #[test]
    fn account_from_slice_length(len in 0usize..64) {
        let bytes = vec![0xAB; len];
        prop_assert_eq!(Account::from_slice(&bytes).is_some(), len == 32);
    }

    /// BlockHash bincode serialization roundtrip (stored record format).
    #[test]
    fn block_hash_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        let encoded = bincode::serialize(&hash).unwrap();
        let decoded: BlockHash = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded.as_bytes(), hash.as_bytes());
    }
}
