use alloy::{primitives::B256, trie::root::ordered_trie_root_encoded};

/// Root of the ordered Merkle-Patricia trie holding `entries`.
///
/// Entry `i` is stored under the key `rlp(i)`, so the first entry lives at `0x80`.
pub fn ordered_root<T: AsRef<[u8]>>(entries: &[T]) -> B256 {
    ordered_trie_root_encoded(entries)
}
