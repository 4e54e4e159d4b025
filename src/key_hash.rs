use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
#[cfg(feature = "foldhash")]
use core::hash::BuildHasher;
#[cfg(feature = "foldhash")]
use core::hash::Hash;

/// A hashing and equality policy for keys of type `K`.
///
/// The two functions must be consistent: `key_eq(a, b)` implies
/// `hash_key(a) == hash_key(b)`. Tables place keys by `hash_key(key) %
/// cellar_start`, so the low-order distribution of the hash matters more than
/// its full width.
///
/// Lookups accept borrowed forms of the stored key. When a policy implements
/// `KeyHasher<Q>` for some `Q` that `K` borrows as, both implementations must
/// agree on hash and equality.
pub trait KeyHasher<K: ?Sized> {
    /// Hashes a key.
    fn hash_key(&self, key: &K) -> u64;

    /// Returns `true` if the two keys are the same key.
    fn key_eq(&self, a: &K, b: &K) -> bool;
}

/// Computes the djb2 hash (`hash * 33 + byte`, seeded with 5381) of a byte
/// string using 32-bit wrapping arithmetic.
///
/// # Examples
///
/// ```rust
/// use cellar_hash::key_hash::djb2;
///
/// assert_eq!(djb2(b""), 5381);
/// assert_eq!(djb2(b"a"), 5381 * 33 + 97);
/// ```
#[inline]
pub fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(5381u32, |hash, &byte| {
        (hash << 5).wrapping_add(hash).wrapping_add(byte as u32)
    })
}

/// Content hashing for string and byte-string keys using [`djb2`].
///
/// # Examples
///
/// ```rust
/// use cellar_hash::key_hash::Djb2;
/// use cellar_hash::key_hash::KeyHasher;
///
/// let owned = String::from("eth0");
/// assert_eq!(Djb2.hash_key(&owned), Djb2.hash_key("eth0"));
/// assert!(Djb2.key_eq("eth0", "eth0"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Djb2;

impl KeyHasher<[u8]> for Djb2 {
    #[inline]
    fn hash_key(&self, key: &[u8]) -> u64 {
        djb2(key) as u64
    }

    #[inline]
    fn key_eq(&self, a: &[u8], b: &[u8]) -> bool {
        a == b
    }
}

impl KeyHasher<str> for Djb2 {
    #[inline]
    fn hash_key(&self, key: &str) -> u64 {
        djb2(key.as_bytes()) as u64
    }

    #[inline]
    fn key_eq(&self, a: &str, b: &str) -> bool {
        a == b
    }
}

impl KeyHasher<String> for Djb2 {
    #[inline]
    fn hash_key(&self, key: &String) -> u64 {
        djb2(key.as_bytes()) as u64
    }

    #[inline]
    fn key_eq(&self, a: &String, b: &String) -> bool {
        a == b
    }
}

impl<'a> KeyHasher<&'a str> for Djb2 {
    #[inline]
    fn hash_key(&self, key: &&'a str) -> u64 {
        djb2(key.as_bytes()) as u64
    }

    #[inline]
    fn key_eq(&self, a: &&'a str, b: &&'a str) -> bool {
        a == b
    }
}

impl KeyHasher<Vec<u8>> for Djb2 {
    #[inline]
    fn hash_key(&self, key: &Vec<u8>) -> u64 {
        djb2(key) as u64
    }

    #[inline]
    fn key_eq(&self, a: &Vec<u8>, b: &Vec<u8>) -> bool {
        a == b
    }
}

/// Identity hashing for integer keys: the hash is the key's bit pattern.
///
/// Signed keys are reinterpreted as the unsigned type of the same width, so
/// `-1i32` hashes to `0xFFFF_FFFF`.
///
/// # Examples
///
/// ```rust
/// use cellar_hash::key_hash::IdentityHash;
/// use cellar_hash::key_hash::KeyHasher;
///
/// assert_eq!(IdentityHash.hash_key(&42u32), 42);
/// assert_eq!(IdentityHash.hash_key(&-1i32), 0xFFFF_FFFF);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityHash;

macro_rules! identity_hash {
    ($($int:ty => $bits:ty),* $(,)?) => {
        $(
            impl KeyHasher<$int> for IdentityHash {
                #[inline]
                fn hash_key(&self, key: &$int) -> u64 {
                    *key as $bits as u64
                }

                #[inline]
                fn key_eq(&self, a: &$int, b: &$int) -> bool {
                    a == b
                }
            }
        )*
    };
}

identity_hash! {
    u8 => u8,
    u16 => u16,
    u32 => u32,
    u64 => u64,
    usize => usize,
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
    isize => usize,
}

/// A policy built from a caller-supplied hash function and equality function.
///
/// # Examples
///
/// ```rust
/// use cellar_hash::hash_map::HashMap;
/// use cellar_hash::key_hash::KeyFns;
///
/// // Case-insensitive interface names.
/// let policy = KeyFns::new(
///     |name: &String| cellar_hash::key_hash::djb2(name.to_ascii_lowercase().as_bytes()) as u64,
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
/// );
/// let mut map = HashMap::with_hasher(policy);
/// map.insert("ETH0".to_string(), 1).unwrap();
/// assert_eq!(map.get(&"eth0".to_string()), Some(&1));
/// ```
#[derive(Clone, Copy)]
pub struct KeyFns<F, E> {
    hash: F,
    eq: E,
}

impl<F, E> KeyFns<F, E> {
    /// Binds a hash function and an equality function into a policy.
    pub fn new<K: ?Sized>(hash: F, eq: E) -> Self
    where
        F: Fn(&K) -> u64,
        E: Fn(&K, &K) -> bool,
    {
        Self { hash, eq }
    }
}

impl<F, E> Debug for KeyFns<F, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyFns").finish_non_exhaustive()
    }
}

impl<K: ?Sized, F, E> KeyHasher<K> for KeyFns<F, E>
where
    F: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn key_eq(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }
}

/// General-purpose policy for any `Hash + Eq` key, backed by foldhash with a
/// per-instance random seed.
#[cfg(feature = "foldhash")]
#[derive(Debug, Clone, Default)]
pub struct FoldHash {
    state: foldhash::fast::RandomState,
}

#[cfg(feature = "foldhash")]
impl<K: Hash + Eq + ?Sized> KeyHasher<K> for FoldHash {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.state.hash_one(key)
    }

    #[inline]
    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::ToString;

    use super::*;

    const SAMPLES: u32 = 1_000_000;
    const EXPECTED: i64 = 250_000;
    const TOLERANCE: i64 = 100;

    fn assert_uniform(counts: [i64; 4]) {
        for (bucket, count) in counts.iter().enumerate() {
            let difference = (count - EXPECTED).abs();
            assert!(
                difference < TOLERANCE,
                "bucket {bucket} holds {count}, expected {EXPECTED} +/- {TOLERANCE}"
            );
        }
    }

    #[test]
    fn djb2_known_values() {
        assert_eq!(djb2(b""), 5381);
        assert_eq!(djb2(b"a"), 177_670);
        assert_eq!(djb2(b"ab"), 5_863_208);
        // Long inputs wrap instead of overflowing.
        let long = [0xFFu8; 64];
        let _ = djb2(&long);
    }

    #[test]
    fn djb2_borrowed_forms_agree() {
        let owned = "router-7".to_string();
        let hash = Djb2.hash_key(&owned);
        assert_eq!(hash, Djb2.hash_key("router-7"));
        assert_eq!(hash, Djb2.hash_key(&"router-7"));
        assert_eq!(hash, Djb2.hash_key(owned.as_bytes()));
        assert_eq!(hash, Djb2.hash_key(&owned.clone().into_bytes()));
    }

    #[test]
    fn identity_is_bit_pattern() {
        assert_eq!(IdentityHash.hash_key(&0i32), 0);
        assert_eq!(IdentityHash.hash_key(&7u8), 7);
        assert_eq!(IdentityHash.hash_key(&-1i8), 0xFF);
        assert_eq!(IdentityHash.hash_key(&-2i64), u64::MAX - 1);
        assert!(IdentityHash.key_eq(&5usize, &5usize));
        assert!(!IdentityHash.key_eq(&5i16, &6i16));
    }

    #[test]
    fn identity_distribution() {
        let mut counts = [0i64; 4];
        for i in 0..SAMPLES as i32 {
            counts[(IdentityHash.hash_key(&i) % 4) as usize] += 1;
        }
        assert_uniform(counts);
    }

    #[test]
    fn djb2_distribution() {
        let mut counts = [0i64; 4];
        for i in 0..SAMPLES {
            let key = format!("test_string_{i}");
            counts[(Djb2.hash_key(key.as_str()) % 4) as usize] += 1;
        }
        assert_uniform(counts);
    }

    #[test]
    fn key_fns_delegate() {
        let policy = KeyFns::new(|k: &u64| k / 10, |a: &u64, b: &u64| a / 10 == b / 10);
        assert_eq!(policy.hash_key(&42), 4);
        assert!(policy.key_eq(&41, &49));
        assert!(!policy.key_eq(&41, &51));
        assert_eq!(format!("{policy:?}"), "KeyFns { .. }");
    }

    #[cfg(feature = "foldhash")]
    #[test]
    fn foldhash_is_consistent_per_instance() {
        let policy = FoldHash::default();
        assert_eq!(policy.hash_key("a"), policy.hash_key(&"a".to_string()));
        assert_eq!(policy.hash_key(&3u64), policy.hash_key(&3u64));
        assert!(policy.key_eq(&(1, 2), &(1, 2)));
    }
}
