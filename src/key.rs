//! Key types accepted by the backends and the two hash families built on them.
//!
//! Every backend hashes through [`TableKey::fold`], an integer projection of
//! the key, so that bucket positions are a pure function of `(key,
//! capacity)` and do not depend on a randomly seeded hasher. Equality and
//! ordering go through [`TableKey::compare`], which is total even for
//! floats.

use core::cmp::Ordering;
use core::fmt::Debug;

/// Fractional part of the golden ratio, scaled into keys by the
/// multiplicative hash.
pub const GOLDEN_FRACTION: f64 = 0.618;

/// Domain the multiplicative hash reduces into before scaling to the table.
pub const MULTIPLICATIVE_DOMAIN: u64 = 1 << 16;

/// A fixed-width scalar or string usable as a map key.
pub trait TableKey: Clone + Debug {
    /// Integer projection of the key used by both hash families.
    fn fold(&self) -> u64;

    /// Total order over keys. `Equal` is the only notion of key equality the
    /// backends use.
    fn compare(&self, other: &Self) -> Ordering;

    #[inline]
    fn same(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

macro_rules! int_keys {
    ($via:ty => $($t:ty),*) => {
        $(
            impl TableKey for $t {
                #[inline]
                fn fold(&self) -> u64 {
                    *self as $via as u64
                }

                #[inline]
                fn compare(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }
            }
        )*
    };
}

// Signed values are sign-extended first, so -1 folds to u64::MAX.
int_keys!(i64 => i8, i16, i32, i64, isize);
int_keys!(u64 => u8, u16, u32, u64, usize);

macro_rules! float_keys {
    ($($t:ty),*) => {
        $(
            impl TableKey for $t {
                #[inline]
                fn fold(&self) -> u64 {
                    self.to_bits() as u64
                }

                #[inline]
                fn compare(&self, other: &Self) -> Ordering {
                    self.total_cmp(other)
                }
            }
        )*
    };
}

float_keys!(f32, f64);

impl TableKey for char {
    #[inline]
    fn fold(&self) -> u64 {
        *self as u64
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TableKey for bool {
    #[inline]
    fn fold(&self) -> u64 {
        *self as u64
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TableKey for String {
    /// Polynomial rolling sum `Σ byte[i] · 31^i`, wrapping on overflow.
    fn fold(&self) -> u64 {
        let mut sum = 0u64;
        let mut power = 1u64;
        for b in self.bytes() {
            sum = sum.wrapping_add(u64::from(b).wrapping_mul(power));
            power = power.wrapping_mul(31);
        }
        sum
    }

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Division hash: `fold(key) mod capacity`.
///
/// `capacity` must be non-zero; the constructors of every hash backend
/// enforce that.
#[inline]
pub fn modulo_hash<K: TableKey>(key: &K, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (key.fold() % capacity as u64) as usize
}

/// Multiplicative hash: scale by [`GOLDEN_FRACTION`], reduce into
/// [`MULTIPLICATIVE_DOMAIN`], then scale the remainder into
/// `[0, capacity)`.
#[inline]
pub fn multiplicative_hash<K: TableKey>(key: &K, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    let scaled = (GOLDEN_FRACTION * key.fold() as f64) as u64 % MULTIPLICATIVE_DOMAIN;
    let width = MULTIPLICATIVE_DOMAIN as f64 / capacity as f64;
    let index = (scaled as f64 / width).floor() as usize;
    index.min(capacity - 1)
}
