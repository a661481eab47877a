//! Polynomial rolling hash over fixed-width byte windows.
//!
//! The hash is only an index into the k-mer tables; callers always confirm a hit by
//! comparing the window bytes.

const BASE: u64 = 0x0100_0000_01B3;

/// Rolling hash of the last `width` bytes fed to it.
#[derive(Debug, Clone)]
pub struct RollingHash {
    width: usize,
    /// `BASE^(width - 1)`, the weight of the byte leaving the window.
    outgoing: u64,
    hash: u64,
}

impl RollingHash {
    /// Hashes the first window of `data`, which must hold at least `width` bytes.
    #[must_use]
    pub fn new(data: &[u8], width: usize) -> Self {
        debug_assert!(width > 0 && data.len() >= width);
        let mut outgoing = 1u64;
        for _ in 1..width {
            outgoing = outgoing.wrapping_mul(BASE);
        }
        Self {
            width,
            outgoing,
            hash: hash_window(&data[..width]),
        }
    }

    /// Current window hash.
    #[inline]
    #[must_use]
    pub fn value(&self) -> u64 {
        self.hash
    }

    /// Window width in bytes.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Slides the window one byte: `old` leaves on the left, `new` enters on the right.
    #[inline]
    pub fn roll(&mut self, old: u8, new: u8) -> u64 {
        let without = self
            .hash
            .wrapping_sub(u64::from(old).wrapping_add(1).wrapping_mul(self.outgoing));
        self.hash = without
            .wrapping_mul(BASE)
            .wrapping_add(u64::from(new).wrapping_add(1));
        self.hash
    }
}

/// Hashes a whole window from scratch; agrees with [`RollingHash::roll`].
#[must_use]
pub fn hash_window(window: &[u8]) -> u64 {
    window.iter().fold(0u64, |acc, &byte| {
        acc.wrapping_mul(BASE)
            .wrapping_add(u64::from(byte).wrapping_add(1))
    })
}

/// Calls `f(offset, hash)` for every `width`-byte window of `data`, left to right.
pub fn for_each_window<F>(data: &[u8], width: usize, mut f: F)
where
    F: FnMut(usize, u64),
{
    if width == 0 || data.len() < width {
        return;
    }
    let mut rolling = RollingHash::new(data, width);
    f(0, rolling.value());
    for offset in 1..=data.len() - width {
        let hash = rolling.roll(data[offset - 1], data[offset + width - 1]);
        f(offset, hash);
    }
}
