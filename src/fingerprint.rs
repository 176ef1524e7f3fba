//! Content hashing for problems and wisdom keys.
//!
//! Every problem feeds its canonical form into a [`Fingerprinter`] and the
//! resulting 16-byte digest keys the planner's memo table and the exported
//! wisdom. The hash is cryptographic so distributed embeddings can exchange
//! digests instead of whole problem records.

use core::fmt;

/// Domain separator, bumped whenever the feeding scheme changes.
const FEED_TAG: &[u8] = b"fftune-problem-v1";

/// Incremental hasher with typed feeding methods.
///
/// Integers are fed little-endian with a width tag so that `(1, 2)` and
/// `(12,)` cannot collide, matching how the canonical problem forms are
/// defined.
pub struct Fingerprinter {
    hasher: blake3::Hasher,
}

impl Fingerprinter {
    pub fn new() -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(FEED_TAG);
        Self { hasher }
    }

    pub fn bytes(&mut self, b: &[u8]) {
        self.hasher.update(&(b.len() as u64).to_le_bytes());
        self.hasher.update(b);
    }

    /// Short structural tag, e.g. a problem kind name.
    pub fn tag(&mut self, t: &str) {
        self.bytes(t.as_bytes());
    }

    pub fn word(&mut self, w: u64) {
        self.hasher.update(&[b'u']);
        self.hasher.update(&w.to_le_bytes());
    }

    pub fn int(&mut self, i: i64) {
        self.hasher.update(&[b'i']);
        self.hasher.update(&i.to_le_bytes());
    }

    pub fn flag(&mut self, b: bool) {
        self.hasher.update(&[b'b', b as u8]);
    }

    /// Truncated digest. 128 bits keep the table keys compact while leaving
    /// collisions out of reach for any realistic wisdom size.
    pub fn digest(&self) -> Digest {
        let full = self.hasher.finalize();
        let mut out = [0u8; 16];
        out.copy_from_slice(&full.as_bytes()[..16]);
        Digest(out)
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

/// 128-bit problem digest, printed as `#x` plus 32 hex digits in wisdom.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 16]);

impl Digest {
    pub fn to_hex(self) -> [u8; 32] {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut out = [0u8; 32];
        for (i, byte) in self.0.iter().enumerate() {
            out[2 * i] = HEX[(byte >> 4) as usize];
            out[2 * i + 1] = HEX[(byte & 0xf) as usize];
        }
        out
    }

    pub fn from_hex(hex: &[u8]) -> Option<Self> {
        if hex.len() != 32 {
            return None;
        }
        let mut out = [0u8; 16];
        for i in 0..16 {
            let hi = hex_val(hex[2 * i])?;
            let lo = hex_val(hex[2 * i + 1])?;
            out[i] = (hi << 4) | lo;
        }
        Some(Self(out))
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#x")?;
        for b in self.to_hex() {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_feed_same_digest() {
        let mut a = Fingerprinter::new();
        let mut b = Fingerprinter::new();
        a.tag("dft");
        a.word(16);
        a.int(-4);
        b.tag("dft");
        b.word(16);
        b.int(-4);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn width_tags_prevent_concatenation_collisions() {
        let mut a = Fingerprinter::new();
        a.tag("ab");
        a.tag("c");
        let mut b = Fingerprinter::new();
        b.tag("a");
        b.tag("bc");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn hex_round_trip() {
        let mut f = Fingerprinter::new();
        f.word(1234);
        let d = f.digest();
        let hex = d.to_hex();
        assert_eq!(Digest::from_hex(&hex), Some(d));
        assert_eq!(Digest::from_hex(b"zz"), None);
    }
}
