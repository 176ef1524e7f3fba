//! Wisdom serialization.
//!
//! Exports are a single s-expression: a version header followed by one
//! `(solver-name #xdigest #xflags)` entry per blessed decision, sorted by
//! digest so equal planner states print identically. Import is a pushback
//! scanner over a byte source; entries naming solvers this build does not
//! register are skipped, so wisdom travels between differently configured
//! builds and simply degrades.

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::fingerprint::Digest;
use crate::flags::Flags;
use crate::num::Float;
use crate::planner::Planner;

/// Format tag with a major.minor version. The major is bumped when the
/// entry layout or the digest feeding scheme changes; import accepts any
/// minor within the same major and refuses foreign majors rather than
/// misread them.
const HEADER: &str = "fftune-wisdom-1.0";
const HEADER_STEM: &str = "fftune-wisdom-";
const MAJOR: &str = "1";

#[derive(Debug, PartialEq, Eq)]
pub enum WisdomError {
    /// Malformed input at the given 1-based line.
    Parse { line: usize },
    /// Input ended inside an expression.
    Truncated,
    /// The header names a format this build does not read.
    Version,
    /// The sink refused bytes.
    Io,
}

impl fmt::Display for WisdomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WisdomError::Parse { line } => write!(f, "malformed wisdom at line {line}"),
            WisdomError::Truncated => write!(f, "truncated wisdom"),
            WisdomError::Version => write!(f, "unreadable wisdom version"),
            WisdomError::Io => write!(f, "wisdom i/o failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WisdomError {}

/// Byte-oriented output for [`export`].
pub trait WisdomSink {
    fn put(&mut self, s: &str) -> Result<(), WisdomError>;
}

impl WisdomSink for String {
    fn put(&mut self, s: &str) -> Result<(), WisdomError> {
        self.push_str(s);
        Ok(())
    }
}

impl WisdomSink for Vec<u8> {
    fn put(&mut self, s: &str) -> Result<(), WisdomError> {
        self.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// Adapter from any [`std::io::Write`].
#[cfg(feature = "std")]
pub struct WriteSink<W: std::io::Write>(pub W);

#[cfg(feature = "std")]
impl<W: std::io::Write> WisdomSink for WriteSink<W> {
    fn put(&mut self, s: &str) -> Result<(), WisdomError> {
        self.0.write_all(s.as_bytes()).map_err(|_| WisdomError::Io)
    }
}

/// Byte-oriented input for [`import`].
pub trait WisdomSource {
    fn next_byte(&mut self) -> Option<u8>;
}

/// Reads from a byte slice.
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl WisdomSource for SliceSource<'_> {
    fn next_byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }
}

/// Adapter from any [`std::io::Read`], one byte at a time. Wrap buffered
/// readers around files before handing them here.
#[cfg(feature = "std")]
pub struct ReadSource<R: std::io::Read>(pub R);

#[cfg(feature = "std")]
impl<R: std::io::Read> WisdomSource for ReadSource<R> {
    fn next_byte(&mut self) -> Option<u8> {
        let mut b = [0u8; 1];
        match self.0.read(&mut b) {
            Ok(1) => Some(b[0]),
            _ => None,
        }
    }
}

/// Write every blessed decision of `plr` to `sink`.
pub fn export<T: Float + 'static, S: WisdomSink + ?Sized>(
    plr: &Planner<T>,
    sink: &mut S,
) -> Result<(), WisdomError> {
    sink.put("(")?;
    sink.put(HEADER)?;
    sink.put("\n")?;
    for (digest, name, flags) in plr.exportable_wisdom() {
        sink.put("  (")?;
        sink.put(name)?;
        sink.put(" #x")?;
        let hex = digest.to_hex();
        sink.put(core::str::from_utf8(&hex).unwrap_or(""))?;
        sink.put(&alloc::format!(" #x{:x})\n", flags.bits()))?;
    }
    sink.put(")\n")?;
    Ok(())
}

/// One-byte-pushback tokenizer over a [`WisdomSource`].
struct Scanner<'a, S: WisdomSource + ?Sized> {
    src: &'a mut S,
    pushback: Option<u8>,
    line: usize,
}

impl<'a, S: WisdomSource + ?Sized> Scanner<'a, S> {
    fn new(src: &'a mut S) -> Self {
        Self {
            src,
            pushback: None,
            line: 1,
        }
    }

    fn get(&mut self) -> Option<u8> {
        let b = match self.pushback.take() {
            Some(b) => Some(b),
            None => self.src.next_byte(),
        };
        if b == Some(b'\n') {
            self.line += 1;
        }
        b
    }

    fn unget(&mut self, b: u8) {
        debug_assert!(self.pushback.is_none());
        if b == b'\n' {
            self.line -= 1;
        }
        self.pushback = Some(b);
    }

    fn parse_err(&self) -> WisdomError {
        WisdomError::Parse { line: self.line }
    }

    /// Next byte that is not whitespace.
    fn nonspace(&mut self) -> Option<u8> {
        loop {
            let b = self.get()?;
            if !b.is_ascii_whitespace() {
                return Some(b);
            }
        }
    }

    /// Next atom: a run of bytes up to whitespace or a paren.
    fn token(&mut self, buf: &mut Vec<u8>) -> Result<(), WisdomError> {
        buf.clear();
        let first = self.nonspace().ok_or(WisdomError::Truncated)?;
        if first == b'(' || first == b')' {
            return Err(self.parse_err());
        }
        buf.push(first);
        while let Some(b) = self.get() {
            if b.is_ascii_whitespace() {
                break;
            }
            if b == b'(' || b == b')' {
                self.unget(b);
                break;
            }
            buf.push(b);
        }
        Ok(())
    }

    fn expect(&mut self, want: u8) -> Result<(), WisdomError> {
        match self.nonspace() {
            Some(b) if b == want => Ok(()),
            Some(_) => Err(self.parse_err()),
            None => Err(WisdomError::Truncated),
        }
    }
}

fn hex_u32(tok: &[u8]) -> Option<u32> {
    let rest = tok.strip_prefix(b"#x")?;
    if rest.is_empty() || rest.len() > 8 {
        return None;
    }
    let mut v: u32 = 0;
    for &c in rest {
        let d = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => return None,
        };
        v = (v << 4) | d as u32;
    }
    Some(v)
}

/// Read wisdom from `src` into `plr`, returning how many entries were
/// absorbed. Entries read before an error are kept.
pub fn import<T: Float + 'static, S: WisdomSource + ?Sized>(
    plr: &mut Planner<T>,
    src: &mut S,
) -> Result<usize, WisdomError> {
    let mut sc = Scanner::new(src);
    let mut tok = Vec::new();

    sc.expect(b'(')?;
    sc.token(&mut tok)?;
    match tok.strip_prefix(HEADER_STEM.as_bytes()) {
        Some(version) => {
            // tolerate unknown minors within our major
            let major = version.split(|&b| b == b'.').next().unwrap_or(version);
            if major != MAJOR.as_bytes() {
                return Err(WisdomError::Version);
            }
        }
        None => return Err(sc.parse_err()),
    }

    let mut absorbed = 0usize;
    loop {
        match sc.nonspace() {
            Some(b')') => return Ok(absorbed),
            Some(b'(') => {}
            Some(_) => return Err(sc.parse_err()),
            None => return Err(WisdomError::Truncated),
        }
        sc.token(&mut tok)?;
        let name = core::str::from_utf8(&tok)
            .map_err(|_| sc.parse_err())?
            .to_owned();
        sc.token(&mut tok)?;
        let digest = tok
            .strip_prefix(b"#x")
            .and_then(Digest::from_hex)
            .ok_or_else(|| sc.parse_err())?;
        sc.token(&mut tok)?;
        let flags = Flags::from_bits(hex_u32(&tok).ok_or_else(|| sc.parse_err())?);
        sc.expect(b')')?;
        if plr.absorb_wisdom(digest, &name, flags) {
            absorbed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufSpec, BufToken};
    use crate::problem::{Problem, Sign};
    use crate::tensor::Tensor;

    fn planned(n: usize) -> (Planner<f64>, Problem) {
        let prb = Problem::dft(
            Tensor::one_d(n, 1, 1),
            Tensor::rank0(),
            Sign::Forward,
            BufSpec::aligned(BufToken(0)),
            BufSpec::aligned(BufToken(1)),
        );
        let mut plr = Planner::new();
        plr.plan(&prb, Flags::ESTIMATE).unwrap();
        (plr, prb)
    }

    #[test]
    fn export_import_round_trip_skips_the_search() {
        let (plr, prb) = planned(12);
        let mut text = String::new();
        export(&plr, &mut text).unwrap();
        assert!(text.starts_with("(fftune-wisdom-1.0"));

        let mut fresh = Planner::<f64>::new();
        let n = import(&mut fresh, &mut SliceSource::new(text.as_bytes())).unwrap();
        assert_eq!(n, fresh.wisdom_len());
        assert!(n > 0);
        fresh.reset_stats();
        fresh.plan(&prb, Flags::ESTIMATE).unwrap();
        assert_eq!(fresh.stats().searches, 0);
    }

    #[test]
    fn exports_are_deterministic() {
        let (a, _) = planned(16);
        let (b, _) = planned(16);
        let mut ta = String::new();
        let mut tb = String::new();
        export(&a, &mut ta).unwrap();
        export(&b, &mut tb).unwrap();
        assert_eq!(ta, tb);
    }

    #[test]
    fn unknown_solver_names_are_skipped() {
        let text =
            "(fftune-wisdom-1.0\n  (no-such-solver #x000102030405060708090a0b0c0d0e0f #x0)\n)\n";
        let mut plr = Planner::<f64>::new();
        let n = import(&mut plr, &mut SliceSource::new(text.as_bytes())).unwrap();
        assert_eq!(n, 0);
        assert_eq!(plr.wisdom_len(), 0);
    }

    #[test]
    fn future_majors_are_refused_minors_tolerated() {
        let mut plr = Planner::<f64>::new();
        let err = import(&mut plr, &mut SliceSource::new(b"(fftune-wisdom-2.0\n)\n".as_ref()));
        assert_eq!(err, Err(WisdomError::Version));
        let ok = import(&mut plr, &mut SliceSource::new(b"(fftune-wisdom-1.7\n)\n".as_ref()));
        assert_eq!(ok, Ok(0));
    }

    #[test]
    fn truncation_keeps_earlier_entries() {
        let (plr, _) = planned(8);
        let mut text = String::new();
        export(&plr, &mut text).unwrap();
        // cut the closing paren off
        let cut = text.trim_end().trim_end_matches(')');
        let mut fresh = Planner::<f64>::new();
        let err = import(&mut fresh, &mut SliceSource::new(cut.as_bytes()));
        assert_eq!(err, Err(WisdomError::Truncated));
        assert_eq!(fresh.wisdom_len(), plr.wisdom_len());
    }

    #[test]
    fn garbage_reports_the_line() {
        let text = "(fftune-wisdom-1.0\n  (dft-rank0 oops)\n)\n";
        let mut plr = Planner::<f64>::new();
        let err = import(&mut plr, &mut SliceSource::new(text.as_bytes()));
        assert_eq!(err, Err(WisdomError::Parse { line: 2 }));
    }
}
