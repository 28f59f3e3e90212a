use crate::common::errors::RelayError;

/// A single caller-supplied byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=S-E`, both inclusive.
    Bounded(u64, u64),
    /// `bytes=S-`
    From(u64),
    /// `bytes=-N`, the last N bytes.
    Suffix(u64),
}

impl ByteRange {
    /// Parses a `Range` header value. Multi-range requests and anything
    /// malformed yield `None` and are served as a full response.
    pub fn parse(value: &str) -> Option<Self> {
        let spec = value.trim().strip_prefix("bytes=")?.trim();
        if spec.contains(',') {
            return None;
        }
        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());

        match (start.is_empty(), end.is_empty()) {
            (true, true) => None,
            (true, false) => end.parse().ok().map(Self::Suffix),
            (false, true) => start.parse().ok().map(Self::From),
            (false, false) => {
                let start: u64 = start.parse().ok()?;
                let end: u64 = end.parse().ok()?;
                (start <= end).then_some(Self::Bounded(start, end))
            }
        }
    }

    /// Intersects the range with a resource of `total` bytes, giving an
    /// inclusive `(start, end)` window.
    pub fn resolve(self, total: u64) -> Result<(u64, u64), RelayError> {
        let unsatisfiable = RelayError::RangeNotSatisfiable { total };
        if total == 0 {
            return Err(unsatisfiable);
        }
        let last = total - 1;

        match self {
            Self::Bounded(start, _) | Self::From(start) if start > last => Err(unsatisfiable),
            Self::Bounded(start, end) => Ok((start, end.min(last))),
            Self::From(start) => Ok((start, last)),
            Self::Suffix(0) => Err(unsatisfiable),
            Self::Suffix(n) => Ok((total - n.min(total), last)),
        }
    }
}

/// Parsed upstream `Content-Range: bytes S-E/T` (or `bytes */T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// `None` for the unsatisfied form `bytes */T`.
    pub span: Option<(u64, u64)>,
    /// `None` when upstream sends `*`.
    pub total: Option<u64>,
}

impl ContentRange {
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.trim().strip_prefix("bytes")?.trim_start();
        let (span, total) = rest.split_once('/')?;

        let total = match total.trim() {
            "*" => None,
            t => Some(t.parse().ok()?),
        };

        let span = match span.trim() {
            "*" => None,
            s => {
                let (start, end) = s.split_once('-')?;
                Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
            }
        };

        Some(Self { span, total })
    }

    pub fn start(&self) -> Option<u64> {
        self.span.map(|(start, _)| start)
    }

    pub fn header_value(start: u64, end: u64, total: u64) -> String {
        format!("bytes {}-{}/{}", start, end, total)
    }
}
