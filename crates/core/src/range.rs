//! Single-range `Range: bytes=...` handling for downloads.

/// Inclusive byte range within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a resource of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// What to serve for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range: serve the whole resource with 200.
    Full,
    /// Serve this slice with 206.
    Partial(ByteRange),
    /// Well-formed but outside the resource: 416.
    Unsatisfiable,
}

/// Interprets a `Range` header against a resource of `size` bytes.
///
/// Malformed headers, other units and multi-range requests are ignored
/// (full response), which is what HTTP allows a server to do.
pub fn parse_range(header: Option<&str>, size: u64) -> RangeRequest {
    let Some(value) = header else {
        return RangeRequest::Full;
    };
    let Some(ranges) = value.trim().strip_prefix("bytes=") else {
        return RangeRequest::Full;
    };
    if ranges.contains(',') {
        return RangeRequest::Full;
    }
    let Some((start_part, end_part)) = ranges.split_once('-') else {
        return RangeRequest::Full;
    };
    let (start_part, end_part) = (start_part.trim(), end_part.trim());

    if start_part.is_empty() {
        // Suffix form: the last N bytes.
        let Ok(suffix) = end_part.parse::<u64>() else {
            return RangeRequest::Full;
        };
        if suffix == 0 || size == 0 {
            return RangeRequest::Unsatisfiable;
        }
        return RangeRequest::Partial(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        });
    }

    let Ok(start) = start_part.parse::<u64>() else {
        return RangeRequest::Full;
    };
    let end = if end_part.is_empty() {
        None
    } else {
        match end_part.parse::<u64>() {
            Ok(end) if end >= start => Some(end),
            _ => return RangeRequest::Full,
        }
    };
    if start >= size {
        return RangeRequest::Unsatisfiable;
    }
    let last = size - 1;
    RangeRequest::Partial(ByteRange {
        start,
        end: end.map_or(last, |e| e.min(last)),
    })
}
