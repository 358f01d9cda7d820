use sqf_core::SourceLocation;

/// One run of output characters sharing an origin.
///
/// An unpinned segment's characters advance column by column from the base
/// location; a pinned segment (macro expansion output) maps every character
/// to the invocation site.
#[derive(Clone, Debug)]
struct Segment {
    start: u32,
    location: SourceLocation,
    pinned: bool,
}

/// Maps offsets in the expanded output back to original source positions.
#[derive(Clone, Default, Debug)]
pub struct PositionMap {
    segments: Vec<Segment>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new segment at `start`. Segments must be pushed in offset
    /// order.
    pub(crate) fn push_segment(&mut self, start: u32, location: SourceLocation, pinned: bool) {
        debug_assert!(
            self.segments.last().map_or(true, |s| s.start <= start),
            "segments must be pushed in offset order"
        );
        self.segments.push(Segment {
            start,
            location,
            pinned,
        });
    }

    /// Resolve an output offset to its origin. `None` only when the map is
    /// empty or the offset precedes the first segment.
    pub fn resolve(&self, offset: u32) -> Option<SourceLocation> {
        let idx = match self
            .segments
            .binary_search_by(|seg| seg.start.cmp(&offset))
        {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };
        let seg = &self.segments[idx];
        if seg.pinned {
            Some(seg.location.clone())
        } else {
            Some(seg.location.with_col_offset(offset - seg.start))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
