use std::sync::Arc;

/// One compressed access unit handed over by the demuxer.
///
/// A packet without payload marks the end of its stream and is accepted by every decoder
/// regardless of `stream_index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedPacket {
    pub stream_index: usize,
    payload: Option<Arc<[u8]>>,
    pub pts: Option<i64>,
}

impl CompressedPacket {
    pub fn new(stream_index: usize, payload: impl Into<Arc<[u8]>>, pts: i64) -> Self {
        Self {
            stream_index,
            payload: Some(payload.into()),
            pts: Some(pts),
        }
    }

    pub fn end_of_stream(stream_index: usize) -> Self {
        Self {
            stream_index,
            payload: None,
            pts: None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.payload.is_none()
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}
