use std::sync::Arc;

use crate::{
    decode::packet::CompressedPacket, foundation::error::MixResult,
    pixel::layout::NativePixelFormat,
};

/// Codec families the core distinguishes between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecId {
    H264,
    Hevc,
    Mpeg2Video,
    DvVideo,
    ProRes,
    RawVideo,
    Other,
}

/// Static description of an opened codec context.
#[derive(Clone, Debug, PartialEq)]
pub struct CodecParameters {
    pub id: CodecId,
    /// Human readable codec name, reported to metrics.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixel_format: NativePixelFormat,
    /// Nominal frame interval as `(num, den)` seconds.
    pub time_base: (u32, u32),
}

impl CodecParameters {
    pub fn frame_interval_secs(&self) -> f64 {
        let (num, den) = self.time_base;
        if den == 0 {
            return 0.0;
        }
        f64::from(num) / f64::from(den)
    }
}

/// One row-addressed plane as produced by a backend. `linesize` may include padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaneData {
    pub data: Arc<Vec<u8>>,
    pub linesize: usize,
}

impl PlaneData {
    pub fn new(data: Vec<u8>, linesize: usize) -> Self {
        Self {
            data: Arc::new(data),
            linesize,
        }
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = (y * self.linesize).min(self.data.len());
        let end = (start + self.linesize).min(self.data.len());
        &self.data[start..end]
    }
}

/// A picture as the backend returns it, before presentation stamping.
#[derive(Clone, Debug, PartialEq)]
pub struct CodecPicture {
    pub planes: Vec<PlaneData>,
    pub width: u32,
    pub height: u32,
    pub pixel_format: NativePixelFormat,
    pub interlaced: bool,
    pub top_field_first: bool,
    /// Extra field repetitions requested by the stream (soft telecine).
    pub repeat_pict: u32,
    /// Timestamp the backend associated with this picture, if it tracks one.
    pub pts: Option<i64>,
}

/// An exclusively owned codec context.
///
/// Implementations wrap a real decoder library. The core never calls one concurrently from
/// two threads; ownership is transferred into the decoder at construction.
pub trait CodecBackend: Send {
    fn parameters(&self) -> &CodecParameters;

    /// Whether the codec may hold pictures back and release them when drained.
    fn supports_delayed_output(&self) -> bool;

    /// Feed one packet. An end-of-stream packet asks the codec to release one buffered
    /// picture. `Ok(None)` means no picture is finished yet.
    fn decode(&mut self, packet: &CompressedPacket) -> MixResult<Option<CodecPicture>>;

    /// Drop all internally buffered state.
    fn flush(&mut self);
}
