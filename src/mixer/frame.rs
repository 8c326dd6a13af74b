use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    foundation::core::{Fps, VideoFormatDesc},
    foundation::error::{MixError, MixResult},
    mixer::accel::ImageFuture,
    pixel::format::PixelFormatDescriptor,
};

/// Identity of the component that produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerTag(u64);

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

impl ProducerTag {
    /// A process-unique tag.
    pub fn next() -> Self {
        Self(NEXT_TAG.fetch_add(1, Ordering::Relaxed))
    }

    /// Tag of frames that no producer made.
    pub const NONE: ProducerTag = ProducerTag(0);

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProducerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read side of a frame handed downstream to consumers.
pub trait DataFrame {
    fn tag(&self) -> ProducerTag;
    fn pixel_format_desc(&self) -> &PixelFormatDescriptor;
    /// Packed image bytes of plane 0, blocking until available.
    fn image_data(&self) -> MixResult<Arc<[u8]>>;
    fn audio_data(&self) -> &[f32];
    fn image_data_mut(&mut self) -> MixResult<&mut [u8]>;
    fn audio_data_mut(&mut self) -> MixResult<&mut Vec<f32>>;
    fn frame_rate(&self) -> f64;
    fn width(&self) -> usize;
    fn height(&self) -> usize;
}

/// Result of one tick. Immutable once produced and owned by a single consumer; share the
/// pixels through [`MixedFrame::image`] instead.
#[derive(Debug)]
pub struct MixedFrame {
    tag: ProducerTag,
    image: Option<ImageFuture>,
    audio: Arc<[f32]>,
    format_desc: Option<VideoFormatDesc>,
    pixel_desc: PixelFormatDescriptor,
}

impl MixedFrame {
    pub(crate) fn new(
        tag: ProducerTag,
        image: ImageFuture,
        audio: Vec<f32>,
        format_desc: &VideoFormatDesc,
    ) -> Self {
        Self {
            tag,
            image: Some(image),
            audio: audio.into(),
            format_desc: Some(format_desc.clone()),
            pixel_desc: PixelFormatDescriptor::bgra(
                format_desc.width as usize,
                format_desc.height as usize,
            ),
        }
    }

    /// The blank frame returned when a tick fails.
    pub fn empty() -> Self {
        Self {
            tag: ProducerTag::NONE,
            image: None,
            audio: Arc::from(Vec::new()),
            format_desc: None,
            pixel_desc: PixelFormatDescriptor::invalid(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }

    pub fn format_desc(&self) -> Option<&VideoFormatDesc> {
        self.format_desc.as_ref()
    }

    pub fn fps(&self) -> Option<Fps> {
        self.format_desc.as_ref().map(|d| d.fps)
    }

    /// The deferred image, for consumers that want to poll readiness.
    pub fn image(&self) -> Option<&ImageFuture> {
        self.image.as_ref()
    }
}

impl DataFrame for MixedFrame {
    fn tag(&self) -> ProducerTag {
        self.tag
    }

    fn pixel_format_desc(&self) -> &PixelFormatDescriptor {
        &self.pixel_desc
    }

    fn image_data(&self) -> MixResult<Arc<[u8]>> {
        match &self.image {
            Some(image) => image.get(),
            None => Ok(Arc::from(Vec::new())),
        }
    }

    fn audio_data(&self) -> &[f32] {
        &self.audio
    }

    fn image_data_mut(&mut self) -> MixResult<&mut [u8]> {
        Err(MixError::invalid_operation("mixed frames are read-only"))
    }

    fn audio_data_mut(&mut self) -> MixResult<&mut Vec<f32>> {
        Err(MixError::invalid_operation("mixed frames are read-only"))
    }

    fn frame_rate(&self) -> f64 {
        self.fps().map(Fps::as_f64).unwrap_or(0.0)
    }

    fn width(&self) -> usize {
        self.pixel_desc.width()
    }

    fn height(&self) -> usize {
        self.pixel_desc.height()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/frame.rs"]
mod tests;
