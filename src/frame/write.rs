use crate::{
    foundation::core::VideoFormatDesc,
    foundation::error::{MixError, MixResult},
    pixel::format::{PixelFormat, PixelFormatDescriptor},
};

/// Per-frame compositing parameters, accumulated down a [`crate::DrawFrame`] tree.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameTransform {
    pub opacity: f64,
    pub volume: f64,
    /// Offset in output-normalized units (1.0 = full output width/height).
    pub translation: [f64; 2],
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            volume: 1.0,
            translation: [0.0, 0.0],
        }
    }
}

impl FrameTransform {
    /// Apply `inner` beneath `self`.
    pub fn combine(&self, inner: &FrameTransform) -> FrameTransform {
        FrameTransform {
            opacity: self.opacity * inner.opacity,
            volume: self.volume * inner.volume,
            translation: [
                self.translation[0] + inner.translation[0],
                self.translation[1] + inner.translation[1],
            ],
        }
    }

    pub fn set_image_translation(&mut self, x: f64, y: f64) {
        self.translation = [x, y];
    }
}

/// A frame whose planes and audio are filled by a producer before it is handed to the mixer.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteFrame {
    desc: PixelFormatDescriptor,
    planes: Vec<Vec<u8>>,
    audio: Vec<f32>,
    transform: FrameTransform,
}

impl WriteFrame {
    /// Zeroed planes sized per `desc`.
    pub fn new(desc: PixelFormatDescriptor) -> Self {
        let planes = desc.planes.iter().map(|p| vec![0u8; p.size()]).collect();
        Self {
            desc,
            planes,
            audio: Vec::new(),
            transform: FrameTransform::default(),
        }
    }

    /// Wrap straight-alpha BGRA bytes.
    pub fn from_bgra(width: usize, height: usize, data: Vec<u8>) -> MixResult<Self> {
        if data.len() != width * height * 4 {
            return Err(MixError::validation(format!(
                "bgra frame expects {} bytes for {width}x{height}, got {}",
                width * height * 4,
                data.len()
            )));
        }
        Ok(Self {
            desc: PixelFormatDescriptor::bgra(width, height),
            planes: vec![data],
            audio: Vec::new(),
            transform: FrameTransform::default(),
        })
    }

    /// A uniformly colored straight-alpha BGRA frame.
    pub fn solid_bgra(width: usize, height: usize, bgra: [u8; 4]) -> Self {
        let data = bgra.repeat(width * height);
        Self {
            desc: PixelFormatDescriptor::bgra(width, height),
            planes: vec![data],
            audio: Vec::new(),
            transform: FrameTransform::default(),
        }
    }

    pub fn with_audio(mut self, samples: Vec<f32>) -> Self {
        self.audio = samples;
        self
    }

    pub fn with_transform(mut self, transform: FrameTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn desc(&self) -> &PixelFormatDescriptor {
        &self.desc
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn width(&self) -> usize {
        self.desc.width()
    }

    pub fn height(&self) -> usize {
        self.desc.height()
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn image_data(&self, plane: usize) -> &[u8] {
        self.planes.get(plane).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn image_data_mut(&mut self, plane: usize) -> &mut [u8] {
        self.planes
            .get_mut(plane)
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    pub(crate) fn planes_mut(&mut self) -> &mut [Vec<u8>] {
        &mut self.planes
    }

    /// Interleaved samples in the output channel layout.
    pub fn audio_data(&self) -> &[f32] {
        &self.audio
    }

    pub fn audio_data_mut(&mut self) -> &mut Vec<f32> {
        &mut self.audio
    }

    pub fn transform(&self) -> &FrameTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut FrameTransform {
        &mut self.transform
    }

    /// Check that every plane holds exactly the bytes its descriptor promises.
    pub fn validate(&self) -> MixResult<()> {
        if self.planes.len() != self.desc.planes.len() {
            return Err(MixError::composition(format!(
                "frame has {} planes but its {:?} descriptor declares {}",
                self.planes.len(),
                self.desc.format,
                self.desc.planes.len()
            )));
        }
        for (n, (data, plane)) in self.planes.iter().zip(&self.desc.planes).enumerate() {
            if data.len() != plane.size() {
                return Err(MixError::composition(format!(
                    "plane {n} holds {} bytes, expected {}",
                    data.len(),
                    plane.size()
                )));
            }
        }
        Ok(())
    }
}

/// Allocates destination frames for producers.
pub trait FrameFactory: Send + Sync {
    fn video_format_desc(&self) -> &VideoFormatDesc;

    fn create_frame(&self, desc: &PixelFormatDescriptor) -> WriteFrame {
        WriteFrame::new(desc.clone())
    }
}

/// Heap-backed [`FrameFactory`] for a fixed output format.
#[derive(Clone, Debug)]
pub struct DefaultFrameFactory {
    format_desc: VideoFormatDesc,
}

impl DefaultFrameFactory {
    pub fn new(format_desc: VideoFormatDesc) -> Self {
        Self { format_desc }
    }
}

impl FrameFactory for DefaultFrameFactory {
    fn video_format_desc(&self) -> &VideoFormatDesc {
        &self.format_desc
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/write.rs"]
mod tests;
