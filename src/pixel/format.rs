use crate::pixel::layout::{NativeLayout, NativePixelFormat};

/// Plane layouts the mixer consumes without a software conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Bgra,
    Argb,
    Rgba,
    Abgr,
    /// Planar Y, Cb, Cr.
    Ycbcr,
    /// Planar Y, Cb, Cr, A.
    Ycbcra,
    Invalid,
}

impl PixelFormat {
    pub fn is_packed_rgb(self) -> bool {
        matches!(self, Self::Bgra | Self::Argb | Self::Rgba | Self::Abgr)
    }

    pub fn is_planar_ycbcr(self) -> bool {
        matches!(self, Self::Ycbcr | Self::Ycbcra)
    }

    /// Byte offsets of `(b, g, r, a)` within one packed pixel.
    pub(crate) fn packed_bgra_offsets(self) -> Option<[usize; 4]> {
        match self {
            Self::Bgra => Some([0, 1, 2, 3]),
            Self::Argb => Some([3, 2, 1, 0]),
            Self::Rgba => Some([2, 1, 0, 3]),
            Self::Abgr => Some([1, 2, 3, 0]),
            _ => None,
        }
    }
}

/// One plane of a [`PixelFormatDescriptor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Plane {
    /// Samples per row.
    pub width: usize,
    pub height: usize,
    pub bytes_per_sample: usize,
}

impl Plane {
    pub fn new(width: usize, height: usize, bytes_per_sample: usize) -> Self {
        Self {
            width,
            height,
            bytes_per_sample,
        }
    }

    pub fn linesize(&self) -> usize {
        self.width * self.bytes_per_sample
    }

    pub fn size(&self) -> usize {
        self.linesize() * self.height
    }
}

/// A canonical pixel format plus the ordered planes a frame of it occupies.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelFormatDescriptor {
    pub format: PixelFormat,
    pub planes: Vec<Plane>,
}

impl PixelFormatDescriptor {
    pub fn invalid() -> Self {
        Self {
            format: PixelFormat::Invalid,
            planes: Vec::new(),
        }
    }

    /// Single packed BGRA plane of `width x height`.
    pub fn bgra(width: usize, height: usize) -> Self {
        Self {
            format: PixelFormat::Bgra,
            planes: vec![Plane::new(width, height, 4)],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.format != PixelFormat::Invalid && !self.planes.is_empty()
    }

    /// Pixel width of the image (the first plane is always full resolution).
    pub fn width(&self) -> usize {
        self.planes.first().map(|p| p.width).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.planes.first().map(|p| p.height).unwrap_or(0)
    }
}

/// Map a backend layout onto the canonical set; anything without a direct plane mapping is
/// [`PixelFormat::Invalid`].
pub fn canonical_format(native: NativePixelFormat) -> PixelFormat {
    match native {
        NativePixelFormat::Bgra => PixelFormat::Bgra,
        NativePixelFormat::Argb => PixelFormat::Argb,
        NativePixelFormat::Rgba => PixelFormat::Rgba,
        NativePixelFormat::Abgr => PixelFormat::Abgr,
        NativePixelFormat::Yuv444p
        | NativePixelFormat::Yuv422p
        | NativePixelFormat::Yuv420p
        | NativePixelFormat::Yuv411p
        | NativePixelFormat::Yuv410p => PixelFormat::Ycbcr,
        NativePixelFormat::Yuva420p => PixelFormat::Ycbcra,
        _ => PixelFormat::Invalid,
    }
}

/// Describe the planes of a `width x height` picture in `native` layout.
///
/// Chroma plane height is measured from the emulated native layout (distance between the
/// two chroma planes divided by their line size) rather than assumed from the format name,
/// so any vertical subsampling the backend uses is picked up.
pub fn plane_descriptor(
    native: NativePixelFormat,
    width: usize,
    height: usize,
) -> PixelFormatDescriptor {
    let format = canonical_format(native);
    let layout = NativeLayout::fill(native, width, height);

    match format {
        PixelFormat::Bgra | PixelFormat::Argb | PixelFormat::Rgba | PixelFormat::Abgr => {
            PixelFormatDescriptor {
                format,
                planes: vec![Plane::new(layout.linesizes[0] / 4, height, 4)],
            }
        }
        PixelFormat::Ycbcr | PixelFormat::Ycbcra => {
            let chroma_size = layout.offsets[2] - layout.offsets[1];
            let chroma_height = chroma_size.checked_div(layout.linesizes[1]).unwrap_or(0);

            let mut planes = vec![
                Plane::new(layout.linesizes[0], height, 1),
                Plane::new(layout.linesizes[1], chroma_height, 1),
                Plane::new(layout.linesizes[2], chroma_height, 1),
            ];
            if format == PixelFormat::Ycbcra {
                planes.push(Plane::new(layout.linesizes[3], height, 1));
            }
            PixelFormatDescriptor { format, planes }
        }
        PixelFormat::Invalid => PixelFormatDescriptor::invalid(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/format.rs"]
mod tests;
