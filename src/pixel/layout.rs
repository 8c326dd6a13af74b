/// Pixel layouts a codec backend may hand out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativePixelFormat {
    Bgra,
    Argb,
    Rgba,
    Abgr,
    Yuv444p,
    Yuv422p,
    Yuv420p,
    Yuv411p,
    Yuv410p,
    Yuva420p,
    Rgb24,
    Bgr24,
    Gray8,
    /// Full-resolution luma plane followed by one interleaved Cb/Cr plane at 4:2:0.
    Nv12,
    /// Packed Y0 Cb Y1 Cr at 4:2:2.
    Yuyv422,
    /// Reported by the backend but without a known layout.
    Other,
}

impl NativePixelFormat {
    /// `(log2 horizontal, log2 vertical)` chroma subsampling of planar YCbCr layouts.
    pub fn chroma_shift(self) -> Option<(u32, u32)> {
        match self {
            Self::Yuv444p => Some((0, 0)),
            Self::Yuv422p => Some((1, 0)),
            Self::Yuv420p | Self::Yuva420p | Self::Nv12 => Some((1, 1)),
            Self::Yuv411p => Some((2, 0)),
            Self::Yuv410p => Some((2, 2)),
            Self::Yuyv422 => Some((1, 0)),
            _ => None,
        }
    }

    fn packed_bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Bgra | Self::Argb | Self::Rgba | Self::Abgr => Some(4),
            Self::Rgb24 | Self::Bgr24 => Some(3),
            Self::Yuyv422 => Some(2),
            Self::Gray8 => Some(1),
            _ => None,
        }
    }
}

/// Byte geometry of a picture in `native` layout stored in one contiguous buffer
/// without row padding, the way backends fill a picture from a flat allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeLayout {
    pub format: NativePixelFormat,
    pub width: usize,
    pub height: usize,
    /// Bytes per row, per plane.
    pub linesizes: Vec<usize>,
    /// Start of each plane inside the contiguous buffer.
    pub offsets: Vec<usize>,
    /// Total buffer size.
    pub size: usize,
}

impl NativeLayout {
    pub fn fill(format: NativePixelFormat, width: usize, height: usize) -> Self {
        let mut linesizes = Vec::with_capacity(4);
        let mut heights = Vec::with_capacity(4);

        if let Some(bpp) = format.packed_bytes_per_pixel() {
            let linesize = match format {
                NativePixelFormat::Yuyv422 => ceil_shift(width, 1) * 4,
                _ => width * bpp,
            };
            linesizes.push(linesize);
            heights.push(height);
        } else if format == NativePixelFormat::Nv12 {
            linesizes.push(width);
            heights.push(height);
            linesizes.push(ceil_shift(width, 1) * 2);
            heights.push(ceil_shift(height, 1));
        } else if let Some((sw, sh)) = format.chroma_shift() {
            let (cw, ch) = (ceil_shift(width, sw), ceil_shift(height, sh));
            linesizes.extend([width, cw, cw]);
            heights.extend([height, ch, ch]);
            if format == NativePixelFormat::Yuva420p {
                linesizes.push(width);
                heights.push(height);
            }
        }

        let mut offsets = Vec::with_capacity(linesizes.len());
        let mut size = 0usize;
        for (linesize, h) in linesizes.iter().zip(&heights) {
            offsets.push(size);
            size += linesize * h;
        }

        Self {
            format,
            width,
            height,
            linesizes,
            offsets,
            size,
        }
    }

    pub fn plane_count(&self) -> usize {
        self.linesizes.len()
    }

    /// Rows in plane `n`, derived from where the next plane starts.
    pub fn plane_height(&self, n: usize) -> usize {
        let Some(&linesize) = self.linesizes.get(n) else {
            return 0;
        };
        if linesize == 0 {
            return 0;
        }
        let end = self.offsets.get(n + 1).copied().unwrap_or(self.size);
        (end - self.offsets[n]) / linesize
    }
}

fn ceil_shift(v: usize, shift: u32) -> usize {
    (v + (1usize << shift) - 1) >> shift
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/layout.rs"]
mod tests;
