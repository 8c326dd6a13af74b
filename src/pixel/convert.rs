use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    decode::codec::{CodecBackend, CodecId, CodecParameters, PlaneData},
    decode::packet::CompressedPacket,
    decode::video::DecodedFrame,
    foundation::core::{FieldMode, VideoFormatDesc},
    foundation::error::{MixError, MixResult},
    frame::write::{FrameFactory, WriteFrame},
    pixel::color::ycbcr_to_rgb,
    pixel::format::{PixelFormat, PixelFormatDescriptor, canonical_format, plane_descriptor},
    pixel::layout::{NativeLayout, NativePixelFormat},
};

/// Largest tolerated difference between the codec's frame interval and the output tick.
const FRAME_INTERVAL_TOLERANCE_SECS: f64 = 0.0001;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConverterOptions {
    /// The consumer only takes packed BGRA; always go through the [`Scaler`].
    pub force_packed: bool,
}

/// Software conversion of any known native layout into straight-alpha BGRA.
#[derive(Clone, Debug)]
pub struct Scaler {
    layout: NativeLayout,
}

impl Scaler {
    pub fn new(format: NativePixelFormat, width: usize, height: usize) -> MixResult<Self> {
        let layout = NativeLayout::fill(format, width, height);
        if layout.plane_count() == 0 || width == 0 || height == 0 {
            return Err(MixError::configuration(format!(
                "no software conversion from {format:?} ({width}x{height}) to bgra"
            )));
        }
        Ok(Self { layout })
    }

    pub fn format(&self) -> NativePixelFormat {
        self.layout.format
    }

    /// Convert one picture, one output row per rayon task.
    pub fn convert(&self, planes: &[PlaneData], dst: &mut [u8]) -> MixResult<()> {
        check_planes(&self.layout, planes)?;
        let (width, height) = (self.layout.width, self.layout.height);
        if dst.len() != width * height * 4 {
            return Err(MixError::composition(format!(
                "scaler target holds {} bytes, expected {}",
                dst.len(),
                width * height * 4
            )));
        }

        let format = self.layout.format;
        dst.par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    px.copy_from_slice(&native_bgra(format, planes, x, y));
                }
            });
        Ok(())
    }
}

/// Straight-alpha `[b, g, r, a]` of one native pixel. Planes must have passed [`check_planes`].
fn native_bgra(format: NativePixelFormat, planes: &[PlaneData], x: usize, y: usize) -> [u8; 4] {
    use NativePixelFormat as N;

    let row = planes[0].row(y);
    match format {
        N::Bgra => [row[x * 4], row[x * 4 + 1], row[x * 4 + 2], row[x * 4 + 3]],
        N::Argb => [row[x * 4 + 3], row[x * 4 + 2], row[x * 4 + 1], row[x * 4]],
        N::Rgba => [row[x * 4 + 2], row[x * 4 + 1], row[x * 4], row[x * 4 + 3]],
        N::Abgr => [row[x * 4 + 1], row[x * 4 + 2], row[x * 4 + 3], row[x * 4]],
        N::Rgb24 => [row[x * 3 + 2], row[x * 3 + 1], row[x * 3], 255],
        N::Bgr24 => [row[x * 3], row[x * 3 + 1], row[x * 3 + 2], 255],
        N::Gray8 => [row[x], row[x], row[x], 255],
        N::Yuyv422 => {
            let pair = (x >> 1) * 4;
            let luma = row[pair + (x & 1) * 2];
            let [r, g, b] = ycbcr_to_rgb(luma, row[pair + 1], row[pair + 3]);
            [b, g, r, 255]
        }
        N::Nv12 => {
            let uv = planes[1].row(y >> 1);
            let [r, g, b] = ycbcr_to_rgb(row[x], uv[(x >> 1) * 2], uv[(x >> 1) * 2 + 1]);
            [b, g, r, 255]
        }
        N::Yuv444p | N::Yuv422p | N::Yuv420p | N::Yuv411p | N::Yuv410p | N::Yuva420p => {
            let (sw, sh) = format.chroma_shift().unwrap_or((0, 0));
            let (cx, cy) = (x >> sw, y >> sh);
            let [r, g, b] = ycbcr_to_rgb(row[x], planes[1].row(cy)[cx], planes[2].row(cy)[cx]);
            let a = match format {
                N::Yuva420p => planes[3].row(y)[x],
                _ => 255,
            };
            [b, g, r, a]
        }
        N::Other => [0, 0, 0, 0],
    }
}

/// Every plane the layout needs must exist with at least the layout's row bytes per row.
fn check_planes(layout: &NativeLayout, planes: &[PlaneData]) -> MixResult<()> {
    if planes.len() < layout.plane_count() {
        return Err(MixError::composition(format!(
            "{:?} picture needs {} planes, got {}",
            layout.format,
            layout.plane_count(),
            planes.len()
        )));
    }
    for n in 0..layout.plane_count() {
        let (row_bytes, rows) = (layout.linesizes[n], layout.plane_height(n));
        let plane = &planes[n];
        let needed = match rows {
            0 => 0,
            rows => plane.linesize * (rows - 1) + row_bytes,
        };
        if plane.linesize < row_bytes || plane.data.len() < needed {
            return Err(MixError::composition(format!(
                "plane {n} of {:?} picture is too small: linesize {} (need {row_bytes}), {} bytes (need {needed})",
                layout.format,
                plane.linesize,
                plane.data.len()
            )));
        }
    }
    Ok(())
}

/// Turns decoded pictures into mixer-ready [`WriteFrame`]s.
///
/// Canonical layouts are copied plane by plane; everything else goes through a [`Scaler`].
pub struct SoftwareColorConverter {
    codec: Box<dyn CodecBackend>,
    params: CodecParameters,
    target: VideoFormatDesc,
    factory: Arc<dyn FrameFactory>,
    scaler: Option<Scaler>,
}

impl SoftwareColorConverter {
    pub fn new(
        codec: Box<dyn CodecBackend>,
        target: &VideoFormatDesc,
        factory: Arc<dyn FrameFactory>,
        opts: ConverterOptions,
    ) -> MixResult<Self> {
        let params = codec.parameters().clone();

        let codec_interval = params.frame_interval_secs();
        let tick_interval = target.frame_interval_secs();
        if (codec_interval - tick_interval).abs() > FRAME_INTERVAL_TOLERANCE_SECS {
            return Err(MixError::configuration(format!(
                "frame rate mismatch: codec frame interval {codec_interval}s, output tick {tick_interval}s"
            )));
        }

        let scaler = if canonical_format(params.pixel_format) == PixelFormat::Invalid
            || opts.force_packed
        {
            tracing::warn!(
                codec = %params.name,
                format = ?params.pixel_format,
                "hardware accelerated color transform not supported; converting to bgra in software"
            );
            Some(Scaler::new(
                params.pixel_format,
                params.width as usize,
                params.height as usize,
            )?)
        } else {
            None
        };

        Ok(Self {
            codec,
            params,
            target: target.clone(),
            factory,
            scaler,
        })
    }

    pub fn uses_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Decode one packet and convert the picture it completes, if any.
    #[tracing::instrument(skip_all, fields(codec = %self.params.name))]
    pub fn execute(&mut self, packet: &CompressedPacket) -> MixResult<Option<WriteFrame>> {
        let Some(picture) = self.codec.decode(packet)? else {
            return Ok(None);
        };
        self.make_frame(
            picture.pixel_format,
            picture.width as usize,
            picture.height as usize,
            &picture.planes,
        )
        .map(Some)
    }

    /// Convert a picture already produced by a [`crate::VideoDecoder`].
    pub fn convert(&self, frame: &DecodedFrame) -> MixResult<WriteFrame> {
        self.make_frame(
            frame.pixel_format,
            frame.width as usize,
            frame.height as usize,
            &frame.planes,
        )
    }

    fn make_frame(
        &self,
        format: NativePixelFormat,
        width: usize,
        height: usize,
        planes: &[PlaneData],
    ) -> MixResult<WriteFrame> {
        let mut frame = match &self.scaler {
            Some(scaler) => {
                let scaler = if (scaler.format(), scaler.layout.width, scaler.layout.height)
                    == (format, width, height)
                {
                    scaler.clone()
                } else {
                    Scaler::new(format, width, height)?
                };
                let mut frame = self
                    .factory
                    .create_frame(&PixelFormatDescriptor::bgra(width, height));
                scaler.convert(planes, frame.image_data_mut(0))?;
                frame
            }
            None => self.copy_planes(format, width, height, planes)?,
        };

        if self.params.id == CodecId::DvVideo && self.target.field_mode == FieldMode::Upper {
            frame
                .transform_mut()
                .set_image_translation(0.0, 1.0 / f64::from(self.target.height));
        }
        Ok(frame)
    }

    fn copy_planes(
        &self,
        format: NativePixelFormat,
        width: usize,
        height: usize,
        planes: &[PlaneData],
    ) -> MixResult<WriteFrame> {
        let desc = plane_descriptor(format, width, height);
        if !desc.is_valid() {
            return Err(MixError::configuration(format!(
                "{format:?} picture has no canonical plane layout"
            )));
        }
        check_planes(&NativeLayout::fill(format, width, height), planes)?;

        let mut frame = self.factory.create_frame(&desc);
        frame.validate()?;
        frame
            .planes_mut()
            .par_iter_mut()
            .zip(desc.planes.par_iter())
            .zip(planes.par_iter())
            .for_each(|((dst, plane), src)| {
                let linesize = plane.linesize();
                if linesize == 0 {
                    return;
                }
                dst.par_chunks_mut(linesize)
                    .enumerate()
                    .for_each(|(y, row)| row.copy_from_slice(&src.row(y)[..linesize]));
            });
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/convert.rs"]
mod tests;
