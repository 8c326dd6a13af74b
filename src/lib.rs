//! tickmix decodes compressed video into raw frames and mixes layered frames into one
//! audio+image result per output tick.
//!
//! The pieces, leaves first:
//!
//! - [`VideoDecoder`] owns one [`CodecBackend`] and turns a stream's packets into
//!   [`DecodedFrame`]s, draining and flushing at end of stream
//! - [`plane_descriptor`] and [`SoftwareColorConverter`] turn decoded pictures into
//!   [`WriteFrame`]s the mixer can consume
//! - [`Mixer`] composites a [`Layers`] map of [`DrawFrame`]s on a dedicated worker, once per
//!   tick, into an immutable [`MixedFrame`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod decode;
pub(crate) mod frame;
pub(crate) mod mixer;
pub(crate) mod monitor;
pub(crate) mod pixel;

pub use crate::foundation::core::{
    DEFAULT_AUDIO_CHANNELS, DEFAULT_AUDIO_SAMPLE_RATE, FieldMode, Fps, VideoFormatDesc,
};
pub use crate::foundation::error::{MixError, MixResult};

pub use crate::decode::codec::{CodecBackend, CodecId, CodecParameters, CodecPicture, PlaneData};
pub use crate::decode::packet::CompressedPacket;
pub use crate::decode::video::{
    DecodedFrame, DecoderOutput, DecoderState, FieldOrder, PacketSink, VideoDecoder,
};
pub use crate::frame::draw::{DrawFrame, FrameVisitor};
pub use crate::frame::write::{DefaultFrameFactory, FrameFactory, FrameTransform, WriteFrame};
pub use crate::mixer::accel::{
    Accelerator, CompositeItem, CompositeJob, CompositeLayer, CpuAccelerator, ImageFuture,
};
pub use crate::mixer::audio::{AudioBuffer, AudioMixer};
pub use crate::mixer::blend::BlendMode;
pub use crate::mixer::frame::{DataFrame, MixedFrame, ProducerTag};
pub use crate::mixer::image::ImageMixer;
pub use crate::mixer::orchestrator::{Layers, Mixer, TickHandle};
pub use crate::mixer::settings::{FormatSetting, MixerSettings};
pub use crate::monitor::events::{
    MetricEvent, MetricValue, MetricsLog, MetricsSink, NullSink, TracingSink,
};
pub use crate::pixel::color::{rgb_to_ycbcr, ycbcr_to_rgb};
pub use crate::pixel::convert::{ConverterOptions, Scaler, SoftwareColorConverter};
pub use crate::pixel::format::{
    PixelFormat, PixelFormatDescriptor, Plane, canonical_format, plane_descriptor,
};
pub use crate::pixel::layout::{NativeLayout, NativePixelFormat};
