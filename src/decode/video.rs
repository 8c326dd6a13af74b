use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    decode::codec::{CodecBackend, CodecPicture, PlaneData},
    decode::packet::CompressedPacket,
    foundation::error::{MixError, MixResult},
    monitor::events::{MetricEvent, MetricsSink, NullSink},
    pixel::layout::NativePixelFormat,
};

/// Where a decoder is in its stream lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderState {
    Init,
    Receiving,
    /// The front of the queue is the end-of-stream marker; buffered pictures are released.
    Draining,
    /// The marker was consumed and the codec reset. Only a [`VideoDecoder::clear`] re-arms it.
    Flushed,
}

/// Field structure of a decoded picture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrder {
    Progressive,
    Upper,
    Lower,
}

impl FieldOrder {
    fn of(picture: &CodecPicture) -> Self {
        if !picture.interlaced {
            Self::Progressive
        } else if picture.top_field_first {
            Self::Upper
        } else {
            Self::Lower
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Progressive => "progressive",
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }
}

/// A decoded picture stamped with its presentation number.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFrame {
    pub planes: Vec<PlaneData>,
    pub width: u32,
    pub height: u32,
    pub pixel_format: NativePixelFormat,
    pub field_order: FieldOrder,
    pub presentation: u32,
}

/// What one [`VideoDecoder::poll`] produced.
#[derive(Clone, Debug, PartialEq)]
pub enum DecoderOutput {
    Frame(DecodedFrame),
    /// The stream ended; downstream should flush anything it holds.
    Flush,
    /// A passthrough packet that carries no picture.
    Empty,
}

type PacketQueue = Arc<Mutex<VecDeque<CompressedPacket>>>;

fn lock(queue: &PacketQueue) -> MutexGuard<'_, VecDeque<CompressedPacket>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

fn enqueue(queue: &PacketQueue, stream_index: usize, packet: CompressedPacket) {
    if packet.stream_index == stream_index || packet.is_end_of_stream() {
        lock(queue).push_back(packet);
    }
}

/// Cloneable push side of a decoder's queue, for a demuxer running on another thread.
#[derive(Clone, Debug)]
pub struct PacketSink {
    stream_index: usize,
    queue: PacketQueue,
}

impl PacketSink {
    pub fn push(&self, packet: CompressedPacket) {
        enqueue(&self.queue, self.stream_index, packet);
    }
}

/// Packet queue and decode state machine for one video stream.
pub struct VideoDecoder {
    stream_index: usize,
    codec: Option<Box<dyn CodecBackend>>,
    queue: PacketQueue,
    nominal_frames: u32,
    width: u32,
    height: u32,
    progressive: bool,
    file_frame_number: u32,
    high_water: u32,
    state: DecoderState,
    metrics: Arc<dyn MetricsSink>,
}

impl VideoDecoder {
    /// Take ownership of `codec` for `stream_index`. `nominal_frames` is the container's
    /// frame-count estimate, which only ever raises [`VideoDecoder::total_frames`].
    pub fn new(stream_index: usize, codec: Box<dyn CodecBackend>, nominal_frames: u32) -> Self {
        let params = codec.parameters();
        let (width, height) = (params.width, params.height);
        Self {
            stream_index,
            codec: Some(codec),
            queue: PacketQueue::default(),
            nominal_frames,
            width,
            height,
            progressive: true,
            file_frame_number: 0,
            high_water: 0,
            state: DecoderState::Init,
            metrics: Arc::new(NullSink),
        }
    }

    /// A decoder without codec context: packets are passed through as empty or flush outputs.
    pub fn passthrough(stream_index: usize) -> Self {
        Self {
            stream_index,
            codec: None,
            queue: PacketQueue::default(),
            nominal_frames: 0,
            width: 0,
            height: 0,
            progressive: true,
            file_frame_number: 0,
            high_water: 0,
            state: DecoderState::Init,
            metrics: Arc::new(NullSink),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn sink(&self) -> PacketSink {
        PacketSink {
            stream_index: self.stream_index,
            queue: self.queue.clone(),
        }
    }

    pub fn push(&self, packet: CompressedPacket) {
        enqueue(&self.queue, self.stream_index, packet);
    }

    /// Advance the state machine by at most one queued packet.
    pub fn poll(&mut self) -> MixResult<Option<DecoderOutput>> {
        let Some(front_is_marker) = lock(&self.queue).front().map(|p| p.is_end_of_stream())
        else {
            return Ok(None);
        };

        if self.state == DecoderState::Flushed {
            return Ok(self.poll_flushed());
        }

        if self.codec.is_none() {
            let Some(packet) = self.pop() else {
                return Ok(None);
            };
            if packet.is_end_of_stream() {
                self.state = DecoderState::Flushed;
                return Ok(Some(DecoderOutput::Flush));
            }
            self.state = DecoderState::Receiving;
            return Ok(Some(DecoderOutput::Empty));
        }

        if front_is_marker {
            self.state = DecoderState::Draining;
            let delayed = self
                .codec
                .as_ref()
                .is_some_and(|codec| codec.supports_delayed_output());
            if delayed {
                let marker = CompressedPacket::end_of_stream(self.stream_index);
                if let Some(frame) = self.decode(&marker)? {
                    return Ok(Some(DecoderOutput::Frame(frame)));
                }
            }

            self.pop();
            if let Some(codec) = self.codec.as_mut() {
                codec.flush();
            }
            self.state = DecoderState::Flushed;
            tracing::debug!(stream = self.stream_index, "video decoder flushed");
            return Ok(Some(DecoderOutput::Flush));
        }

        let Some(packet) = self.pop() else {
            return Ok(None);
        };
        self.state = DecoderState::Receiving;
        Ok(self.decode(&packet)?.map(DecoderOutput::Frame))
    }

    fn poll_flushed(&mut self) -> Option<DecoderOutput> {
        while let Some(packet) = self.pop() {
            if packet.is_end_of_stream() {
                return Some(DecoderOutput::Flush);
            }
            tracing::debug!(
                stream = self.stream_index,
                "discarding packet queued after end of stream"
            );
        }
        None
    }

    fn pop(&self) -> Option<CompressedPacket> {
        lock(&self.queue).pop_front()
    }

    /// Run one packet through the codec. `Ok(None)` when the codec needs more input.
    pub fn decode(&mut self, packet: &CompressedPacket) -> MixResult<Option<DecodedFrame>> {
        let Some(codec) = self.codec.as_mut() else {
            return Ok(None);
        };
        let picture = match codec.decode(packet) {
            Ok(Some(picture)) => picture,
            Ok(None) => return Ok(None),
            Err(MixError::Decode(msg)) => return Err(MixError::Decode(msg)),
            Err(e) => {
                return Err(MixError::decode(format!(
                    "{}: {e}",
                    codec.parameters().name
                )));
            }
        };

        self.progressive = !picture.interlaced;
        let field_order = FieldOrder::of(&picture);

        if picture.repeat_pict > 0 {
            tracing::warn!(
                repeat_pict = picture.repeat_pict,
                "repeated field pictures are not implemented; presenting picture once"
            );
        }

        let params = codec.parameters();
        self.metrics
            .send(MetricEvent::new("file/video/width", params.width));
        self.metrics
            .send(MetricEvent::new("file/video/height", params.height));
        self.metrics
            .send(MetricEvent::new("file/video/field", field_order.as_str()));
        self.metrics
            .send(MetricEvent::new("file/video/codec", params.name.as_str()));

        let presentation = picture
            .pts
            .or(packet.pts)
            .map(|pts| u32::try_from(pts.max(0)).unwrap_or(u32::MAX))
            .unwrap_or_else(|| self.file_frame_number.saturating_add(1));
        self.file_frame_number = presentation;
        self.high_water = self.high_water.max(presentation);

        Ok(Some(DecodedFrame {
            planes: picture.planes,
            width: picture.width,
            height: picture.height,
            pixel_format: picture.pixel_format,
            field_order,
            presentation,
        }))
    }

    pub fn ready(&self) -> bool {
        !lock(&self.queue).is_empty()
    }

    /// Drop every queued packet, e.g. on a seek or loop. A flushed decoder becomes usable again.
    pub fn clear(&mut self) {
        lock(&self.queue).clear();
        if self.state == DecoderState::Flushed {
            self.state = DecoderState::Init;
        }
    }

    /// Best known stream length: never below the highest presentation number decoded so far.
    pub fn total_frames(&self) -> u32 {
        self.nominal_frames.max(self.high_water)
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_progressive(&self) -> bool {
        self.progressive
    }

    /// Presentation number of the most recently decoded picture.
    pub fn file_frame_number(&self) -> u32 {
        self.file_frame_number
    }
}

impl fmt::Display for VideoDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.codec {
            Some(codec) => write!(f, "[video-decoder] {}", codec.parameters().name),
            None => write!(f, "[video-decoder] passthrough"),
        }
    }
}

impl fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("stream_index", &self.stream_index)
            .field("state", &self.state)
            .field("queued", &lock(&self.queue).len())
            .field("total_frames", &self.total_frames())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/video.rs"]
mod tests;
