use std::sync::Arc;

use crate::{
    foundation::core::{Fps, VideoFormatDesc},
    foundation::error::MixResult,
    frame::draw::{DrawFrame, FrameVisitor},
    frame::write::{FrameTransform, WriteFrame},
};

/// Interleaved `f32` samples for one tick.
pub type AudioBuffer = Vec<f32>;

/// Sums the audio of every visited frame into the current tick.
///
/// Output lengths follow the format's per-tick cadence. The cadence restarts whenever the
/// sample rate or frame rate changes.
#[derive(Debug, Default)]
pub struct AudioMixer {
    transforms: Vec<FrameTransform>,
    sum: Vec<f32>,
    tick: u64,
    clock: Option<(u32, Fps)>,
}

impl AudioMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, frame: &DrawFrame) -> MixResult<()> {
        frame.accept(self)
    }

    /// The tick's audio, exactly `desc.audio_buffer_len_for_tick(n)` samples in `[-1, 1]`
    /// for the n-th tick mixed at this format.
    pub fn finalize(&mut self, desc: &VideoFormatDesc) -> AudioBuffer {
        let tick = self.advance(desc);
        let mut out = std::mem::take(&mut self.sum);
        out.resize(desc.audio_buffer_len_for_tick(tick), 0.0);
        for sample in &mut out {
            *sample = sample.clamp(-1.0, 1.0);
        }
        self.transforms.clear();
        out
    }

    /// Drop a partially accumulated tick. The tick keeps its place in the cadence.
    pub fn reset(&mut self, desc: &VideoFormatDesc) {
        self.transforms.clear();
        self.sum.clear();
        self.advance(desc);
    }

    /// Position of the tick being closed, restarting on a clock change.
    fn advance(&mut self, desc: &VideoFormatDesc) -> u64 {
        let clock = (desc.audio_sample_rate, desc.fps);
        if self.clock != Some(clock) {
            self.clock = Some(clock);
            self.tick = 0;
        }
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);
        tick
    }

    fn current(&self) -> FrameTransform {
        self.transforms.last().copied().unwrap_or_default()
    }
}

impl FrameVisitor for AudioMixer {
    fn begin(&mut self, transform: &FrameTransform) {
        let combined = self.current().combine(transform);
        self.transforms.push(combined);
    }

    fn visit(&mut self, frame: &Arc<WriteFrame>) -> MixResult<()> {
        let samples = frame.audio_data();
        if samples.is_empty() {
            return Ok(());
        }
        let volume = self.current().volume as f32;
        if volume == 0.0 {
            return Ok(());
        }
        if self.sum.len() < samples.len() {
            self.sum.resize(samples.len(), 0.0);
        }
        for (acc, s) in self.sum.iter_mut().zip(samples) {
            *acc += s * volume;
        }
        Ok(())
    }

    fn end(&mut self) {
        self.transforms.pop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/audio.rs"]
mod tests;
