use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    thread::{self, JoinHandle},
};

use crossbeam::channel::{self, Receiver, Sender};

use crate::{
    foundation::core::VideoFormatDesc,
    foundation::error::{MixError, MixResult},
    frame::draw::DrawFrame,
    mixer::accel::{Accelerator, CpuAccelerator},
    mixer::audio::AudioMixer,
    mixer::blend::BlendMode,
    mixer::frame::{MixedFrame, ProducerTag},
    mixer::image::ImageMixer,
    mixer::settings::MixerSettings,
};

/// Layer content keyed by z-index, bottom first.
pub type Layers = BTreeMap<i32, DrawFrame>;

struct Tick {
    layers: Layers,
    format_desc: VideoFormatDesc,
    reply: Sender<MixedFrame>,
}

enum Priority {
    SetBlendMode { index: i32, mode: BlendMode },
}

/// Pending result of [`Mixer::begin_invoke`].
#[derive(Debug)]
pub struct TickHandle {
    rx: Receiver<MixedFrame>,
    frame: Option<MixedFrame>,
}

impl TickHandle {
    fn new(rx: Receiver<MixedFrame>) -> Self {
        Self { rx, frame: None }
    }

    /// Block until the tick has been mixed.
    pub fn wait(self) -> MixedFrame {
        if let Some(frame) = self.frame {
            return frame;
        }
        self.rx.recv().unwrap_or_else(|_| {
            tracing::error!("mixer worker stopped before finishing a tick");
            MixedFrame::empty()
        })
    }

    /// The mixed frame if the tick has finished. It stays in the handle for [`TickHandle::wait`].
    pub fn try_get(&mut self) -> Option<&MixedFrame> {
        if self.frame.is_none() {
            self.frame = self.rx.try_recv().ok();
        }
        self.frame.as_ref()
    }
}

/// Serializes every tick of audio and image mixing onto one worker thread.
///
/// Blend mode changes travel on a separate channel and are applied before the next queued
/// tick starts, never in the middle of one.
pub struct Mixer {
    tag: ProducerTag,
    accelerator: String,
    ticks: Option<Sender<Tick>>,
    priority: Option<Sender<Priority>>,
    worker: Option<JoinHandle<()>>,
}

impl Mixer {
    pub fn new(accel: Box<dyn Accelerator>) -> MixResult<Self> {
        let tag = ProducerTag::next();
        let accelerator = accel.name().to_string();
        let (tick_tx, tick_rx) = channel::unbounded::<Tick>();
        let (prio_tx, prio_rx) = channel::unbounded::<Priority>();

        let state = MixerState {
            tag,
            blend_modes: HashMap::new(),
            audio: AudioMixer::new(),
            image: ImageMixer::new(accel),
        };
        let worker = thread::Builder::new()
            .name(format!("tickmix-mixer-{}", tag.id()))
            .spawn(move || state.run(tick_rx, prio_rx))
            .map_err(|e| MixError::Other(anyhow::anyhow!("spawn mixer thread: {e}")))?;

        tracing::debug!(tag = %tag, accelerator = %accelerator, "mixer started");
        Ok(Self {
            tag,
            accelerator,
            ticks: Some(tick_tx),
            priority: Some(prio_tx),
            worker: Some(worker),
        })
    }

    /// A mixer compositing on the CPU.
    pub fn cpu() -> MixResult<Self> {
        Self::new(Box::new(CpuAccelerator::new()?))
    }

    /// A CPU mixer with the blend modes of `settings` already applied.
    pub fn from_settings(settings: &MixerSettings) -> MixResult<Self> {
        settings.validate()?;
        let mixer = Self::cpu()?;
        for (&index, &mode) in &settings.blend_modes {
            mixer.set_blend_mode(index, mode);
        }
        Ok(mixer)
    }

    pub fn tag(&self) -> ProducerTag {
        self.tag
    }

    /// Mix one tick and wait for it.
    pub fn invoke(&self, layers: Layers, format_desc: &VideoFormatDesc) -> MixedFrame {
        self.begin_invoke(layers, format_desc).wait()
    }

    /// Queue one tick behind any already submitted.
    pub fn begin_invoke(&self, layers: Layers, format_desc: &VideoFormatDesc) -> TickHandle {
        let (reply, rx) = channel::bounded(1);
        let tick = Tick {
            layers,
            format_desc: format_desc.clone(),
            reply,
        };
        if let Some(ticks) = &self.ticks
            && ticks.send(tick).is_err()
        {
            tracing::error!(tag = %self.tag, "mixer worker is gone; tick dropped");
        }
        TickHandle::new(rx)
    }

    /// Takes effect before the next tick that has not started yet.
    pub fn set_blend_mode(&self, index: i32, mode: BlendMode) {
        if let Some(priority) = &self.priority
            && priority
                .send(Priority::SetBlendMode { index, mode })
                .is_err()
        {
            tracing::error!(
                tag = %self.tag,
                index,
                mode = %mode,
                "mixer worker is gone; blend mode dropped"
            );
        }
    }

    /// Monitoring snapshot.
    pub fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "mixer",
            "tag": self.tag.id(),
            "accelerator": self.accelerator,
        })
    }
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("tag", &self.tag)
            .field("accelerator", &self.accelerator)
            .finish()
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.priority.take();
        self.ticks.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Everything only the worker thread touches.
struct MixerState {
    tag: ProducerTag,
    blend_modes: HashMap<i32, BlendMode>,
    audio: AudioMixer,
    image: ImageMixer,
}

impl MixerState {
    fn run(mut self, ticks: Receiver<Tick>, priority: Receiver<Priority>) {
        loop {
            crossbeam::select! {
                recv(priority) -> msg => match msg {
                    Ok(msg) => self.handle(msg),
                    Err(_) => break,
                },
                recv(ticks) -> tick => match tick {
                    Ok(tick) => {
                        self.drain(&priority);
                        self.serve(tick);
                    }
                    Err(_) => break,
                },
            }
        }
        // The mixer is being dropped; finish what was queued.
        for tick in ticks {
            self.serve(tick);
        }
        tracing::debug!(tag = %self.tag, "mixer stopped");
    }

    fn drain(&mut self, priority: &Receiver<Priority>) {
        while let Ok(msg) = priority.try_recv() {
            self.handle(msg);
        }
    }

    fn handle(&mut self, msg: Priority) {
        match msg {
            Priority::SetBlendMode { index, mode } => {
                tracing::debug!(index, mode = %mode, "blend mode set");
                self.blend_modes.insert(index, mode);
            }
        }
    }

    fn serve(&mut self, tick: Tick) {
        let frame = self.tick(&tick.layers, &tick.format_desc);
        let _ = tick.reply.send(frame);
    }

    /// One tick; failures yield a blank frame and leave the mixers clean for the next.
    #[tracing::instrument(skip_all, fields(tag = %self.tag, layers = layers.len()))]
    fn tick(&mut self, layers: &Layers, format_desc: &VideoFormatDesc) -> MixedFrame {
        match catch_unwind(AssertUnwindSafe(|| self.try_tick(layers, format_desc))) {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "mixer tick failed");
                self.reset(format_desc);
                MixedFrame::empty()
            }
            Err(panic) => {
                tracing::error!(panic = panic_message(panic.as_ref()), "mixer tick panicked");
                self.reset(format_desc);
                MixedFrame::empty()
            }
        }
    }

    fn try_tick(
        &mut self,
        layers: &Layers,
        format_desc: &VideoFormatDesc,
    ) -> MixResult<MixedFrame> {
        format_desc.validate()?;
        for (index, layer) in layers {
            let mode = self.blend_modes.get(index).copied().unwrap_or_default();
            self.image.begin_layer(mode);
            self.image.apply(layer)?;
            self.audio.apply(layer)?;
            self.image.end_layer();
        }
        let image = self.image.finalize(format_desc);
        let audio = self.audio.finalize(format_desc);
        Ok(MixedFrame::new(self.tag, image, audio, format_desc))
    }

    fn reset(&mut self, format_desc: &VideoFormatDesc) {
        self.audio.reset(format_desc);
        self.image.reset();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/orchestrator.rs"]
mod tests;
