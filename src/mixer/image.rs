use std::sync::Arc;

use crate::{
    foundation::core::VideoFormatDesc,
    foundation::error::{MixError, MixResult},
    frame::draw::{DrawFrame, FrameVisitor},
    frame::write::{FrameTransform, WriteFrame},
    mixer::accel::{Accelerator, CompositeItem, CompositeJob, CompositeLayer, ImageFuture},
    mixer::blend::BlendMode,
};

/// Collects one tick's layers and hands them to an [`Accelerator`].
pub struct ImageMixer {
    accel: Box<dyn Accelerator>,
    transforms: Vec<FrameTransform>,
    layers: Vec<CompositeLayer>,
    open: Option<CompositeLayer>,
}

impl ImageMixer {
    pub fn new(accel: Box<dyn Accelerator>) -> Self {
        Self {
            accel,
            transforms: Vec::new(),
            layers: Vec::new(),
            open: None,
        }
    }

    pub fn accelerator_name(&self) -> &str {
        self.accel.name()
    }

    pub fn begin_layer(&mut self, blend: BlendMode) {
        if let Some(unclosed) = self.open.take() {
            self.layers.push(unclosed);
        }
        self.open = Some(CompositeLayer {
            blend,
            items: Vec::new(),
        });
    }

    pub fn end_layer(&mut self) {
        if let Some(layer) = self.open.take() {
            self.layers.push(layer);
        }
    }

    pub fn apply(&mut self, frame: &DrawFrame) -> MixResult<()> {
        if self.open.is_none() {
            return Err(MixError::composition("image mixer applied outside of a layer"));
        }
        frame.accept(self)
    }

    /// Submit the tick to the accelerator and start over.
    pub fn finalize(&mut self, desc: &VideoFormatDesc) -> ImageFuture {
        self.end_layer();
        self.transforms.clear();
        let job = CompositeJob {
            width: desc.width as usize,
            height: desc.height as usize,
            layers: std::mem::take(&mut self.layers),
        };
        tracing::trace!(layers = job.layers.len(), "submitting composite job");
        self.accel.composite(job)
    }

    /// Drop a partially collected tick.
    pub fn reset(&mut self) {
        self.transforms.clear();
        self.layers.clear();
        self.open = None;
    }

    fn current(&self) -> FrameTransform {
        self.transforms.last().copied().unwrap_or_default()
    }
}

impl FrameVisitor for ImageMixer {
    fn begin(&mut self, transform: &FrameTransform) {
        let combined = self.current().combine(transform);
        self.transforms.push(combined);
    }

    fn visit(&mut self, frame: &Arc<WriteFrame>) -> MixResult<()> {
        frame.validate()?;
        let transform = self.current();
        let Some(layer) = self.open.as_mut() else {
            return Err(MixError::composition(
                "image mixer visited a frame outside of a layer",
            ));
        };
        layer.items.push(CompositeItem {
            frame: Arc::clone(frame),
            transform,
        });
        Ok(())
    }

    fn end(&mut self) {
        self.transforms.pop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/image.rs"]
mod tests;
