use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, OnceLock},
    thread::{self, JoinHandle},
};

use crossbeam::channel::{self, Receiver, Sender};
use rayon::prelude::*;

use crate::{
    foundation::error::{MixError, MixResult},
    frame::write::{FrameTransform, WriteFrame},
    mixer::blend::{BlendMode, composite_premul},
    pixel::color::sample_bgra,
};

/// One producer frame placed on a layer with its accumulated transform.
#[derive(Clone, Debug)]
pub struct CompositeItem {
    pub frame: Arc<WriteFrame>,
    pub transform: FrameTransform,
}

/// Items flattened together, then blended onto the layers beneath with `blend`.
#[derive(Clone, Debug, Default)]
pub struct CompositeLayer {
    pub blend: BlendMode,
    pub items: Vec<CompositeItem>,
}

/// Everything needed to produce one tick's image.
#[derive(Clone, Debug, Default)]
pub struct CompositeJob {
    pub width: usize,
    pub height: usize,
    /// Bottom to top.
    pub layers: Vec<CompositeLayer>,
}

type ImageResult = MixResult<Arc<[u8]>>;

struct Pending {
    rx: Option<Receiver<ImageResult>>,
    image: OnceLock<Result<Arc<[u8]>, String>>,
}

/// Deferred premultiplied BGRA image. Resolved at most once; clones share the result.
#[derive(Clone)]
pub struct ImageFuture(Arc<Pending>);

impl ImageFuture {
    pub(crate) fn pending(rx: Receiver<ImageResult>) -> Self {
        Self(Arc::new(Pending {
            rx: Some(rx),
            image: OnceLock::new(),
        }))
    }

    /// An already available image.
    pub fn ready(image: impl Into<Arc<[u8]>>) -> Self {
        Self(Arc::new(Pending {
            rx: None,
            image: OnceLock::from(Ok(image.into())),
        }))
    }

    pub(crate) fn failed(msg: impl Into<String>) -> Self {
        Self(Arc::new(Pending {
            rx: None,
            image: OnceLock::from(Err(msg.into())),
        }))
    }

    /// Whether [`ImageFuture::get`] would return without blocking.
    pub fn is_ready(&self) -> bool {
        self.0.image.get().is_some() || self.0.rx.as_ref().is_some_and(|rx| !rx.is_empty())
    }

    /// Block until the image is composited.
    pub fn get(&self) -> MixResult<Arc<[u8]>> {
        let settled = self.0.image.get_or_init(|| match &self.0.rx {
            Some(rx) => match rx.recv() {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err("accelerator dropped the composite job".to_string()),
            },
            None => Err("image future has no source".to_string()),
        });
        settled.clone().map_err(MixError::composition)
    }
}

impl fmt::Debug for ImageFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFuture")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Device that turns a [`CompositeJob`] into pixels.
///
/// Jobs submitted to one accelerator complete in submission order.
pub trait Accelerator: Send {
    fn composite(&mut self, job: CompositeJob) -> ImageFuture;
    fn name(&self) -> &str;
}

type Submission = (CompositeJob, Sender<ImageResult>);

/// Composites on a dedicated thread, rows in parallel on the rayon pool.
pub struct CpuAccelerator {
    jobs: Option<Sender<Submission>>,
    worker: Option<JoinHandle<()>>,
}

impl CpuAccelerator {
    pub fn new() -> MixResult<Self> {
        let (tx, rx) = channel::unbounded::<Submission>();
        let worker = thread::Builder::new()
            .name("tickmix-accel".into())
            .spawn(move || run(rx))
            .map_err(|e| MixError::Other(anyhow::anyhow!("spawn accelerator thread: {e}")))?;
        Ok(Self {
            jobs: Some(tx),
            worker: Some(worker),
        })
    }
}

fn run(rx: Receiver<Submission>) {
    tracing::debug!("cpu accelerator started");
    for (job, reply) in rx {
        let result = catch_unwind(AssertUnwindSafe(|| render(&job))).unwrap_or_else(|_| {
            Err(MixError::composition("cpu accelerator panicked while compositing"))
        });
        let _ = reply.send(result);
    }
    tracing::debug!("cpu accelerator stopped");
}

impl Accelerator for CpuAccelerator {
    fn composite(&mut self, job: CompositeJob) -> ImageFuture {
        let (reply, rx) = channel::bounded(1);
        match &self.jobs {
            Some(jobs) if jobs.send((job, reply)).is_ok() => ImageFuture::pending(rx),
            _ => ImageFuture::failed("cpu accelerator is not running"),
        }
    }

    fn name(&self) -> &str {
        "cpu"
    }
}

impl Drop for CpuAccelerator {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Flatten each layer's items with source-over, then blend the layer onto the canvas.
#[tracing::instrument(skip(job), fields(width = job.width, height = job.height))]
pub(crate) fn render(job: &CompositeJob) -> ImageResult {
    let (width, height) = (job.width, job.height);
    let mut canvas = vec![0u8; width * height * 4];
    if canvas.is_empty() {
        return Ok(canvas.into());
    }
    let stride = width * 4;
    let mut layer = vec![0u8; canvas.len()];

    for l in &job.layers {
        if l.items.is_empty() {
            continue;
        }
        layer.fill(0);
        for item in &l.items {
            item.frame.validate()?;
            draw_item(&mut layer, width, height, item)?;
        }
        canvas
            .par_chunks_mut(stride)
            .zip(layer.par_chunks(stride))
            .try_for_each(|(dst, src)| composite_premul(dst, src, 1.0, l.blend))?;
    }
    Ok(canvas.into())
}

/// Nearest-neighbor scale `item` to the full surface, offset by its translation.
fn draw_item(
    surface: &mut [u8],
    width: usize,
    height: usize,
    item: &CompositeItem,
) -> MixResult<()> {
    let frame = item.frame.as_ref();
    let (src_w, src_h) = (frame.width(), frame.height());
    if src_w == 0 || src_h == 0 {
        return Ok(());
    }
    let opacity = item.transform.opacity.clamp(0.0, 1.0) as f32;
    let tx = (item.transform.translation[0] * width as f64).round() as i64;
    let ty = (item.transform.translation[1] * height as f64).round() as i64;
    let (w, h) = (width as i64, height as i64);

    surface
        .par_chunks_mut(width * 4)
        .enumerate()
        .try_for_each(|(y, dst)| {
            let yy = y as i64 - ty;
            if !(0..h).contains(&yy) {
                return Ok(());
            }
            let sy = (yy * src_h as i64 / h) as usize;

            let mut row = vec![0u8; dst.len()];
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let xx = x as i64 - tx;
                if !(0..w).contains(&xx) {
                    continue;
                }
                let sx = (xx * src_w as i64 / w) as usize;
                let [b, g, r, a] = sample_bgra(frame, sx, sy);
                let alpha = f32::from(a) * opacity;
                let premul = |c: u8| (f32::from(c) * alpha / 255.0).round() as u8;
                px.copy_from_slice(&[premul(b), premul(g), premul(r), alpha.round() as u8]);
            }
            composite_premul(dst, &row, 1.0, BlendMode::Normal)
        })
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/accel.rs"]
mod tests;
