use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use super::*;
use crate::{
    foundation::core::Fps,
    frame::write::WriteFrame,
    mixer::accel::{CompositeJob, ImageFuture},
    mixer::frame::DataFrame,
};

fn tiny() -> VideoFormatDesc {
    VideoFormatDesc::new("tiny", 1, 1, Fps::new(25, 1).unwrap()).unwrap()
}

fn solid(bgra: [u8; 4]) -> DrawFrame {
    DrawFrame::new(WriteFrame::solid_bgra(1, 1, bgra))
}

/// Panics on the n-th job, renders nothing otherwise.
struct FlakyAccel {
    calls: Arc<AtomicUsize>,
    panic_on: usize,
}

impl Accelerator for FlakyAccel {
    fn composite(&mut self, job: CompositeJob) -> ImageFuture {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == self.panic_on {
            panic!("device lost");
        }
        ImageFuture::ready(vec![0u8; job.width * job.height * 4])
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[test]
fn unset_layers_blend_normally() {
    let mixer = Mixer::cpu().unwrap();
    let layers = Layers::from([(0, solid([128, 128, 128, 255])), (1, solid([128, 255, 0, 255]))]);
    let frame = mixer.invoke(layers, &tiny());
    assert_eq!(&frame.image_data().unwrap()[..], &[128, 255, 0, 255]);
    assert_eq!(frame.tag(), mixer.tag());
}

#[test]
fn blend_mode_applies_to_the_next_tick() {
    let mixer = Mixer::cpu().unwrap();
    let layers = || Layers::from([(0, solid([128, 128, 128, 255])), (1, solid([128, 255, 0, 255]))]);

    mixer.set_blend_mode(1, BlendMode::Multiply);
    let frame = mixer.invoke(layers(), &tiny());
    assert_eq!(&frame.image_data().unwrap()[..], &[64, 128, 0, 255]);
}

#[test]
fn layers_are_mixed_by_index_not_insertion() {
    let mixer = Mixer::cpu().unwrap();
    let mut layers = Layers::new();
    layers.insert(10, solid([0, 0, 255, 255]));
    layers.insert(-5, solid([255, 0, 0, 255]));
    let frame = mixer.invoke(layers, &tiny());
    assert_eq!(&frame.image_data().unwrap()[..], &[0, 0, 255, 255]);
}

#[test]
fn failed_tick_returns_blank_and_mixer_recovers() {
    let mixer = Mixer::cpu().unwrap();
    let mut broken = WriteFrame::solid_bgra(1, 1, [1, 2, 3, 255]);
    broken.planes_mut()[0].clear();

    let frame = mixer.invoke(
        Layers::from([(0, solid([9, 9, 9, 255])), (1, DrawFrame::new(broken))]),
        &tiny(),
    );
    assert!(frame.is_empty());

    let frame = mixer.invoke(Layers::from([(0, solid([9, 9, 9, 255]))]), &tiny());
    assert_eq!(&frame.image_data().unwrap()[..], &[9, 9, 9, 255]);
}

#[test]
fn panicking_accelerator_only_loses_one_tick() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mixer = Mixer::new(Box::new(FlakyAccel {
        calls: calls.clone(),
        panic_on: 0,
    }))
    .unwrap();

    assert!(mixer.invoke(Layers::from([(0, solid([1; 4]))]), &tiny()).is_empty());
    let frame = mixer.invoke(Layers::from([(0, solid([1; 4]))]), &tiny());
    assert!(!frame.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn queued_ticks_complete_in_order() {
    let mixer = Mixer::cpu().unwrap();
    let handles: Vec<_> = (0..5u8)
        .map(|v| mixer.begin_invoke(Layers::from([(0, solid([v, v, v, 255]))]), &tiny()))
        .collect();
    for (v, handle) in handles.into_iter().enumerate() {
        let image = handle.wait().image_data().unwrap();
        assert_eq!(image[0], v as u8);
    }
}

#[test]
fn dropping_the_mixer_finishes_queued_ticks() {
    let mixer = Mixer::cpu().unwrap();
    let handle = mixer.begin_invoke(Layers::from([(0, solid([4; 4]))]), &tiny());
    drop(mixer);
    assert!(!handle.wait().is_empty());
}

#[test]
fn polled_tick_is_still_returned_by_wait() {
    let mixer = Mixer::cpu().unwrap();
    let mut handle = mixer.begin_invoke(Layers::from([(0, solid([9, 8, 7, 255]))]), &tiny());

    let polled = loop {
        if let Some(frame) = handle.try_get() {
            break frame.image_data().unwrap();
        }
        std::thread::sleep(Duration::from_millis(1));
    };
    assert!(handle.try_get().is_some());

    let frame = handle.wait();
    assert!(!frame.is_empty());
    assert_eq!(frame.image_data().unwrap(), polled);
    assert_eq!(&polled[..], &[9, 8, 7, 255]);
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A mixer whose worker has already gone away.
fn orphaned_mixer() -> Mixer {
    let (ticks, _) = channel::unbounded();
    let (priority, _) = channel::unbounded();
    Mixer {
        tag: ProducerTag::next(),
        accelerator: "cpu".to_string(),
        ticks: Some(ticks),
        priority: Some(priority),
        worker: None,
    }
}

#[test]
fn requests_to_a_stopped_worker_are_logged() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let frame = tracing::subscriber::with_default(subscriber, || {
        let mixer = orphaned_mixer();
        mixer.set_blend_mode(3, BlendMode::Screen);
        mixer.begin_invoke(Layers::new(), &tiny()).wait()
    });

    assert!(frame.is_empty());
    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains("blend mode dropped"), "{text}");
    assert!(text.contains("index=3"), "{text}");
    assert!(text.contains("tick dropped"), "{text}");
}

#[test]
fn info_is_available_immediately() {
    let mixer = Mixer::cpu().unwrap();
    let info = mixer.info();
    assert_eq!(info["type"], "mixer");
    assert_eq!(info["accelerator"], "cpu");
    assert_eq!(info["tag"], mixer.tag().id());
}

#[test]
fn settings_preload_blend_modes() {
    let settings: MixerSettings =
        serde_json::from_str(r#"{ "format": "pal", "blend_modes": { "1": "multiply" } }"#).unwrap();
    let mixer = Mixer::from_settings(&settings).unwrap();
    let layers = Layers::from([(0, solid([128, 128, 128, 255])), (1, solid([128, 255, 0, 255]))]);
    let frame = mixer.invoke(layers, &tiny());
    assert_eq!(&frame.image_data().unwrap()[..], &[64, 128, 0, 255]);
}
