use super::*;
use crate::mixer::accel::CpuAccelerator;

/// Records jobs instead of rendering them.
#[derive(Default)]
struct RecordingAccel {
    jobs: std::sync::Arc<std::sync::Mutex<Vec<CompositeJob>>>,
}

impl Accelerator for RecordingAccel {
    fn composite(&mut self, job: CompositeJob) -> ImageFuture {
        let len = job.width * job.height * 4;
        self.jobs.lock().unwrap().push(job);
        ImageFuture::ready(vec![0u8; len])
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn tiny() -> VideoFormatDesc {
    let fps = crate::foundation::core::Fps::new(25, 1).unwrap();
    VideoFormatDesc::new("tiny", 2, 2, fps).unwrap()
}

fn solid(bgra: [u8; 4]) -> DrawFrame {
    DrawFrame::new(WriteFrame::solid_bgra(2, 2, bgra))
}

#[test]
fn layers_carry_their_blend_modes_and_transforms() {
    let accel = RecordingAccel::default();
    let jobs = accel.jobs.clone();
    let mut mixer = ImageMixer::new(Box::new(accel));

    mixer.begin_layer(BlendMode::Normal);
    mixer.apply(&solid([1, 1, 1, 255])).unwrap();
    mixer.end_layer();

    let faded = FrameTransform {
        opacity: 0.5,
        ..FrameTransform::default()
    };
    mixer.begin_layer(BlendMode::Screen);
    mixer
        .apply(&DrawFrame::group(vec![solid([2, 2, 2, 255]), solid([3, 3, 3, 255])]).with_transform(faded))
        .unwrap();
    mixer.end_layer();

    let image = mixer.finalize(&tiny());
    assert_eq!(image.get().unwrap().len(), 16);

    let jobs = jobs.lock().unwrap();
    let job = &jobs[0];
    assert_eq!((job.width, job.height), (2, 2));
    assert_eq!(job.layers.len(), 2);
    assert_eq!(job.layers[0].blend, BlendMode::Normal);
    assert_eq!(job.layers[1].blend, BlendMode::Screen);
    assert_eq!(job.layers[1].items.len(), 2);
    assert_eq!(job.layers[1].items[1].transform.opacity, 0.5);
}

#[test]
fn apply_outside_a_layer_is_an_error() {
    let mut mixer = ImageMixer::new(Box::new(RecordingAccel::default()));
    assert!(matches!(
        mixer.apply(&solid([0; 4])),
        Err(MixError::Composition(_))
    ));
}

#[test]
fn reset_drops_collected_layers() {
    let accel = RecordingAccel::default();
    let jobs = accel.jobs.clone();
    let mut mixer = ImageMixer::new(Box::new(accel));
    mixer.begin_layer(BlendMode::Multiply);
    mixer.apply(&solid([5; 4])).unwrap();
    mixer.reset();

    let _ = mixer.finalize(&tiny());
    assert!(jobs.lock().unwrap()[0].layers.is_empty());
}

#[test]
fn cpu_backed_mixer_renders_premultiplied_bgra() {
    let mut mixer = ImageMixer::new(Box::new(CpuAccelerator::new().unwrap()));
    assert_eq!(mixer.accelerator_name(), "cpu");
    mixer.begin_layer(BlendMode::Normal);
    mixer.apply(&solid([10, 20, 30, 255])).unwrap();
    mixer.end_layer();

    let image = mixer.finalize(&tiny()).get().unwrap();
    assert_eq!(&image[..4], &[10, 20, 30, 255]);
}
