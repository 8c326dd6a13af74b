use super::*;
use crate::pixel::{format::plane_descriptor, layout::NativePixelFormat};

#[test]
fn studio_range_extremes() {
    assert_eq!(ycbcr_to_rgb(16, 128, 128), [0, 0, 0]);
    assert_eq!(ycbcr_to_rgb(235, 128, 128), [255, 255, 255]);
    assert_eq!(rgb_to_ycbcr(0, 0, 0), [16, 128, 128]);
    assert_eq!(rgb_to_ycbcr(255, 255, 255), [235, 128, 128]);
}

#[test]
fn primaries_survive_a_round_trip() {
    for rgb in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [200, 120, 40]] {
        let [y, cb, cr] = rgb_to_ycbcr(rgb[0], rgb[1], rgb[2]);
        let back = ycbcr_to_rgb(y, cb, cr);
        for (a, b) in rgb.iter().zip(back) {
            assert!(a.abs_diff(b) <= 3, "{rgb:?} came back as {back:?}");
        }
    }
}

#[test]
fn packed_orders_are_normalized_to_bgra() {
    let mut frame = WriteFrame::new(crate::pixel::format::PixelFormatDescriptor {
        format: PixelFormat::Rgba,
        planes: vec![crate::pixel::format::Plane::new(1, 1, 4)],
    });
    frame.image_data_mut(0).copy_from_slice(&[10, 20, 30, 40]);
    assert_eq!(sample_bgra(&frame, 0, 0), [30, 20, 10, 40]);
    assert_eq!(sample_bgra(&frame, 1, 0), [0; 4]);
}

#[test]
fn planar_frames_sample_subsampled_chroma() {
    let mut frame = WriteFrame::new(plane_descriptor(NativePixelFormat::Yuv420p, 4, 2));
    let [y, cb, cr] = rgb_to_ycbcr(0, 0, 255);
    frame.image_data_mut(0).fill(y);
    frame.image_data_mut(1).fill(cb);
    frame.image_data_mut(2).fill(cr);

    let [b, g, r, a] = sample_bgra(&frame, 3, 1);
    assert!(b >= 250 && g <= 5 && r <= 5, "got {b} {g} {r}");
    assert_eq!(a, 255);
}
