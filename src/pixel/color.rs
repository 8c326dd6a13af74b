use crate::{frame::write::WriteFrame, pixel::format::PixelFormat};

/// BT.601 studio-range YCbCr to `[r, g, b]`.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let c = 298 * (i32::from(y) - 16);
    let d = i32::from(cb) - 128;
    let e = i32::from(cr) - 128;
    [
        clamp_i32((c + 409 * e + 128) >> 8),
        clamp_i32((c - 100 * d - 208 * e + 128) >> 8),
        clamp_i32((c + 516 * d + 128) >> 8),
    ]
}

/// Inverse of [`ycbcr_to_rgb`], returned as `[y, cb, cr]`.
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    [
        clamp_i32(((66 * r + 129 * g + 25 * b + 128) >> 8) + 16),
        clamp_i32(((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128),
        clamp_i32(((112 * r - 94 * g - 18 * b + 128) >> 8) + 128),
    ]
}

fn clamp_i32(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Straight-alpha `[b, g, r, a]` of pixel `(x, y)` in any canonical-format frame.
///
/// Chroma planes are addressed proportionally to their size relative to the luma plane.
/// Out of range coordinates and malformed frames read as transparent black.
pub(crate) fn sample_bgra(frame: &WriteFrame, x: usize, y: usize) -> [u8; 4] {
    let desc = frame.desc();
    let Some(luma) = desc.planes.first() else {
        return [0; 4];
    };
    if x >= luma.width || y >= luma.height {
        return [0; 4];
    }

    if let Some([ob, og, or, oa]) = desc.format.packed_bgra_offsets() {
        let i = (y * luma.width + x) * 4;
        return match frame.image_data(0).get(i..i + 4) {
            Some(px) => [px[ob], px[og], px[or], px[oa]],
            None => [0; 4],
        };
    }

    if !desc.format.is_planar_ycbcr() || desc.planes.len() < 3 {
        return [0; 4];
    }
    let chroma = desc.planes[1];
    let cx = x * chroma.width / luma.width;
    let cy = y * chroma.height / luma.height;
    let at = |plane: usize, index: usize| frame.image_data(plane).get(index).copied();

    let (Some(yv), Some(cb), Some(cr)) = (
        at(0, y * luma.width + x),
        at(1, cy * chroma.width + cx),
        at(2, cy * chroma.width + cx),
    ) else {
        return [0; 4];
    };
    let alpha = match desc.format {
        PixelFormat::Ycbcra => at(3, y * luma.width + x).unwrap_or(255),
        _ => 255,
    };
    let [r, g, b] = ycbcr_to_rgb(yv, cb, cr);
    [b, g, r, alpha]
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/color.rs"]
mod tests;
