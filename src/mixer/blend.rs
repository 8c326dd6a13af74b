use std::{fmt, str::FromStr};

use crate::foundation::{
    error::{MixError, MixResult},
    math::{clamp_u8, mul_div255_u8},
};

/// How a flattened layer is combined with everything beneath it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    pub const ALL: [BlendMode; 12] = [
        Self::Normal,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::SoftLight,
        Self::HardLight,
        Self::Difference,
        Self::Exclusion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color_dodge",
            Self::ColorBurn => "color_burn",
            Self::SoftLight => "soft_light",
            Self::HardLight => "hard_light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = MixError;

    /// Accepts `color_dodge`, `color-dodge` and `colordodge`, case-insensitively.
    fn from_str(s: &str) -> MixResult<Self> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().replace('_', "") == wanted)
            .ok_or_else(|| MixError::validation(format!("unknown blend mode '{s}'")))
    }
}

/// Composite premultiplied 4-byte pixels of `src` onto `dst` in place.
///
/// Channel order is irrelevant as long as alpha is the fourth byte.
pub(crate) fn composite_premul(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: BlendMode,
) -> MixResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(MixError::composition(
            "composite_premul expects equal-length 4-byte pixel buffers",
        ));
    }

    // Mode is dispatched once per call; each arm gets its own monomorphized kernel.
    match mode {
        BlendMode::Normal => {
            over(dst, src, opacity);
        }
        BlendMode::Multiply => separable(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => separable(dst, src, opacity, |s, d| s + d - s * d),
        BlendMode::Overlay => separable(dst, src, opacity, |s, d| hard_light(d, s)),
        BlendMode::Darken => separable(dst, src, opacity, f32::min),
        BlendMode::Lighten => separable(dst, src, opacity, f32::max),
        BlendMode::ColorDodge => separable(dst, src, opacity, |s, d| {
            if s >= 1.0 {
                1.0
            } else {
                (d / (1.0 - s)).min(1.0)
            }
        }),
        BlendMode::ColorBurn => separable(dst, src, opacity, |s, d| {
            if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - d) / s).min(1.0)
            }
        }),
        BlendMode::SoftLight => separable(dst, src, opacity, soft_light),
        BlendMode::HardLight => separable(dst, src, opacity, hard_light),
        BlendMode::Difference => separable(dst, src, opacity, |s, d| (d - s).abs()),
        BlendMode::Exclusion => separable(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
    }
    Ok(())
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

fn soft_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        return d - (1.0 - 2.0 * s) * d * (1.0 - d);
    }
    let g = if d <= 0.25 {
        ((16.0 * d - 12.0) * d + 4.0) * d
    } else {
        d.sqrt()
    };
    d + (2.0 * s - 1.0) * (g - d)
}

/// Integer source-over with a global opacity.
fn over(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    if op == 0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255 - u16::from(sa);
        d[3] = sa.saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            d[c] = sc.saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
}

/// Source-over where the overlapping region takes `B(src, dst)` of the straight colors:
/// `out_a = sa + da(1 - sa)`, `out_p = sp(1 - da) + dp(1 - sa) + B(sc, dc) sa da`.
#[inline(always)]
fn separable<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend: F)
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = f32::from(s[3]) / 255.0 * opacity;
        let da = f32::from(d[3]) / 255.0;
        if sa <= 0.0 {
            continue;
        }

        for c in 0..3 {
            let sp = f32::from(s[c]) / 255.0 * opacity;
            let dp = f32::from(d[c]) / 255.0;
            let sc = (sp / sa).clamp(0.0, 1.0);
            let dc = if da > 0.0 { (dp / da).clamp(0.0, 1.0) } else { 0.0 };
            let b = blend(sc, dc).clamp(0.0, 1.0);
            d[c] = to_u8(sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da);
        }
        d[3] = to_u8(sa + da * (1.0 - sa));
    }
}

fn to_u8(v: f32) -> u8 {
    clamp_u8(v * 255.0)
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/blend.rs"]
mod tests;
