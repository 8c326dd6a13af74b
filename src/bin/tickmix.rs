use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tickmix::{
    BlendMode, DataFrame, DrawFrame, FrameTransform, Layers, Mixer, MixerSettings,
    NativePixelFormat, VideoFormatDesc, WriteFrame, plane_descriptor, rgb_to_ycbcr,
};

#[derive(Parser, Debug)]
#[command(name = "tickmix", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mix synthetic layers for a number of ticks and write each tick as a PNG.
    Render(RenderArgs),
    /// List the built-in video formats.
    Formats,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Output video format (preset name). Overrides the settings file.
    #[arg(long)]
    format: Option<String>,

    /// Number of ticks to mix.
    #[arg(long, default_value_t = 25)]
    ticks: u32,

    /// Output directory for `tick_NNNNN.png` files.
    #[arg(long)]
    out: PathBuf,

    /// Mixer settings JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Blend mode for a layer, as `INDEX=MODE` (repeatable).
    #[arg(long = "blend", value_parser = parse_blend)]
    blends: Vec<(i32, BlendMode)>,
}

fn parse_blend(s: &str) -> Result<(i32, BlendMode), String> {
    let (index, mode) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=MODE, got '{s}'"))?;
    let index = index
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad layer index '{index}': {e}"))?;
    let mode = mode.parse::<BlendMode>().map_err(|e| e.to_string())?;
    Ok((index, mode))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Formats => {
            for name in VideoFormatDesc::preset_names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut settings = match &args.config {
        Some(path) => MixerSettings::from_path(path)?,
        None => MixerSettings::default(),
    };
    if let Some(format) = &args.format {
        settings.format = tickmix::FormatSetting::Preset(format.clone());
    }
    settings.blend_modes.extend(args.blends.iter().copied());
    let desc = settings.format_desc()?;

    let mixer = Mixer::from_settings(&settings)?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let bars = bars_layer()?;
    for tick in 0..args.ticks {
        let layers = Layers::from([
            (0, bars.clone()),
            (1, sweep_layer(&desc, tick)),
            (2, lower_third_layer()),
        ]);
        let frame = mixer.invoke(layers, &desc);
        if frame.is_empty() {
            anyhow::bail!("tick {tick} failed to mix");
        }

        let rgba = premul_bgra_to_rgba(&frame.image_data()?);
        let path = args.out.join(format!("tick_{tick:05}.png"));
        image::save_buffer_with_format(
            &path,
            &rgba,
            desc.width,
            desc.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;

        let peak = frame
            .audio_data()
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        println!("tick {tick:5}  audio peak {peak:.3}  {}", path.display());
    }

    eprintln!("wrote {} ticks to {}", args.ticks, args.out.display());
    Ok(())
}

/// Seven vertical SMPTE-style bars.
fn bars_layer() -> anyhow::Result<DrawFrame> {
    const BARS: [[u8; 4]; 7] = [
        [191, 191, 191, 255],
        [0, 191, 191, 255],
        [191, 191, 0, 255],
        [0, 191, 0, 255],
        [191, 0, 191, 255],
        [0, 0, 191, 255],
        [191, 0, 0, 255],
    ];
    let width = BARS.len();
    let data: Vec<u8> = BARS.iter().flatten().copied().collect();
    Ok(DrawFrame::new(WriteFrame::from_bgra(width, 1, data)?))
}

/// A horizontal color ramp in planar 4:2:0 sliding across the output, with a 440 Hz tone.
fn sweep_layer(desc: &VideoFormatDesc, tick: u32) -> DrawFrame {
    let (w, h) = (64usize, 16usize);
    let mut frame = WriteFrame::new(plane_descriptor(NativePixelFormat::Yuv420p, w, h));
    let chroma_w = frame.desc().planes[1].width;

    let colors: Vec<[u8; 3]> = (0..w)
        .map(|x| {
            let t = (x * 255 / (w - 1)) as u8;
            rgb_to_ycbcr(t, 64, 255 - t)
        })
        .collect();
    for (row_index, row) in frame.image_data_mut(0).chunks_exact_mut(w).enumerate() {
        for (x, y) in row.iter_mut().enumerate() {
            *y = colors[x][0].saturating_add((row_index % 2) as u8);
        }
    }
    for plane in [1, 2] {
        for row in frame.image_data_mut(plane).chunks_exact_mut(chroma_w) {
            for (cx, c) in row.iter_mut().enumerate() {
                *c = colors[(cx * 2).min(w - 1)][plane];
            }
        }
    }

    let spt = desc.audio_samples_for_tick(u64::from(tick));
    let start = desc.audio_samples_before_tick(u64::from(tick));
    let channels = usize::from(desc.audio_channels);
    let rate = f64::from(desc.audio_sample_rate);
    let mut audio = Vec::with_capacity(spt * channels);
    for i in 0..spt {
        let n = start + i as u64;
        let s = (std::f64::consts::TAU * 440.0 * n as f64 / rate).sin() as f32 * 0.5;
        audio.extend(std::iter::repeat_n(s, channels));
    }

    let offset = f64::from(tick % 50) / 50.0 - 0.5;
    DrawFrame::new(frame.with_audio(audio)).with_transform(FrameTransform {
        opacity: 0.8,
        volume: 0.5,
        translation: [offset, 0.0],
    })
}

/// A translucent band over the bottom quarter.
fn lower_third_layer() -> DrawFrame {
    let mut frame = WriteFrame::solid_bgra(1, 4, [0; 4]);
    frame.image_data_mut(0)[12..].copy_from_slice(&[40, 20, 10, 200]);
    DrawFrame::new(frame)
}

fn premul_bgra_to_rgba(bgra: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bgra.len());
    for px in bgra.chunks_exact(4) {
        let a = px[3];
        let unpremul = |c: u8| match a {
            0 => 0,
            a => ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8,
        };
        out.extend_from_slice(&[unpremul(px[2]), unpremul(px[1]), unpremul(px[0]), a]);
    }
    out
}
