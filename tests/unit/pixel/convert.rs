use super::*;
use crate::{
    decode::codec::CodecPicture, frame::write::DefaultFrameFactory, pixel::color::rgb_to_ycbcr,
};

/// Returns the same picture for every data packet.
struct StillCodec {
    params: CodecParameters,
    planes: Vec<PlaneData>,
}

impl StillCodec {
    fn new(id: CodecId, format: NativePixelFormat, width: u32, height: u32) -> Self {
        Self {
            params: CodecParameters {
                id,
                name: "still".to_string(),
                width,
                height,
                pixel_format: format,
                time_base: (1, 25),
            },
            planes: Vec::new(),
        }
    }

    fn with_planes(mut self, planes: Vec<PlaneData>) -> Self {
        self.planes = planes;
        self
    }
}

impl CodecBackend for StillCodec {
    fn parameters(&self) -> &CodecParameters {
        &self.params
    }

    fn supports_delayed_output(&self) -> bool {
        false
    }

    fn decode(&mut self, packet: &CompressedPacket) -> MixResult<Option<CodecPicture>> {
        if packet.is_end_of_stream() {
            return Ok(None);
        }
        Ok(Some(CodecPicture {
            planes: self.planes.clone(),
            width: self.params.width,
            height: self.params.height,
            pixel_format: self.params.pixel_format,
            interlaced: false,
            top_field_first: false,
            repeat_pict: 0,
            pts: packet.pts,
        }))
    }

    fn flush(&mut self) {}
}

fn factory(name: &str) -> (VideoFormatDesc, Arc<dyn FrameFactory>) {
    let desc = VideoFormatDesc::preset(name).unwrap();
    (desc.clone(), Arc::new(DefaultFrameFactory::new(desc)))
}

fn data_packet() -> CompressedPacket {
    CompressedPacket::new(0, vec![1u8], 0)
}

#[test]
fn frame_rate_mismatch_is_a_configuration_error() {
    let (target, factory) = factory("720p5000");
    let codec = StillCodec::new(CodecId::H264, NativePixelFormat::Yuv420p, 4, 2);
    let err = SoftwareColorConverter::new(Box::new(codec), &target, factory, ConverterOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, MixError::Configuration(_)));
    let msg = err.to_string();
    assert!(msg.contains("0.04") && msg.contains("0.02"), "{msg}");
}

#[test]
fn canonical_planar_pictures_are_copied_row_by_row() {
    let (target, factory) = factory("1080p2500");
    // Source rows carry padding beyond the 4 meaningful bytes.
    let luma: Vec<u8> = (0..16).collect();
    let codec = StillCodec::new(CodecId::H264, NativePixelFormat::Yuv420p, 4, 2).with_planes(vec![
        PlaneData::new(luma, 8),
        PlaneData::new(vec![90, 91, 0, 0], 4),
        PlaneData::new(vec![200, 201, 0, 0], 4),
    ]);
    let mut conv =
        SoftwareColorConverter::new(Box::new(codec), &target, factory, ConverterOptions::default())
            .unwrap();
    assert!(!conv.uses_scaler());

    assert!(conv.execute(&CompressedPacket::end_of_stream(0)).unwrap().is_none());
    let frame = conv.execute(&data_packet()).unwrap().unwrap();
    assert_eq!(frame.pixel_format(), PixelFormat::Ycbcr);
    assert_eq!(frame.image_data(0), &[0, 1, 2, 3, 8, 9, 10, 11]);
    assert_eq!(frame.image_data(1), &[90, 91]);
    assert_eq!(frame.image_data(2), &[200, 201]);
    assert_eq!(frame.transform().translation, [0.0, 0.0]);
}

#[test]
fn nv12_goes_through_the_scaler_and_keeps_its_color() {
    let (target, factory) = factory("1080p2500");
    let [y, cb, cr] = rgb_to_ycbcr(200, 120, 40);
    let codec = StillCodec::new(CodecId::H264, NativePixelFormat::Nv12, 4, 4).with_planes(vec![
        PlaneData::new(vec![y; 16], 4),
        PlaneData::new([cb, cr].repeat(4), 4),
    ]);
    let mut conv =
        SoftwareColorConverter::new(Box::new(codec), &target, factory, ConverterOptions::default())
            .unwrap();
    assert!(conv.uses_scaler());

    let frame = conv.execute(&data_packet()).unwrap().unwrap();
    assert_eq!(frame.pixel_format(), PixelFormat::Bgra);
    for px in frame.image_data(0).chunks_exact(4) {
        assert!(px[0].abs_diff(40) <= 3);
        assert!(px[1].abs_diff(120) <= 3);
        assert!(px[2].abs_diff(200) <= 3);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn forced_packed_output_converts_planar_sources() {
    let (target, factory) = factory("1080p2500");
    let codec = StillCodec::new(CodecId::H264, NativePixelFormat::Rgb24, 2, 1)
        .with_planes(vec![PlaneData::new(vec![1, 2, 3, 4, 5, 6], 6)]);
    let mut conv = SoftwareColorConverter::new(
        Box::new(codec),
        &target,
        factory,
        ConverterOptions { force_packed: true },
    )
    .unwrap();
    let frame = conv.execute(&data_packet()).unwrap().unwrap();
    assert_eq!(frame.image_data(0), &[3, 2, 1, 255, 6, 5, 4, 255]);
}

#[test]
fn unknown_layouts_cannot_be_converted() {
    let (target, factory) = factory("1080p2500");
    let codec = StillCodec::new(CodecId::Other, NativePixelFormat::Other, 4, 4);
    let err = SoftwareColorConverter::new(Box::new(codec), &target, factory, ConverterOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, MixError::Configuration(_)));
}

#[test]
fn short_planes_are_rejected() {
    let (target, factory) = factory("1080p2500");
    let codec = StillCodec::new(CodecId::H264, NativePixelFormat::Yuv444p, 4, 2).with_planes(vec![
        PlaneData::new(vec![0; 8], 4),
        PlaneData::new(vec![0; 8], 4),
        PlaneData::new(vec![0; 3], 4),
    ]);
    let mut conv =
        SoftwareColorConverter::new(Box::new(codec), &target, factory, ConverterOptions::default())
            .unwrap();
    assert!(matches!(
        conv.execute(&data_packet()),
        Err(MixError::Composition(_))
    ));
}

#[test]
fn dv_into_upper_field_output_is_shifted_one_line() {
    let (target, factory) = factory("pal");
    let codec = StillCodec::new(CodecId::DvVideo, NativePixelFormat::Bgra, 2, 2)
        .with_planes(vec![PlaneData::new(vec![7; 16], 8)]);
    let mut conv =
        SoftwareColorConverter::new(Box::new(codec), &target, factory, ConverterOptions::default())
            .unwrap();
    let frame = conv.execute(&data_packet()).unwrap().unwrap();
    assert_eq!(frame.transform().translation, [0.0, 1.0 / 576.0]);
}
