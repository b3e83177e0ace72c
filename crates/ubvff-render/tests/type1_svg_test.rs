use ubvff_core::commands::type1 as op;
use ubvff_core::type1::Type1Decoder;
use ubvff_render::type1::{Type1Converter, convert_type1, run_type1};
use ubvff_render::{Error, svg::EmitState};

const ONE: u32 = 0x8000;

fn words(ws: &[u32]) -> Vec<u8> {
    ws.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn layer_name(name: &str) -> Vec<u32> {
    let mut out = vec![op::START_LAYER, name.len() as u32];
    out.extend(name.bytes().map(u32::from));
    out
}

fn red_square_layer() -> Vec<u32> {
    let mut ws = vec![op::START_FILE, 0, 0, 10 * ONE, 10 * ONE, 0];
    ws.extend(layer_name("Layer 1"));
    ws.extend([
        op::FILL_COLOR,
        0x0000_00FF,
        op::START_PATH,
        0,
        0,
        op::LINE,
        1,
        ONE,
        0,
        op::CLOSE_PATH,
        op::END_PATH_FILL,
        op::END_LAYER,
        op::LAYER_SEP,
        op::END_FILE,
    ]);
    ws
}

#[test]
fn converts_a_single_filled_path() {
    let (out, report) = convert_type1(&words(&red_square_layer())[..], Vec::new()).expect("convert ok");
    let svg = String::from_utf8(out).expect("utf-8");

    assert_eq!(
        svg,
        concat!(
            "<svg viewBox=\"0 0 10 10\" version=\"1.1\" baseProfile=\"full\" xmlns=\"http://www.w3.org/2000/svg\">\n",
            "<g>\n",
            "<path d=\"M 0.000000 0.000000 L 1.000000 0.000000 Z \" fill=\"rgb(255,0,0)\" stroke=\"none\" />\n",
            "</g>\n",
            "</svg>\n",
        )
    );
    assert_eq!(svg.matches("<g>").count(), 1);
    assert!(report.reached_end_file);
    assert!(!report.trailing_data);
}

#[test]
fn reports_trailing_data() {
    let mut bytes = words(&red_square_layer());
    bytes.push(0);
    let (_, report) = convert_type1(&bytes[..], Vec::new()).expect("convert ok");
    assert!(report.trailing_data);
}

#[test]
fn missing_end_file_leaves_document_incomplete() {
    let mut ws = red_square_layer();
    ws.pop();
    let err = convert_type1(&words(&ws)[..], Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Incomplete {
            state: EmitState::AfterEndLayer
        }
    ));
}

#[test]
fn listing_without_svg_still_stops_at_end_file() {
    let mut ws = red_square_layer();
    ws.extend([op::NOP, op::NOP]);
    let bytes = words(&ws);
    let mut decoder = Type1Decoder::new(&bytes[..]);
    let mut names = Vec::new();
    let report = run_type1::<_, Vec<u8>>(&mut decoder, None, |cmd| {
        names.push(cmd.name().into_owned())
    })
    .expect("run ok");
    assert_eq!(names.first().map(String::as_str), Some("CMD_03_START_FILE"));
    assert_eq!(names.last().map(String::as_str), Some("CMD_15_END_FILE"));
    assert!(report.trailing_data);
}

#[test]
fn conversion_stops_at_end_file() {
    let mut ws = red_square_layer();
    ws.extend([op::CLOSE_PATH, op::START_PATH, 0, 0]);
    let bytes = words(&ws);
    let mut decoder = Type1Decoder::new(&bytes[..]);
    let mut converter = Type1Converter::new(Vec::new());
    let report = run_type1(&mut decoder, Some(&mut converter), |_| {}).expect("run ok");
    assert_eq!(report.commands, 10);
    assert!(report.reached_end_file);
    assert!(report.trailing_data);
    let svg = converter.finish().expect("finish ok");
    assert!(svg.ends_with(b"</svg>\n"));
}

#[test]
fn several_layers_and_cubics() {
    let mut ws = vec![op::START_FILE, 0, 0, 4 * ONE, 4 * ONE, 0];
    for name in ["A", "B"] {
        ws.extend(layer_name(name));
        ws.extend([
            op::STROKE_COLOR,
            0x00FF_0000,
            op::START_PATH,
            0,
            0,
            op::CUBIC,
            3,
            0,
            ONE,
            ONE,
            ONE,
            ONE,
            0,
            op::END_PATH_STROKE_FILL,
            op::END_LAYER,
        ]);
    }
    ws.push(op::END_FILE);

    let (out, _) = convert_type1(&words(&ws)[..], Vec::new()).expect("convert ok");
    let svg = String::from_utf8(out).expect("utf-8");
    assert_eq!(svg.matches("<g>\n").count(), 2);
    assert_eq!(svg.matches("</g>\n").count(), 2);
    assert!(svg.contains(
        "C 0.000000 1.000000, 1.000000 1.000000, 1.000000 0.000000 \" fill=\"rgb(0,0,0)\" stroke=\"rgb(0,0,255)\" stroke-width=\"1.000000\""
    ));
}

#[test]
fn unknown_opcodes_pass_through() {
    let mut ws = vec![0x42];
    ws.extend(red_square_layer());
    let (out, report) = convert_type1(&words(&ws)[..], Vec::new()).expect("convert ok");
    assert!(out.ends_with(b"</svg>\n"));
    assert_eq!(report.commands, 11);
}

#[test]
fn illegal_sequence_is_fatal() {
    let ws = [op::START_FILE, 0, 0, ONE, ONE, 0, op::CLOSE_PATH];
    let bytes = words(&ws);
    let mut decoder = Type1Decoder::new(&bytes[..]);
    let mut converter = Type1Converter::new(Vec::new());
    let err = run_type1(&mut decoder, Some(&mut converter), |_| {}).unwrap_err();
    assert_eq!(err.to_string(), "invalid state in close_path: BEGIN");
}
