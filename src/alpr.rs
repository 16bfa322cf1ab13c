use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};
use imageproc::{contrast, filter};
use log::debug;
use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};

use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

use crate::error::WatchError;
use crate::utils;

// charset the OCR graph predicts over; index CHARS.len() is the CTC blank
const CHARS: [&str; 36] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B", "C", "D", "E", "F", "G", "H",
    "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
];
// timesteps x (charset + blank)
const OCR_SHAPE: [usize; 2] = [18, 37];

const SCORE_NEEDED: f32 = 0.6;

/// Fractional bounding box as the detector reports it, already scaled to
/// pixel units but not yet rounded.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Integer corners, fractional coordinates truncated toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn to_pixels(&self) -> PixelBox {
        PixelBox {
            x1: self.x1 as i32,
            y1: self.y1 as i32,
            x2: self.x2 as i32,
            y2: self.y2 as i32,
        }
    }
}

impl PixelBox {
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Corners clamped into the frame so the box can be used as a crop.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> PixelBox {
        let clamp = |v: i32, max: i32| v.max(0).min(max);
        PixelBox {
            x1: clamp(self.x1, frame_width as i32),
            y1: clamp(self.y1, frame_height as i32),
            x2: clamp(self.x2, frame_width as i32),
            y2: clamp(self.y2, frame_height as i32),
        }
    }
}

/// One plate found in a frame: where it is, what it reads, how sure the OCR
/// graph was. Nothing survives past the frame it came from.
#[derive(Debug, Clone)]
pub struct PlateReading {
    pub bbox: BoundingBox,
    pub text: String,
    pub confidence: f32,
}

/// The detection + OCR collaborator. The frame loop only depends on this
/// seam, the tensorflow-backed implementation below is swappable.
pub trait PlateReader {
    fn read_plates(&self, frame: &RgbImage) -> Result<Vec<PlateReading>, WatchError>;
}

/// ALPR over two frozen tensorflow graphs: an SSD-style plate detector and a
/// GRU OCR network.
pub struct Alpr {
    detection: DetectModel,
    ocr: OcrModel,
}

impl Alpr {

    pub fn new(detection_pb: impl AsRef<Path>, ocr_pb: impl AsRef<Path>) -> Result<Self, WatchError> {
        let detection = DetectModel::new(detection_pb, "image_tensor", "detection_boxes", "detection_scores")?;
        let ocr = OcrModel::new(ocr_pb, "input_1", "dense_2/truediv")?;
        Ok(Self { detection, ocr })
    }

    /// Run OCR on one cropped plate.
    fn recognize_plate(&self, plate: &DynamicImage) -> Result<(String, f32), WatchError> {
        let img = utils::equalize_hist_in_gray(plate);
        let img = utils::transpose(&img);
        let img = img.resize_exact(48, 164, FilterType::Nearest);

        let img = img.to_luma8();
        let mut img = filter::gaussian_blur_f32(&img, 1.4);
        contrast::equalize_histogram_mut(&mut img);
        let img = DynamicImage::ImageLuma8(img).to_bgr8().to_vec();
        let img: Vec<f32> = img.into_iter().map(|v| v as f32).collect();
        let tensor_img: Tensor<f32> = Tensor::new(&[1, 164, 48u64, 3]);
        let tensor_img = tensor_img.with_values(&img[..])?;

        let ocr_res = self.ocr.run(&tensor_img)?;
        Ok(fast_decode(&ocr_res.to_vec(), OCR_SHAPE))
    }
}

impl PlateReader for Alpr {

    fn read_plates(&self, frame: &RgbImage) -> Result<Vec<PlateReading>, WatchError> {
        let (width, height) = frame.dimensions();
        let img_tensor = Tensor::new(&[1, height as u64, width as u64, 3]);
        let img_tensor = img_tensor.with_values(frame.as_raw())?;

        // boxes come back as ymin xmin ymax xmax, normalized to 1
        let (boxes, scores) = self.detection.run(&img_tensor)?;

        let mut readings = Vec::new();
        for (index, corners) in boxes.chunks(4).enumerate() {
            if scores[index] <= SCORE_NEEDED {
                continue;
            }
            let bbox = BoundingBox {
                x1: corners[1] * width as f32,
                y1: corners[0] * height as f32,
                x2: corners[3] * width as f32,
                y2: corners[2] * height as f32,
            };
            let pix = bbox.to_pixels().clamped(width, height);
            if pix.width() < 2 || pix.height() < 2 {
                continue;
            }
            let plate = frame
                .view(pix.x1 as u32, pix.y1 as u32, pix.width() as u32, pix.height() as u32)
                .to_image();
            let (text, confidence) = self.recognize_plate(&DynamicImage::ImageRgb8(plate))?;
            debug!("plate {:?} score {} reads {:?} ({})", pix, scores[index], text, confidence);
            readings.push(PlateReading { bbox, text, confidence });
        }
        Ok(readings)
    }
}

/// CTC-style collapse of the raw OCR output: drop blanks and repeats, average
/// the kept glyph scores into one confidence.
fn fast_decode(ocr_res: &[f32], shape: [usize; 2]) -> (String, f32) {
    let argmax = utils::argmax_in_axis0(ocr_res, &shape);
    let mut res = Vec::new();
    let mut confidence = 0.0;
    for (i, v) in argmax.iter().enumerate() {
        if *v >= CHARS.len() {
            continue;
        }
        // a repeat of the previous timestep belongs to the same glyph
        if i > 0 && *v == argmax[i - 1] {
            continue;
        }
        res.push(CHARS[*v]);
        confidence += ocr_res[i * shape[1] + v];
    }
    if res.is_empty() {
        return (String::new(), 0.0);
    }
    (res.join(""), confidence / res.len() as f32)
}

struct DetectModel {
    graph: Graph,
    session: Session,
    input_name: &'static str,
    box_name: &'static str,
    scores_name: &'static str,
}

impl DetectModel {

    fn new(
        pb_file: impl AsRef<Path>,
        input_name: &'static str,
        box_name: &'static str,
        scores_name: &'static str,
    ) -> Result<Self, WatchError> {
        let (graph, session) = load_frozen_graph(pb_file)?;
        Ok(Self { graph, session, input_name, box_name, scores_name })
    }

    /// Run detection, return (boxes, scores).
    fn run(&self, input: &Tensor<u8>) -> Result<(Tensor<f32>, Tensor<f32>), WatchError> {
        let graph = &self.graph;
        let mut args = SessionRunArgs::new();
        args.add_feed(&graph.operation_by_name_required(self.input_name)?, 0, input);
        let box_token = args.request_fetch(&graph.operation_by_name_required(self.box_name)?, 0);
        let scores_token = args.request_fetch(&graph.operation_by_name_required(self.scores_name)?, 0);
        self.session.run(&mut args)?;
        let boxes: Tensor<f32> = args.fetch(box_token)?;
        let scores: Tensor<f32> = args.fetch(scores_token)?;
        Ok((boxes, scores))
    }
}

struct OcrModel {
    graph: Graph,
    session: Session,
    input_name: &'static str,
    output_name: &'static str,
}

impl OcrModel {

    fn new(
        pb_file: impl AsRef<Path>,
        input_name: &'static str,
        output_name: &'static str,
    ) -> Result<Self, WatchError> {
        let (graph, session) = load_frozen_graph(pb_file)?;
        Ok(Self { graph, session, input_name, output_name })
    }

    fn run(&self, input: &Tensor<f32>) -> Result<Tensor<f32>, WatchError> {
        let graph = &self.graph;
        let mut args = SessionRunArgs::new();
        args.add_feed(&graph.operation_by_name_required(self.input_name)?, 0, input);
        let res = args.request_fetch(&graph.operation_by_name_required(self.output_name)?, 0);
        self.session.run(&mut args)?;
        let res: Tensor<f32> = args.fetch(res)?;
        Ok(res)
    }
}

fn load_frozen_graph(pb_file: impl AsRef<Path>) -> Result<(Graph, Session), WatchError> {
    let mut pb_file = File::open(pb_file)?;
    let mut pb = Vec::new();
    pb_file.read_to_end(&mut pb)?;

    let mut graph = Graph::new();
    let graph_def_options = ImportGraphDefOptions::new();
    graph.import_graph_def(&pb, &graph_def_options)?;

    let session_option = SessionOptions::new();
    let session = Session::new(&session_option, &graph)?;
    Ok((graph, session))
}

#[cfg(test)]
mod test {

    use super::{fast_decode, BoundingBox, OCR_SHAPE};

    // one-hot rows for the given argmax sequence
    fn one_hot(argmax: &[usize], width: usize, value: f32) -> Vec<f32> {
        let mut out = vec![0.0; argmax.len() * width];
        for (row, index) in argmax.iter().enumerate() {
            out[row * width + index] = value;
        }
        out
    }

    #[test]
    fn decode_collapses_repeats_and_blanks() {
        // blank, A, A, blank, B, 7  ->  "AB7"
        let rows = [36, 10, 10, 36, 11, 7];
        let ocr_res = one_hot(&rows, 37, 0.9);
        let (text, confidence) = fast_decode(&ocr_res, [6, 37]);
        assert_eq!(text, "AB7");
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn decode_keeps_a_glyph_on_the_first_timestep() {
        // A, blank, blank, blank, B, 7  ->  "AB7"
        let rows = [10, 36, 36, 36, 11, 7];
        let ocr_res = one_hot(&rows, 37, 0.9);
        let (text, confidence) = fast_decode(&ocr_res, [6, 37]);
        assert_eq!(text, "AB7");
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn decode_of_all_blanks_is_empty_with_zero_confidence() {
        let rows = vec![36; OCR_SHAPE[0]];
        let ocr_res = one_hot(&rows, OCR_SHAPE[1], 0.9);
        let (text, confidence) = fast_decode(&ocr_res, OCR_SHAPE);
        assert_eq!(text, "");
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn pixel_box_truncates_toward_zero_and_clamps() {
        let bbox = BoundingBox { x1: 10.9, y1: -3.2, x2: 99.5, y2: 701.8 };
        let pix = bbox.to_pixels();
        assert_eq!((pix.x1, pix.y1, pix.x2, pix.y2), (10, -3, 99, 701));

        let clamped = pix.clamped(640, 480);
        assert_eq!((clamped.x1, clamped.y1, clamped.x2, clamped.y2), (10, 0, 99, 480));
        assert_eq!(clamped.width(), 89);
        assert_eq!(clamped.height(), 480);
    }
}
