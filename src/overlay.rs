use image::{
    imageops::{self, FilterType},
    GenericImage, GenericImageView, GrayImage, Rgb, RgbImage,
};
use imageproc::{drawing, rect::Rect};
use rusttype::{point, Font, Scale};

use std::fs;
use std::path::Path;

use crate::alpr::{PixelBox, PlateReading};
use crate::error::WatchError;
use crate::morphology::{self, MorphStep, STEP_LABELS};
use crate::watchlist::Watchlist;

pub const FLAGGED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CLEAR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_BG: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_FG: Rgb<u8> = Rgb([0, 0, 0]);

const BOX_THICKNESS: i32 = 3;
const LABEL_SCALE: f32 = 32.0;
const LABEL_PAD_X: i32 = 5;

pub const THUMB_WIDTH: u32 = 80;
pub const THUMB_HEIGHT: u32 = 60;
pub const THUMB_MARGIN: u32 = 15;
// extra clearance between the bottom thumbnail and the top of the box
const STACK_GAP: i32 = 40;

// boxes this small get no morphology strip, the crop is useless to look at
pub const MIN_ROI_SIDE: i32 = 10;

/// Red for a watchlisted plate, green otherwise. Exact match only.
pub fn box_color(text: &str, watchlist: &Watchlist) -> Rgb<u8> {
    if watchlist.contains(text) {
        FLAGGED_COLOR
    } else {
        CLEAR_COLOR
    }
}

/// `"<text> (<confidence>)"` with two decimals. A confidence that is NaN or
/// infinite is refused instead of formatted.
pub fn format_label(text: &str, confidence: f32) -> Result<String, WatchError> {
    if !confidence.is_finite() {
        return Err(WatchError::bad_confidence(confidence));
    }
    Ok(format!("{} ({:.2})", text, confidence))
}

pub fn wants_morph_strip(pix: &PixelBox) -> bool {
    pix.width() > MIN_ROI_SIDE && pix.height() > MIN_ROI_SIDE
}

/// Top-left corner of the thumbnail stack: directly above the box, shifted
/// back inside the frame when the box sits near the top or a side edge.
pub fn stack_origin(pix: &PixelBox, frame_width: u32) -> (u32, u32) {
    let total_height = STEP_LABELS.len() as i32 * (THUMB_HEIGHT + THUMB_MARGIN) as i32;

    let mut top = pix.y1 - total_height - STACK_GAP;
    if top < 0 {
        top = 0;
    }

    let mut left = pix.x1;
    if left + THUMB_WIDTH as i32 > frame_width as i32 {
        left = frame_width as i32 - THUMB_WIDTH as i32;
    }
    if left < 0 {
        left = 0;
    }

    (left as u32, top as u32)
}

/// Hollow rectangle with a fixed 3px line, drawn as nested 1px rects growing
/// inward so the outer edge stays on the reported box.
pub fn draw_thick_hollow_rect(frame: &mut RgbImage, pix: &PixelBox, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let width = pix.width() - 2 * inset;
        let height = pix.height() - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(pix.x1 + inset, pix.y1 + inset).of_size(width as u32, height as u32);
        drawing::draw_hollow_rect_mut(frame, rect, color);
    }
}

/// Resize the steps to fixed thumbnails and write them top to bottom from
/// `origin`, one THUMB_MARGIN apart. Rows that would cross the bottom of the
/// frame are dropped. Returns how many rows were written.
pub fn blit_morph_strip(
    frame: &mut RgbImage,
    steps: &[MorphStep],
    origin: (u32, u32),
) -> Result<usize, WatchError> {
    let (frame_width, frame_height) = frame.dimensions();
    if frame_width < THUMB_WIDTH {
        return Ok(0);
    }

    let (left, top) = origin;
    let mut current_y = top;
    let mut placed = 0;
    for step in steps {
        let bottom = current_y + THUMB_HEIGHT;
        if bottom > frame_height {
            break;
        }
        let thumb = imageops::resize(
            &gray_to_rgb(&step.image),
            THUMB_WIDTH,
            THUMB_HEIGHT,
            FilterType::Triangle,
        );
        frame.copy_from(&thumb, left, current_y)?;
        placed += 1;
        current_y = bottom + THUMB_MARGIN;
    }
    Ok(placed)
}

// thumbnails composite onto an rgb frame, single channel steps get expanded
fn gray_to_rgb(img: &GrayImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img[(x, y)].0[0];
        Rgb([v, v, v])
    })
}

/// Label baseline y: 10px above the box, pushed down so the background rect
/// never rises past the frame top.
pub fn label_anchor(box_top: i32, text_height: i32) -> i32 {
    (box_top - 10).max(text_height + 10)
}

/// Rendered pixel extent of `text` at `scale`.
pub fn text_extent(font: &Font, scale: Scale, text: &str) -> (i32, i32) {
    let v_metrics = font.v_metrics(scale);
    let height = (v_metrics.ascent - v_metrics.descent).ceil() as i32;
    let width = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .last()
        .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
        .ceil() as i32;
    (width, height)
}

/// Seam between the frame loop and the drawing code. The loop only needs
/// something that can put one detection onto a frame.
pub trait AnnotateFrame {
    fn annotate(
        &self,
        frame: &mut RgbImage,
        reading: &PlateReading,
        watchlist: &Watchlist,
    ) -> Result<(), WatchError>;
}

/// Draws everything one detection contributes to a frame: the colored box,
/// the text label, and (for large enough boxes) the morphology strip.
pub struct Annotator {
    font: Font<'static>,
    scale: Scale,
}

impl Annotator {

    pub fn from_font_file(path: impl AsRef<Path>) -> Result<Self, WatchError> {
        let data = fs::read(path.as_ref())?;
        let font = Font::try_from_vec(data).ok_or_else(|| WatchError::bad_font(path.as_ref()))?;
        Ok(Self { font, scale: Scale::uniform(LABEL_SCALE) })
    }

    fn draw_label(&self, frame: &mut RgbImage, pix: &PixelBox, label: &str) {
        let (text_width, text_height) = text_extent(&self.font, self.scale, label);
        let text_x = pix.x1;
        let text_y = label_anchor(pix.y1, text_height);

        let background = Rect::at(text_x - LABEL_PAD_X, text_y - text_height - 10).of_size(
            (text_width + 2 * LABEL_PAD_X) as u32,
            (text_height + 15) as u32,
        );
        drawing::draw_filled_rect_mut(frame, background, LABEL_BG);
        drawing::draw_text_mut(
            frame,
            LABEL_FG,
            text_x.max(0) as u32,
            (text_y - text_height).max(0) as u32,
            self.scale,
            &self.font,
            label,
        );
    }
}

impl AnnotateFrame for Annotator {

    fn annotate(
        &self,
        frame: &mut RgbImage,
        reading: &PlateReading,
        watchlist: &Watchlist,
    ) -> Result<(), WatchError> {
        let (frame_width, frame_height) = frame.dimensions();

        let label = format_label(&reading.text, reading.confidence)?;
        let color = box_color(&reading.text, watchlist);
        let pix = reading.bbox.to_pixels();

        // crop before the box outline lands inside the region
        let clamped = pix.clamped(frame_width, frame_height);
        let roi = if wants_morph_strip(&clamped) {
            let view = frame.view(
                clamped.x1 as u32,
                clamped.y1 as u32,
                clamped.width() as u32,
                clamped.height() as u32,
            );
            Some(view.to_image())
        } else {
            None
        };

        draw_thick_hollow_rect(frame, &pix, color);
        self.draw_label(frame, &pix, &label);

        if let Some(roi) = roi {
            let steps = morphology::morphology_steps(&roi);
            let origin = stack_origin(&clamped, frame_width);
            blit_morph_strip(frame, &steps, origin)?;
        }
        Ok(())
    }
}
