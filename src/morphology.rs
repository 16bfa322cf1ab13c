use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::{contrast, filter};

/// Labels of the five steps, in the order they are produced.
pub const STEP_LABELS: [&str; 5] = ["Gray", "Blur", "Otsu", "Dilate", "Invert"];

// sigma opencv derives for a 3x3 gaussian kernel: 0.3*((3-1)*0.5 - 1) + 0.8
const BLUR_SIGMA: f32 = 0.8;

/// One intermediate result of the morphology strip.
pub struct MorphStep {
    pub label: &'static str,
    pub image: GrayImage,
}

/// Run the fixed five-stage filter sequence over one plate region and keep a
/// snapshot after every stage. The snapshots are for display only, none of them
/// feeds back into recognition.
pub fn morphology_steps(roi: &RgbImage) -> Vec<MorphStep> {
    let gray = imageops::grayscale(roi);

    let blur = filter::gaussian_blur_f32(&gray, BLUR_SIGMA);

    let level = contrast::otsu_level(&blur);
    let otsu = contrast::threshold(&blur, level);

    let dilated = dilate_2x2(&otsu);

    let mut inverted = dilated.clone();
    imageops::invert(&mut inverted);

    vec![
        MorphStep { label: STEP_LABELS[0], image: gray },
        MorphStep { label: STEP_LABELS[1], image: blur },
        MorphStep { label: STEP_LABELS[2], image: otsu },
        MorphStep { label: STEP_LABELS[3], image: dilated },
        MorphStep { label: STEP_LABELS[4], image: inverted },
    ]
}

// Dilation with a 2x2 rectangular structuring element, one iteration.
// imageproc only offers odd-sized square elements, so the 2x2 case is done by
// hand: each output pixel takes the max of its up-left 2x2 neighbourhood
// (opencv anchor convention for even kernels), clamped at the image edge.
fn dilate_2x2(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut max = 0u8;
            for yy in y.saturating_sub(1)..=y {
                for xx in x.saturating_sub(1)..=x {
                    let v = img[(xx, yy)].0[0];
                    if v > max {
                        max = v;
                    }
                }
            }
            out.put_pixel(x, y, Luma([max]));
        }
    }
    out
}

#[cfg(test)]
mod test {

    use image::{GrayImage, Luma, Rgb, RgbImage};

    use super::{dilate_2x2, morphology_steps, STEP_LABELS};

    fn gradient_roi(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 13) % 256) as u8;
            Rgb([v, v / 2, 255 - v])
        })
    }

    #[test]
    fn five_steps_fixed_labels_same_dims() {
        let roi = gradient_roi(41, 23);
        let steps = morphology_steps(&roi);
        assert_eq!(steps.len(), 5);
        for (step, expected) in steps.iter().zip(STEP_LABELS.iter()) {
            assert_eq!(step.label, *expected);
            assert_eq!(step.image.dimensions(), (41, 23));
        }
    }

    #[test]
    fn otsu_step_is_binary() {
        let roi = gradient_roi(32, 18);
        let steps = morphology_steps(&roi);
        let mut values: Vec<u8> = steps[2].image.pixels().map(|p| p.0[0]).collect();
        values.sort_unstable();
        values.dedup();
        assert!(values.len() <= 2);
        assert!(values.iter().all(|v| *v == 0 || *v == 255));
    }

    #[test]
    fn invert_is_involution_on_dilated() {
        let roi = gradient_roi(30, 12);
        let steps = morphology_steps(&roi);
        let twice: Vec<u8> = steps[4].image.pixels().map(|p| 255 - p.0[0]).collect();
        let dilated: Vec<u8> = steps[3].image.pixels().map(|p| p.0[0]).collect();
        assert_eq!(twice, dilated);
    }

    #[test]
    fn dilate_2x2_grows_down_right() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(1, 1, Luma([255]));
        let out = dilate_2x2(&img);
        for y in 0..4 {
            for x in 0..4 {
                let expected = if (1..=2).contains(&x) && (1..=2).contains(&y) {
                    255
                } else {
                    0
                };
                assert_eq!(out[(x, y)].0[0], expected, "at ({}, {})", x, y);
            }
        }
    }
}
