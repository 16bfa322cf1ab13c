use image::{DynamicImage, GenericImage, ImageBuffer, Luma};

/// Row-wise argmax over a tensor laid out as `shape[0]` rows of `shape[1]`
/// values. Tensors unroll row-major, so each chunk is one timestep of the OCR
/// output.
pub fn argmax_in_axis0(input: &[f32], shape: &[usize]) -> Vec<usize> {
    input.chunks(shape[1]).map(|row: &[f32]| {
        let mut max = row[0];
        let mut index = 0;
        row.iter().enumerate().for_each(|(i, v)| {
            if *v >= max {
                max = *v;
                index = i;
            }
        });
        index
    }).collect()
}

/// Swap x and y. The OCR graph takes the plate crop rotated onto its side, so
/// the crop is transposed before it is fed in.
pub fn transpose(input: &DynamicImage) -> DynamicImage {
    let img = input.to_rgba8();
    let mut output = DynamicImage::new_rgba8(img.height(), img.width());
    img.rows().enumerate().for_each(|(y, pixels)| {
        pixels.enumerate().for_each(|(x, pixel)| {
            output.put_pixel(y as u32, x as u32, *pixel);
        });
    });
    output
}

/// Histogram equalization on the gray rendition of the image.
pub fn equalize_hist_in_gray(img: &DynamicImage) -> DynamicImage {
    let img = img.grayscale();
    let img = img.as_luma8().unwrap();
    let mut vec = img.to_vec();
    let len = vec.len();

    // pixel value distribution
    let mut df = [0; 256];
    for v in &vec {
        df[*v as usize] += 1;
    }
    // cumulative distribution
    let mut temp = df[0];
    df.iter_mut().skip(1).for_each(|v| {
        *v += temp;
        temp = *v;
    });
    let mut iter = df.iter().filter(|v| **v != 0);
    let cdf_min = iter.next().unwrap();
    vec.iter_mut().for_each(|v| {
        let x = df[*v as usize] - cdf_min;
        let y = len - cdf_min;
        *v = ((x as f32 / y as f32) * 255.0).round() as u8;
    });
    let image_buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(img.width(), img.height(), vec).unwrap();
    DynamicImage::ImageLuma8(image_buffer)
}

#[cfg(test)]
mod test {

    use image::{DynamicImage, GenericImageView};

    use super::{argmax_in_axis0, transpose};

    #[test]
    fn argmax_picks_per_row() {
        let input = vec![
            0.1, 0.8, 0.1, //
            0.9, 0.0, 0.1, //
            0.2, 0.3, 0.5, //
        ];
        assert_eq!(argmax_in_axis0(&input, &[3, 3]), vec![1, 0, 2]);
    }

    #[test]
    fn transpose_swaps_dimensions() {
        let img = DynamicImage::new_rgba8(7, 3);
        let out = transpose(&img);
        assert_eq!(out.dimensions(), (3, 7));
    }
}
