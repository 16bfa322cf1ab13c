use image::{GenericImage, Rgb, RgbImage};

use std::env::args;
use std::error::Error;
use std::process;

use plate_watch::morphology;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = args();
    args.next();
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("didn't get an image from args");
            process::exit(1);
        }
    };

    let img = image::open(&path)?.to_rgb8();
    let (width, height) = img.dimensions();

    let steps = morphology::morphology_steps(&img);
    let mut strip = RgbImage::new(width * steps.len() as u32, height);
    for (i, step) in steps.iter().enumerate() {
        println!("step {}: {}", i + 1, step.label);
        let rgb = RgbImage::from_fn(width, height, |x, y| {
            let v = step.image[(x, y)].0[0];
            Rgb([v, v, v])
        });
        strip.copy_from(&rgb, i as u32 * width, 0)?;
    }

    strip.save("morph_strip.png")?;
    println!("wrote morph_strip.png");
    Ok(())
}
