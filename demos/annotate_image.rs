use std::env::args;
use std::error::Error;
use std::process;

use plate_watch::alpr::{Alpr, PlateReader};
use plate_watch::overlay::{AnnotateFrame, Annotator};
use plate_watch::watchlist::Watchlist;

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

    let alpr = Alpr::new("./models/detect.pb", "./models/ocr_plate.pb")?;
    let annotator = Annotator::from_font_file("./fonts/DejaVuSans.ttf")?;
    let watchlist = Watchlist::demo();

    let mut img = image::open(&path)?.to_rgb8();
    let readings = alpr.read_plates(&img)?;
    for reading in &readings {
        println!("plate: {} confidence: {:.2}", reading.text, reading.confidence);
        annotator.annotate(&mut img, reading, &watchlist)?;
    }

    img.save("annotated.png")?;
    println!("wrote annotated.png with {} plate(s)", readings.len());
    Ok(())
}
