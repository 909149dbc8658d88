use std::process;

use clap::{crate_version, Arg, ArgAction, Command};
use log::error;

use mediameta::formats::{gif, jpeg, mp4, png};
use mediameta::GenericMetadata;

fn main() {
    env_logger::init();

    let matches = Command::new("mediameta analyzer")
        .version(crate_version!())
        .author("Vladimir Matveev <vladimir.matweev@gmail.com>")
        .about("Loads and displays metadata from image and MP4 files.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("mp4")
                .long("mp4")
                .action(ArgAction::SetTrue)
                .help("Read the files as MP4 instead of detecting the image format"),
        )
        .arg(
            Arg::new("FILE")
                .required(true)
                .num_args(1..)
                .help("Input file names"),
        )
        .get_matches();

    let mp4 = matches.get_flag("mp4");
    let mut failed = false;

    for file_name in matches.get_many::<String>("FILE").into_iter().flatten() {
        let result = if mp4 {
            mediameta::decode_mp4(file_name).map(print_mp4_metadata)
        } else {
            mediameta::decode_image(file_name).map(|md| match md {
                GenericMetadata::Jpeg(md) => print_jpeg_metadata(md),
                GenericMetadata::Gif(md) => print_gif_metadata(md),
                GenericMetadata::Png(md) => print_png_metadata(md),
            })
        };
        if let Err(e) = result {
            error!("Cannot load metadata from {}: {}", file_name, e);
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }
}

fn print_jpeg_metadata(md: jpeg::Metadata) {
    println!("JPEG image:");
    println!("  Width: {}", md.width);
    println!("  Height: {}", md.height);
    println!("  Bits per sample: {}", md.bits_per_sample);
    println!("  Coding process: {}", md.coding_process);
}

fn print_gif_metadata(md: gif::Metadata) {
    println!("GIF image:");
    if let Some(version) = md.version {
        println!("  Version: {:?}", version);
    }
    println!("  Width: {}", md.width);
    println!("  Height: {}", md.height);
    match md.global_color_table {
        Some(ref table) => println!("  Global color table: {} colors (sorted: {})", table.size, table.sorted),
        None => println!("  Global color table: none"),
    }
    if let Some(index) = md.background_color_index {
        println!("  Background color index: {}", index);
    }
    println!("  Color resolution: {}", md.color_resolution);
    match md.pixel_aspect_ratio_computed {
        Some(ratio) => println!("  Pixel aspect ratio: {} (~{:.4})", md.pixel_aspect_ratio, ratio),
        None => println!("  Pixel aspect ratio: not specified"),
    }
}

fn print_png_metadata(md: png::Metadata) {
    println!("PNG image:");
    println!("  Width: {}", md.width);
    println!("  Height: {}", md.height);
    println!("  Bit depth: {}", md.bit_depth);
    match md.typed_color_type() {
        Some(ct) => println!("  Color type: {:?} ({})", ct, md.color_type),
        None => println!("  Color type: {}", md.color_type),
    }
    println!("  Compression method: {}", md.compression_method);
    println!("  Filter method: {}", md.filter_method);
    println!("  Interlace method: {}", md.interlace_method);
}

fn print_mp4_metadata(md: mp4::Metadata) {
    println!("MP4 movie:");
    println!("  Time scale: {}", md.timescale);
    println!("  Duration: {} ({:.3} s)", md.duration, md.duration_seconds);
    println!("  Frame width: {}", md.width);
    println!("  Frame height: {}", md.height);
}
