/// Fixture helpers shared by the unit tests
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use png::text_metadata::TEXtChunk;

/// A text chunk to embed in a fixture PNG
#[derive(Debug, Clone, Copy)]
pub enum TextChunk<'a> {
    /// tEXt
    Plain(&'a str, &'a str),
    /// zTXt
    Compressed(&'a str, &'a str),
    /// iTXt
    International(&'a str, &'a str),
}

/// Write a 2x2 RGBA PNG carrying the given text chunks
pub fn write_png(path: &Path, chunks: &[TextChunk]) {
    let file = File::create(path).unwrap();
    let mut encoder = png::Encoder::new(BufWriter::new(file), 2, 2);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    for chunk in chunks {
        match *chunk {
            TextChunk::Plain(keyword, text) => encoder
                .add_text_chunk(keyword.to_string(), text.to_string())
                .unwrap(),
            TextChunk::Compressed(keyword, text) => encoder
                .add_ztxt_chunk(keyword.to_string(), text.to_string())
                .unwrap(),
            TextChunk::International(keyword, text) => encoder
                .add_itxt_chunk(keyword.to_string(), text.to_string())
                .unwrap(),
        }
    }

    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&fixture_pixels()).unwrap();
    writer.finish().unwrap();
}

/// Write a 2x2 RGBA PNG whose only text chunk is a tEXt after IDAT
pub fn write_png_with_trailing_text(path: &Path, keyword: &str, text: &str) {
    let file = File::create(path).unwrap();
    let mut encoder = png::Encoder::new(BufWriter::new(file), 2, 2);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&fixture_pixels()).unwrap();
    writer
        .write_text_chunk(&TEXtChunk::new(keyword, text))
        .unwrap();
    writer.finish().unwrap();
}

fn fixture_pixels() -> Vec<u8> {
    (0..16).map(|i| (i * 16) as u8).collect()
}
