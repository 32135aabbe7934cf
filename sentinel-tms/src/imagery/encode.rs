//! Resize and PNG output.

use std::fs;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage, RgbaImage};

use super::ImageryError;

/// Resamples `image` to `size`×`size` and writes it as PNG at `path`.
///
/// The PNG is written to a temp file in the destination directory and renamed
/// into place, so a concurrent reader sees either no file or a complete one.
pub fn write_tile_png(image: &RgbImage, size: u32, path: &Path) -> Result<(), ImageryError> {
    let resized = if image.dimensions() == (size, size) {
        image.clone()
    } else {
        imageops::resize(image, size, size, FilterType::CatmullRom)
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let io_error = |e: std::io::Error| ImageryError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    fs::create_dir_all(dir).map_err(io_error)?;
    let temp = tempfile::Builder::new()
        .prefix(".tile-")
        .suffix(".png")
        .tempfile_in(dir)
        .map_err(io_error)?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        resized.write_to(&mut writer, ImageFormat::Png)?;
        writer.flush().map_err(io_error)?;
    }

    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// Encodes a fully transparent `size`×`size` PNG.
pub fn transparent_png(size: u32) -> Result<Vec<u8>, ImageryError> {
    let image = RgbaImage::new(size, size);
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
