//! Rotation correction and de-padding.

use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use super::ImageryError;

/// Angles below this (degrees) are treated as aligned.
const MIN_ROTATION_DEGREES: f64 = 1e-6;

/// Rotates `image` by `-skew_degrees` about its center without clipping.
///
/// The image is first centered on a canvas large enough to hold the rotated
/// result; uncovered pixels are black.
pub fn deskew(image: &RgbImage, skew_degrees: f64) -> RgbImage {
    if skew_degrees.abs() < MIN_ROTATION_DEGREES {
        return image.clone();
    }

    let theta = skew_degrees.to_radians();
    let (width, height) = image.dimensions();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let canvas_width = (f64::from(width) * cos + f64::from(height) * sin).ceil() as u32;
    let canvas_height = (f64::from(width) * sin + f64::from(height) * cos).ceil() as u32;
    let canvas_width = canvas_width.max(width);
    let canvas_height = canvas_height.max(height);

    let mut canvas = RgbImage::new(canvas_width, canvas_height);
    imageops::overlay(
        &mut canvas,
        image,
        i64::from((canvas_width - width) / 2),
        i64::from((canvas_height - height) / 2),
    );

    // Positive theta rotates clockwise in image coordinates
    rotate_about_center(&canvas, -theta as f32, Interpolation::Bilinear, Rgb([0, 0, 0]))
}

/// Crops a centered square of side `min(width, height) - 2 * margin`.
///
/// Fails when the margin consumes the whole image.
pub fn center_crop(image: &RgbImage, margin: u32) -> Result<RgbImage, ImageryError> {
    let (width, height) = image.dimensions();
    let side = i64::from(width.min(height)) - 2 * i64::from(margin);
    if side <= 0 {
        return Err(ImageryError::EmptyCrop {
            width,
            height,
            margin,
        });
    }

    let side = side as u32;
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    Ok(imageops::crop_imm(image, x, y, side, side).to_image())
}
