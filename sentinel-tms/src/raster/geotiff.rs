//! GeoTIFF raster backend.
//!
//! Reads georeferencing from the GeoTIFF tags:
//!
//! - `ModelTiepointTag` + `ModelPixelScaleTag` for north-up rasters
//! - `ModelTransformationTag` for rasters carrying a full affine matrix
//! - `GeoKeyDirectoryTag` for the EPSG code (`ProjectedCSTypeGeoKey`, falling
//!   back to `GeographicTypeGeoKey`)
//!
//! Only the first sample of each pixel is read; band files are single-band.
//! Window reads decode only the strips or tiles that intersect the window.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use super::{BandArray, GeoTransform, PixelWindow, Raster, RasterError, RasterOpener};

const GEOGRAPHIC_TYPE_GEO_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u32 = 3072;

/// Band file extensions this backend decodes.
pub const GEOTIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Opens band files as [`GeoTiffRaster`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffOpener;

impl RasterOpener for GeoTiffOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Raster>, RasterError> {
        Ok(Box::new(GeoTiffRaster::open(path)?))
    }
}

/// A georeferenced single-band TIFF on disk.
///
/// Opening reads only the header; pixel data is decoded on [`Raster::read_band`].
#[derive(Debug, Clone)]
pub struct GeoTiffRaster {
    path: PathBuf,
    width: u32,
    height: u32,
    geo_transform: GeoTransform,
    epsg: u32,
}

impl GeoTiffRaster {
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let mut decoder = open_decoder(path)?;
        let (width, height) = decoder.dimensions()?;
        let geo_transform = read_geo_transform(&mut decoder, path)?;
        let epsg = read_epsg(&mut decoder, path)?;

        debug!(
            path = %path.display(),
            width,
            height,
            epsg,
            "Opened GeoTIFF"
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            geo_transform,
            epsg,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Raster for GeoTiffRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn epsg(&self) -> u32 {
        self.epsg
    }

    fn read_band(&self) -> Result<BandArray, RasterError> {
        let mut decoder = open_decoder(&self.path)?;
        let values = decoding_result_to_f32(decoder.read_image()?);

        let pixels = self.width as usize * self.height as usize;
        if pixels == 0 || values.len() % pixels != 0 {
            return Err(RasterError::SizeMismatch {
                expected: pixels,
                actual: values.len(),
            });
        }

        let samples = values.len() / pixels;
        let data = if samples == 1 {
            values
        } else {
            values.into_iter().step_by(samples).collect()
        };

        BandArray::new(self.width, self.height, data)
    }

    fn read_window(&self, window: PixelWindow) -> Result<BandArray, RasterError> {
        if window.is_empty() {
            return BandArray::new(window.width, window.height, Vec::new());
        }

        let mut decoder = open_decoder(&self.path)?;
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        if chunk_width == 0 || chunk_height == 0 {
            return Ok(self.read_band()?.window(window));
        }
        let chunks_across = self.width.div_ceil(chunk_width);

        let first_col = window.x / chunk_width;
        let last_col = (window.x + window.width - 1) / chunk_width;
        let first_row = window.y / chunk_height;
        let last_row = (window.y + window.height - 1) / chunk_height;

        let mut data = vec![0.0f32; window.width as usize * window.height as usize];
        for chunk_row in first_row..=last_row {
            for chunk_col in first_col..=last_col {
                let index = chunk_row * chunks_across + chunk_col;
                let (data_width, data_height) = decoder.chunk_data_dimensions(index);
                let values = decoding_result_to_f32(decoder.read_chunk(index)?);

                let pixels = data_width as usize * data_height as usize;
                if pixels == 0 || values.len() < pixels {
                    return Err(RasterError::SizeMismatch {
                        expected: pixels,
                        actual: values.len(),
                    });
                }
                let samples = values.len() / pixels;

                let origin_x = chunk_col * chunk_width;
                let origin_y = chunk_row * chunk_height;
                let x_start = window.x.max(origin_x);
                let x_end = (window.x + window.width).min(origin_x + data_width);
                let y_start = window.y.max(origin_y);
                let y_end = (window.y + window.height).min(origin_y + data_height);

                for y in y_start..y_end {
                    let src_row = (y - origin_y) as usize * data_width as usize;
                    let dst_row = (y - window.y) as usize * window.width as usize;
                    for x in x_start..x_end {
                        let src = (src_row + (x - origin_x) as usize) * samples;
                        data[dst_row + (x - window.x) as usize] = values[src];
                    }
                }
            }
        }

        BandArray::new(window.width, window.height, data)
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, RasterError> {
    let file = File::open(path).map_err(|source| RasterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited()))
}

fn read_geo_transform(
    decoder: &mut Decoder<BufReader<File>>,
    path: &Path,
) -> Result<GeoTransform, RasterError> {
    if let Some(matrix) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = matrix.into_f64_vec()?;
        if m.len() >= 8 {
            return Ok(GeoTransform::new([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    let tiepoint = decoder.find_tag(Tag::ModelTiepointTag)?;
    let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
    match (tiepoint, scale) {
        (Some(tiepoint), Some(scale)) => {
            let t = tiepoint.into_f64_vec()?;
            let s = scale.into_f64_vec()?;
            if t.len() < 6 || s.len() < 2 {
                return Err(RasterError::MissingGeoreference(path.to_path_buf()));
            }
            // Tiepoint ties raster (I, J) to model (X, Y)
            Ok(GeoTransform::new([
                t[3] - t[0] * s[0],
                s[0],
                0.0,
                t[4] + t[1] * s[1],
                0.0,
                -s[1],
            ]))
        }
        _ => Err(RasterError::MissingGeoreference(path.to_path_buf())),
    }
}

fn read_epsg(decoder: &mut Decoder<BufReader<File>>, path: &Path) -> Result<u32, RasterError> {
    let keys = match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
        Some(value) => value.into_u32_vec()?,
        None => return Err(RasterError::MissingCrs(path.to_path_buf())),
    };

    // Header is [version, revision, minor, count]; entries are
    // [key_id, tiff_tag_location, count, value_offset]
    let mut geographic = None;
    for entry in keys.chunks_exact(4).skip(1) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match key {
            PROJECTED_CS_TYPE_GEO_KEY => return Ok(value),
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
            _ => {}
        }
    }

    geographic.ok_or_else(|| RasterError::MissingCrs(path.to_path_buf()))
}

fn decoding_result_to_f32(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
    }
}
