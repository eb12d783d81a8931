//! Native GeoTIFF reading/writing built on the `tiff` crate.
//!
//! Georeferencing is limited to ModelPixelScale + ModelTiepoint (north-up
//! grids) and the EPSG code from the GeoKey directory, which is all the
//! Landsat band exports and the LST/NDVI outputs need.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, RGBA8};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    /// EPSG code to record when the raster carries no CRS
    pub epsg: Option<u32>,
}

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single-band image of {}x{}, got {} samples",
            cols,
            rows,
            data.len()
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    if let Some(epsg) = read_epsg(&mut decoder) {
        raster.set_crs(Some(CRS::from_epsg(epsg)));
    }
    if let Ok(nodata) = decoder.get_tag_ascii_string(GDAL_NODATA) {
        if let Ok(v) = nodata.trim_end_matches('\0').trim().parse::<f64>() {
            raster.set_nodata(num_traits::cast(v));
        }
    }

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(MODEL_PIXEL_SCALE)
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(MODEL_TIEPOINT)
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}

/// EPSG code from GeographicTypeGeoKey or ProjectedCSTypeGeoKey.
fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u16_vec(GEO_KEY_DIRECTORY).ok()?;
    // Header is 4 shorts, then entries of (key, location, count, value)
    keys.get(4..)?
        .chunks_exact(4)
        .find(|e| {
            (e[0] == GEOGRAPHIC_TYPE_KEY || e[0] == PROJECTED_CS_TYPE_KEY) && e[1] == 0
        })
        .map(|e| e[3] as u32)
}

/// Write a Raster to a Float32 GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file, &options.unwrap_or_default())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(
    raster: &Raster<T>,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), &options.unwrap_or_default())?;
    Ok(buf)
}

fn geokeys(geographic: bool, epsg: Option<u32>) -> Vec<u16> {
    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE_KEY, 0, 1, if geographic { 2 } else { 1 }],
        [GT_RASTER_TYPE_KEY, 0, 1, 1], // RasterPixelIsArea
    ];
    if let Some(code) = epsg.and_then(|c| u16::try_from(c).ok()) {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        entries.push([key, 0, 1, code]);
    }

    let mut out = vec![1, 1, 0, entries.len() as u16];
    out.extend(entries.into_iter().flatten());
    out
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f32::NAN
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();

    let scale = vec![gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(MODEL_PIXEL_SCALE, scale.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(MODEL_TIEPOINT, tiepoint.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    let epsg = raster.crs().and_then(CRS::epsg).or(options.epsg);
    let keys = geokeys(raster.is_geographic(), epsg);
    image
        .encoder()
        .write_tag(GEO_KEY_DIRECTORY, keys.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

/// Write an RGBA8 pixel buffer (row-major, 4 bytes per pixel) as a plain TIFF.
///
/// Used for rendered quicklooks; no georeferencing is attached.
pub fn write_rgba_tiff<P: AsRef<Path>>(path: P, rgba: &[u8], cols: usize, rows: usize) -> Result<()> {
    if rgba.len() != rows * cols * 4 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;
    encoder
        .write_image::<RGBA8>(cols as u32, rows as u32, rgba)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thermal_band() -> Raster<f64> {
        let mut r = Raster::from_vec(vec![300.0, 301.5, f64::NAN, 298.25], 2, 2).unwrap();
        r.set_transform(GeoTransform::new(-63.25, -17.75, 0.0003, -0.0003));
        r.set_crs(Some(CRS::wgs84()));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn buffer_roundtrip_keeps_grid_and_crs() {
        let band = thermal_band();
        let bytes = write_geotiff_to_buffer(&band, None).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.shape(), (2, 2));
        assert_eq!(back.get(0, 1).unwrap(), 301.5);
        assert!(back.get(1, 0).unwrap().is_nan());
        assert_eq!(back.crs().and_then(CRS::epsg), Some(4326));
        let gt = back.transform();
        assert!((gt.origin_x + 63.25).abs() < 1e-9);
        assert!((gt.pixel_height + 0.0003).abs() < 1e-12);
    }

    #[test]
    fn file_roundtrip() {
        let band = thermal_band();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        write_geotiff(&band, tmp.path(), None).unwrap();
        let back: Raster<f64> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(back.get(1, 1).unwrap(), 298.25);
    }

    #[test]
    fn projected_epsg_from_options() {
        let mut r = Raster::filled(2, 2, 0.5_f64);
        r.set_transform(GeoTransform::new(470_000.0, 8_040_000.0, 30.0, -30.0));
        let opts = GeoTiffOptions { epsg: Some(32720) };
        let bytes = write_geotiff_to_buffer(&r, Some(opts)).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(back.crs().and_then(CRS::epsg), Some(32720));
        assert!(!back.is_geographic());
    }

    #[test]
    fn geokey_directory_layout() {
        let keys = geokeys(true, Some(4326));
        assert_eq!(&keys[..4], &[1, 1, 0, 3]);
        assert_eq!(&keys[12..16], &[GEOGRAPHIC_TYPE_KEY, 0, 1, 4326]);
    }

    #[test]
    fn rgba_size_checked() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        assert!(write_rgba_tiff(tmp.path(), &[0u8; 15], 2, 2).is_err());
        assert!(write_rgba_tiff(tmp.path(), &[255u8; 16], 2, 2).is_ok());
    }
}
