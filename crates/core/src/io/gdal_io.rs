//! GeoTIFF reading and writing using GDAL

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use gdal::raster::GdalType;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use std::path::Path;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Compression type: "DEFLATE", "LZW", "ZSTD", "NONE"
    pub compression: String,
    /// Tile size for tiled TIFFs (0 for strips)
    pub tile_size: usize,
    /// BigTIFF for files > 4GB
    pub bigtiff: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            compression: "LZW".to_string(),
            tile_size: 256,
            bigtiff: false,
        }
    }
}

/// Read a GeoTIFF file into a Raster
///
/// # Arguments
/// * `path` - Path to the GeoTIFF file
/// * `band` - Band number (1-indexed), defaults to 1
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
{
    let dataset = Dataset::open(path.as_ref())?;
    let band_idx = band.unwrap_or(1);
    let rasterband = dataset.rasterband(band_idx)?;

    let (cols, rows) = dataset.raster_size();

    let buffer = rasterband.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;

    let mut raster = Raster::from_vec(buffer.data().to_vec(), rows, cols)?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }

    if let Ok(srs) = dataset.spatial_ref() {
        if let Ok(wkt) = srs.to_wkt() {
            let crs = if let Ok(code) = srs.auth_code() {
                Crs::from_epsg(code as u32)
            } else {
                Crs::from_wkt(wkt)
            };
            raster.set_crs(Some(crs));
        }
    }

    if let Ok(nodata) = rasterband.no_data_value() {
        if let Some(nd) = num_traits::cast(nodata) {
            raster.set_nodata(Some(nd));
        }
    }

    Ok(raster)
}

/// Update one band of a raster file window by window.
///
/// Each window is read, handed to `op` together with the band's nodata
/// sentinel, and written back before the next window is read, so peak memory
/// stays bounded by the window size regardless of raster dimensions. A
/// window that fails to read or write raises `RasterIoFailure` naming the
/// file; windows already written stay written. Errors raised by `op`
/// propagate unchanged.
pub fn update_band_windowed<T, P, F>(
    path: P,
    band: Option<usize>,
    window_size: usize,
    mut op: F,
) -> Result<()>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
    F: FnMut(&mut [T], Option<T>) -> Result<()>,
{
    let path = path.as_ref();
    let io_err = |message: String| Error::RasterIoFailure {
        path: path.to_path_buf(),
        message,
    };

    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
        ..Default::default()
    };
    let dataset = Dataset::open_ex(path, options).map_err(|e| io_err(e.to_string()))?;
    let mut rasterband = dataset
        .rasterband(band.unwrap_or(1))
        .map_err(|e| io_err(e.to_string()))?;

    let nodata = rasterband
        .no_data_value()
        .ok()
        .and_then(num_traits::cast::<f64, T>);

    let (cols, rows) = dataset.raster_size();
    let mut row = 0;
    while row < rows {
        let h = window_size.min(rows - row);
        let mut col = 0;
        while col < cols {
            let w = window_size.min(cols - col);

            let buffer = rasterband
                .read_as::<T>((col as isize, row as isize), (w, h), (w, h), None)
                .map_err(|e| io_err(e.to_string()))?;
            let mut data = buffer.data().to_vec();

            op(&mut data, nodata)?;

            rasterband
                .write((col as isize, row as isize), (w, h), &data)
                .map_err(|e| io_err(e.to_string()))?;
            col += w;
        }
        row += h;
    }

    Ok(())
}

/// Write a Raster to a GeoTIFF file
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
{
    let opts = options.unwrap_or_default();
    let driver = DriverManager::get_driver_by_name("GTiff")?;

    let (rows, cols) = raster.shape();

    let mut create_options = vec![format!("COMPRESS={}", opts.compression)];

    if opts.tile_size > 0 {
        create_options.push("TILED=YES".to_string());
        create_options.push(format!("BLOCKXSIZE={}", opts.tile_size));
        create_options.push(format!("BLOCKYSIZE={}", opts.tile_size));
    }

    if opts.bigtiff {
        create_options.push("BIGTIFF=YES".to_string());
    }

    let create_options_refs: Vec<&str> = create_options.iter().map(|s| s.as_str()).collect();

    let mut dataset = driver.create_with_band_type_with_options::<T, _>(
        path.as_ref(),
        cols as isize,
        rows as isize,
        1,
        &create_options_refs,
    )?;

    dataset.set_geo_transform(&raster.transform().to_gdal())?;

    if let Some(crs) = raster.crs() {
        if let Some(epsg) = crs.epsg() {
            let srs = SpatialRef::from_epsg(epsg)?;
            dataset.set_spatial_ref(&srs)?;
        } else if let Some(wkt) = crs.wkt() {
            let srs = SpatialRef::from_wkt(wkt)?;
            dataset.set_spatial_ref(&srs)?;
        }
    }

    let mut band = dataset.rasterband(1)?;

    if let Some(nodata) = raster.nodata() {
        if let Some(nd) = num_traits::cast(nodata) {
            band.set_no_data_value(Some(nd))?;
        }
    }

    let data: Vec<T> = raster.data().iter().copied().collect();
    band.write((0, 0), (cols, rows), &data)?;

    Ok(())
}
