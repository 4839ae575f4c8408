//! Documentation for the C API.
//!
//! For easier integration, none of the FFI methods allocate memory visible to the caller.
//! When tiling or untiling, make sure to allocate
//! the appropriate amount of memory for the destination array.
//! Use the `surf_size` from [wiiu_get_surface_info] for tiled data
//! and [wiiu_deswizzled_surface_size] for untiled surfaces.
//!
//! Functions that can fail return a status code.
//! A value of [WIIU_OK] indicates success.
use crate::{
    surface::deswizzled_surface_size, swizzle::deswizzle_inner, swizzle::swizzle_inner,
    SurfaceDim, SurfaceError, SurfaceLayout, TileMode, TiledSurface,
};

/// The operation completed successfully.
pub const WIIU_OK: i32 = 0;
/// See [SurfaceError::InvalidBitsPerPixel].
pub const WIIU_INVALID_BITS_PER_PIXEL: i32 = 1;
/// See [SurfaceError::InvalidFormat].
pub const WIIU_INVALID_FORMAT: i32 = 2;
/// See [SurfaceError::UnsupportedTileMode].
pub const WIIU_UNSUPPORTED_TILE_MODE: i32 = 3;
/// See [SurfaceError::InvalidSampleCount].
pub const WIIU_INVALID_SAMPLE_COUNT: i32 = 4;
/// See [SurfaceError::InvalidAaMode].
pub const WIIU_INVALID_AA_MODE: i32 = 5;
/// See [SurfaceError::InvalidDimensions].
pub const WIIU_INVALID_DIMENSIONS: i32 = 6;
/// See [SurfaceError::InvalidMipmapCount].
pub const WIIU_INVALID_MIPMAP_COUNT: i32 = 7;
/// See [SurfaceError::NotEnoughData].
pub const WIIU_NOT_ENOUGH_DATA: i32 = 8;
/// The surface dimension is not one of the GX2 values.
pub const WIIU_INVALID_SURFACE_DIM: i32 = 9;
/// See [SurfaceError::BlocksOutOfRange].
pub const WIIU_BLOCKS_OUT_OF_RANGE: i32 = 10;

/// The C representation of [SurfaceLayout].
/// The tile mode uses the GX2 enum values.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WiiuSurfaceInfo {
    pub tile_mode: u32,
    pub bpp: u32,
    pub pitch: u32,
    pub height: u32,
    pub depth: u32,
    pub surf_size: u64,
    pub slice_size: u64,
    pub base_align: u32,
    pub pitch_align: u32,
    pub height_align: u32,
    pub depth_align: u32,
    pub pixel_pitch: u32,
    pub pixel_height: u32,
    pub pixel_bits: u32,
}

impl From<SurfaceLayout> for WiiuSurfaceInfo {
    fn from(layout: SurfaceLayout) -> Self {
        Self {
            tile_mode: layout.gx2_tile_mode(),
            bpp: layout.bpp,
            pitch: layout.pitch,
            height: layout.height,
            depth: layout.depth,
            surf_size: layout.surf_size,
            slice_size: layout.slice_size,
            base_align: layout.base_align,
            pitch_align: layout.pitch_align,
            height_align: layout.height_align,
            depth_align: layout.depth_align,
            pixel_pitch: layout.pixel_pitch,
            pixel_height: layout.pixel_height,
            pixel_bits: layout.pixel_bits,
        }
    }
}

fn status(error: SurfaceError) -> i32 {
    match error {
        SurfaceError::InvalidBitsPerPixel { .. } => WIIU_INVALID_BITS_PER_PIXEL,
        SurfaceError::InvalidFormat { .. } => WIIU_INVALID_FORMAT,
        SurfaceError::UnsupportedTileMode { .. } => WIIU_UNSUPPORTED_TILE_MODE,
        SurfaceError::InvalidSampleCount { .. } => WIIU_INVALID_SAMPLE_COUNT,
        SurfaceError::InvalidAaMode { .. } => WIIU_INVALID_AA_MODE,
        SurfaceError::InvalidDimensions { .. } => WIIU_INVALID_DIMENSIONS,
        SurfaceError::InvalidMipmapCount { .. } => WIIU_INVALID_MIPMAP_COUNT,
        SurfaceError::NotEnoughData { .. } => WIIU_NOT_ENOUGH_DATA,
        SurfaceError::BlocksOutOfRange { .. } => WIIU_BLOCKS_OUT_OF_RANGE,
    }
}

fn tiled_surface(
    info: &WiiuSurfaceInfo,
    width: u32,
    height: u32,
    format: u32,
    swizzle: u32,
    slice: u32,
) -> Result<TiledSurface, SurfaceError> {
    // LinearGeneral uses the GX2 value 16.
    let tile_mode = TileMode::new(info.tile_mode & 0xF).ok_or(SurfaceError::UnsupportedTileMode {
        tile_mode: info.tile_mode,
    })?;
    let mut surface = TiledSurface::from_layout(
        &SurfaceLayout {
            tile_mode,
            bpp: info.bpp,
            pitch: info.pitch,
            height: info.height,
            depth: info.depth,
            surf_size: info.surf_size,
            slice_size: info.slice_size,
            base_align: info.base_align,
            pitch_align: info.pitch_align,
            height_align: info.height_align,
            depth_align: info.depth_align,
            pixel_pitch: info.pixel_pitch,
            pixel_height: info.pixel_height,
            pixel_bits: info.pixel_bits,
        },
        width,
        height,
        format,
        swizzle,
    );
    surface.slice = slice;
    Ok(surface)
}

/// See [crate::get_surface_info].
///
/// Returns [WIIU_OK] and writes the layout to `info` on success.
/// `info` is not modified if an error occurs.
///
/// # Safety
/// `info` must be a valid pointer to a [WiiuSurfaceInfo].
#[no_mangle]
pub unsafe extern "C" fn wiiu_get_surface_info(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: u32,
    tile_mode: u32,
    aa: u32,
    level: u32,
    info: *mut WiiuSurfaceInfo,
) -> i32 {
    let dim = match SurfaceDim::new(dim) {
        Some(dim) => dim,
        None => return WIIU_INVALID_SURFACE_DIM,
    };
    match crate::get_surface_info(format, width, height, depth, dim, tile_mode, aa, level) {
        Ok(layout) => {
            *info = layout.into();
            WIIU_OK
        }
        Err(e) => status(e),
    }
}

/// See [crate::swizzle].
///
/// The `info` should be the result of [wiiu_get_surface_info] for the same mip level.
/// Blocks with an offset outside either array are skipped.
///
/// # Safety
/// `info` must be a valid pointer to a [WiiuSurfaceInfo].
/// `source` and `source_len` should refer to an array with the untiled data for the slice.
/// Similarly, `destination` and `destination_len` should refer to an array
/// with at least as many bytes as the `surf_size` of `info`.
#[no_mangle]
pub unsafe extern "C" fn wiiu_swizzle(
    info: *const WiiuSurfaceInfo,
    width: u32,
    height: u32,
    format: u32,
    swizzle: u32,
    slice: u32,
    source: *const u8,
    source_len: usize,
    destination: *mut u8,
    destination_len: usize,
) -> i32 {
    let source = core::slice::from_raw_parts(source, source_len);
    let destination = core::slice::from_raw_parts_mut(destination, destination_len);

    tiled_surface(&*info, width, height, format, swizzle, slice)
        .and_then(|surface| swizzle_inner::<false>(&surface, source, destination))
        .map_or_else(status, |_| WIIU_OK)
}

/// See [crate::deswizzle].
///
/// The `info` should be the result of [wiiu_get_surface_info] for the same mip level.
/// Blocks with an offset outside either array are skipped.
///
/// # Safety
/// `info` must be a valid pointer to a [WiiuSurfaceInfo].
/// `source` and `source_len` should refer to an array with at least as many bytes as the `surf_size` of `info`.
/// Similarly, `destination` and `destination_len` should refer to an array
/// large enough for the untiled data for the slice.
#[no_mangle]
pub unsafe extern "C" fn wiiu_deswizzle(
    info: *const WiiuSurfaceInfo,
    width: u32,
    height: u32,
    format: u32,
    swizzle: u32,
    slice: u32,
    source: *const u8,
    source_len: usize,
    destination: *mut u8,
    destination_len: usize,
) -> i32 {
    let source = core::slice::from_raw_parts(source, source_len);
    let destination = core::slice::from_raw_parts_mut(destination, destination_len);

    tiled_surface(&*info, width, height, format, swizzle, slice)
        .and_then(|surface| deswizzle_inner(&surface, source, destination))
        .map_or_else(status, |_| WIIU_OK)
}

/// See [crate::surface_bits_per_pixel].
#[no_mangle]
pub extern "C" fn wiiu_surface_bits_per_pixel(format: u32) -> u32 {
    crate::surface_bits_per_pixel(format)
}

/// See [crate::surface::deswizzled_surface_size].
/// Returns 0 if `dim` is not one of the GX2 values or the surface is invalid.
#[no_mangle]
pub extern "C" fn wiiu_deswizzled_surface_size(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: u32,
    mipmap_count: u32,
) -> usize {
    SurfaceDim::new(dim)
        .map(|dim| deswizzled_surface_size(format, width, height, depth, dim, mipmap_count))
        .unwrap_or(0)
}
