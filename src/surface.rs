//! Functions for working with GX2 surfaces containing all slices and mip levels.
//!
//! GX2 surfaces store the base level in the image data and the remaining levels in a separate mip data buffer.
//! Each level is padded to its surface size and aligned to its base alignment.
//! The offset of the first mip level is relative to the start of the image data.
//! The offsets of later mip levels are relative to the start of the mip data.
//!
//! Use [deswizzle_surface] for untiling surfaces into a single `Vec<u8>`.
//! This output can be used as is for creating DDS files.
//!
//! Use [swizzle_surface] for tiling a surface from a combined buffer like the result of [deswizzle_surface] or a DDS file.
//! The result of [swizzle_surface] is the image and mip data expected for GTX and BFRES textures.
//!
//! # Examples
//! Mip levels and slices are ordered by mip level and then slice.
//! A surface with `M` mip levels and `S` slices would have the following layout.
/*!
```no_compile
Mip 0 Slice 0
Mip 0 Slice 1
...
Mip 0 Slice S-1
Mip 1 Slice 0
...
Mip M-1 Slice S-1
```
*/
//! The deswizzled layout is tightly packed with no padding between slices or mip levels.
//! 3D surfaces have fewer slices for each mip level.
use alloc::{vec, vec::Vec};
use core::cmp::max;

use crate::{
    div_round_up, get_surface_info, surface_bits_per_pixel,
    swizzle::{deswizzle_inner, swizzle_inner},
    BlockDim, SurfaceDim, SurfaceError, SurfaceLayout, TiledSurface, MAX_DIMENSION,
    MAX_MIPMAP_COUNT,
};

// Only the pipe and bank bits of the swizzle apply to mip levels.
const SWIZZLE_MASK: u32 = 0x700;

/// The sizes and offsets for all the mip levels of a GX2 surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipChain {
    /// The size in bytes of the base level including all slices.
    pub image_size: u64,
    /// The required alignment in bytes of the image data.
    pub image_align: u32,
    /// The size in bytes of the mip data for all levels after the base level.
    pub mip_size: u64,
    /// The offsets for levels `1..mipmap_count`.
    ///
    /// The first offset is relative to the start of the image data.
    /// Later offsets are relative to the start of the mip data.
    pub mip_offsets: Vec<u64>,
    /// The layout of each level starting with the base level.
    pub levels: Vec<SurfaceLayout>,
}

impl MipChain {
    /// The offset of `level` in the mip data or [None] for the base level.
    pub fn mip_data_offset(&self, level: usize) -> Option<u64> {
        match level {
            0 => None,
            1 => Some(0),
            _ => self.mip_offsets.get(level - 1).copied(),
        }
    }
}

/// Calculates the layout for all `mipmap_count` levels of a GX2 surface.
///
/// A `mipmap_count` of 0 is treated as a surface with only the base level.
/// Returns [SurfaceError::InvalidMipmapCount] if `mipmap_count` is larger than [MAX_MIPMAP_COUNT].
/**
```rust
use wiiu_swizzle::{surface::mip_chain, SurfaceDim};

// 256x256 BC1 texture with 9 mip levels using GX2_TILE_MODE_2D_TILED_THIN1.
let chain = mip_chain(0x31, 256, 256, 1, SurfaceDim::D2, 4, 0, 9).unwrap();
assert_eq!(32768, chain.image_size);
assert_eq!(4096, chain.image_align);
assert_eq!(13312, chain.mip_size);
assert_eq!(8, chain.mip_offsets.len());
```
*/
pub fn mip_chain(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: u32,
    aa: u32,
    mipmap_count: u32,
) -> Result<MipChain, SurfaceError> {
    if mipmap_count > MAX_MIPMAP_COUNT {
        return Err(SurfaceError::InvalidMipmapCount { mipmap_count });
    }

    let levels = (0..max(mipmap_count, 1))
        .map(|level| get_surface_info(format, width, height, depth, dim, tile_mode, aa, level))
        .collect::<Result<Vec<_>, _>>()?;

    let image_size = levels[0].surf_size;
    let image_align = levels[0].base_align;

    let mut mip_offsets = Vec::with_capacity(levels.len().saturating_sub(1));
    let mut mip_size = 0;
    for (level, layout) in levels.iter().enumerate().skip(1) {
        let align = layout.base_align as u64;
        if level == 1 {
            // The first mip level starts the mip data.
            mip_offsets.push(align_offset(image_size, align));
            mip_size = layout.surf_size;
        } else {
            let offset = align_offset(mip_size, align);
            mip_offsets.push(offset);
            mip_size = offset + layout.surf_size;
        }
    }

    Ok(MipChain {
        image_size,
        image_align,
        mip_size,
        mip_offsets,
        levels,
    })
}

/// Calculates the size in bytes for the deswizzled data for all mip levels and slices.
/// The result is the expected size of the source for [swizzle_surface].
///
/// Returns 0 if a dimension is larger than [MAX_DIMENSION],
/// `mipmap_count` is larger than [MAX_MIPMAP_COUNT], or the size does not fit in a `usize`.
/**
```rust
use wiiu_swizzle::{surface::deswizzled_surface_size, SurfaceDim};

// 16x16 R8G8B8A8 cube map with 5 mip levels.
assert_eq!(8184, deswizzled_surface_size(0x1a, 16, 16, 6, SurfaceDim::Cube, 5));
```
*/
pub fn deswizzled_surface_size(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    mipmap_count: u32,
) -> usize {
    if width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || depth > MAX_DIMENSION
        || mipmap_count > MAX_MIPMAP_COUNT
    {
        return 0;
    }

    let bytes_per_pixel = bytes_per_pixel(format);
    let block_dim = BlockDim::from_format(format);
    (0..max(mipmap_count, 1))
        .try_fold(0usize, |size, level| {
            let (mip_width, mip_height) = mip_dimensions(width, height, dim, level);
            let slices = level_slices(depth, dim, level);
            deswizzled_slice_size(mip_width, mip_height, block_dim, bytes_per_pixel)?
                .checked_mul(slices as usize)?
                .checked_add(size)
        })
        .unwrap_or(0)
}

/// Tiles all the mip levels and slices in `source` to the image data and mip data for a GX2 surface.
///
/// The `format`, `tile_mode`, and `aa` use the GX2 enum values.
/// The `swizzle` is the value stored with the surface and only the bank and pipe bits are used.
///
/// Returns [SurfaceError::NotEnoughData] if `source` does not have
/// at least as many bytes as the result of [deswizzled_surface_size].
/// Returns [SurfaceError::BlocksOutOfRange] if any block would be written outside the tiled data.
///
/// Only the first sample of multisampled surfaces with a nonzero `aa` is tiled.
/// The remaining samples in the image data are left as zeros.
///
/// # Examples
/**
```rust
use wiiu_swizzle::{surface::{deswizzled_surface_size, swizzle_surface}, SurfaceDim};

// 64x64 R8G8B8A8 texture with 7 mip levels using GX2_TILE_MODE_2D_TILED_THIN1.
let size = deswizzled_surface_size(0x1a, 64, 64, 1, SurfaceDim::D2, 7);
let deswizzled = vec![0u8; size];
let (image_data, mip_data) =
    swizzle_surface(0x1a, 64, 64, 1, SurfaceDim::D2, 4, 0, 0, &deswizzled, 7).unwrap();
assert_eq!(16384, image_data.len());
assert_eq!(6144, mip_data.len());
```
*/
pub fn swizzle_surface(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: u32,
    aa: u32,
    swizzle: u32,
    source: &[u8],
    mipmap_count: u32,
) -> Result<(Vec<u8>, Vec<u8>), SurfaceError> {
    let chain = mip_chain(format, width, height, depth, dim, tile_mode, aa, mipmap_count)?;

    let expected_size = deswizzled_surface_size(format, width, height, depth, dim, mipmap_count);
    if source.len() < expected_size {
        return Err(SurfaceError::NotEnoughData {
            expected_size,
            actual_size: source.len(),
        });
    }

    let mut image_data = vec![0u8; chain.image_size as usize];
    let mut mip_data = vec![0u8; chain.mip_size as usize];

    let mut offset = 0;
    for (level, layout) in chain.levels.iter().enumerate() {
        let destination = match chain.mip_data_offset(level) {
            None => &mut image_data[..],
            Some(start) => {
                let start = start as usize;
                &mut mip_data[start..start + layout.surf_size as usize]
            }
        };

        offset += swizzle_level::<false>(
            layout,
            format,
            width,
            height,
            depth,
            dim,
            aa,
            swizzle,
            level as u32,
            &source[offset..],
            destination,
        )?;
    }

    Ok((image_data, mip_data))
}

/// Untiles all the mip levels and slices in `image_data` and `mip_data` to a new vector
/// without any padding between mip levels or slices.
///
/// The `format`, `tile_mode`, and `aa` use the GX2 enum values.
/// The `swizzle` is the value stored with the surface and only the bank and pipe bits are used.
/// The `mip_data` is ignored for surfaces with a single mip level.
///
/// Returns [SurfaceError::NotEnoughData] if `image_data` or `mip_data` are smaller
/// than the sizes calculated by [mip_chain].
/// Returns [SurfaceError::BlocksOutOfRange] if any block would be read from outside the tiled data.
///
/// Only the first sample of multisampled surfaces with a nonzero `aa` is untiled.
/// The result has the same size as for a single sampled surface.
/**
```rust
use wiiu_swizzle::{surface::deswizzle_surface, SurfaceDim};
# let image_data = vec![0u8; 12288];
# let mip_data = vec![0u8; 8192];

// 16x16 R8G8B8A8 cube map with 5 mip levels using GX2_TILE_MODE_2D_TILED_THIN1.
let deswizzled =
    deswizzle_surface(0x1a, 16, 16, 6, SurfaceDim::Cube, 4, 0, 0, &image_data, &mip_data, 5)
        .unwrap();
assert_eq!(8184, deswizzled.len());
```
*/
pub fn deswizzle_surface(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: u32,
    aa: u32,
    swizzle: u32,
    image_data: &[u8],
    mip_data: &[u8],
    mipmap_count: u32,
) -> Result<Vec<u8>, SurfaceError> {
    let chain = mip_chain(format, width, height, depth, dim, tile_mode, aa, mipmap_count)?;
    check_size(chain.image_size, image_data)?;
    if chain.levels.len() > 1 {
        check_size(chain.mip_size, mip_data)?;
    }

    let mut result = vec![0u8; deswizzled_surface_size(format, width, height, depth, dim, mipmap_count)];

    let mut offset = 0;
    for (level, layout) in chain.levels.iter().enumerate() {
        let source = match chain.mip_data_offset(level) {
            None => &image_data[..chain.image_size as usize],
            Some(start) => {
                let start = start as usize;
                &mip_data[start..start + layout.surf_size as usize]
            }
        };

        offset += swizzle_level::<true>(
            layout,
            format,
            width,
            height,
            depth,
            dim,
            aa,
            swizzle,
            level as u32,
            source,
            &mut result[offset..],
        )?;
    }

    Ok(result)
}

fn check_size(expected_size: u64, data: &[u8]) -> Result<(), SurfaceError> {
    if (data.len() as u64) < expected_size {
        Err(SurfaceError::NotEnoughData {
            expected_size: expected_size as usize,
            actual_size: data.len(),
        })
    } else {
        Ok(())
    }
}

// Returns the number of deswizzled bytes read or written for all slices of the level.
// Every block must be in bounds since the buffers are sized from the layout.
#[allow(clippy::too_many_arguments)]
fn swizzle_level<const DESWIZZLE: bool>(
    layout: &SurfaceLayout,
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    aa: u32,
    swizzle: u32,
    level: u32,
    source: &[u8],
    destination: &mut [u8],
) -> Result<usize, SurfaceError> {
    let (mip_width, mip_height) = mip_dimensions(width, height, dim, level);
    let mut surface = TiledSurface::from_layout(layout, mip_width, mip_height, format, swizzle & SWIZZLE_MASK);
    // Only sample 0 is addressed.
    surface.num_samples = 1 << aa;

    let slice_size = deswizzled_slice_size(
        mip_width,
        mip_height,
        surface.block_dim,
        bytes_per_pixel(format),
    )
    .ok_or(SurfaceError::InvalidDimensions {
        width,
        height,
        depth,
    })?;

    let slices = level_slices(depth, dim, level);
    for slice in 0..slices {
        surface.slice = slice;
        let start = slice as usize * slice_size;
        let skipped = if DESWIZZLE {
            deswizzle_inner(&surface, source, &mut destination[start..start + slice_size])?
        } else {
            swizzle_inner::<false>(&surface, &source[start..start + slice_size], destination)?
        };
        if skipped > 0 {
            return Err(SurfaceError::BlocksOutOfRange { count: skipped });
        }
    }

    Ok(slices as usize * slice_size)
}

fn align_offset(offset: u64, align: u64) -> u64 {
    let align = max(align, 1);
    (offset + align - 1) / align * align
}

fn bytes_per_pixel(format: u32) -> usize {
    surface_bits_per_pixel(format) as usize / 8
}

fn deswizzled_slice_size(
    width: u32,
    height: u32,
    block_dim: BlockDim,
    bytes_per_pixel: usize,
) -> Option<usize> {
    (div_round_up(width, block_dim.width.get()) as usize)
        .checked_mul(div_round_up(height, block_dim.height.get()) as usize)?
        .checked_mul(bytes_per_pixel)
}

fn mip_dimensions(width: u32, height: u32, dim: SurfaceDim, level: u32) -> (u32, u32) {
    let mip_width = max(1, width.checked_shr(level).unwrap_or(0));
    let mip_height = match dim {
        SurfaceDim::D1 | SurfaceDim::D1Array => 1,
        _ => max(1, height.checked_shr(level).unwrap_or(0)),
    };
    (mip_width, mip_height)
}

// Only 3D surfaces have fewer slices for smaller mip levels.
fn level_slices(depth: u32, dim: SurfaceDim, level: u32) -> u32 {
    match dim {
        SurfaceDim::D1 | SurfaceDim::D2 | SurfaceDim::D2Msaa => 1,
        SurfaceDim::D3 => max(1, depth.checked_shr(level).unwrap_or(0)),
        SurfaceDim::Cube => max(6, depth),
        SurfaceDim::D1Array | SurfaceDim::D2Array | SurfaceDim::D2MsaaArray => max(1, depth),
    }
}
