//! Surface layout calculation for GX2 surfaces.
use bitflags::bitflags;
use core::cmp::max;

use crate::{
    format::{format_info, hw_format, is_block_compressed, surface_bits_per_pixel},
    hwl::{AddressGenerator, R7xx},
    layout::{compute_padded_surface, LayoutInput},
    next_pow2, pow_two_align, selector::mip_level_tile_mode,
    ElementMode, FormatInfo, SurfaceError, TileMode, MAX_DIMENSION,
};

bitflags! {
    /// Surface properties using the bit layout of the hardware input flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
        const TEXTURE = 1 << 3;
        const CUBE = 1 << 4;
        const VOLUME = 1 << 5;
        /// Use the non bank swapped version of the tile mode.
        const FMASK = 1 << 6;
        const CUBE_AS_ARRAY = 1 << 7;
        /// Pad the pitch of 3 component linear surfaces as a single component.
        const LINEAR_WA = 1 << 9;
        /// The dimensions describe the base level instead of the requested mip level.
        const INPUT_BASE_MAP = 1 << 12;
        /// Align the pitch for scan out.
        const DISPLAY = 1 << 13;
    }
}

bitflags! {
    /// The GX2 usage of a surface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceUse: u32 {
        const TEXTURE = 1 << 0;
        const COLOR_BUFFER = 1 << 1;
        const DEPTH_BUFFER = 1 << 2;
        const SCAN_BUFFER = 1 << 3;
    }
}

/// The GX2 surface dimension.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum SurfaceDim {
    D1 = 0,
    D2 = 1,
    D3 = 2,
    Cube = 3,
    D1Array = 4,
    D2Array = 5,
    D2Msaa = 6,
    D2MsaaArray = 7,
}

impl SurfaceDim {
    /// Attempts to construct a surface dimension from the GX2 `value`.
    /// Returns [None] if `value` is not a valid dimension.
    /// # Examples
    /**
    ```rust
    use wiiu_swizzle::SurfaceDim;

    assert_eq!(Some(SurfaceDim::Cube), SurfaceDim::new(3));
    assert_eq!(None, SurfaceDim::new(8));
    ```
    */
    pub fn new(value: u32) -> Option<Self> {
        match value {
            0 => Some(SurfaceDim::D1),
            1 => Some(SurfaceDim::D2),
            2 => Some(SurfaceDim::D3),
            3 => Some(SurfaceDim::Cube),
            4 => Some(SurfaceDim::D1Array),
            5 => Some(SurfaceDim::D2Array),
            6 => Some(SurfaceDim::D2Msaa),
            7 => Some(SurfaceDim::D2MsaaArray),
            _ => None,
        }
    }
}

/// The parameters of a single mip level of a surface.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SurfaceDescriptor {
    /// The GX2 surface format or `0` to use `bpp` without any expansion.
    pub format: u32,
    pub bpp: u32,
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub num_samples: u32,
    /// The requested tile mode for the base level.
    pub tile_mode: TileMode,
    pub mip_level: u32,
    /// The slice for calculating [SurfaceLayout::slice_size].
    pub slice: u32,
    pub flags: SurfaceFlags,
}

impl Default for SurfaceDescriptor {
    fn default() -> Self {
        Self {
            format: 0,
            bpp: 0,
            width: 1,
            height: 1,
            num_slices: 1,
            num_samples: 1,
            tile_mode: TileMode::LinearGeneral,
            mip_level: 0,
            slice: 0,
            flags: SurfaceFlags::empty(),
        }
    }
}

/// The memory layout of a single mip level of a surface.
///
/// The `pitch` and `height` are padded and in elements,
/// so block compressed formats use the dimensions in blocks.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SurfaceLayout {
    /// The tile mode used for this mip level.
    pub tile_mode: TileMode,
    /// The bits per element.
    pub bpp: u32,
    pub pitch: u32,
    pub height: u32,
    pub depth: u32,
    /// The size in bytes of the mip level including padding.
    pub surf_size: u64,
    pub slice_size: u64,
    pub base_align: u32,
    pub pitch_align: u32,
    pub height_align: u32,
    pub depth_align: u32,
    /// The padded width in pixels.
    pub pixel_pitch: u32,
    /// The padded height in pixels.
    pub pixel_height: u32,
    /// The bits per pixel of the format.
    pub pixel_bits: u32,
}

impl SurfaceLayout {
    /// The pitch in 8 pixel tiles minus one.
    pub fn pitch_tile_max(&self) -> i32 {
        (self.pitch >> 3) as i32 - 1
    }

    /// The height in 8 pixel tiles minus one.
    pub fn height_tile_max(&self) -> i32 {
        (self.height >> 3) as i32 - 1
    }

    /// The number of 8x8 tiles in a slice minus one.
    pub fn slice_tile_max(&self) -> i64 {
        ((self.height as i64 * self.pitch as i64) >> 6) - 1
    }

    /// The GX2 tile mode, which uses `16` for [TileMode::LinearGeneral].
    pub fn gx2_tile_mode(&self) -> u32 {
        match self.tile_mode {
            TileMode::LinearGeneral => 16,
            mode => mode as u32,
        }
    }
}

/// Calculates the layout of a mip level for the Wii U.
/// See [compute_surface_info_with] for other GPU generations.
/**
```rust
use wiiu_swizzle::{compute_surface_info, SurfaceDescriptor, TileMode};

let layout = compute_surface_info(&SurfaceDescriptor {
    format: 0x1a,
    bpp: 32,
    width: 30,
    height: 30,
    tile_mode: TileMode::Tiled2DThin1,
    ..Default::default()
})
.unwrap();
assert_eq!(32, layout.pitch);
assert_eq!(32, layout.height);
assert_eq!(4096, layout.surf_size);
```
*/
pub fn compute_surface_info(descriptor: &SurfaceDescriptor) -> Result<SurfaceLayout, SurfaceError> {
    compute_surface_info_with(&R7xx, descriptor)
}

/// Calculates the layout of a mip level using the alignment rules of `gen`.
pub fn compute_surface_info_with<G: AddressGenerator + ?Sized>(
    gen: &G,
    descriptor: &SurfaceDescriptor,
) -> Result<SurfaceLayout, SurfaceError> {
    if descriptor.bpp > 128 {
        return Err(SurfaceError::InvalidBitsPerPixel {
            bpp: descriptor.bpp,
        });
    }

    if descriptor.num_samples > 8 {
        return Err(SurfaceError::InvalidSampleCount {
            num_samples: descriptor.num_samples,
        });
    }

    validate_dimensions(descriptor.width, descriptor.height, descriptor.num_slices)?;

    let mut flags = descriptor.flags;
    let mip_level = descriptor.mip_level;

    let (width, height, num_slices) = mip_dimensions(
        hw_format(descriptor.format),
        max(descriptor.width, 1),
        max(descriptor.height, 1),
        max(descriptor.num_slices, 1),
        mip_level,
        flags,
    );

    let (bpp, width, height, info) = if descriptor.format != 0 {
        let info = format_info(descriptor.format);

        // 3 component formats can't be linear aligned with the usual pitch alignment.
        if info.element_mode == ElementMode::Expanded
            && info.expand_x == 3
            && descriptor.tile_mode == TileMode::LinearAligned
        {
            flags |= SurfaceFlags::LINEAR_WA;
        }

        let (bpp, width, height) = adjust_surface_info(info, width, height);
        if bpp == 0 {
            return Err(SurfaceError::InvalidFormat {
                format: descriptor.format,
            });
        }
        (bpp, width, height, Some(info))
    } else if descriptor.bpp != 0 {
        (descriptor.bpp, width, height, None)
    } else {
        return Err(SurfaceError::InvalidBitsPerPixel { bpp: 0 });
    };

    let num_samples = max(descriptor.num_samples, 1);
    let pad_dims = if flags.contains(SurfaceFlags::CUBE) && mip_level == 0 {
        2
    } else {
        0
    };

    let tile_mode = if flags.contains(SurfaceFlags::FMASK) {
        descriptor.tile_mode.to_non_bank_swapped()
    } else {
        mip_level_tile_mode(
            gen,
            descriptor.tile_mode,
            bpp,
            mip_level,
            width,
            height,
            num_slices,
            num_samples,
            flags.contains(SurfaceFlags::DEPTH),
        )
    };

    let padded = compute_padded_surface(
        gen,
        &LayoutInput {
            tile_mode,
            base_tile_mode: descriptor.tile_mode,
            bpp,
            num_samples,
            pitch: width,
            height,
            num_slices,
            mip_level,
            pad_dims,
            flags,
        },
    )?;

    let (pixel_pitch, pixel_height) = match info {
        Some(info) if !flags.contains(SurfaceFlags::LINEAR_WA) || mip_level == 0 => {
            restore_surface_info(info, padded.pitch, padded.height)
        }
        _ => (padded.pitch, padded.height),
    };

    let slice_size = if flags.contains(SurfaceFlags::VOLUME) {
        padded.surf_size
    } else {
        let depth = max(padded.depth, 1) as u64;
        let slice_size = padded.surf_size / depth;
        // The last slice includes any padding slices.
        if num_slices > 1 && descriptor.slice == num_slices - 1 {
            slice_size + slice_size * depth.saturating_sub(num_slices as u64)
        } else {
            slice_size
        }
    };

    let layout = SurfaceLayout {
        tile_mode: padded.tile_mode,
        bpp,
        pitch: padded.pitch,
        height: padded.height,
        depth: padded.depth,
        surf_size: padded.surf_size,
        slice_size,
        base_align: padded.base_align,
        pitch_align: padded.pitch_align,
        height_align: padded.height_align,
        depth_align: padded.depth_align,
        pixel_pitch,
        pixel_height,
        pixel_bits: descriptor.bpp,
    };
    log::trace!("Computed layout {:?} for {:?}", layout, descriptor);

    Ok(layout)
}

/// Calculates the layout of a mip level of a GX2 surface for the Wii U.
///
/// The `tile_mode` and `aa` use the GX2 values.
/// A `tile_mode` of `16` selects the unpadded linear layout.
/// The `width`, `height`, and `depth` are for the base level,
/// and the `level` selects the mip level starting from `0`.
/**
```rust
use wiiu_swizzle::{get_surface_info, SurfaceDim, TileMode};

// GX2_SURFACE_FORMAT_TCS_R8_G8_B8_A8_UNORM
let layout = get_surface_info(0x1a, 64, 64, 1, SurfaceDim::D2, 1, 0, 0).unwrap();
assert_eq!(TileMode::LinearAligned, layout.tile_mode);
assert_eq!(64, layout.pitch);
assert_eq!(16384, layout.surf_size);
assert_eq!(256, layout.base_align);
```
*/
pub fn get_surface_info(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: u32,
    aa: u32,
    level: u32,
) -> Result<SurfaceLayout, SurfaceError> {
    get_surface_info_with(&R7xx, format, width, height, depth, dim, tile_mode, aa, level)
}

/// Calculates the layout of a mip level of a GX2 surface using the alignment rules of `gen`.
/// See [get_surface_info].
pub fn get_surface_info_with<G: AddressGenerator + ?Sized>(
    gen: &G,
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: u32,
    aa: u32,
    level: u32,
) -> Result<SurfaceLayout, SurfaceError> {
    if aa > 3 {
        return Err(SurfaceError::InvalidAaMode { aa });
    }
    validate_dimensions(width, height, depth)?;

    let num_samples = 1 << aa;
    let mip_width = max(1, shift_dim(width, level));
    let mip_height = max(1, shift_dim(height, level));

    let (height, num_slices) = match dim {
        SurfaceDim::D1 => (1, 1),
        SurfaceDim::D2 | SurfaceDim::D2Msaa => (mip_height, 1),
        SurfaceDim::D3 => (mip_height, max(1, shift_dim(depth, level))),
        SurfaceDim::Cube => (mip_height, max(6, depth)),
        SurfaceDim::D1Array => (1, depth),
        SurfaceDim::D2Array | SurfaceDim::D2MsaaArray => (mip_height, depth),
    };

    if tile_mode == 16 {
        return linear_general_layout(format, mip_width, height, max(num_slices, 1), dim, num_samples);
    }

    let mut flags = SurfaceFlags::empty();
    match dim {
        SurfaceDim::D3 => flags |= SurfaceFlags::VOLUME,
        SurfaceDim::Cube => flags |= SurfaceFlags::CUBE,
        _ => (),
    }
    if level == 0 {
        flags |= SurfaceFlags::INPUT_BASE_MAP;
    }

    let format = hw_format(format) as u32;
    compute_surface_info_with(
        gen,
        &SurfaceDescriptor {
            format,
            bpp: surface_bits_per_pixel(format),
            width: mip_width,
            height,
            num_slices,
            num_samples,
            tile_mode: TileMode::new(tile_mode & 0xF)
                .ok_or(SurfaceError::UnsupportedTileMode { tile_mode })?,
            mip_level: level,
            slice: 0,
            flags,
        },
    )
}

/// Selects the GX2 tile mode used by default for a new surface.
///
/// 1D textures use [TileMode::LinearAligned].
/// Other surfaces use 2D tiling unless the base level is smaller than a macro tile.
/**
```rust
use wiiu_swizzle::{default_tile_mode, SurfaceDim, SurfaceUse, TileMode};

let mode = default_tile_mode(SurfaceDim::D2, 256, 256, 1, 0x1a, 0, SurfaceUse::TEXTURE).unwrap();
assert_eq!(TileMode::Tiled2DThin1, mode);
```
*/
pub fn default_tile_mode(
    dim: SurfaceDim,
    width: u32,
    height: u32,
    depth: u32,
    format: u32,
    aa: u32,
    usage: SurfaceUse,
) -> Result<TileMode, SurfaceError> {
    if dim == SurfaceDim::D1 && aa == 0 && !usage.contains(SurfaceUse::DEPTH_BUFFER) {
        return Ok(TileMode::LinearAligned);
    }

    let tile_mode = if dim != SurfaceDim::D3 || usage.contains(SurfaceUse::COLOR_BUFFER) {
        TileMode::Tiled2DThin1
    } else {
        TileMode::Tiled2DThick
    };

    let layout = get_surface_info(format, width, height, depth, dim, tile_mode as u32, aa, 0)?;
    if width < layout.pitch_align && height < layout.height_align {
        if tile_mode == TileMode::Tiled2DThick {
            Ok(TileMode::Tiled1DThick)
        } else {
            Ok(TileMode::Tiled1DThin1)
        }
    } else {
        Ok(tile_mode)
    }
}

fn validate_dimensions(width: u32, height: u32, depth: u32) -> Result<(), SurfaceError> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION || depth > MAX_DIMENSION {
        Err(SurfaceError::InvalidDimensions {
            width,
            height,
            depth,
        })
    } else {
        Ok(())
    }
}

fn shift_dim(dim: u32, level: u32) -> u32 {
    dim.checked_shr(level).unwrap_or(0)
}

// The GX2 linear general layout only pads to the block size.
fn linear_general_layout(
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    num_samples: u32,
) -> Result<SurfaceLayout, SurfaceError> {
    let bpp = surface_bits_per_pixel(format);
    if bpp == 0 {
        return Err(SurfaceError::InvalidFormat { format });
    }

    let block_size = if is_block_compressed(format) { 4 } else { 1 };
    let pixel_pitch = pow_two_align(width, block_size);
    let pixel_height = pow_two_align(height, block_size);
    let pitch = pixel_pitch / block_size;
    let height = pixel_height / block_size;

    let surf_size =
        (bpp as u64 * num_samples as u64 * depth as u64 * height as u64 * pitch as u64) >> 3;
    let slice_size = if dim == SurfaceDim::D3 {
        surf_size
    } else {
        surf_size / depth as u64
    };

    Ok(SurfaceLayout {
        tile_mode: TileMode::LinearGeneral,
        bpp,
        pitch,
        height,
        depth,
        surf_size,
        slice_size,
        base_align: 1,
        pitch_align: 1,
        height_align: 1,
        depth_align: 1,
        pixel_pitch,
        pixel_height,
        pixel_bits: bpp,
    })
}

fn mip_dimensions(
    format: usize,
    width: u32,
    height: u32,
    num_slices: u32,
    mip_level: u32,
    flags: SurfaceFlags,
) -> (u32, u32, u32) {
    let is_base_map = flags.contains(SurfaceFlags::INPUT_BASE_MAP);
    let is_cube = flags.contains(SurfaceFlags::CUBE);

    // Block compressed and packed formats.
    if (49..=55).contains(&format) {
        let (mut width, mut height, mut num_slices) = (width, height, num_slices);
        if mip_level == 0 || is_base_map {
            width = pow_two_align(width, 4);
            height = pow_two_align(height, 4);
        }

        if mip_level > 0 {
            if is_base_map {
                width = max(1, shift_dim(width, mip_level));
                height = max(1, shift_dim(height, mip_level));
                if !is_cube {
                    num_slices = shift_dim(num_slices, mip_level);
                }
                num_slices = max(1, num_slices);
            }
            width = next_pow2(width);
            height = next_pow2(height);
        }
        return (width, height, num_slices);
    }

    if mip_level > 0 && is_base_map {
        let width = max(1, shift_dim(width, mip_level));
        let height = max(1, shift_dim(height, mip_level));
        let num_slices = if is_cube {
            num_slices
        } else {
            max(1, shift_dim(num_slices, mip_level))
        };

        if format == 47 || format == 48 {
            (width, height, num_slices)
        } else {
            (next_pow2(width), next_pow2(height), next_pow2(num_slices))
        }
    } else {
        (width, height, num_slices)
    }
}

// Convert pixels to the stored elements.
fn adjust_surface_info(info: FormatInfo, width: u32, height: u32) -> (u32, u32, u32) {
    let FormatInfo {
        bpp,
        expand_x,
        expand_y,
        element_mode,
    } = info;

    if bpp == 0 {
        return (0, width, height);
    }

    let (width, height) = if expand_x > 1 || expand_y > 1 {
        let (width, height) = match element_mode {
            ElementMode::Expanded => (expand_x * width, expand_y * height),
            // Partial blocks are already handled by aligning to the block size.
            mode if mode.is_block_compressed() => (width / expand_x, height / expand_y),
            _ => (
                crate::div_round_up(width, expand_x),
                crate::div_round_up(height, expand_y),
            ),
        };
        (max(width, 1), max(height, 1))
    } else {
        (width, height)
    };

    let bpp = match element_mode {
        ElementMode::Expanded => bpp / expand_x / expand_y,
        ElementMode::PackedStd | ElementMode::PackedRev => expand_x * expand_y * bpp,
        ElementMode::PackedBc1 | ElementMode::PackedBc4 => 64,
        ElementMode::PackedBc2 | ElementMode::PackedBc3 | ElementMode::PackedBc5 => 128,
        _ => bpp,
    };

    (bpp, width, height)
}

// Convert the stored elements back to pixels.
fn restore_surface_info(info: FormatInfo, pitch: u32, height: u32) -> (u32, u32) {
    if info.expand_x > 1 || info.expand_y > 1 {
        let (pitch, height) = if info.element_mode == ElementMode::Expanded {
            (pitch / info.expand_x, height / info.expand_y)
        } else {
            (pitch * info.expand_x, height * info.expand_y)
        };
        (max(pitch, 1), max(height, 1))
    } else {
        (pitch, height)
    }
}
