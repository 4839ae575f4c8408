//! # wiiu_swizzle
//! wiiu_swizzle is an unofficial CPU implementation of the surface layout and
//! texture memory tiling used by the Wii U's R7xx based GPU.
//!
//! # Getting Started
//! The following example deswizzles the base mip level of a BC1 compressed 2D texture.
//! The layout returned by [get_surface_info] describes the padded dimensions,
//! alignment, and size of the tiled data.
/*!
```rust
use wiiu_swizzle::{deswizzle, get_surface_info, SurfaceDim, TiledSurface};
# fn main() -> Result<(), wiiu_swizzle::SurfaceError> {
let width = 256;
let height = 256;
// GX2_SURFACE_FORMAT_T_BC1_UNORM
let format = 0x31;
let layout = get_surface_info(format, width, height, 1, SurfaceDim::D2, 4, 0, 0)?;

# let image_data = vec![0u8; layout.surf_size as usize];
// The swizzle value is stored with the surface in texture files.
let surface = TiledSurface::from_layout(&layout, width, height, format, 0);
let deswizzled = deswizzle(&surface, &image_data)?;
# Ok(())
# }
```
*/
//! # Tiling
//! Surfaces are stored using one of the [TileMode] variants.
//! Linear modes store rows of texels with a padded pitch.
//! Micro tiled modes reorder texels within 8x8 tiles.
//! Macro tiled modes additionally distribute groups of micro tiles across the memory pipes and banks.
//! The addressing functions for each family are available in [addr].
//!
//! Mip levels may use a different tile mode than the base level.
//! Small mip levels are stored using micro tiling even if the surface requests macro tiling.
//! The [surface] module handles the offsets and tile modes for the complete mip chain.
#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub mod addr;
pub mod hwl;
pub mod surface;

mod format;
mod info;
mod layout;
mod selector;
mod swizzle;
mod tilemode;

// Avoid making this module public to prevent people importing it accidentally.
#[cfg(feature = "ffi")]
mod ffi;

pub use format::{format_info, is_block_compressed, surface_bits_per_pixel, ElementMode, FormatInfo};
pub use hwl::{generator, AddressGenerator, ChipFamily, HwConfig, R6xx, R7xx, WII_U_CONFIG};
pub use info::*;
pub use selector::mip_level_tile_mode;
pub use swizzle::*;
pub use tilemode::TileMode;

/// The largest supported width, height, or depth in pixels.
pub const MAX_DIMENSION: u32 = 1 << 16;

/// The largest number of mip levels including the base level.
/// GX2 surfaces store offsets for at most 13 levels after the base level.
pub const MAX_MIPMAP_COUNT: u32 = 14;

/// Errors than can occur while computing surface layouts or swizzling.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SurfaceError {
    /// The bits per pixel is zero, larger than 128, or not a whole number of bytes.
    InvalidBitsPerPixel { bpp: u32 },

    /// The format does not have a known size.
    InvalidFormat { format: u32 },

    /// The tile mode has no layout calculation like the 2D and 3D XThick modes.
    UnsupportedTileMode { tile_mode: u32 },

    /// The number of samples is larger than the 8 samples supported by the hardware.
    InvalidSampleCount { num_samples: u32 },

    /// The GX2 AA mode is outside the range `0..=3`.
    InvalidAaMode { aa: u32 },

    /// At least one of the dimensions is larger than [MAX_DIMENSION].
    InvalidDimensions { width: u32, height: u32, depth: u32 },

    /// The number of mip levels is larger than [MAX_MIPMAP_COUNT].
    InvalidMipmapCount { mipmap_count: u32 },

    /// The source data does not contain enough bytes.
    NotEnoughData {
        expected_size: usize,
        actual_size: usize,
    },

    /// Blocks of a surface have offsets outside the tiled data for the surface.
    BlocksOutOfRange { count: usize },
}

impl core::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SurfaceError::InvalidBitsPerPixel { bpp } => {
                write!(f, "Invalid bits per pixel {}.", bpp)
            }
            SurfaceError::InvalidFormat { format } => {
                write!(f, "Format 0x{:x} does not have a known size.", format)
            }
            SurfaceError::UnsupportedTileMode { tile_mode } => {
                write!(f, "Tile mode {} is not supported.", tile_mode)
            }
            SurfaceError::InvalidSampleCount { num_samples } => write!(
                f,
                "Invalid sample count {}. Expected at most 8 samples.",
                num_samples
            ),
            SurfaceError::InvalidAaMode { aa } => {
                write!(f, "Invalid AA mode {}. Expected a value from 0 to 3.", aa)
            }
            SurfaceError::InvalidDimensions {
                width,
                height,
                depth,
            } => write!(
                f,
                "Invalid surface dimensions {}x{}x{}. Dimensions must be at most {}.",
                width, height, depth, MAX_DIMENSION
            ),
            SurfaceError::InvalidMipmapCount { mipmap_count } => write!(
                f,
                "Invalid mipmap count {}. Expected at most {} levels.",
                mipmap_count, MAX_MIPMAP_COUNT
            ),
            SurfaceError::NotEnoughData {
                expected_size,
                actual_size,
            } => write!(
                f,
                "Not enough data. Expected {} bytes but found {} bytes.",
                expected_size, actual_size
            ),
            SurfaceError::BlocksOutOfRange { count } => {
                write!(f, "{} blocks are outside the tiled surface data.", count)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SurfaceError {}

/// Calculates the division of `x` by `d` but rounds up rather than truncating.
///
/// # Examples
/// Use this function when calculating dimensions for block compressed formats like BC1.
/**
```rust
# use wiiu_swizzle::div_round_up;
assert_eq!(2, div_round_up(8, 4));
assert_eq!(3, div_round_up(10, 4));
assert_eq!(1, div_round_up(u32::MAX, u32::MAX));
```
 */
#[inline]
pub const fn div_round_up(x: u32, d: u32) -> u32 {
    x / d + (x % d != 0) as u32
}

// The alignment must be a power of two.
pub(crate) const fn pow_two_align(x: u32, align: u32) -> u32 {
    (x + align - 1) & !(align - 1)
}

pub(crate) fn next_pow2(dim: u32) -> u32 {
    if dim > 0x7FFF_FFFF {
        0x8000_0000
    } else {
        dim.next_power_of_two()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_pow2_values() {
        assert_eq!(1, next_pow2(0));
        assert_eq!(1, next_pow2(1));
        assert_eq!(4, next_pow2(3));
        assert_eq!(64, next_pow2(64));
        assert_eq!(128, next_pow2(65));
        assert_eq!(0x8000_0000, next_pow2(0x8000_0001));
        assert_eq!(0x8000_0000, next_pow2(u32::MAX));
    }

    #[test]
    fn pow_two_align_values() {
        assert_eq!(0, pow_two_align(0, 8));
        assert_eq!(8, pow_two_align(1, 8));
        assert_eq!(32, pow_two_align(32, 32));
        assert_eq!(64, pow_two_align(33, 32));
    }

    #[test]
    fn div_round_up_values() {
        assert_eq!(0, div_round_up(0, 4));
        assert_eq!(64, div_round_up(256, 4));
        assert_eq!(65, div_round_up(257, 4));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            "Not enough data. Expected 4096 bytes but found 12 bytes.",
            SurfaceError::NotEnoughData {
                expected_size: 4096,
                actual_size: 12
            }
            .to_string()
        );
        assert_eq!(
            "Format 0x3f does not have a known size.",
            SurfaceError::InvalidFormat { format: 0x3f }.to_string()
        );
        assert_eq!(
            "12 blocks are outside the tiled surface data.",
            SurfaceError::BlocksOutOfRange { count: 12 }.to_string()
        );
    }
}
