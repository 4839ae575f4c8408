//! Functions for swizzling and deswizzling a single slice of a surface.
use alloc::{vec, vec::Vec};
use core::num::NonZeroU32;

use crate::{
    addr::{addr_linear_3d, addr_macro_tiled_3d, addr_micro_tiled_3d},
    div_round_up, format_info, is_block_compressed, ElementMode, SurfaceError, SurfaceLayout,
    TileMode, MAX_DIMENSION, WII_U_CONFIG,
};

/// The dimensions of a compressed block. Compressed block sizes are usually 4x4 pixels.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct BlockDim {
    /// The width of the block in pixels.
    pub width: NonZeroU32,
    /// The height of the block in pixels.
    pub height: NonZeroU32,
    /// The depth of the block in pixels.
    pub depth: NonZeroU32,
}

const fn non_zero(value: u32) -> NonZeroU32 {
    match NonZeroU32::new(value) {
        Some(value) => value,
        None => NonZeroU32::MIN,
    }
}

impl BlockDim {
    /// A 1x1x1 block for formats that do not use block compression like R8G8B8A8.
    pub const fn uncompressed() -> Self {
        BlockDim {
            width: non_zero(1),
            height: non_zero(1),
            depth: non_zero(1),
        }
    }

    /// A 4x4x1 compressed block. This includes the BC1 to BC5 formats.
    pub const fn block_4x4() -> Self {
        BlockDim {
            width: non_zero(4),
            height: non_zero(4),
            depth: non_zero(1),
        }
    }

    /// The block dimensions for the GX2 surface `format`.
    pub fn from_format(format: u32) -> Self {
        if is_block_compressed(format) {
            Self::block_4x4()
        } else {
            Self::uncompressed()
        }
    }
}

/// The parameters for addressing a single slice and sample of a tiled surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiledSurface {
    /// The width in pixels or in 32-bit elements for expanded formats like R32G32B32.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
    pub block_dim: BlockDim,
    pub tile_mode: TileMode,
    /// The GX2 swizzle value with the pipe swizzle in bit 8 and the bank swizzle in bits 9-10.
    pub swizzle: u32,
    /// The padded width in blocks.
    pub pitch: u32,
    /// The padded height in blocks.
    pub surface_height: u32,
    /// The number of slices in the surface.
    pub num_slices: u32,
    /// The bits per block.
    pub bpp: u32,
    pub num_samples: u32,
    pub slice: u32,
    pub sample: u32,
    pub is_depth: bool,
}

impl TiledSurface {
    /// Creates the parameters for the first slice and sample of a surface with the given `layout`.
    /// The `width` and `height` should be the mip level's dimensions in pixels.
    ///
    /// Expanded formats like R32G32B32 are addressed as separate 32-bit elements
    /// since the layout's pitch counts elements rather than pixels.
    /// The linear data for each row is unchanged.
    /**
    ```rust
    use wiiu_swizzle::{get_surface_info, BlockDim, SurfaceDim, TiledSurface};

    let layout = get_surface_info(0x31, 64, 64, 1, SurfaceDim::D2, 4, 0, 0).unwrap();
    let surface = TiledSurface::from_layout(&layout, 64, 64, 0x31, 0);
    assert_eq!(BlockDim::block_4x4(), surface.block_dim);
    assert_eq!(64, surface.bpp);
    ```
    */
    pub fn from_layout(
        layout: &SurfaceLayout,
        width: u32,
        height: u32,
        format: u32,
        swizzle: u32,
    ) -> Self {
        // Expanded layouts count 32-bit elements except for the linear general layout.
        let expand = match format_info(format).element_mode {
            ElementMode::Expanded if layout.bpp != 0 && layout.pixel_bits > layout.bpp => {
                layout.pixel_bits / layout.bpp
            }
            _ => 1,
        };

        Self {
            width: width.saturating_mul(expand),
            height,
            block_dim: BlockDim::from_format(format),
            tile_mode: layout.tile_mode,
            swizzle,
            pitch: layout.pitch,
            surface_height: layout.height,
            num_slices: layout.depth,
            bpp: layout.pixel_bits / expand,
            num_samples: 1,
            slice: 0,
            sample: 0,
            is_depth: false,
        }
    }

    fn dimensions_in_blocks(&self) -> (u32, u32) {
        (
            div_round_up(self.width, self.block_dim.width.get()),
            div_round_up(self.height, self.block_dim.height.get()),
        )
    }

    /// Calculates the byte offset of the block at `(x, y)` in the tiled data.
    pub fn block_address(&self, x: u32, y: u32) -> u64 {
        match self.tile_mode {
            TileMode::LinearGeneral | TileMode::LinearAligned => addr_linear_3d(
                x,
                y,
                self.slice,
                self.sample,
                self.bpp,
                self.pitch,
                self.surface_height,
                self.num_slices,
            ),
            TileMode::Tiled1DThin1 | TileMode::Tiled1DThick => addr_micro_tiled_3d(
                x,
                y,
                self.slice,
                self.bpp,
                self.pitch,
                self.surface_height,
                self.tile_mode,
                self.is_depth,
            ),
            _ => addr_macro_tiled_3d(
                &WII_U_CONFIG,
                x,
                y,
                self.slice,
                self.sample,
                self.bpp,
                self.pitch,
                self.surface_height,
                self.num_samples,
                self.tile_mode,
                self.is_depth,
                (self.swizzle >> 8) & 1,
                (self.swizzle >> 9) & 3,
            ),
        }
    }

    fn validate(&self) -> Result<usize, SurfaceError> {
        if self.bpp == 0 || self.bpp > 128 || self.bpp % 8 != 0 {
            return Err(SurfaceError::InvalidBitsPerPixel { bpp: self.bpp });
        }

        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(SurfaceError::InvalidDimensions {
                width: self.width,
                height: self.height,
                depth: self.num_slices,
            });
        }

        Ok((self.bpp / 8) as usize)
    }
}

/// Tiles the linear data in `source` using the layout in `surface`.
///
/// The result has the same length as `source`.
/// Blocks with an offset outside the data are skipped,
/// so `source` should be padded to the surface size to tile all blocks.
/// The surface functions in [crate::surface] return an error for skipped blocks instead.
/**
```rust
use wiiu_swizzle::{get_surface_info, swizzle, SurfaceDim, TiledSurface};

// GX2_SURFACE_FORMAT_TCS_R8_G8_B8_A8_UNORM
let layout = get_surface_info(0x1a, 32, 32, 1, SurfaceDim::D2, 4, 0, 0).unwrap();
let surface = TiledSurface::from_layout(&layout, 32, 32, 0x1a, 0);

let mut linear = vec![0u8; layout.surf_size as usize];
linear[..4].copy_from_slice(&[1, 2, 3, 4]);
let tiled = swizzle(&surface, &linear).unwrap();
assert_eq!(&[1, 2, 3, 4], &tiled[..4]);
```
*/
pub fn swizzle(surface: &TiledSurface, source: &[u8]) -> Result<Vec<u8>, SurfaceError> {
    let mut destination = vec![0u8; source.len()];
    swizzle_inner::<false>(surface, source, &mut destination)?;
    Ok(destination)
}

/// Untiles the tiled data in `source` using the layout in `surface`.
///
/// The first `width * height * bpp / 8` bytes of the result contain the untiled blocks.
/// The result has the same length as `source`.
/// Blocks with an offset outside the data are skipped.
pub fn deswizzle(surface: &TiledSurface, source: &[u8]) -> Result<Vec<u8>, SurfaceError> {
    let mut destination = vec![0u8; source.len()];
    deswizzle_inner(surface, source, &mut destination)?;
    Ok(destination)
}

// Untiles source into destination using all available threads if enabled.
// Returns the number of skipped blocks.
pub(crate) fn deswizzle_inner(
    surface: &TiledSurface,
    source: &[u8],
    destination: &mut [u8],
) -> Result<usize, SurfaceError> {
    #[cfg(feature = "rayon")]
    {
        deswizzle_par(surface, source, destination)
    }

    #[cfg(not(feature = "rayon"))]
    {
        swizzle_inner::<true>(surface, source, destination)
    }
}

// The tiled and linear buffers are bounds checked separately.
// This allows tiling multiple slices into a single tiled buffer.
// Returns the number of blocks skipped for being outside either buffer.
pub(crate) fn swizzle_inner<const DESWIZZLE: bool>(
    surface: &TiledSurface,
    source: &[u8],
    destination: &mut [u8],
) -> Result<usize, SurfaceError> {
    let bytes_per_pixel = surface.validate()?;
    let (width, height) = surface.dimensions_in_blocks();

    let (tiled_len, linear_len) = if DESWIZZLE {
        (source.len() as u64, destination.len() as u64)
    } else {
        (destination.len() as u64, source.len() as u64)
    };
    let bytes = bytes_per_pixel as u64;

    let mut skipped = 0;
    for y in 0..height {
        for x in 0..width {
            let tiled = surface.block_address(x, y);
            let linear = (y as u64 * width as u64 + x as u64) * bytes;

            if tiled + bytes <= tiled_len && linear + bytes <= linear_len {
                let tiled = tiled as usize;
                let linear = linear as usize;
                if DESWIZZLE {
                    destination[linear..linear + bytes_per_pixel]
                        .copy_from_slice(&source[tiled..tiled + bytes_per_pixel]);
                } else {
                    destination[tiled..tiled + bytes_per_pixel]
                        .copy_from_slice(&source[linear..linear + bytes_per_pixel]);
                }
            } else {
                skipped += 1;
            }
        }
    }

    Ok(skipped)
}

// Each row of the linear output only depends on the tiled input.
#[cfg(feature = "rayon")]
fn deswizzle_par(
    surface: &TiledSurface,
    source: &[u8],
    destination: &mut [u8],
) -> Result<usize, SurfaceError> {
    use rayon::prelude::*;

    let bytes_per_pixel = surface.validate()?;
    let (width, height) = surface.dimensions_in_blocks();

    let row_size = width as usize * bytes_per_pixel;
    if row_size == 0 {
        return Ok(0);
    }

    // Rows past the end of the destination are skipped entirely.
    let rows = ((destination.len() + row_size - 1) / row_size).min(height as usize);
    let missing_rows = (height as usize - rows) * width as usize;

    let len = source.len() as u64;
    let bytes = bytes_per_pixel as u64;
    let skipped: usize = destination
        .par_chunks_mut(row_size)
        .take(rows)
        .enumerate()
        .map(|(y, row)| {
            let mut skipped = 0;
            for x in 0..width {
                let tiled = surface.block_address(x, y as u32);
                let start = x as usize * bytes_per_pixel;
                if tiled + bytes <= len && start + bytes_per_pixel <= row.len() {
                    let tiled = tiled as usize;
                    row[start..start + bytes_per_pixel]
                        .copy_from_slice(&source[tiled..tiled + bytes_per_pixel]);
                } else {
                    skipped += 1;
                }
            }
            skipped
        })
        .sum();

    Ok(skipped + missing_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{get_surface_info, SurfaceDim};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn surface(format: u32, width: u32, height: u32, tile_mode: u32) -> (TiledSurface, usize) {
        let layout =
            get_surface_info(format, width, height, 1, SurfaceDim::D2, tile_mode, 0, 0).unwrap();
        (
            TiledSurface::from_layout(&layout, width, height, format, 0),
            layout.surf_size as usize,
        )
    }

    #[test]
    fn swizzle_deswizzle_32_32_tiled_2d() {
        let mut rng = StdRng::from_seed([13u8; 32]);
        let linear: Vec<u8> = (0..4096).map(|_| rng.gen::<u8>()).collect();

        let (surface, size) = surface(0x1a, 32, 32, 4);
        assert_eq!(4096, size);

        let tiled = swizzle(&surface, &linear).unwrap();
        assert_eq!(4096, tiled.len());
        assert_ne!(linear, tiled);

        let deswizzled = deswizzle(&surface, &tiled).unwrap();
        assert_eq!(linear, deswizzled);
    }

    #[test]
    fn deswizzle_linear_aligned_rows() {
        // Rows are padded to the 64 pixel pitch.
        let (surface, size) = surface(0x1a, 16, 2, 1);
        let mut tiled = vec![0u8; size];
        tiled[..4].copy_from_slice(&[1, 2, 3, 4]);
        tiled[256..260].copy_from_slice(&[5, 6, 7, 8]);

        let deswizzled = deswizzle(&surface, &tiled).unwrap();
        assert_eq!(&[1, 2, 3, 4], &deswizzled[..4]);
        assert_eq!(&[5, 6, 7, 8], &deswizzled[64..68]);
    }

    #[test]
    fn deswizzle_micro_tiled_first_row() {
        // 32 bpp micro tiles store rows of 4 texels.
        let (surface, size) = surface(0x1a, 8, 8, 2);
        let tiled: Vec<u8> = (0..size).map(|i| (i / 4) as u8).collect();

        let deswizzled = deswizzle(&surface, &tiled).unwrap();
        let first_row: Vec<u8> = deswizzled[..32].chunks(4).map(|t| t[0]).collect();
        assert_eq!(vec![0, 1, 2, 3, 8, 9, 10, 11], first_row);
    }

    #[test]
    fn block_compressed_dimensions() {
        let (surface, _) = surface(0x31, 30, 30, 4);
        assert_eq!((8, 8), surface.dimensions_in_blocks());
        assert_eq!(64, surface.bpp);
    }

    #[test]
    fn expanded_format_elements() {
        // R32G32B32 rows have 3 elements for each pixel.
        let (surface, size) = surface(0x2f, 100, 16, 1);
        assert_eq!((300, 16), surface.dimensions_in_blocks());
        assert_eq!(32, surface.bpp);
        assert_eq!(384, surface.pitch);

        let mut rng = StdRng::from_seed([13u8; 32]);
        let linear: Vec<u8> = (0..size).map(|_| rng.gen()).collect();
        let mut tiled = vec![0u8; size];
        assert_eq!(Ok(0), swizzle_inner::<false>(&surface, &linear, &mut tiled));
        // The second row starts after the padded pitch.
        assert_eq!(&linear[1200..1212], &tiled[1536..1548]);

        let mut deswizzled = vec![0u8; 100 * 16 * 12];
        assert_eq!(Ok(0), deswizzle_inner(&surface, &tiled, &mut deswizzled));
        assert_eq!(&linear[..100 * 16 * 12], &deswizzled[..]);
    }

    #[test]
    fn expanded_format_linear_general() {
        let (surface, _) = surface(0x30, 100, 16, 16);
        assert_eq!((100, 16), surface.dimensions_in_blocks());
        assert_eq!(96, surface.bpp);
    }

    #[test]
    fn skipped_block_count() {
        let (surface, _) = surface(0x1a, 32, 32, 4);
        let mut destination = vec![0u8; 32 * 32 * 4];
        // Only 32 blocks have offsets in the first 128 bytes.
        assert_eq!(
            Ok(32 * 32 - 32),
            deswizzle_inner(&surface, &[0u8; 128], &mut destination)
        );
    }

    #[test]
    fn swizzle_value_moves_blocks() {
        let (surface, size) = surface(0x1a, 64, 64, 4);
        let swizzled = TiledSurface {
            swizzle: 0x300,
            ..surface
        };
        assert_ne!(surface.block_address(0, 0), swizzled.block_address(0, 0));

        let mut rng = StdRng::from_seed([13u8; 32]);
        let linear: Vec<u8> = (0..size).map(|_| rng.gen()).collect();
        let tiled = swizzle(&swizzled, &linear).unwrap();
        assert_eq!(
            &linear[..64 * 64 * 4],
            &deswizzle(&swizzled, &tiled).unwrap()[..64 * 64 * 4]
        );
    }

    #[test]
    fn short_input_skips_blocks() {
        let (surface, _) = surface(0x1a, 32, 32, 4);
        let tiled = deswizzle(&surface, &[1u8; 12]).unwrap();
        assert_eq!(12, tiled.len());
    }

    #[test]
    fn empty_input() {
        let (surface, _) = surface(0x1a, 32, 32, 4);
        assert_eq!(Vec::<u8>::new(), swizzle(&surface, &[]).unwrap());
        assert_eq!(Vec::<u8>::new(), deswizzle(&surface, &[]).unwrap());
    }

    #[test]
    fn invalid_bits_per_pixel() {
        let (surface, _) = surface(0x1a, 32, 32, 4);
        for bpp in [0, 12, 256] {
            let surface = TiledSurface { bpp, ..surface };
            assert_eq!(
                Err(SurfaceError::InvalidBitsPerPixel { bpp }),
                swizzle(&surface, &[0u8; 16])
            );
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn deswizzle_par_matches_serial() {
        let mut rng = StdRng::from_seed([13u8; 32]);
        for tile_mode in 1..16 {
            let (surface, size) = surface(0x1a, 60, 40, tile_mode);
            let tiled: Vec<u8> = (0..size).map(|_| rng.gen()).collect();
            let mut serial = vec![0u8; tiled.len()];
            swizzle_inner::<true>(&surface, &tiled, &mut serial).unwrap();
            let mut parallel = vec![0u8; tiled.len()];
            deswizzle_par(&surface, &tiled, &mut parallel).unwrap();
            assert_eq!(serial, parallel);
        }
    }

    const FORMATS: [u32; 10] = [0x1, 0x7, 0x1a, 0x1f, 0x22, 0x2f, 0x30, 0x31, 0x33, 0x35];

    proptest! {
        #[test]
        fn swizzle_deswizzle_all_tile_modes(
            format in proptest::sample::select(&FORMATS[..]),
            width in 1u32..96,
            height in 1u32..96,
            tile_mode in 1u32..17,
            seed in any::<u64>()
        ) {
            let (surface, size) = surface(format, width, height, tile_mode);
            let mut rng = StdRng::seed_from_u64(seed);
            let linear: Vec<u8> = (0..size).map(|_| rng.gen()).collect();

            let (block_width, block_height) = surface.dimensions_in_blocks();
            let logical_size = (block_width * block_height * surface.bpp / 8) as usize;

            let tiled = swizzle(&surface, &linear).unwrap();
            let deswizzled = deswizzle(&surface, &tiled).unwrap();
            prop_assert_eq!(&linear[..logical_size], &deswizzled[..logical_size]);
        }

        #[test]
        fn swizzle_is_deterministic(
            width in 1u32..64,
            height in 1u32..64,
            tile_mode in 1u32..17
        ) {
            let (surface, size) = surface(0x1a, width, height, tile_mode);
            let linear: Vec<u8> = (0..size).map(|i| i as u8).collect();
            prop_assert_eq!(swizzle(&surface, &linear), swizzle(&surface, &linear));
        }
    }
}
