//! Selection of the tile mode actually used for each mip level.
//!
//! Surfaces request a single tile mode, but smaller mip levels can't always use it.
//! Multisampled and depth surfaces also can't use the thick macro tiled modes.
use crate::{hwl::AddressGenerator, hwl::HwConfig, next_pow2, TileMode};

/// Calculates the number of tile slices needed to store the samples of a micro tile.
pub(crate) fn surface_tile_slices(
    config: &HwConfig,
    tile_mode: TileMode,
    bpp: u32,
    num_samples: u32,
) -> u32 {
    let bytes_per_sample = ((bpp << 6) + 7) >> 3;
    let num_samples = if tile_mode.thickness() > 1 {
        4
    } else {
        num_samples
    };

    if bytes_per_sample == 0 {
        return 1;
    }

    match config.split_size / bytes_per_sample {
        0 => 1,
        samples_per_tile => (num_samples / samples_per_tile).max(1),
    }
}

/// Calculates the tile mode for the given mip level of a surface with `base_tile_mode`.
///
/// Mip levels that are too small for a macro tile use micro tiling instead.
/// Thick modes fall back to thin modes with fewer than 4 slices.
/// The result is never macro tiled if the mip level is smaller than a single macro tile.
/**
```rust
use wiiu_swizzle::{mip_level_tile_mode, TileMode, R7xx};

// An 8x8 mip is smaller than the 32x16 macro tile for 32 bpp.
let mode = mip_level_tile_mode(&R7xx, TileMode::Tiled2DThin1, 32, 3, 8, 8, 1, 1, false);
assert_eq!(TileMode::Tiled1DThin1, mode);
```
*/
pub fn mip_level_tile_mode<G: AddressGenerator + ?Sized>(
    gen: &G,
    base_tile_mode: TileMode,
    bpp: u32,
    level: u32,
    width: u32,
    height: u32,
    num_slices: u32,
    num_samples: u32,
    is_depth: bool,
) -> TileMode {
    let config = gen.config();
    let tile_mode = sample_compatible_tile_mode(config, base_tile_mode, bpp, num_samples, is_depth);
    if level == 0 {
        return tile_mode;
    }

    let bpp = match bpp {
        24 | 48 | 96 => bpp / 3,
        _ => bpp,
    };

    // Mip chains are tiled using power of two dimensions.
    let width = next_pow2(width);
    let height = next_pow2(height);
    let num_slices = next_pow2(num_slices);

    let mut tile_mode = tile_mode.to_non_bank_swapped();
    let thickness = tile_mode.thickness() as u64;
    let micro_tile_bytes = (num_samples as u64 * bpp as u64 * (thickness << 6) + 7) >> 3;
    let pipe_interleave_bytes = config.pipe_interleave_bytes as u64;
    let width_align_factor = if micro_tile_bytes >= pipe_interleave_bytes {
        1
    } else {
        pipe_interleave_bytes / micro_tile_bytes.max(1)
    };

    let mut macro_tile_width = 8 * config.num_banks as u64;
    let mut macro_tile_height = 8 * config.num_pipes as u64;
    let too_small = |macro_tile_width: u64, macro_tile_height: u64| {
        (width as u64) < width_align_factor * macro_tile_width
            || (height as u64) < macro_tile_height
    };

    match tile_mode {
        TileMode::Tiled2DThin1 | TileMode::Tiled3DThin1 => {
            if too_small(macro_tile_width, macro_tile_height) {
                tile_mode = TileMode::Tiled1DThin1;
            }
        }
        TileMode::Tiled2DThin2 => {
            macro_tile_width >>= 1;
            macro_tile_height *= 2;
            if too_small(macro_tile_width, macro_tile_height) {
                tile_mode = TileMode::Tiled1DThin1;
            }
        }
        TileMode::Tiled2DThin4 => {
            macro_tile_width >>= 2;
            macro_tile_height *= 4;
            if too_small(macro_tile_width, macro_tile_height) {
                tile_mode = TileMode::Tiled1DThin1;
            }
        }
        _ => (),
    }

    if matches!(tile_mode, TileMode::Tiled2DThick | TileMode::Tiled3DThick)
        && too_small(macro_tile_width, macro_tile_height)
    {
        tile_mode = TileMode::Tiled1DThick;
    }

    if num_slices < 4 {
        tile_mode = match tile_mode {
            TileMode::Tiled1DThick => TileMode::Tiled1DThin1,
            TileMode::Tiled2DThick => TileMode::Tiled2DThin1,
            TileMode::Tiled3DThick => TileMode::Tiled3DThin1,
            mode => mode,
        };
    }

    if tile_mode != base_tile_mode {
        log::trace!(
            "Mip {} ({}x{}x{}) uses {:?} instead of {:?}",
            level,
            width,
            height,
            num_slices,
            tile_mode,
            base_tile_mode
        );
    }

    // Apply the sample checks once more to the downgraded mode.
    sample_compatible_tile_mode(config, tile_mode, bpp, num_samples, is_depth)
}

fn sample_compatible_tile_mode(
    config: &HwConfig,
    base_tile_mode: TileMode,
    bpp: u32,
    num_samples: u32,
    is_depth: bool,
) -> TileMode {
    let tile_slices = surface_tile_slices(config, base_tile_mode, bpp, num_samples);
    let needs_thin = num_samples > 1 || tile_slices > 1 || is_depth;
    let thin2_too_large = 2 * config.pipe_interleave_bytes > config.split_size;
    let thin4_too_large = 4 * config.pipe_interleave_bytes > config.split_size;

    let tile_mode = match base_tile_mode {
        TileMode::Tiled2DThin2 if thin2_too_large => TileMode::Tiled2DThin1,
        TileMode::Tiled2DThin4 if thin4_too_large => TileMode::Tiled2DThin2,
        TileMode::Tiled2BThin2 if thin2_too_large => TileMode::Tiled2BThin1,
        TileMode::Tiled2BThin4 if thin4_too_large => TileMode::Tiled2BThin2,
        TileMode::Tiled2DThick if needs_thin => TileMode::Tiled2DThin1,
        TileMode::Tiled3DThick if needs_thin => TileMode::Tiled3DThin1,
        TileMode::Tiled2BThick if needs_thin => TileMode::Tiled2BThin1,
        TileMode::Tiled3BThick if needs_thin => TileMode::Tiled3BThin1,
        TileMode::Tiled1DThin1 if num_samples > 1 => TileMode::Tiled2DThin1,
        TileMode::Tiled1DThick => {
            let mut mode = TileMode::Tiled1DThick;
            if num_samples > 1 || is_depth {
                mode = TileMode::Tiled1DThin1;
            }
            // These checks are not exclusive, so 2 and 4 samples end up thick.
            if num_samples == 2 || num_samples == 4 {
                mode = TileMode::Tiled2DThick;
            }
            mode
        }
        mode => mode,
    };

    // The 3D modes only differ from the 2D modes with pipe rotation.
    if tile_mode.rotation(config) % config.num_pipes == 0 {
        match tile_mode {
            TileMode::Tiled3DThin1 => TileMode::Tiled2DThin1,
            TileMode::Tiled3BThin1 => TileMode::Tiled2BThin1,
            TileMode::Tiled3DThick => TileMode::Tiled2DThick,
            TileMode::Tiled3BThick => TileMode::Tiled2BThick,
            mode => mode,
        }
    } else {
        tile_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{R7xx, WII_U_CONFIG};

    fn mode(
        base: TileMode,
        bpp: u32,
        level: u32,
        width: u32,
        height: u32,
        num_slices: u32,
        num_samples: u32,
        is_depth: bool,
    ) -> TileMode {
        mip_level_tile_mode(
            &R7xx,
            base,
            bpp,
            level,
            width,
            height,
            num_slices,
            num_samples,
            is_depth,
        )
    }

    #[test]
    fn tile_slices() {
        assert_eq!(1, surface_tile_slices(&WII_U_CONFIG, TileMode::Tiled2DThin1, 32, 1));
        assert_eq!(1, surface_tile_slices(&WII_U_CONFIG, TileMode::Tiled2DThick, 32, 1));
        assert_eq!(2, surface_tile_slices(&WII_U_CONFIG, TileMode::Tiled2DThick, 128, 1));
        assert_eq!(2, surface_tile_slices(&WII_U_CONFIG, TileMode::Tiled2DThin1, 128, 4));
        assert_eq!(1, surface_tile_slices(&WII_U_CONFIG, TileMode::Tiled2DThin1, 0, 4));
    }

    #[test]
    fn base_level_unchanged() {
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled2DThin1, 32, 0, 1, 1, 1, 1, false)
        );
        assert_eq!(
            TileMode::Tiled2BThin1,
            mode(TileMode::Tiled2BThin1, 32, 0, 64, 64, 1, 1, false)
        );
        assert_eq!(
            TileMode::LinearAligned,
            mode(TileMode::LinearAligned, 32, 5, 1, 1, 1, 1, false)
        );
    }

    #[test]
    fn depth_and_samples_use_thin_modes() {
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled2DThick, 32, 0, 64, 64, 1, 1, true)
        );
        assert_eq!(
            TileMode::Tiled2BThin1,
            mode(TileMode::Tiled2BThick, 32, 0, 64, 64, 1, 4, false)
        );
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled2DThick, 128, 0, 64, 64, 1, 1, false)
        );
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled1DThin1, 32, 0, 64, 64, 1, 2, false)
        );
    }

    #[test]
    fn thick_1d_samples() {
        assert_eq!(
            TileMode::Tiled2DThick,
            mode(TileMode::Tiled1DThick, 32, 0, 64, 64, 1, 2, false)
        );
        assert_eq!(
            TileMode::Tiled1DThin1,
            mode(TileMode::Tiled1DThick, 32, 0, 64, 64, 1, 8, false)
        );
        assert_eq!(
            TileMode::Tiled1DThin1,
            mode(TileMode::Tiled1DThick, 32, 0, 64, 64, 1, 1, true)
        );
    }

    #[test]
    fn small_mips_use_micro_tiling() {
        assert_eq!(
            TileMode::Tiled1DThin1,
            mode(TileMode::Tiled2DThin1, 32, 3, 8, 8, 1, 1, false)
        );
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled2DThin1, 32, 1, 64, 64, 1, 1, false)
        );
        // Smaller texels need wider surfaces to fill the pipe interleave.
        assert_eq!(
            TileMode::Tiled1DThin1,
            mode(TileMode::Tiled2DThin1, 8, 1, 64, 64, 1, 1, false)
        );
        assert_eq!(
            TileMode::Tiled1DThin1,
            mode(TileMode::Tiled2DThin2, 32, 1, 16, 16, 1, 1, false)
        );
    }

    #[test]
    fn small_mips_thick() {
        assert_eq!(
            TileMode::Tiled2DThick,
            mode(TileMode::Tiled2DThick, 32, 1, 64, 64, 8, 1, false)
        );
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled2DThick, 32, 1, 64, 64, 2, 1, false)
        );
        assert_eq!(
            TileMode::Tiled1DThick,
            mode(TileMode::Tiled2DThick, 32, 1, 16, 16, 8, 1, false)
        );
        assert_eq!(
            TileMode::Tiled1DThin1,
            mode(TileMode::Tiled2DThick, 32, 1, 16, 16, 2, 1, false)
        );
    }

    #[test]
    fn mips_remove_bank_swapping() {
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled2BThin1, 32, 1, 64, 64, 1, 1, false)
        );
    }

    #[test]
    fn thin4_keeps_mode() {
        // The 8x64 macro tile check uses the thin4 dimensions.
        assert_eq!(
            TileMode::Tiled2DThin4,
            mode(TileMode::Tiled2DThin4, 32, 1, 8, 64, 1, 1, false)
        );
    }

    #[test]
    fn expanded_bpp() {
        assert_eq!(
            TileMode::Tiled2DThin1,
            mode(TileMode::Tiled2DThin1, 96, 1, 31, 16, 1, 1, false)
        );
    }

    #[test]
    fn mip_modes_never_macro_below_macro_tile() {
        for base in 4..16 {
            let base = TileMode::new(base).unwrap();
            for bpp in [8, 16, 32, 64, 128] {
                let result = mode(base, bpp, 4, 4, 4, 1, 1, false);
                assert!(!result.is_macro_tiled(), "{:?} {}", base, bpp);
            }
        }
    }
}
