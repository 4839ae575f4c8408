//! Hardware parameters for the supported GPU generations.
//!
//! The address calculations are shared between generations.
//! The differences are limited to a handful of alignment rules,
//! which are exposed through the [AddressGenerator] trait.
//! The Wii U's GPU uses the [R7xx] rules.
use crate::TileMode;

/// Fixed parameters of the memory controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwConfig {
    pub num_pipes: u32,
    pub num_banks: u32,
    /// The size in bytes of the interleave between pipes.
    pub pipe_interleave_bytes: u32,
    /// The size in bytes of a DRAM row.
    pub row_size: u32,
    pub swap_size: u32,
    /// The maximum size in bytes of a micro tile before samples split into tile slices.
    pub split_size: u32,
    /// Skip rounding the slices of non array cube maps up to a power of two.
    pub no_cube_mip_slices_pad: bool,
}

/// The memory configuration used by the Wii U.
pub const WII_U_CONFIG: HwConfig = HwConfig {
    num_pipes: 2,
    num_banks: 4,
    pipe_interleave_bytes: 256,
    row_size: 2048,
    swap_size: 256,
    split_size: 2048,
    no_cube_mip_slices_pad: false,
};

impl HwConfig {
    pub const fn pipe_bits(&self) -> u32 {
        self.num_pipes.trailing_zeros()
    }

    pub const fn bank_bits(&self) -> u32 {
        self.num_banks.trailing_zeros()
    }

    pub const fn group_bits(&self) -> u32 {
        self.pipe_interleave_bytes.trailing_zeros()
    }
}

impl Default for HwConfig {
    fn default() -> Self {
        WII_U_CONFIG
    }
}

/// GPU generations with distinct surface alignment rules.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum ChipFamily {
    R6xx,
    R7xx,
}

/// The generation specific rules for computing surface layouts.
///
/// All of the layout functions in this crate accept any implementation,
/// so custom configurations only need to provide a [HwConfig] and the alignment hooks.
pub trait AddressGenerator: Sync {
    fn chip_family(&self) -> ChipFamily;

    fn config(&self) -> &HwConfig;

    /// Returns `true` if macro tiled pitches need an extra macro tile
    /// to avoid an odd number of tiles per group.
    fn is_dual_pitch_align_needed(&self, tile_mode: TileMode, is_depth: bool, mip_level: u32)
        -> bool;

    /// Returns `true` if the base alignment must be an even number of macro tiles.
    fn is_dual_base_align_needed(&self, tile_mode: TileMode) -> bool;

    /// The factor applied to the size of a macro tile for alignment.
    fn macro_tile_bytes_scale(&self, num_samples: u32) -> u32;
}

/// The R600 family.
#[derive(Debug, Default, Clone, Copy)]
pub struct R6xx;

/// The R700 family including the Wii U's GPU.
#[derive(Debug, Default, Clone, Copy)]
pub struct R7xx;

impl AddressGenerator for R6xx {
    fn chip_family(&self) -> ChipFamily {
        ChipFamily::R6xx
    }

    fn config(&self) -> &HwConfig {
        &WII_U_CONFIG
    }

    fn is_dual_pitch_align_needed(
        &self,
        tile_mode: TileMode,
        is_depth: bool,
        mip_level: u32,
    ) -> bool {
        if is_depth || mip_level > 0 {
            return false;
        }

        !matches!(
            tile_mode,
            TileMode::LinearGeneral
                | TileMode::LinearAligned
                | TileMode::Tiled1DThin1
                | TileMode::Tiled1DThick
                | TileMode::Tiled2DThick
                | TileMode::Tiled2BThick
                | TileMode::Tiled3DThick
                | TileMode::Tiled3BThick
        )
    }

    fn is_dual_base_align_needed(&self, tile_mode: TileMode) -> bool {
        !tile_mode.is_linear() && !tile_mode.is_micro_tiled()
    }

    fn macro_tile_bytes_scale(&self, num_samples: u32) -> u32 {
        if num_samples == 1 {
            2
        } else {
            1
        }
    }
}

impl AddressGenerator for R7xx {
    fn chip_family(&self) -> ChipFamily {
        ChipFamily::R7xx
    }

    fn config(&self) -> &HwConfig {
        &WII_U_CONFIG
    }

    fn is_dual_pitch_align_needed(&self, _: TileMode, _: bool, _: u32) -> bool {
        false
    }

    fn is_dual_base_align_needed(&self, _: TileMode) -> bool {
        false
    }

    fn macro_tile_bytes_scale(&self, _: u32) -> u32 {
        1
    }
}

/// Selects the rules for the given chip `family`.
/**
```rust
use wiiu_swizzle::{generator, ChipFamily};

assert_eq!(ChipFamily::R7xx, generator(ChipFamily::R7xx).chip_family());
```
*/
pub fn generator(family: ChipFamily) -> &'static dyn AddressGenerator {
    match family {
        ChipFamily::R6xx => &R6xx,
        ChipFamily::R7xx => &R7xx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiiu_bit_counts() {
        assert_eq!(1, WII_U_CONFIG.pipe_bits());
        assert_eq!(2, WII_U_CONFIG.bank_bits());
        assert_eq!(8, WII_U_CONFIG.group_bits());
    }

    #[test]
    fn r7xx_has_no_dual_alignment() {
        for value in 0..18 {
            let mode = TileMode::new(value).unwrap();
            assert!(!R7xx.is_dual_base_align_needed(mode));
            assert!(!R7xx.is_dual_pitch_align_needed(mode, false, 0));
        }
    }

    #[test]
    fn r6xx_dual_pitch_align() {
        assert!(R6xx.is_dual_pitch_align_needed(TileMode::Tiled2DThin1, false, 0));
        assert!(!R6xx.is_dual_pitch_align_needed(TileMode::Tiled2DThin1, true, 0));
        assert!(!R6xx.is_dual_pitch_align_needed(TileMode::Tiled2DThin1, false, 1));
        assert!(!R6xx.is_dual_pitch_align_needed(TileMode::Tiled2DThick, false, 0));
        assert_eq!(2, R6xx.macro_tile_bytes_scale(1));
        assert_eq!(1, R6xx.macro_tile_bytes_scale(4));
    }
}
