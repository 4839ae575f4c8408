//! Functions for calculating the byte offset of a texel in a tiled surface.
//!
//! Each tile mode family has its own addressing function.
//! Linear modes store rows of texels contiguously with a padded pitch.
//! Micro tiled modes store 8x8 texel micro tiles contiguously,
//! with the texels of each micro tile interleaved depending on the bits per pixel.
//! Macro tiled modes group micro tiles into macro tiles distributed across memory pipes and banks.
//!
//! All coordinates and dimensions are in texels, or in blocks for block compressed formats.
//! The `bpp` parameter is the bits per texel of the stored elements
//! as returned by [crate::SurfaceLayout::bpp].
//!
//! # Examples
//! Find the offset of the texel at `(5, 3)` in a linear R8G8B8A8 surface.
/*!
```rust
use wiiu_swizzle::addr::addr_linear;

assert_eq!(776, addr_linear(5, 3, 32, 64));
```
*/
use crate::{hwl::HwConfig, TileMode, WII_U_CONFIG};

const BANK_SWAP_ORDER: [u64; 10] = [0, 1, 3, 2, 6, 7, 5, 4, 0, 0];

/// Calculates the index of a texel within its micro tile.
///
/// The index interleaves the low 3 bits of `x` and `y`.
/// Thick tile modes also interleave the low bits of the slice `z`.
pub fn pixel_index_within_micro_tile(
    x: u32,
    y: u32,
    z: u32,
    bpp: u32,
    tile_mode: TileMode,
    is_depth: bool,
) -> u32 {
    let [x0, x1, x2] = [x & 1, (x >> 1) & 1, (x >> 2) & 1];
    let [y0, y1, y2] = [y & 1, (y >> 1) & 1, (y >> 2) & 1];

    let bits = if is_depth {
        [x0, y0, x1, y1, x2, y2]
    } else {
        match bpp {
            8 => [x0, x1, x2, y1, y0, y2],
            16 => [x0, x1, x2, y0, y1, y2],
            64 => [x0, y0, x1, x2, y1, y2],
            128 => [y0, x0, x1, x2, y1, y2],
            // 32 and 96 bits use the default pattern.
            _ => [x0, x1, y0, x2, y1, y2],
        }
    };

    let mut index = bits
        .iter()
        .enumerate()
        .fold(0, |index, (i, bit)| index | (bit << i));

    let thickness = tile_mode.thickness();
    if thickness > 1 {
        index |= (z & 1) << 6 | ((z >> 1) & 1) << 7;
    }
    if thickness == 8 {
        index |= ((z >> 2) & 1) << 8;
    }

    index
}

/// Calculates the memory pipe for a texel before applying any rotation or swizzle.
/// The hardware has two pipes.
pub fn pipe_from_coord(x: u32, y: u32) -> u32 {
    ((y >> 3) ^ (x >> 3)) & 1
}

/// Calculates the memory bank for a texel before applying any rotation or swizzle.
pub fn bank_from_coord(config: &HwConfig, x: u32, y: u32) -> u32 {
    let num_pipes = config.num_pipes;
    match config.num_banks {
        4 => {
            let bit0 = ((y / (16 * num_pipes)) ^ (x >> 3)) & 1;
            let bit1 = ((y / (8 * num_pipes)) ^ (x >> 4)) & 1;
            bit0 | (bit1 << 1)
        }
        8 => {
            let bit0 = ((y / (32 * num_pipes)) ^ (x >> 3)) & 1;
            let bit1 = ((y / (32 * num_pipes)) ^ (y / (16 * num_pipes)) ^ (x >> 4)) & 1;
            let bit2 = ((y / (8 * num_pipes)) ^ (x >> 5)) & 1;
            bit0 | (bit1 << 1) | (bit2 << 2)
        }
        _ => 0,
    }
}

/// Calculates the width in texels after which bank swapped tile modes swap banks.
/// Returns `0` for tile modes without bank swapping.
pub fn bank_swapped_width(
    config: &HwConfig,
    tile_mode: TileMode,
    bpp: u32,
    num_samples: u32,
    pitch: u32,
) -> u32 {
    if !tile_mode.is_bank_swapped() || bpp == 0 {
        return 0;
    }

    let num_samples = num_samples.max(1);
    let bytes_per_sample = 8 * bpp;
    let samples_per_tile = config.split_size / bytes_per_sample;
    let slices_per_tile = if samples_per_tile == 0 {
        1
    } else {
        (num_samples / samples_per_tile).max(1)
    };

    let num_samples = if tile_mode.is_thick_macro_tiled() {
        4
    } else {
        num_samples
    };

    let bytes_per_tile_slice = num_samples * bytes_per_sample / slices_per_tile;
    let swap_tiles = ((config.swap_size >> 1) / bpp).max(1);
    let swap_width = swap_tiles * 8 * config.num_banks;
    let height_bytes =
        num_samples * tile_mode.aspect_ratio() * config.num_pipes * bpp / slices_per_tile;
    let swap_max = config.num_pipes * config.num_banks * config.row_size / height_bytes;
    let swap_min = config.pipe_interleave_bytes * 8 * config.num_banks / bytes_per_tile_slice;

    let mut bank_swap_width = swap_max.min(swap_min.max(swap_width));
    while bank_swap_width != 0 && bank_swap_width >= 2 * pitch {
        bank_swap_width >>= 1;
    }

    bank_swap_width
}

/// Calculates the byte offset of the texel at `(x, y)` in a linear surface.
/**
```rust
use wiiu_swizzle::addr::addr_linear;

assert_eq!((3 * 64 + 5) * 32 / 8, addr_linear(5, 3, 32, 64));
```
*/
pub fn addr_linear(x: u32, y: u32, bpp: u32, pitch: u32) -> u64 {
    (y as u64 * pitch as u64 + x as u64) * bpp as u64 / 8
}

/// Calculates the byte offset of a texel in a linear surface with multiple slices or samples.
/// Samples are stored after all the slices of the previous sample.
pub fn addr_linear_3d(
    x: u32,
    y: u32,
    slice: u32,
    sample: u32,
    bpp: u32,
    pitch: u32,
    height: u32,
    num_slices: u32,
) -> u64 {
    let slice_offset =
        pitch as u64 * height as u64 * (slice as u64 + sample as u64 * num_slices as u64);
    (y as u64 * pitch as u64 + x as u64 + slice_offset) * bpp as u64 / 8
}

/// Calculates the byte offset of the texel at `(x, y)` in the first slice of a micro tiled surface.
pub fn addr_micro_tiled(x: u32, y: u32, bpp: u32, pitch: u32, tile_mode: TileMode) -> u64 {
    addr_micro_tiled_3d(x, y, 0, bpp, pitch, 0, tile_mode, false)
}

/// Calculates the byte offset of the texel at `(x, y, slice)` in a micro tiled surface.
/// The `height` should be the padded height in texels.
pub fn addr_micro_tiled_3d(
    x: u32,
    y: u32,
    slice: u32,
    bpp: u32,
    pitch: u32,
    height: u32,
    tile_mode: TileMode,
    is_depth: bool,
) -> u64 {
    let bpp64 = bpp as u64;
    let thickness = tile_mode.thickness() as u64;

    let micro_tile_bytes = (64 * thickness * bpp64 + 7) / 8;
    let micro_tiles_per_row = (pitch >> 3) as u64;
    let micro_tile_index_x = (x >> 3) as u64;
    let micro_tile_index_y = (y >> 3) as u64;
    let micro_tile_index_z = slice as u64 / thickness;

    let micro_tile_offset =
        micro_tile_bytes * (micro_tile_index_x + micro_tile_index_y * micro_tiles_per_row);
    let slice_bytes = (pitch as u64 * height as u64 * thickness * bpp64 + 7) / 8;
    let slice_offset = micro_tile_index_z * slice_bytes;

    let pixel_index = pixel_index_within_micro_tile(x, y, slice, bpp, tile_mode, is_depth);
    let pixel_offset = (bpp64 * pixel_index as u64) >> 3;

    pixel_offset + micro_tile_offset + slice_offset
}

/// Calculates the byte offset of the texel at `(x, y)` in the first slice of a single sampled macro tiled surface.
///
/// The `pipe_swizzle` and `bank_swizzle` come from bits 8 and 9-10 of the GX2 surface swizzle value.
pub fn addr_macro_tiled(
    x: u32,
    y: u32,
    bpp: u32,
    pitch: u32,
    height: u32,
    tile_mode: TileMode,
    pipe_swizzle: u32,
    bank_swizzle: u32,
) -> u64 {
    addr_macro_tiled_3d(
        &WII_U_CONFIG,
        x,
        y,
        0,
        0,
        bpp,
        pitch,
        height,
        1,
        tile_mode,
        false,
        pipe_swizzle,
        bank_swizzle,
    )
}

/// Calculates the byte offset of a texel in a macro tiled surface with multiple slices or samples.
/// The `height` should be the padded height in texels.
///
/// The result packs the bank and pipe above the pipe interleave bits to match the physical address.
pub fn addr_macro_tiled_3d(
    config: &HwConfig,
    x: u32,
    y: u32,
    slice: u32,
    sample: u32,
    bpp: u32,
    pitch: u32,
    height: u32,
    num_samples: u32,
    tile_mode: TileMode,
    is_depth: bool,
    pipe_swizzle: u32,
    bank_swizzle: u32,
) -> u64 {
    let bpp64 = bpp as u64;
    let thickness = tile_mode.thickness() as u64;
    let mut num_samples = num_samples.max(1) as u64;

    let micro_tile_bits = num_samples * bpp64 * thickness * 64;
    let micro_tile_bytes = (micro_tile_bits + 7) / 8;
    let bytes_per_sample = micro_tile_bytes / num_samples;

    let pixel_index = pixel_index_within_micro_tile(x, y, slice, bpp, tile_mode, is_depth) as u64;

    // Depth surfaces interleave samples per texel instead of per micro tile.
    let sample = sample as u64;
    let (sample_offset, pixel_offset) = if is_depth {
        (bpp64 * sample, num_samples * bpp64 * pixel_index)
    } else {
        (sample * (micro_tile_bits / num_samples), bpp64 * pixel_index)
    };
    let mut elem_offset = pixel_offset + sample_offset;

    // Samples that don't fit in a single split are stored in separate tile slices.
    let split_size = config.split_size as u64;
    let (num_sample_splits, sample_slice) = if num_samples <= 1 || micro_tile_bytes <= split_size
    {
        (1, 0)
    } else {
        let samples_per_slice = (split_size / bytes_per_sample.max(1)).max(1);
        let num_sample_splits = (num_samples / samples_per_slice).max(1);
        num_samples = samples_per_slice;

        let tile_slice_bits = (micro_tile_bits / num_sample_splits).max(1);
        let sample_slice = elem_offset / tile_slice_bits;
        elem_offset %= tile_slice_bits;
        (num_sample_splits, sample_slice)
    };

    let elem_offset = (elem_offset + 7) / 8;

    let num_pipes = config.num_pipes as u64;
    let num_banks = config.num_banks as u64;

    let pipe = pipe_from_coord(x, y) as u64;
    let bank = bank_from_coord(config, x, y) as u64;

    let swizzle = pipe_swizzle as u64 + num_pipes * bank_swizzle as u64;
    let rotation = tile_mode.rotation(config) as u64;
    let slice_in = if tile_mode.is_thick_macro_tiled() {
        (slice >> 2) as u64
    } else {
        slice as u64
    };

    let mut bank_pipe = pipe + num_pipes * bank;
    bank_pipe ^= num_pipes * sample_slice * ((num_banks >> 1) + 1) ^ (swizzle + slice_in * rotation);
    bank_pipe %= num_pipes * num_banks;
    let pipe = bank_pipe % num_pipes;
    let mut bank = bank_pipe / num_pipes;

    let slice_bytes =
        (height as u64 * pitch as u64 * thickness * bpp64 * num_samples + 7) / 8;
    let slice_offset =
        slice_bytes * ((sample_slice + num_sample_splits * slice as u64) / thickness);

    let aspect_ratio = tile_mode.aspect_ratio() as u64;
    let macro_tile_pitch = 8 * num_banks / aspect_ratio;
    let macro_tile_height = 8 * num_pipes * aspect_ratio;

    let macro_tiles_per_row = pitch as u64 / macro_tile_pitch;
    let macro_tile_bytes =
        (num_samples * thickness * bpp64 * macro_tile_height * macro_tile_pitch + 7) / 8;
    let macro_tile_index_x = x as u64 / macro_tile_pitch;
    let macro_tile_index_y = y as u64 / macro_tile_height;
    let macro_tile_offset =
        (macro_tile_index_x + macro_tiles_per_row * macro_tile_index_y) * macro_tile_bytes;

    if tile_mode.is_bank_swapped() {
        let bank_swap_width =
            bank_swapped_width(config, tile_mode, bpp, num_samples as u32, pitch) as u64;
        if bank_swap_width > 0 {
            let swap_index = macro_tile_pitch * macro_tile_index_x / bank_swap_width;
            bank ^= BANK_SWAP_ORDER[(swap_index & (num_banks - 1)) as usize];
        }
    }

    let pipe_bits = config.pipe_bits();
    let group_bits = config.group_bits();
    let num_swizzle_bits = config.bank_bits() + pipe_bits;

    let total_offset = elem_offset + ((macro_tile_offset + slice_offset) >> num_swizzle_bits);
    let group_mask = (1u64 << group_bits) - 1;
    let offset_high = (total_offset & !group_mask) << num_swizzle_bits;
    let offset_low = total_offset & group_mask;

    (bank << (pipe_bits + group_bits)) | (pipe << group_bits) | offset_low | offset_high
}
