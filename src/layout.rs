use crate::{
    addr::bank_swapped_width,
    hwl::{AddressGenerator, HwConfig},
    next_pow2, pow_two_align, SurfaceError, SurfaceFlags, TileMode,
};

/// The inputs shared by the layout calculations for each tile mode family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutInput {
    pub tile_mode: TileMode,
    /// The tile mode requested for the surface before any mip level adjustments.
    pub base_tile_mode: TileMode,
    pub bpp: u32,
    pub num_samples: u32,
    pub pitch: u32,
    pub height: u32,
    pub num_slices: u32,
    pub mip_level: u32,
    pub pad_dims: u32,
    pub flags: SurfaceFlags,
}

/// The padded dimensions and alignment for a single mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PaddedSurface {
    pub tile_mode: TileMode,
    pub pitch: u32,
    pub height: u32,
    pub depth: u32,
    pub surf_size: u64,
    pub base_align: u32,
    pub pitch_align: u32,
    pub height_align: u32,
    pub depth_align: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Alignments {
    pub base: u32,
    pub pitch: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MacroAlignments {
    pub base: u32,
    pub pitch: u32,
    pub height: u32,
    pub macro_tile_width: u32,
    pub macro_tile_height: u32,
}

pub(crate) fn compute_padded_surface<G: AddressGenerator + ?Sized>(
    gen: &G,
    input: &LayoutInput,
) -> Result<PaddedSurface, SurfaceError> {
    match input.tile_mode {
        TileMode::LinearGeneral | TileMode::LinearAligned => {
            Ok(linear_padded_surface(gen.config(), input))
        }
        TileMode::Tiled1DThin1 | TileMode::Tiled1DThick => {
            Ok(micro_tiled_padded_surface(gen.config(), input))
        }
        TileMode::Tiled2DXThick | TileMode::Tiled3DXThick => {
            Err(SurfaceError::UnsupportedTileMode {
                tile_mode: input.tile_mode as u32,
            })
        }
        _ => Ok(macro_tiled_padded_surface(gen, input)),
    }
}

pub(crate) fn adjust_pitch_alignment(flags: SurfaceFlags, pitch_align: u32) -> u32 {
    if flags.contains(SurfaceFlags::DISPLAY) {
        pow_two_align(pitch_align, 32)
    } else {
        pitch_align
    }
}

/// Pads the `(pitch, height, slices)` of a surface to the given alignments.
///
/// A `pad_dims` of `1` only pads the pitch and `2` also pads the height.
/// `0` is treated as `3` and pads all dimensions.
pub(crate) fn pad_dimensions(
    config: &HwConfig,
    tile_mode: TileMode,
    pad_dims: u32,
    flags: SurfaceFlags,
    pitch_align: u32,
    height_align: u32,
    slice_align: u32,
    (pitch, height, num_slices): (u32, u32, u32),
) -> (u32, u32, u32) {
    let thickness = tile_mode.thickness();
    let pad_dims = if pad_dims == 0 { 3 } else { pad_dims };

    let pitch = if pitch_align.is_power_of_two() {
        pow_two_align(pitch, pitch_align)
    } else {
        ((pitch + pitch_align - 1) / pitch_align) * pitch_align
    };

    let height = if pad_dims > 1 {
        pow_two_align(height, height_align)
    } else {
        height
    };

    let mut num_slices = num_slices;
    if pad_dims > 2 || thickness > 1 {
        let is_cube = flags.contains(SurfaceFlags::CUBE);
        if is_cube
            && (!config.no_cube_mip_slices_pad || flags.contains(SurfaceFlags::CUBE_AS_ARRAY))
        {
            num_slices = next_pow2(num_slices);
        }

        if thickness > 1 {
            num_slices = pow_two_align(num_slices, slice_align);
        }
    }

    (pitch, height, num_slices)
}

// Mip levels use power of two dimensions before padding.
fn mip_dimensions(input: &LayoutInput) -> ((u32, u32, u32), u32) {
    if input.mip_level == 0 {
        return (
            (input.pitch, input.height, input.num_slices),
            input.pad_dims,
        );
    }

    let pitch = next_pow2(input.pitch);
    let height = next_pow2(input.height);
    if input.flags.contains(SurfaceFlags::CUBE) {
        let pad_dims = if input.num_slices <= 1 { 2 } else { 0 };
        ((pitch, height, input.num_slices), pad_dims)
    } else {
        ((pitch, height, next_pow2(input.num_slices)), input.pad_dims)
    }
}

pub(crate) fn linear_alignments(
    config: &HwConfig,
    tile_mode: TileMode,
    bpp: u32,
    flags: SurfaceFlags,
) -> Alignments {
    let (base, pitch) = match tile_mode {
        TileMode::LinearGeneral => (1, if bpp != 1 { 1 } else { 8 }),
        TileMode::LinearAligned => {
            let pixels_per_pipe_interleave = 8 * config.pipe_interleave_bytes / bpp.max(1);
            (
                config.pipe_interleave_bytes,
                pixels_per_pipe_interleave.max(64),
            )
        }
        _ => (1, 1),
    };

    Alignments {
        base,
        pitch: adjust_pitch_alignment(flags, pitch),
        height: 1,
    }
}

fn linear_padded_surface(config: &HwConfig, input: &LayoutInput) -> PaddedSurface {
    let thickness = input.tile_mode.thickness();
    let align = linear_alignments(config, input.tile_mode, input.bpp, input.flags);

    // 3 component formats are padded as a single component with 3 times the width.
    let expanded_3 = input.flags.contains(SurfaceFlags::LINEAR_WA) && input.mip_level == 0;

    let ((pitch, height, num_slices), pad_dims) = mip_dimensions(input);
    let pitch = if expanded_3 {
        next_pow2(pitch / 3)
    } else {
        pitch
    };

    let (pitch, height, num_slices) = pad_dimensions(
        config,
        input.tile_mode,
        pad_dims,
        input.flags,
        align.pitch,
        align.height,
        thickness,
        (pitch, height, num_slices),
    );
    let pitch = if expanded_3 { pitch * 3 } else { pitch };

    // The sample count is applied twice to match the hardware tables.
    let num_samples = input.num_samples as u64;
    let slices = num_slices as u64 * num_samples / thickness as u64;
    let surf_size =
        (height as u64 * pitch as u64 * slices * input.bpp as u64 * num_samples + 7) / 8;

    PaddedSurface {
        tile_mode: input.tile_mode,
        pitch,
        height,
        depth: num_slices,
        surf_size,
        base_align: align.base,
        pitch_align: align.pitch,
        height_align: align.height,
        depth_align: thickness,
    }
}

pub(crate) fn micro_tiled_alignments(
    config: &HwConfig,
    tile_mode: TileMode,
    bpp: u32,
    flags: SurfaceFlags,
    num_samples: u32,
) -> Alignments {
    let bpp = match bpp {
        24 | 48 | 96 => bpp / 3,
        _ => bpp,
    };
    let thickness = tile_mode.thickness();
    let pitch =
        (config.pipe_interleave_bytes / bpp.max(1) / num_samples.max(1) / thickness).max(8);

    Alignments {
        base: config.pipe_interleave_bytes,
        pitch: adjust_pitch_alignment(flags, pitch),
        height: 8,
    }
}

fn micro_tiled_padded_surface(config: &HwConfig, input: &LayoutInput) -> PaddedSurface {
    let mut tile_mode = input.tile_mode;
    let mut thickness = tile_mode.thickness();

    let ((pitch, height, num_slices), pad_dims) = mip_dimensions(input);
    if input.mip_level > 0 && tile_mode == TileMode::Tiled1DThick && num_slices < 4 {
        tile_mode = TileMode::Tiled1DThin1;
        thickness = 1;
    }

    let align = micro_tiled_alignments(
        config,
        tile_mode,
        input.bpp,
        input.flags,
        input.num_samples,
    );

    let (pitch, height, num_slices) = pad_dimensions(
        config,
        tile_mode,
        pad_dims,
        input.flags,
        align.pitch,
        align.height,
        thickness,
        (pitch, height, num_slices),
    );

    PaddedSurface {
        tile_mode,
        pitch,
        height,
        depth: num_slices,
        surf_size: surface_size(pitch, height, num_slices, input.bpp, input.num_samples),
        base_align: align.base,
        pitch_align: align.pitch,
        height_align: align.height,
        depth_align: thickness,
    }
}

pub(crate) fn macro_tiled_alignments<G: AddressGenerator + ?Sized>(
    gen: &G,
    tile_mode: TileMode,
    bpp: u32,
    flags: SurfaceFlags,
    num_samples: u32,
) -> MacroAlignments {
    let config = gen.config();
    let aspect_ratio = tile_mode.aspect_ratio();
    let thickness = tile_mode.thickness();
    let num_samples = num_samples.max(1);

    let bpp = match bpp {
        24 | 48 | 96 => bpp / 3,
        3 => 1,
        _ => bpp,
    }
    .max(1);

    let macro_tile_width = 8 * config.num_banks / aspect_ratio;
    let macro_tile_height = aspect_ratio * 8 * config.num_pipes;

    let pitch_align = macro_tile_width.max(
        macro_tile_width * (config.pipe_interleave_bytes / bpp / (8 * thickness) / num_samples),
    );
    let pitch_align = adjust_pitch_alignment(flags, pitch_align);
    let height_align = macro_tile_height;

    let macro_bytes = (bpp as u64 * macro_tile_height as u64 * macro_tile_width as u64 + 7) >> 3;
    let macro_tile_bytes =
        num_samples as u64 * macro_bytes * gen.macro_tile_bytes_scale(num_samples) as u64;

    let tile_bytes = |samples: u64| {
        (samples * height_align as u64 * bpp as u64 * pitch_align as u64 + 7) >> 3
    };
    let mut base_align = if thickness == 1 {
        macro_tile_bytes.max(tile_bytes(num_samples as u64))
    } else {
        (config.pipe_interleave_bytes as u64).max(tile_bytes(4))
    };

    let micro_tile_bytes = (thickness as u64 * num_samples as u64 * ((bpp as u64) << 6) + 7) >> 3;
    let split_size = config.split_size as u64;
    let slices_per_micro_tile = if micro_tile_bytes < split_size {
        1
    } else {
        micro_tile_bytes / split_size
    };
    base_align /= slices_per_micro_tile;

    if gen.is_dual_base_align_needed(tile_mode) && (base_align / macro_bytes) % 2 != 0 {
        base_align += macro_bytes;
    }

    MacroAlignments {
        base: base_align as u32,
        pitch: pitch_align,
        height: height_align,
        macro_tile_width,
        macro_tile_height,
    }
}

fn macro_tiled_padded_surface<G: AddressGenerator + ?Sized>(
    gen: &G,
    input: &LayoutInput,
) -> PaddedSurface {
    let config = gen.config();
    let tile_mode = input.tile_mode;
    let base_tile_mode = input.base_tile_mode;

    let mut output_tile_mode = tile_mode;
    let mut thickness = tile_mode.thickness();

    let (dims, pad_dims) = mip_dimensions(input);
    if input.mip_level > 0 && output_tile_mode == TileMode::Tiled2DThick && dims.2 < 4 {
        output_tile_mode = TileMode::Tiled2DThin1;
        thickness = 1;
    }

    if tile_mode == base_tile_mode
        || input.mip_level == 0
        || !base_tile_mode.is_thick_macro_tiled()
        || tile_mode.is_thick_macro_tiled()
    {
        return pad_macro_tiled(gen, input, output_tile_mode, thickness, dims, pad_dims);
    }

    // Thick mip chains check the alignment of the base mode first.
    let base_align = macro_tiled_alignments(
        gen,
        base_tile_mode,
        input.bpp,
        input.flags,
        input.num_samples,
    );
    let pitch_align_factor = ((config.pipe_interleave_bytes >> 3) / input.bpp.max(1)).max(1);

    if dims.0 < base_align.pitch * pitch_align_factor || dims.1 < base_align.height {
        log::debug!(
            "Mip {} ({}x{}) is too small for {:?}, using {:?}",
            input.mip_level,
            dims.0,
            dims.1,
            base_tile_mode,
            TileMode::Tiled1DThin1
        );
        let micro_input = LayoutInput {
            tile_mode: TileMode::Tiled1DThin1,
            ..*input
        };
        micro_tiled_padded_surface(config, &micro_input)
    } else {
        pad_macro_tiled(gen, input, output_tile_mode, thickness, dims, pad_dims)
    }
}

fn pad_macro_tiled<G: AddressGenerator + ?Sized>(
    gen: &G,
    input: &LayoutInput,
    output_tile_mode: TileMode,
    thickness: u32,
    (pitch, height, num_slices): (u32, u32, u32),
    pad_dims: u32,
) -> PaddedSurface {
    let config = gen.config();
    let tile_mode = input.tile_mode;
    let num_samples = input.num_samples;

    let align = macro_tiled_alignments(gen, tile_mode, input.bpp, input.flags, num_samples);

    // The swap width uses the pitch before any padding.
    let pitch_align = align
        .pitch
        .max(bank_swapped_width(config, tile_mode, input.bpp, num_samples, input.pitch));

    let mut pitch = pitch;
    let is_depth = input.flags.contains(SurfaceFlags::DEPTH);
    if gen.is_dual_pitch_align_needed(tile_mode, is_depth, input.mip_level) {
        let tiles_per_group = ((config.pipe_interleave_bytes >> 3)
            / input.bpp.max(1)
            / num_samples.max(1)
            / tile_mode.thickness())
        .max(1);
        let even_height = (height.saturating_sub(1) / align.macro_tile_height) & 1;
        let even_width = (pitch.saturating_sub(1) / align.macro_tile_width) & 1;

        if num_samples == 1
            && tiles_per_group == 1
            && even_width == 0
            && (pitch > align.macro_tile_width
                || (even_height == 0 && height > align.macro_tile_height))
        {
            pitch += align.macro_tile_width;
        }
    }

    let (pitch, height, num_slices) = pad_dimensions(
        config,
        tile_mode,
        pad_dims,
        input.flags,
        pitch_align,
        align.height,
        thickness,
        (pitch, height, num_slices),
    );

    PaddedSurface {
        tile_mode: output_tile_mode,
        pitch,
        height,
        depth: num_slices,
        surf_size: surface_size(pitch, height, num_slices, input.bpp, num_samples),
        base_align: align.base,
        pitch_align,
        height_align: align.height,
        depth_align: thickness,
    }
}

fn surface_size(pitch: u32, height: u32, num_slices: u32, bpp: u32, num_samples: u32) -> u64 {
    (height as u64 * pitch as u64 * num_slices as u64 * bpp as u64 * num_samples as u64 + 7) / 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{R6xx, R7xx, WII_U_CONFIG};

    fn input(tile_mode: TileMode, bpp: u32, width: u32, height: u32) -> LayoutInput {
        LayoutInput {
            tile_mode,
            base_tile_mode: tile_mode,
            bpp,
            num_samples: 1,
            pitch: width,
            height,
            num_slices: 1,
            mip_level: 0,
            pad_dims: 0,
            flags: SurfaceFlags::empty(),
        }
    }

    #[test]
    fn pad_dimensions_cube() {
        let flags = SurfaceFlags::CUBE;
        assert_eq!(
            (64, 16, 8),
            pad_dimensions(
                &WII_U_CONFIG,
                TileMode::Tiled2DThin1,
                0,
                flags,
                32,
                16,
                1,
                (33, 9, 6)
            )
        );
        // Only the pitch and height are padded for 2 dimensions.
        assert_eq!(
            (64, 16, 6),
            pad_dimensions(
                &WII_U_CONFIG,
                TileMode::Tiled2DThin1,
                2,
                flags,
                32,
                16,
                1,
                (33, 9, 6)
            )
        );
    }

    #[test]
    fn pad_dimensions_thick() {
        assert_eq!(
            (8, 3, 4),
            pad_dimensions(
                &WII_U_CONFIG,
                TileMode::Tiled1DThick,
                1,
                SurfaceFlags::empty(),
                8,
                8,
                4,
                (8, 3, 1)
            )
        );
    }

    #[test]
    fn pad_dimensions_non_power_of_two_pitch() {
        assert_eq!(
            (96, 1, 1),
            pad_dimensions(
                &WII_U_CONFIG,
                TileMode::LinearAligned,
                0,
                SurfaceFlags::empty(),
                48,
                1,
                1,
                (50, 1, 1)
            )
        );
    }

    #[test]
    fn display_pitch_alignment() {
        assert_eq!(8, adjust_pitch_alignment(SurfaceFlags::empty(), 8));
        assert_eq!(32, adjust_pitch_alignment(SurfaceFlags::DISPLAY, 8));
        assert_eq!(64, adjust_pitch_alignment(SurfaceFlags::DISPLAY, 64));
    }

    #[test]
    fn linear_alignment_values() {
        let flags = SurfaceFlags::empty();
        assert_eq!(
            Alignments {
                base: 1,
                pitch: 8,
                height: 1
            },
            linear_alignments(&WII_U_CONFIG, TileMode::LinearGeneral, 1, flags)
        );
        assert_eq!(
            Alignments {
                base: 256,
                pitch: 64,
                height: 1
            },
            linear_alignments(&WII_U_CONFIG, TileMode::LinearAligned, 32, flags)
        );
        assert_eq!(
            Alignments {
                base: 256,
                pitch: 256,
                height: 1
            },
            linear_alignments(&WII_U_CONFIG, TileMode::LinearAligned, 8, flags)
        );
    }

    #[test]
    fn micro_alignment_values() {
        let flags = SurfaceFlags::empty();
        assert_eq!(
            Alignments {
                base: 256,
                pitch: 32,
                height: 8
            },
            micro_tiled_alignments(&WII_U_CONFIG, TileMode::Tiled1DThin1, 8, flags, 1)
        );
        assert_eq!(
            Alignments {
                base: 256,
                pitch: 8,
                height: 8
            },
            micro_tiled_alignments(&WII_U_CONFIG, TileMode::Tiled1DThin1, 96, flags, 1)
        );
        assert_eq!(
            Alignments {
                base: 256,
                pitch: 8,
                height: 8
            },
            micro_tiled_alignments(&WII_U_CONFIG, TileMode::Tiled1DThick, 8, flags, 1)
        );
    }

    #[test]
    fn macro_alignment_values() {
        let flags = SurfaceFlags::empty();
        assert_eq!(
            MacroAlignments {
                base: 2048,
                pitch: 32,
                height: 16,
                macro_tile_width: 32,
                macro_tile_height: 16
            },
            macro_tiled_alignments(&R7xx, TileMode::Tiled2DThin1, 32, flags, 1)
        );
        assert_eq!(
            MacroAlignments {
                base: 2048,
                pitch: 128,
                height: 16,
                macro_tile_width: 32,
                macro_tile_height: 16
            },
            macro_tiled_alignments(&R7xx, TileMode::Tiled2DThin1, 8, flags, 1)
        );
        assert_eq!(
            MacroAlignments {
                base: 2048,
                pitch: 16,
                height: 32,
                macro_tile_width: 16,
                macro_tile_height: 32
            },
            macro_tiled_alignments(&R7xx, TileMode::Tiled2DThin2, 32, flags, 1)
        );
        assert_eq!(
            MacroAlignments {
                base: 16384,
                pitch: 32,
                height: 16,
                macro_tile_width: 32,
                macro_tile_height: 16
            },
            macro_tiled_alignments(&R7xx, TileMode::Tiled2DThick, 128, flags, 1)
        );
    }

    #[test]
    fn macro_alignment_r6xx() {
        let align = macro_tiled_alignments(
            &R6xx,
            TileMode::Tiled2DThin1,
            32,
            SurfaceFlags::empty(),
            1,
        );
        assert_eq!(4096, align.base);
    }

    #[test]
    fn linear_surface() {
        let surface = compute_padded_surface(&R7xx, &input(TileMode::LinearAligned, 32, 64, 64))
            .unwrap();
        assert_eq!(64, surface.pitch);
        assert_eq!(64, surface.height);
        assert_eq!(16384, surface.surf_size);
        assert_eq!(256, surface.base_align);
    }

    #[test]
    fn linear_surface_expanded_3() {
        let mut input = input(TileMode::LinearAligned, 32, 300, 4);
        input.flags = SurfaceFlags::LINEAR_WA;
        let surface = compute_padded_surface(&R7xx, &input).unwrap();
        assert_eq!(384, surface.pitch);
        assert_eq!(384 * 4 * 4, surface.surf_size);
    }

    #[test]
    fn micro_surface() {
        let surface = compute_padded_surface(&R7xx, &input(TileMode::Tiled1DThin1, 32, 30, 20))
            .unwrap();
        assert_eq!(TileMode::Tiled1DThin1, surface.tile_mode);
        assert_eq!(32, surface.pitch);
        assert_eq!(24, surface.height);
        assert_eq!(32 * 24 * 4, surface.surf_size);
    }

    #[test]
    fn micro_surface_thick_mip() {
        let mut input = input(TileMode::Tiled1DThick, 32, 16, 16);
        input.mip_level = 1;
        input.num_slices = 2;
        let surface = compute_padded_surface(&R7xx, &input).unwrap();
        assert_eq!(TileMode::Tiled1DThin1, surface.tile_mode);
        assert_eq!(1, surface.depth_align);
        assert_eq!(2, surface.depth);
    }

    #[test]
    fn macro_surface() {
        let surface = compute_padded_surface(&R7xx, &input(TileMode::Tiled2DThin1, 32, 32, 32))
            .unwrap();
        assert_eq!(TileMode::Tiled2DThin1, surface.tile_mode);
        assert_eq!(32, surface.pitch);
        assert_eq!(32, surface.height);
        assert_eq!(4096, surface.surf_size);
        assert_eq!(2048, surface.base_align);
    }

    #[test]
    fn macro_surface_bank_swapped_pitch() {
        let surface = compute_padded_surface(&R7xx, &input(TileMode::Tiled2BThin1, 32, 256, 64))
            .unwrap();
        assert_eq!(128, surface.pitch_align);
        assert_eq!(256, surface.pitch);
    }

    #[test]
    fn macro_surface_thick_fallback() {
        let mut input = input(TileMode::Tiled2DThin1, 32, 16, 16);
        input.base_tile_mode = TileMode::Tiled2DThick;
        input.mip_level = 1;
        let surface = compute_padded_surface(&R7xx, &input).unwrap();
        assert_eq!(TileMode::Tiled1DThin1, surface.tile_mode);
        assert_eq!(256, surface.base_align);
    }

    #[test]
    fn macro_surface_dual_pitch_r6xx() {
        // Pitches spanning an odd number of macro tiles get an extra tile.
        let r7xx = compute_padded_surface(&R7xx, &input(TileMode::Tiled2DThin1, 128, 96, 64))
            .unwrap();
        let r6xx = compute_padded_surface(&R6xx, &input(TileMode::Tiled2DThin1, 128, 96, 64))
            .unwrap();
        assert_eq!(96, r7xx.pitch);
        assert_eq!(128, r6xx.pitch);
    }

    #[test]
    fn xthick_unsupported() {
        let result = compute_padded_surface(&R7xx, &input(TileMode::Tiled2DXThick, 32, 64, 64));
        assert!(matches!(
            result,
            Err(SurfaceError::UnsupportedTileMode { tile_mode: 16 })
        ));
    }
}
