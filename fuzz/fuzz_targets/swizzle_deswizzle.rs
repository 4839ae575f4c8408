#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};

extern crate rand;
use rand::{rngs::StdRng, Rng, SeedableRng};

use wiiu_swizzle::{surface, SurfaceDim};

#[derive(Debug)]
struct Input {
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: u32,
    swizzle: u32,
    mipmap_count: u32,
}

// Formats with a known size.
const FORMATS: [u32; 10] = [0x1, 0x7, 0x1a, 0x1f, 0x22, 0x2f, 0x30, 0x31, 0x33, 0x35];

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            format: *u.choose(&FORMATS)?,
            width: u.int_in_range(1..=256)?,
            height: u.int_in_range(1..=256)?,
            depth: u.int_in_range(1..=8)?,
            dim: u.arbitrary()?,
            tile_mode: u.int_in_range(1..=16)?,
            swizzle: u.arbitrary()?,
            mipmap_count: u.int_in_range(1..=9)?,
        })
    }
}

fuzz_target!(|input: Input| {
    // Multisampled surfaces only round trip the first sample.
    if matches!(input.dim, SurfaceDim::D2Msaa | SurfaceDim::D2MsaaArray) {
        return;
    }

    let deswizzled_size = surface::deswizzled_surface_size(
        input.format,
        input.width,
        input.height,
        input.depth,
        input.dim,
        input.mipmap_count,
    );

    let seed = [13u8; 32];
    let mut rng: StdRng = SeedableRng::from_seed(seed);
    let deswizzled: Vec<_> = (0..deswizzled_size)
        .map(|_| rng.gen_range::<u8, _>(0..=255))
        .collect();

    let (image_data, mip_data) = surface::swizzle_surface(
        input.format,
        input.width,
        input.height,
        input.depth,
        input.dim,
        input.tile_mode,
        0,
        input.swizzle,
        &deswizzled,
        input.mipmap_count,
    )
    .unwrap();

    let new_deswizzled = surface::deswizzle_surface(
        input.format,
        input.width,
        input.height,
        input.depth,
        input.dim,
        input.tile_mode,
        0,
        input.swizzle,
        &image_data,
        &mip_data,
        input.mipmap_count,
    )
    .unwrap();

    if deswizzled != new_deswizzled {
        panic!("Swizzle deswizzle is not 1:1");
    }
});
