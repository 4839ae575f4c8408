#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};

use wiiu_swizzle::SurfaceDim;

#[derive(Debug)]
struct Input {
    format: u32,
    width: u32,
    height: u32,
    depth: u32,
    dim: SurfaceDim,
    tile_mode: u32,
    swizzle: u32,
    image_size: usize,
    mip_size: usize,
    mipmap_count: u32,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            format: u.int_in_range(0..=0x3f)?,
            width: u.int_in_range(0..=256)?,
            height: u.int_in_range(0..=256)?,
            depth: u.int_in_range(0..=16)?,
            dim: u.arbitrary()?,
            tile_mode: u.int_in_range(0..=16)?,
            swizzle: u.arbitrary()?,
            image_size: u.int_in_range(0..=1048576)?,
            mip_size: u.int_in_range(0..=1048576)?,
            mipmap_count: u.int_in_range(0..=16)?,
        })
    }
}

fuzz_target!(|input: Input| {
    let image_data = vec![0u8; input.image_size];
    let mip_data = vec![0u8; input.mip_size];

    // This should never panic even if the input sizes are incorrect.
    let _ = wiiu_swizzle::surface::deswizzle_surface(
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
    );
});
