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
    aa: u32,
    level: u32,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(Input {
            format: u.arbitrary()?,
            width: u.arbitrary()?,
            height: u.arbitrary()?,
            depth: u.int_in_range(0..=1024)?,
            dim: u.arbitrary()?,
            tile_mode: u.int_in_range(0..=20)?,
            aa: u.int_in_range(0..=4)?,
            level: u.int_in_range(0..=40)?,
        })
    }
}

fuzz_target!(|input: Input| {
    // This should never panic even for invalid formats or dimensions.
    if let Ok(layout) = wiiu_swizzle::get_surface_info(
        input.format,
        input.width,
        input.height,
        input.depth,
        input.dim,
        input.tile_mode,
        input.aa,
        input.level,
    ) {
        if layout.pitch_align != 0 && layout.pitch % layout.pitch_align != 0 {
            panic!("Pitch is not aligned");
        }
    }
});
