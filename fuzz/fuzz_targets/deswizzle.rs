#![no_main]
use libfuzzer_sys::fuzz_target;

extern crate arbitrary;
use arbitrary::{Arbitrary, Result, Unstructured};

use wiiu_swizzle::{BlockDim, TileMode, TiledSurface};

#[derive(Debug)]
struct Input {
    surface: TiledSurface,
    input_size: usize,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let tile_mode: TileMode = u.arbitrary()?;
        Ok(Input {
            surface: TiledSurface {
                width: u.int_in_range(0..=1024)?,
                height: u.int_in_range(0..=1024)?,
                block_dim: u.arbitrary::<BlockDim>()?,
                tile_mode,
                swizzle: u.arbitrary()?,
                pitch: u.int_in_range(0..=2048)?,
                surface_height: u.int_in_range(0..=2048)?,
                num_slices: u.int_in_range(0..=16)?,
                bpp: u.int_in_range(0..=256)?,
                num_samples: u.int_in_range(0..=8)?,
                slice: u.int_in_range(0..=16)?,
                sample: u.int_in_range(0..=8)?,
                is_depth: u.arbitrary()?,
            },
            input_size: u.int_in_range(0..=16777216)?,
        })
    }
}

fuzz_target!(|input: Input| {
    let swizzled = vec![0u8; input.input_size];

    // This should never panic even if the input size is incorrect.
    let _ = wiiu_swizzle::deswizzle(&input.surface, &swizzled);
});
