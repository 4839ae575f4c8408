//! Per format storage information for GX2 surface formats.
//!
//! Only the low 6 bits of a format select the hardware format.
//! The remaining bits encode the number type like sRGB or SNORM,
//! which doesn't affect the memory layout.

/// Describes how the stored elements of a format map to pixels.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ElementMode {
    RoundByHalf = 0,
    RoundTruncate = 1,
    RoundDither = 2,
    Uncompressed = 3,
    /// Each pixel is split into `expand_x` separate elements like R32G32B32.
    Expanded = 4,
    PackedStd = 5,
    PackedRev = 6,
    PackedGbgr = 7,
    PackedBgrg = 8,
    PackedBc1 = 9,
    PackedBc2 = 10,
    PackedBc3 = 11,
    PackedBc4 = 12,
    PackedBc5 = 13,
}

impl ElementMode {
    fn new(value: u8) -> Self {
        match value {
            0 => ElementMode::RoundByHalf,
            1 => ElementMode::RoundTruncate,
            2 => ElementMode::RoundDither,
            4 => ElementMode::Expanded,
            5 => ElementMode::PackedStd,
            6 => ElementMode::PackedRev,
            7 => ElementMode::PackedGbgr,
            8 => ElementMode::PackedBgrg,
            9 => ElementMode::PackedBc1,
            10 => ElementMode::PackedBc2,
            11 => ElementMode::PackedBc3,
            12 => ElementMode::PackedBc4,
            13 => ElementMode::PackedBc5,
            _ => ElementMode::Uncompressed,
        }
    }

    pub fn is_block_compressed(self) -> bool {
        matches!(
            self,
            ElementMode::PackedBc1
                | ElementMode::PackedBc2
                | ElementMode::PackedBc3
                | ElementMode::PackedBc4
                | ElementMode::PackedBc5
        )
    }
}

/// The element size and expansion for a hardware format.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FormatInfo {
    /// The bits per element before applying the element mode.
    pub bpp: u32,
    pub expand_x: u32,
    pub expand_y: u32,
    pub element_mode: ElementMode,
}

// Bits per pixel for each hardware format.
const FORMAT_HW_BPP: [u8; 64] = [
    0x00, 0x08, 0x08, 0x00, 0x00, 0x10, 0x10, 0x10, // 0x00
    0x10, 0x10, 0x10, 0x10, 0x10, 0x20, 0x20, 0x20, // 0x08
    0x20, 0x20, 0x00, 0x20, 0x00, 0x00, 0x20, 0x00, // 0x10
    0x00, 0x20, 0x20, 0x20, 0x40, 0x40, 0x40, 0x40, // 0x18
    0x40, 0x00, 0x80, 0x80, 0x00, 0x00, 0x00, 0x10, // 0x20
    0x10, 0x20, 0x20, 0x20, 0x00, 0x00, 0x00, 0x60, // 0x28
    0x60, 0x40, 0x80, 0x80, 0x40, 0x80, 0x00, 0x00, // 0x30
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0x38
];

// bpp, expand x, expand y, element mode
const FORMAT_EX_INFO: [[u8; 4]; 64] = [
    [0x00, 1, 1, 3],
    [0x08, 1, 1, 3],
    [0x08, 1, 1, 3],
    [0x08, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x10, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x40, 1, 1, 3],
    [0x40, 1, 1, 3],
    [0x40, 1, 1, 3],
    [0x40, 1, 1, 3],
    [0x40, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x80, 1, 1, 3],
    [0x80, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x01, 8, 1, 5],
    [0x01, 8, 1, 6],
    [0x10, 1, 1, 7],
    [0x10, 1, 1, 8],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x20, 1, 1, 3],
    [0x18, 3, 1, 4],
    [0x30, 3, 1, 4],
    [0x30, 3, 1, 4],
    [0x60, 3, 1, 4],
    [0x60, 3, 1, 4],
    [0x40, 4, 4, 9],
    [0x80, 4, 4, 10],
    [0x80, 4, 4, 11],
    [0x40, 4, 4, 12],
    [0x40, 4, 4, 13],
    [0x40, 4, 4, 13],
    [0x40, 4, 4, 13],
    [0x00, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x00, 1, 1, 3],
    [0x40, 1, 1, 3],
    [0x00, 1, 1, 3],
];

/// Returns the bits per pixel of the stored elements for `format`.
/// Unknown formats return `0`.
/**
```rust
use wiiu_swizzle::surface_bits_per_pixel;

// GX2_SURFACE_FORMAT_TCS_R8_G8_B8_A8_UNORM
assert_eq!(32, surface_bits_per_pixel(0x1a));
// GX2_SURFACE_FORMAT_T_BC1_SRGB
assert_eq!(64, surface_bits_per_pixel(0x431));
```
*/
pub fn surface_bits_per_pixel(format: u32) -> u32 {
    FORMAT_HW_BPP[hw_format(format)] as u32
}

/// Returns the element information for `format`.
pub fn format_info(format: u32) -> FormatInfo {
    let [bpp, expand_x, expand_y, element_mode] = FORMAT_EX_INFO[hw_format(format)];
    FormatInfo {
        bpp: bpp as u32,
        expand_x: expand_x as u32,
        expand_y: expand_y as u32,
        element_mode: ElementMode::new(element_mode),
    }
}

/// Returns `true` if `format` is one of the BC1 to BC5 formats with 4x4 pixel blocks.
/**
```rust
use wiiu_swizzle::is_block_compressed;

assert!(is_block_compressed(0x31));
assert!(is_block_compressed(0x235));
assert!(!is_block_compressed(0x1a));
```
*/
pub fn is_block_compressed(format: u32) -> bool {
    (0x31..=0x35).contains(&hw_format(format))
}

pub(crate) fn hw_format(format: u32) -> usize {
    (format & 0x3F) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_per_pixel_common_formats() {
        // R8
        assert_eq!(8, surface_bits_per_pixel(0x1));
        // R5G6B5
        assert_eq!(16, surface_bits_per_pixel(0x8));
        // R10G10B10A2
        assert_eq!(32, surface_bits_per_pixel(0x19));
        // R16G16B16A16
        assert_eq!(64, surface_bits_per_pixel(0x1f));
        // R32G32B32A32
        assert_eq!(128, surface_bits_per_pixel(0x22));
        // BC1 to BC5
        assert_eq!(64, surface_bits_per_pixel(0x31));
        assert_eq!(128, surface_bits_per_pixel(0x32));
        assert_eq!(128, surface_bits_per_pixel(0x33));
        assert_eq!(64, surface_bits_per_pixel(0x34));
        assert_eq!(128, surface_bits_per_pixel(0x35));
    }

    #[test]
    fn bits_per_pixel_ignores_number_type() {
        assert_eq!(surface_bits_per_pixel(0x1a), surface_bits_per_pixel(0x41a));
        assert_eq!(surface_bits_per_pixel(0x34), surface_bits_per_pixel(0x234));
    }

    #[test]
    fn unknown_formats() {
        assert_eq!(0, surface_bits_per_pixel(0x0));
        assert_eq!(0, surface_bits_per_pixel(0x3f));
        assert_eq!(0, format_info(0x0).bpp);
    }

    #[test]
    fn format_info_expanded() {
        // R32G32B32
        assert_eq!(
            FormatInfo {
                bpp: 96,
                expand_x: 3,
                expand_y: 1,
                element_mode: ElementMode::Expanded
            },
            format_info(0x2f)
        );
    }

    #[test]
    fn format_info_bcn() {
        let info = format_info(0x33);
        assert_eq!(128, info.bpp);
        assert_eq!(4, info.expand_x);
        assert_eq!(4, info.expand_y);
        assert_eq!(ElementMode::PackedBc3, info.element_mode);
        assert!(info.element_mode.is_block_compressed());
    }

    #[test]
    fn block_compressed_formats() {
        let formats: Vec<_> = (0..64).filter(|f| is_block_compressed(*f)).collect();
        assert_eq!(vec![0x31, 0x32, 0x33, 0x34, 0x35], formats);
    }
}
