use crate::hwl::HwConfig;

/// The hardware tiling modes for surfaces.
///
/// The discriminants match the address library numbering rather than GX2.
/// GX2 uses the same values except that `16` selects [TileMode::LinearGeneral]
/// through a special flat path. See [TileMode::from_gx2].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum TileMode {
    LinearGeneral = 0,
    LinearAligned = 1,
    Tiled1DThin1 = 2,
    Tiled1DThick = 3,
    Tiled2DThin1 = 4,
    Tiled2DThin2 = 5,
    Tiled2DThin4 = 6,
    Tiled2DThick = 7,
    Tiled2BThin1 = 8,
    Tiled2BThin2 = 9,
    Tiled2BThin4 = 10,
    Tiled2BThick = 11,
    Tiled3DThin1 = 12,
    Tiled3DThick = 13,
    Tiled3BThin1 = 14,
    Tiled3BThick = 15,
    Tiled2DXThick = 16,
    Tiled3DXThick = 17,
}

impl TileMode {
    /// Attempts to construct a tile mode from its address library value.
    /// Returns [None] if `value` is not a known tile mode.
    /**
    ```rust
    use wiiu_swizzle::TileMode;

    assert_eq!(Some(TileMode::Tiled2DThin1), TileMode::new(4));
    assert_eq!(None, TileMode::new(18));
    ```
    */
    pub fn new(value: u32) -> Option<Self> {
        match value {
            0 => Some(TileMode::LinearGeneral),
            1 => Some(TileMode::LinearAligned),
            2 => Some(TileMode::Tiled1DThin1),
            3 => Some(TileMode::Tiled1DThick),
            4 => Some(TileMode::Tiled2DThin1),
            5 => Some(TileMode::Tiled2DThin2),
            6 => Some(TileMode::Tiled2DThin4),
            7 => Some(TileMode::Tiled2DThick),
            8 => Some(TileMode::Tiled2BThin1),
            9 => Some(TileMode::Tiled2BThin2),
            10 => Some(TileMode::Tiled2BThin4),
            11 => Some(TileMode::Tiled2BThick),
            12 => Some(TileMode::Tiled3DThin1),
            13 => Some(TileMode::Tiled3DThick),
            14 => Some(TileMode::Tiled3BThin1),
            15 => Some(TileMode::Tiled3BThick),
            16 => Some(TileMode::Tiled2DXThick),
            17 => Some(TileMode::Tiled3DXThick),
            _ => None,
        }
    }

    /// Converts a GX2 tile mode to the address library tile mode.
    /// GX2 uses `16` for linear special surfaces, which are addressed like [TileMode::LinearGeneral].
    /// The default GX2 mode `0` has no fixed layout, so it returns [None] like any other unknown value.
    /// Use [crate::default_tile_mode] to pick a concrete mode instead.
    pub fn from_gx2(value: u32) -> Option<Self> {
        match value {
            0 => None,
            16 => Some(TileMode::LinearGeneral),
            v if v < 16 => Self::new(v),
            _ => None,
        }
    }

    /// The number of slices stored together in a single micro tile.
    pub fn thickness(self) -> u32 {
        match self {
            TileMode::Tiled1DThick
            | TileMode::Tiled2DThick
            | TileMode::Tiled2BThick
            | TileMode::Tiled3DThick
            | TileMode::Tiled3BThick => 4,
            TileMode::Tiled2DXThick | TileMode::Tiled3DXThick => 8,
            _ => 1,
        }
    }

    pub fn is_linear(self) -> bool {
        matches!(self, TileMode::LinearGeneral | TileMode::LinearAligned)
    }

    pub fn is_micro_tiled(self) -> bool {
        matches!(self, TileMode::Tiled1DThin1 | TileMode::Tiled1DThick)
    }

    pub fn is_macro_tiled(self) -> bool {
        !self.is_linear() && !self.is_micro_tiled()
    }

    /// Returns `true` for the 4 slice thick macro tiled modes.
    /// The 8 slice modes are intentionally excluded to match the hardware tables.
    pub fn is_thick_macro_tiled(self) -> bool {
        matches!(
            self,
            TileMode::Tiled2DThick
                | TileMode::Tiled2BThick
                | TileMode::Tiled3DThick
                | TileMode::Tiled3BThick
        )
    }

    pub fn is_bank_swapped(self) -> bool {
        matches!(
            self,
            TileMode::Tiled2BThin1
                | TileMode::Tiled2BThin2
                | TileMode::Tiled2BThin4
                | TileMode::Tiled2BThick
                | TileMode::Tiled3BThin1
                | TileMode::Tiled3BThick
        )
    }

    /// The ratio between the macro tile's height and its default height.
    pub fn aspect_ratio(self) -> u32 {
        match self {
            TileMode::Tiled2DThin2 | TileMode::Tiled2BThin2 => 2,
            TileMode::Tiled2DThin4 | TileMode::Tiled2BThin4 => 4,
            _ => 1,
        }
    }

    /// The bank and pipe rotation applied for each slice.
    pub fn rotation(self, config: &HwConfig) -> u32 {
        match self {
            TileMode::Tiled2DThin1
            | TileMode::Tiled2DThin2
            | TileMode::Tiled2DThin4
            | TileMode::Tiled2DThick
            | TileMode::Tiled2BThin1
            | TileMode::Tiled2BThin2
            | TileMode::Tiled2BThin4
            | TileMode::Tiled2BThick => config.num_pipes * ((config.num_banks >> 1) - 1),
            TileMode::Tiled3DThin1
            | TileMode::Tiled3DThick
            | TileMode::Tiled3BThin1
            | TileMode::Tiled3BThick => 1,
            _ => 0,
        }
    }

    /// The equivalent mode without bank swapping.
    pub fn to_non_bank_swapped(self) -> Self {
        match self {
            TileMode::Tiled2BThin1 => TileMode::Tiled2DThin1,
            TileMode::Tiled2BThin2 => TileMode::Tiled2DThin2,
            TileMode::Tiled2BThin4 => TileMode::Tiled2DThin4,
            TileMode::Tiled2BThick => TileMode::Tiled2DThick,
            TileMode::Tiled3BThin1 => TileMode::Tiled3DThin1,
            TileMode::Tiled3BThick => TileMode::Tiled3DThick,
            mode => mode,
        }
    }
}
