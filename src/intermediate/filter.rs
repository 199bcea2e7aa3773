/// Filter method written in IHDR. See https://www.w3.org/TR/png-3/#9Filter-types
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterMethod {
    /// Adaptive filtering with the five basic filter types. The only method
    /// the standard defines.
    #[default]
    Zero = 0,
}

impl TryFrom<u8> for FilterMethod {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            _ => Err("Unknown filter method"),
        }
    }
}

/// Per-scanline filter type byte. Scanlines are always written with `None`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterKind {
    #[default]
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl TryFrom<u8> for FilterKind {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Sub),
            2 => Ok(Self::Up),
            3 => Ok(Self::Average),
            4 => Ok(Self::Paeth),
            _ => Err("Unknown filter type"),
        }
    }
}
