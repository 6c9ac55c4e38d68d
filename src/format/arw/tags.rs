//! Vendor tag IDs.
//!
//! These appear in the raw image directory, in the private directory that
//! `DNGPrivateData` points at, and in the decrypted SR2 directory.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SonyTag {
    // -------------------------------------------------------------------------
    // Root Directory
    // -------------------------------------------------------------------------
    /// Offset of the vendor private directory
    DngPrivateData = 0xC634,

    // -------------------------------------------------------------------------
    // Raw Image Directory
    // -------------------------------------------------------------------------
    /// 0 = uncompressed 14-bit, 1 = uncompressed 12-bit,
    /// 2 = compressed RAW, 3 = lossless compressed RAW
    SonyRawFileType = 0x7000,

    /// Four tone curve control points
    SonyToneCurve = 0x7010,

    // -------------------------------------------------------------------------
    // Private Directory
    // -------------------------------------------------------------------------
    /// Absolute offset of the encrypted SR2 region
    Sr2SubIfdOffset = 0x7200,

    /// Length of the encrypted SR2 region
    Sr2SubIfdLength = 0x7201,

    /// Raw cipher key for the SR2 region
    Sr2SubIfdKey = 0x7221,

    /// Offset of the IDC directory
    IdcIfd = 0x7240,

    /// Offset of the second IDC directory
    Idc2Ifd = 0x7241,

    /// Offset of the embedded MRW block
    MrwInfo = 0x7250,

    // -------------------------------------------------------------------------
    // SR2 Directory
    // -------------------------------------------------------------------------
    BlackLevel = 0x7300,
    WbGrbgLevelsAuto = 0x7302,
    WbGrbgLevels = 0x7303,
    BlackLevel2 = 0x7310,
    WbRggbLevelsAuto = 0x7312,
    WbRggbLevels = 0x7313,
}

impl SonyTag {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0xC634 => Some(SonyTag::DngPrivateData),
            0x7000 => Some(SonyTag::SonyRawFileType),
            0x7010 => Some(SonyTag::SonyToneCurve),
            0x7200 => Some(SonyTag::Sr2SubIfdOffset),
            0x7201 => Some(SonyTag::Sr2SubIfdLength),
            0x7221 => Some(SonyTag::Sr2SubIfdKey),
            0x7240 => Some(SonyTag::IdcIfd),
            0x7241 => Some(SonyTag::Idc2Ifd),
            0x7250 => Some(SonyTag::MrwInfo),
            0x7300 => Some(SonyTag::BlackLevel),
            0x7302 => Some(SonyTag::WbGrbgLevelsAuto),
            0x7303 => Some(SonyTag::WbGrbgLevels),
            0x7310 => Some(SonyTag::BlackLevel2),
            0x7312 => Some(SonyTag::WbRggbLevelsAuto),
            0x7313 => Some(SonyTag::WbRggbLevels),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Tag name as printed by `dump`.
    pub const fn name(self) -> &'static str {
        match self {
            SonyTag::DngPrivateData => "DNGPrivateData",
            SonyTag::SonyRawFileType => "SonyRawFileType",
            SonyTag::SonyToneCurve => "SonyToneCurve",
            SonyTag::Sr2SubIfdOffset => "SR2SubIFDOffset",
            SonyTag::Sr2SubIfdLength => "SR2SubIFDLength",
            SonyTag::Sr2SubIfdKey => "SR2SubIFDKey",
            SonyTag::IdcIfd => "IDC_IFD",
            SonyTag::Idc2Ifd => "IDC2_IFD",
            SonyTag::MrwInfo => "MRWInfo",
            SonyTag::BlackLevel => "BlackLevel",
            SonyTag::WbGrbgLevelsAuto => "WB_GRBGLevelsAuto",
            SonyTag::WbGrbgLevels => "WB_GRBGLevels",
            SonyTag::BlackLevel2 => "BlackLevel2",
            SonyTag::WbRggbLevelsAuto => "WB_RGGBLevelsAuto",
            SonyTag::WbRggbLevels => "WB_RGGBLevels",
        }
    }
}
