//! Output types handed to rendering and thumbnail consumers.
//!
//! Every field is optional: a tag that cannot be found is reported as
//! absent and the consumer decides whether that matters.

use serde::Serialize;

/// Last control point of the tone curve, implied by the format.
pub const TONE_CURVE_END: u16 = 0x3FFF;

/// Geometry and calibration of the sensor samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawSampleGeometry {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bit_depth: Option<u16>,
    pub compression: Option<u16>,

    /// `SonyRawFileType` as stored.
    pub raw_file_type: Option<u16>,

    pub strip_offset: Option<u32>,
    pub strip_length: Option<u32>,
    pub rows_per_strip: Option<u32>,

    /// Per-channel black level, RGGB order.
    pub black_level: Option<[u16; 4]>,

    /// Per-channel white balance multipliers, RGGB order.
    pub white_balance: Option<[i16; 4]>,

    pub cfa_pattern: Option<CfaPattern>,

    /// Four stored control points followed by [`TONE_CURVE_END`].
    pub tone_curve: Option<[u16; 5]>,

    /// `DefaultCropSize` as (width, height).
    pub crop_size: Option<[u32; 2]>,
}

impl RawSampleGeometry {
    /// Number of sensor sites, if both dimensions are known.
    pub fn sample_count(&self) -> Option<u64> {
        Some(self.width? as u64 * self.height? as u64)
    }
}

/// Color filter array layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CfaPattern {
    /// Repeat tile size as (rows, columns).
    pub dimensions: [u16; 2],

    /// One color index per tile site, row-major: 0 = red, 1 = green,
    /// 2 = blue.
    pub colors: Vec<u8>,
}

impl CfaPattern {
    /// Pattern written as color letters, e.g. "RGGB".
    pub fn describe(&self) -> String {
        self.colors
            .iter()
            .map(|c| match c {
                0 => 'R',
                1 => 'G',
                2 => 'B',
                3 => 'C',
                4 => 'M',
                5 => 'Y',
                6 => 'W',
                _ => '?',
            })
            .collect()
    }
}

/// Capture metadata from the root and Exif directories.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExposureInfo {
    pub make: Option<String>,
    pub model: Option<String>,
    pub software: Option<String>,
    pub orientation: Option<u16>,
    pub date_time: Option<String>,
    pub date_time_original: Option<String>,
    pub lens_model: Option<String>,

    /// Seconds, as an unreduced rational.
    pub exposure_time: Option<(u32, u32)>,
    pub f_number: Option<(u32, u32)>,
    pub focal_length: Option<(u32, u32)>,
    pub iso: Option<u32>,
}

impl ExposureInfo {
    /// Exposure time formatted the way cameras show it ("1/250", "2.5").
    pub fn shutter_speed(&self) -> Option<String> {
        let (n, d) = self.exposure_time?;
        if n == 0 || d == 0 {
            return None;
        }
        if n < d && d % n == 0 {
            Some(format!("1/{}", d / n))
        } else {
            Some(format!("{}", n as f64 / d as f64))
        }
    }

    pub fn aperture(&self) -> Option<f64> {
        ratio(self.f_number?)
    }

    pub fn focal_length_mm(&self) -> Option<f64> {
        ratio(self.focal_length?)
    }
}

fn ratio((n, d): (u32, u32)) -> Option<f64> {
    (d != 0).then(|| n as f64 / d as f64)
}

/// Byte range of an embedded JPEG stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThumbnailLocation {
    /// Position of the owning directory in the chain.
    pub directory_index: usize,
    pub offset: u32,
    pub length: u32,
}
