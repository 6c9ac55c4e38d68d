//! Asset locator: the one place that knows which tags mean what.
//!
//! Starting from the header it walks the directory chain, follows
//! `SubIFDs`, `ExifTag`, `GPSTag` and `DNGPrivateData`, decrypts the SR2
//! region when its key material is present and folds everything into
//! [`LocatedAssets`].
//!
//! Only a broken first directory is fatal. Everything reached through an
//! optional tag degrades to an absent field plus an entry in
//! [`LocatedAssets::issues`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DecodeLimits;
use crate::error::FormatError;
use crate::format::detect::{detect_container, ContainerKind};
use crate::format::tiff::{
    parse_directory, parse_sub_directories, walk_chain, Compression, DecodedValue, Directory,
    FileHeader, TiffTag, VisitGuard,
};
use crate::io::{ByteCursor, MemoryReader, RangeReader, RelocatedReader};

use super::cipher::{self, CipherKeyMaterial};
use super::codec::CodecVariant;
use super::geometry::{CfaPattern, ExposureInfo, RawSampleGeometry, ThumbnailLocation, TONE_CURVE_END};
use super::tags::SonyTag;

// =============================================================================
// LocatedAssets
// =============================================================================

/// Everything the locator found in one file.
#[derive(Debug, Clone)]
pub struct LocatedAssets {
    pub kind: ContainerKind,

    /// Directories of the main chain, IFD0 first.
    pub chain: Vec<Directory>,

    /// Children of IFD0's `SubIFDs`.
    pub sub_directories: Vec<Directory>,

    /// Index into `sub_directories` of the directory holding the sensor
    /// data, or `None` when the raw data lives in the chain itself.
    pub raw_directory: Option<RawDirectory>,

    pub exif: Option<Directory>,
    pub gps: Option<Directory>,

    /// Directory that `DNGPrivateData` points at.
    pub private: Option<Directory>,

    /// IDC, IDC2 and MRW directories found under the private directory.
    pub vendor_directories: Vec<(SonyTag, Directory)>,

    /// Decrypted SR2 directory.
    pub sr2: Option<Directory>,

    pub geometry: RawSampleGeometry,
    pub exposure: ExposureInfo,
    pub thumbnails: Vec<ThumbnailLocation>,
    pub codec: Option<CodecVariant>,

    /// Non-fatal problems met on the way.
    pub issues: Vec<FormatError>,
}

/// Where the raw image directory was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDirectory {
    SubDirectory(usize),
    Chain(usize),
}

impl LocatedAssets {
    /// The directory holding the sensor data.
    pub fn raw(&self) -> Option<&Directory> {
        match self.raw_directory? {
            RawDirectory::SubDirectory(i) => self.sub_directories.get(i),
            RawDirectory::Chain(i) => self.chain.get(i),
        }
    }

    pub fn root(&self) -> Option<&Directory> {
        self.chain.first()
    }

    /// Largest embedded JPEG.
    pub fn largest_thumbnail(&self) -> Option<&ThumbnailLocation> {
        self.thumbnails.iter().max_by_key(|t| t.length)
    }

    /// Every directory with a label, in discovery order.
    pub fn labelled_directories(&self) -> Vec<(String, &Directory)> {
        let mut out: Vec<(String, &Directory)> = Vec::new();
        for (i, dir) in self.chain.iter().enumerate() {
            out.push((format!("IFD{}", i), dir));
        }
        for (i, dir) in self.sub_directories.iter().enumerate() {
            out.push((format!("SubIFD{}", i), dir));
        }
        if let Some(dir) = &self.exif {
            out.push(("Exif".to_string(), dir));
        }
        if let Some(dir) = &self.gps {
            out.push(("GPS".to_string(), dir));
        }
        if let Some(dir) = &self.private {
            out.push(("DNGPrivateData".to_string(), dir));
        }
        for (tag, dir) in &self.vendor_directories {
            out.push((tag.name().to_string(), dir));
        }
        if let Some(dir) = &self.sr2 {
            out.push(("SR2".to_string(), dir));
        }
        out
    }

    /// Serializable summary for reports.
    pub fn report(&self) -> AssetReport {
        AssetReport {
            kind: self.kind,
            codec: self.codec.map(CodecVariant::name),
            geometry: self.geometry.clone(),
            exposure: self.exposure.clone(),
            thumbnails: self.thumbnails.clone(),
            sr2_decrypted: self.sr2.is_some(),
            issues: self.issues.iter().map(ToString::to_string).collect(),
        }
    }
}

/// JSON-friendly view of [`LocatedAssets`].
#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    pub kind: ContainerKind,
    pub codec: Option<String>,
    pub geometry: RawSampleGeometry,
    pub exposure: ExposureInfo,
    pub thumbnails: Vec<ThumbnailLocation>,
    pub sr2_decrypted: bool,
    pub issues: Vec<String>,
}

// =============================================================================
// Locate
// =============================================================================

/// Locate geometry, exposure, thumbnails and SR2 data.
///
/// # Errors
/// Only when the first directory cannot be read, or when a length field
/// exceeds `limits`.
pub fn locate<R: RangeReader + ?Sized>(
    reader: &R,
    header: &FileHeader,
    limits: &DecodeLimits,
) -> Result<LocatedAssets, FormatError> {
    let mut cursor = ByteCursor::new(reader, header.byte_order);
    let mut guard = VisitGuard::from_limits(limits);
    let mut issues = Vec::new();

    let chain = walk_chain(&mut cursor, header.first_directory_offset, &mut guard, limits)?;
    issues.extend(chain.stopped_by);
    let chain = chain.directories;
    let root = chain.first().ok_or(FormatError::MissingTag("IFD0"))?;

    let kind = detect_container(root);
    debug!(kind = kind.name(), directories = chain.len(), "Walked main chain");

    // Optional children of IFD0
    let mut follow = |tag: u16, issues: &mut Vec<FormatError>, guard: &mut VisitGuard| {
        let offsets = root.offsets_value(tag);
        let (dirs, errors) = parse_sub_directories(&mut cursor, &offsets, guard, limits);
        issues.extend(errors);
        dirs
    };

    let sub_directories = follow(TiffTag::SubIfds.as_u16(), &mut issues, &mut guard);
    let exif = follow(TiffTag::ExifIfd.as_u16(), &mut issues, &mut guard)
        .into_iter()
        .next();
    let gps = follow(TiffTag::GpsIfd.as_u16(), &mut issues, &mut guard)
        .into_iter()
        .next();
    let private = follow(SonyTag::DngPrivateData.as_u16(), &mut issues, &mut guard)
        .into_iter()
        .next();

    let mut vendor_directories = Vec::new();
    if let Some(private) = &private {
        for tag in [SonyTag::IdcIfd, SonyTag::Idc2Ifd, SonyTag::MrwInfo] {
            let offsets = private.offsets_value(tag.as_u16());
            let (dirs, errors) = parse_sub_directories(&mut cursor, &offsets, &mut guard, limits);
            issues.extend(errors);
            vendor_directories.extend(dirs.into_iter().map(|d| (tag, d)));
        }
    }

    let sr2 = match private.as_ref().and_then(key_material) {
        Some(material) => decrypt_sr2(reader, header, &material, limits, &mut issues)?,
        None => None,
    };

    let raw_directory = select_raw_directory(&sub_directories, &chain);
    let raw = match raw_directory {
        Some(RawDirectory::SubDirectory(i)) => sub_directories.get(i),
        Some(RawDirectory::Chain(i)) => chain.get(i),
        None => None,
    };

    let mut geometry = raw.map(raw_geometry).unwrap_or_default();
    if let Some(sr2) = &sr2 {
        apply_sr2_overrides(&mut geometry, sr2);
    }

    let codec = raw.map(|_| {
        CodecVariant::infer(
            geometry.raw_file_type,
            geometry.compression,
            geometry.bit_depth,
        )
    });

    let exposure = exposure_info(root, exif.as_ref());
    let thumbnails = thumbnails(&chain, reader.size(), &mut issues);

    if raw.is_none() {
        warn!("No raw image directory found");
    }
    info!(
        width = ?geometry.width,
        height = ?geometry.height,
        codec = ?codec.map(CodecVariant::name),
        sr2 = sr2.is_some(),
        "Located raw assets"
    );

    let mut assets = LocatedAssets {
        kind,
        chain,
        sub_directories,
        raw_directory,
        exif,
        gps,
        private,
        vendor_directories,
        sr2,
        geometry,
        exposure,
        thumbnails,
        codec,
        issues,
    };

    let unknown: Vec<FormatError> = assets
        .labelled_directories()
        .into_iter()
        .flat_map(|(_, dir)| dir.unknown_field_types())
        .collect();
    assets.issues.extend(unknown);
    Ok(assets)
}

// =============================================================================
// SR2
// =============================================================================

/// Offset, length and key from the private directory, if all three exist.
pub fn key_material(private: &Directory) -> Option<CipherKeyMaterial> {
    let offset = private.u32_value(SonyTag::Sr2SubIfdOffset.as_u16())?;
    let length = private.u32_value(SonyTag::Sr2SubIfdLength.as_u16())?;
    let raw_key = *private
        .offsets_value(SonyTag::Sr2SubIfdKey.as_u16())
        .first()?;
    Some(CipherKeyMaterial {
        offset,
        length,
        raw_key,
    })
}

/// Decrypt the SR2 region and parse it as a directory.
///
/// The decrypted bytes are served at their original absolute offsets, so
/// out-of-line values inside the region resolve as they would in the file.
/// A region that does not parse, or parses to an empty directory, is
/// reported as `CipherIntegrityFailure`.
pub fn decrypt_sr2<R: RangeReader + ?Sized>(
    reader: &R,
    header: &FileHeader,
    material: &CipherKeyMaterial,
    limits: &DecodeLimits,
    issues: &mut Vec<FormatError>,
) -> Result<Option<Directory>, FormatError> {
    limits.check_allocation("SR2 region", material.length as u64)?;

    if !material.end().is_some_and(|end| end <= reader.size()) {
        let err = FormatError::TruncatedRead {
            offset: material.offset as u64,
            requested: material.length as u64,
            available: reader.size().saturating_sub(material.offset as u64),
        };
        warn!(error = %err, "SR2 region outside file");
        issues.push(err);
        return Ok(None);
    }

    let ciphertext = reader.read_exact_at(material.offset as u64, material.length as usize)?;

    let plain = cipher::decrypt(&ciphertext, material.derived_key());
    let region = RelocatedReader::new(MemoryReader::new(plain, "sr2"), material.offset as u64);
    let mut cursor = ByteCursor::new(&region, header.byte_order);

    match parse_directory(&mut cursor, material.offset, limits) {
        Ok(dir) if dir.is_empty() => {
            warn!("SR2 region decrypted to an empty directory");
            issues.push(FormatError::CipherIntegrityFailure {
                reason: "decrypted directory has no records".to_string(),
            });
            Ok(None)
        }
        Ok(dir) => {
            debug!(records = dir.len(), "Decrypted SR2 directory");
            Ok(Some(dir))
        }
        Err(err) => {
            warn!(error = %err, "SR2 region failed to parse after decryption");
            issues.push(FormatError::CipherIntegrityFailure {
                reason: err.to_string(),
            });
            Ok(None)
        }
    }
}

fn apply_sr2_overrides(geometry: &mut RawSampleGeometry, sr2: &Directory) {
    let black = sr2
        .value(SonyTag::BlackLevel2.as_u16())
        .or_else(|| sr2.value(SonyTag::BlackLevel.as_u16()))
        .and_then(four_levels);
    if let Some(levels) = black {
        geometry.black_level = Some(levels.map(|v| v as u16));
    }

    if let Some(levels) = sr2
        .value(SonyTag::WbRggbLevels.as_u16())
        .and_then(four_levels)
    {
        geometry.white_balance = Some(levels.map(|v| v as i16));
    } else if let Some(levels) = sr2
        .value(SonyTag::WbGrbgLevels.as_u16())
        .and_then(four_levels)
    {
        geometry.white_balance = Some([levels[1], levels[0], levels[3], levels[2]].map(|v| v as i16));
    }
}

// =============================================================================
// Raw Directory
// =============================================================================

/// Pick the directory holding the sensor data.
///
/// Candidates carry `SonyRawFileType`, or a strip with raw compression
/// (none or vendor-packed). Among them the largest image wins; sub-directories
/// are preferred over the chain.
fn select_raw_directory(sub_directories: &[Directory], chain: &[Directory]) -> Option<RawDirectory> {
    fn is_raw(dir: &Directory) -> bool {
        let raw_compression = matches!(
            dir.u32_value(TiffTag::Compression.as_u16())
                .and_then(|c| Compression::from_u16(c as u16)),
            Some(Compression::None | Compression::SonyArw)
        );
        dir.contains(SonyTag::SonyRawFileType.as_u16())
            || (raw_compression && dir.contains(TiffTag::StripOffsets.as_u16()))
    }

    fn area(dir: &Directory) -> u64 {
        let w = dir.u32_value(TiffTag::ImageWidth.as_u16()).unwrap_or(0) as u64;
        let h = dir.u32_value(TiffTag::ImageLength.as_u16()).unwrap_or(0) as u64;
        w * h
    }

    let best_sub = sub_directories
        .iter()
        .enumerate()
        .filter(|(_, d)| is_raw(d))
        .max_by_key(|(_, d)| area(d))
        .map(|(i, _)| RawDirectory::SubDirectory(i));

    best_sub.or_else(|| {
        chain
            .iter()
            .enumerate()
            .filter(|(_, d)| is_raw(d))
            .max_by_key(|(_, d)| area(d))
            .map(|(i, _)| RawDirectory::Chain(i))
    })
}

fn raw_geometry(raw: &Directory) -> RawSampleGeometry {
    let u32_of = |tag: TiffTag| raw.u32_value(tag.as_u16());
    let u16_of = |tag: u16| raw.u32_value(tag).map(|v| v as u16);

    let tone_curve = raw
        .value(SonyTag::SonyToneCurve.as_u16())
        .and_then(DecodedValue::to_u32_vec)
        .filter(|points| points.len() >= 4)
        .map(|p| [p[0] as u16, p[1] as u16, p[2] as u16, p[3] as u16, TONE_CURVE_END]);

    let cfa_pattern = raw
        .value(TiffTag::CfaRepeatPatternDim.as_u16())
        .and_then(DecodedValue::to_u32_vec)
        .filter(|dims| dims.len() == 2)
        .and_then(|dims| {
            let colors = raw.value(TiffTag::CfaPattern2.as_u16())?.as_bytes()?.to_vec();
            (colors.len() == dims[0] as usize * dims[1] as usize).then(|| CfaPattern {
                dimensions: [dims[0] as u16, dims[1] as u16],
                colors,
            })
        });

    let crop_size = raw
        .value(TiffTag::DefaultCropSize.as_u16())
        .and_then(DecodedValue::to_u32_vec)
        .filter(|v| v.len() == 2)
        .map(|v| [v[0], v[1]]);

    RawSampleGeometry {
        width: u32_of(TiffTag::ImageWidth),
        height: u32_of(TiffTag::ImageLength),
        bit_depth: u16_of(TiffTag::BitsPerSample.as_u16()),
        compression: u16_of(TiffTag::Compression.as_u16()),
        raw_file_type: u16_of(SonyTag::SonyRawFileType.as_u16()),
        strip_offset: u32_of(TiffTag::StripOffsets),
        strip_length: u32_of(TiffTag::StripByteCounts),
        rows_per_strip: u32_of(TiffTag::RowsPerStrip),
        black_level: raw
            .value(SonyTag::BlackLevel2.as_u16())
            .and_then(four_levels)
            .map(|l| l.map(|v| v as u16)),
        white_balance: raw
            .value(SonyTag::WbRggbLevels.as_u16())
            .and_then(four_levels)
            .map(|l| l.map(|v| v as i16)),
        cfa_pattern,
        tone_curve,
        crop_size,
    }
}

/// Four per-channel levels; a single value applies to every channel.
fn four_levels(value: &DecodedValue) -> Option<[i64; 4]> {
    let v = value.to_i64_vec()?;
    match v.len() {
        0 => None,
        1..=3 => Some([v[0]; 4]),
        _ => Some([v[0], v[1], v[2], v[3]]),
    }
}

// =============================================================================
// Exposure and Thumbnails
// =============================================================================

fn exposure_info(root: &Directory, exif: Option<&Directory>) -> ExposureInfo {
    let text = |dir: Option<&Directory>, tag: TiffTag| dir.and_then(|d| d.string_value(tag.as_u16()));
    let rational = |tag: TiffTag| {
        exif.and_then(|d| d.value(tag.as_u16()))
            .and_then(DecodedValue::as_rational)
    };

    ExposureInfo {
        make: text(Some(root), TiffTag::Make),
        model: text(Some(root), TiffTag::Model),
        software: text(Some(root), TiffTag::Software),
        orientation: root
            .u32_value(TiffTag::Orientation.as_u16())
            .map(|v| v as u16),
        date_time: text(Some(root), TiffTag::DateTime),
        date_time_original: text(exif, TiffTag::DateTimeOriginal),
        lens_model: text(exif, TiffTag::LensModel),
        exposure_time: rational(TiffTag::ExposureTime),
        f_number: rational(TiffTag::FNumber),
        focal_length: rational(TiffTag::FocalLength),
        iso: exif.and_then(|d| d.u32_value(TiffTag::IsoSpeedRatings.as_u16())),
    }
}

fn thumbnails(chain: &[Directory], file_size: u64, issues: &mut Vec<FormatError>) -> Vec<ThumbnailLocation> {
    let mut out = Vec::new();
    for (i, dir) in chain.iter().enumerate() {
        let offset = dir.u32_value(TiffTag::JpegInterchangeFormat.as_u16());
        let length = dir.u32_value(TiffTag::JpegInterchangeFormatLength.as_u16());
        let (Some(offset), Some(length)) = (offset, length) else {
            continue;
        };
        if length == 0 || offset as u64 + length as u64 > file_size {
            issues.push(FormatError::InvalidTagValue {
                tag: "JPEGInterchangeFormat",
                message: format!(
                    "IFD{} thumbnail {}+{} outside file of {} bytes",
                    i, offset, length, file_size
                ),
            });
            continue;
        }
        out.push(ThumbnailLocation {
            directory_index: i,
            offset,
            length,
        });
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
