//! Configuration for the ARW reader.
//!
//! Two layers:
//! - [`DecodeLimits`], the only knobs the library itself takes. Every
//!   `count` or `length` field read from a file is checked against them
//!   before anything is allocated.
//! - [`Cli`], the command-line surface of the `arw-reader` binary, parsed
//!   with clap. Limits can also be set from the environment.
//!
//! # Environment Variables
//!
//! - `ARW_MAX_ALLOCATION` - Largest single allocation in bytes (default: 256 MiB)
//! - `ARW_MAX_DIRECTORIES` - Most directories visited per walk (default: 100)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::FormatError;

// =============================================================================
// Default Values
// =============================================================================

/// Default ceiling on a single allocation driven by file contents (256 MiB).
///
/// A 61 MP sensor at 16 bits per sample needs about 120 MiB.
pub const DEFAULT_MAX_ALLOCATION: usize = 256 * 1024 * 1024;

/// Default number of directories a single walk may visit.
pub const DEFAULT_MAX_DIRECTORIES: usize = 100;

// =============================================================================
// DecodeLimits
// =============================================================================

/// Resource ceilings for one decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest buffer a length or count field may make us allocate.
    pub max_allocation: usize,

    /// Step ceiling for directory walks (chain plus sub-directories).
    pub max_directories: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_allocation: DEFAULT_MAX_ALLOCATION,
            max_directories: DEFAULT_MAX_DIRECTORIES,
        }
    }
}

impl DecodeLimits {
    /// Validate the limits and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_allocation == 0 {
            return Err("max_allocation must be greater than 0".to_string());
        }
        if self.max_directories == 0 {
            return Err("max_directories must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Reject an allocation of `requested` bytes above the ceiling.
    pub fn check_allocation(&self, what: &'static str, requested: u64) -> Result<(), FormatError> {
        if requested > self.max_allocation as u64 {
            return Err(FormatError::UnreasonableLength {
                what,
                requested,
                limit: self.max_allocation as u64,
            });
        }
        Ok(())
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// ARW Reader - inspect Sony ARW raw containers.
///
/// Walks the metadata directories, decrypts the SR2 private block and
/// decodes the sensor samples.
#[derive(Parser, Debug, Clone)]
#[command(name = "arw-reader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub limits: LimitArgs,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Limit flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    /// Largest single allocation, in bytes, that file contents may request.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_ALLOCATION, env = "ARW_MAX_ALLOCATION")]
    pub max_allocation: usize,

    /// Most directories visited by a single walk.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DIRECTORIES, env = "ARW_MAX_DIRECTORIES")]
    pub max_directories: usize,
}

impl LimitArgs {
    pub fn to_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_allocation: self.max_allocation,
            max_directories: self.max_directories,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print every record of every directory reachable from the header.
    Dump {
        /// Path to the raw file.
        file: PathBuf,
    },

    /// Print located geometry, exposure, thumbnails and non-fatal issues.
    Info {
        /// Path to the raw file.
        file: PathBuf,

        /// Emit JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Copy the largest embedded JPEG out unchanged.
    Thumbnail {
        /// Path to the raw file.
        file: PathBuf,

        /// Output path for the JPEG bytes.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode the sensor samples and write them as little-endian u16.
    Samples {
        /// Path to the raw file.
        file: PathBuf,

        /// Output path for the sample array.
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Cli {
    /// Decode limits from the global flags.
    pub fn limits(&self) -> DecodeLimits {
        self.limits.to_limits()
    }

    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.limits().validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
