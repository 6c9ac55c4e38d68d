//! Container parsers.
//!
//! - [`tiff`]: header, typed directories and guarded directory walks
//! - [`arw`]: Sony vendor tags, SR2 decryption and sample decoding
//! - [`detect`]: classification of a parsed root directory

pub mod arw;
pub mod detect;
pub mod tiff;

pub use detect::{detect_container, is_tiff_header, probe, ContainerKind};
