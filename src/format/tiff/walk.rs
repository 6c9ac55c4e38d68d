//! Caller-side directory walking.
//!
//! Nothing in the format guarantees that next-directory links or
//! sub-directory offsets form a tree. Every walk goes through a
//! [`VisitGuard`] that remembers visited offsets and caps the number of
//! steps, so a self-referencing chain ends in an error instead of a loop.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::DecodeLimits;
use crate::error::FormatError;
use crate::io::{ByteCursor, RangeReader};

use super::directory::{parse_directory, Directory};

// =============================================================================
// VisitGuard
// =============================================================================

/// Visited-offset set with a hard step ceiling.
#[derive(Debug, Clone)]
pub struct VisitGuard {
    visited: HashSet<u32>,
    limit: usize,
}

impl VisitGuard {
    pub fn new(limit: usize) -> Self {
        Self {
            visited: HashSet::new(),
            limit,
        }
    }

    pub fn from_limits(limits: &DecodeLimits) -> Self {
        Self::new(limits.max_directories)
    }

    /// Record a visit to `offset`.
    ///
    /// # Errors
    /// - `DirectoryCycle` if the offset was already visited
    /// - `TooManyDirectories` once the step ceiling is reached
    pub fn visit(&mut self, offset: u32) -> Result<(), FormatError> {
        if self.visited.contains(&offset) {
            return Err(FormatError::DirectoryCycle { offset });
        }
        if self.visited.len() >= self.limit {
            return Err(FormatError::TooManyDirectories { limit: self.limit });
        }
        self.visited.insert(offset);
        Ok(())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn has_visited(&self, offset: u32) -> bool {
        self.visited.contains(&offset)
    }
}

// =============================================================================
// Chain Walking
// =============================================================================

/// Result of walking a next-directory chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Directories in chain order.
    pub directories: Vec<Directory>,

    /// Why the walk stopped before reaching a 0 link, if it did.
    pub stopped_by: Option<FormatError>,
}

/// Walk the chain of directories starting at `first_offset`.
///
/// A failure on the first directory is returned as an error. A failure
/// further down ends the walk and is kept in [`Chain::stopped_by`], so the
/// directories read so far stay usable.
pub fn walk_chain<R: RangeReader + ?Sized>(
    cursor: &mut ByteCursor<'_, R>,
    first_offset: u32,
    guard: &mut VisitGuard,
    limits: &DecodeLimits,
) -> Result<Chain, FormatError> {
    let mut directories: Vec<Directory> = Vec::new();
    let mut offset = first_offset;

    while offset != 0 {
        let step = guard
            .visit(offset)
            .and_then(|()| parse_directory(cursor, offset, limits));

        match step {
            Ok(directory) => {
                offset = directory.next_directory_offset;
                directories.push(directory);
            }
            Err(err) if directories.is_empty() => return Err(err),
            Err(err) => {
                warn!(offset, error = %err, "Directory chain stopped early");
                return Ok(Chain {
                    directories,
                    stopped_by: Some(err),
                });
            }
        }
    }

    debug!(count = directories.len(), "Walked directory chain");
    Ok(Chain {
        directories,
        stopped_by: None,
    })
}

/// Parse each directory in `offsets`, collecting failures instead of
/// propagating them.
///
/// Used for optional sub-directory tags: a missing or broken child is
/// reported, not fatal.
pub fn parse_sub_directories<R: RangeReader + ?Sized>(
    cursor: &mut ByteCursor<'_, R>,
    offsets: &[u32],
    guard: &mut VisitGuard,
    limits: &DecodeLimits,
) -> (Vec<Directory>, Vec<FormatError>) {
    let mut directories = Vec::new();
    let mut issues = Vec::new();

    for &offset in offsets {
        if offset == 0 {
            continue;
        }
        match guard
            .visit(offset)
            .and_then(|()| parse_directory(cursor, offset, limits))
        {
            Ok(directory) => directories.push(directory),
            Err(err) => {
                warn!(offset, error = %err, "Skipping sub-directory");
                issues.push(err);
            }
        }
    }

    (directories, issues)
}

// =============================================================================
// Tests
// =============================================================================
