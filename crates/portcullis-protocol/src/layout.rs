//! Packaging layout of the installed application.
//!
//! The layout is fixed when the crate is built (`nested-layout` feature), not
//! guessed from the executable's install path at runtime.

use crate::error::ProtocolError;
use std::path::{Path, PathBuf};

/// Directory holding the packaged web content, relative to the install root.
pub const OUTPUT_DIR: &str = "dist";

/// File name of the capability bridge script.
pub const BRIDGE_FILE: &str = "preload.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingLayout {
    /// Executable sits directly in the install root.
    Flat,
    /// Executable sits one directory below the install root.
    Nested,
}

#[cfg(feature = "nested-layout")]
pub const PACKAGING_LAYOUT: PackagingLayout = PackagingLayout::Nested;

#[cfg(not(feature = "nested-layout"))]
pub const PACKAGING_LAYOUT: PackagingLayout = PackagingLayout::Flat;

impl PackagingLayout {
    /// Install root for an executable living in `exe_dir`.
    pub fn install_root(self, exe_dir: &Path) -> PathBuf {
        match self {
            Self::Flat => exe_dir.to_path_buf(),
            Self::Nested => exe_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| exe_dir.to_path_buf()),
        }
    }

    /// Packaged output root for an executable living in `exe_dir`.
    pub fn output_root(self, exe_dir: &Path) -> PathBuf {
        self.install_root(exe_dir).join(OUTPUT_DIR)
    }
}

/// Output root of the running executable under [`PACKAGING_LAYOUT`].
pub fn default_output_root() -> Result<PathBuf, ProtocolError> {
    let exe = std::env::current_exe()?;
    let exe_dir = exe
        .parent()
        .ok_or_else(|| ProtocolError::NotFound(format!("parent of {}", exe.display())))?;
    Ok(PACKAGING_LAYOUT.output_root(exe_dir))
}

/// Where the capability bridge may live, in lookup order.
pub fn bridge_candidates(output_root: &Path) -> [PathBuf; 2] {
    [
        output_root.join(BRIDGE_FILE),
        output_root.join("bridge").join(BRIDGE_FILE),
    ]
}

/// First existing bridge script, if any.
pub fn locate_bridge(output_root: &Path) -> Option<PathBuf> {
    bridge_candidates(output_root)
        .into_iter()
        .find(|candidate| candidate.is_file())
}
