//! Virtual file system offered to cores (`GET_VFS_INTERFACE`).

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Path rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum VfsPathError {
    /// Path has no `/` separator.
    #[error("path {path:?} has no '/' separator")]
    MissingSeparator {
        /// Rejected path.
        path: String,
    },
    /// Path uses `\` as a separator.
    #[error("path {path:?} uses '\\' instead of '/'")]
    Backslash {
        /// Rejected path.
        path: String,
    },
    /// Path contains `//`.
    #[error("path {path:?} contains an empty segment")]
    EmptySegment {
        /// Rejected path.
        path: String,
    },
    /// Path contains a `.` or `..` segment.
    #[error("path {path:?} contains a relative segment")]
    RelativeSegment {
        /// Rejected path.
        path: String,
    },
    /// Name joined onto a path is empty, relative or contains a separator.
    #[error("{name:?} is not a single path component")]
    InvalidComponent {
        /// Rejected name.
        name: String,
    },
}

/// Path handed across the VFS boundary.
///
/// Forward slashes only, at least one separator, and no `./`, `../` or `//`
/// sequences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VfsPath(String);

impl VfsPath {
    /// Validates a path.
    ///
    /// # Errors
    ///
    /// Returns the first [`VfsPathError`] rule the path breaks.
    pub fn new(path: &str) -> Result<Self, VfsPathError> {
        let owned = || path.to_owned();
        if path.contains('\\') {
            return Err(VfsPathError::Backslash { path: owned() });
        }
        if !path.contains('/') {
            return Err(VfsPathError::MissingSeparator { path: owned() });
        }
        if path.contains("//") {
            return Err(VfsPathError::EmptySegment { path: owned() });
        }
        if path
            .split('/')
            .any(|segment| segment == "." || segment == "..")
        {
            return Err(VfsPathError::RelativeSegment { path: owned() });
        }
        Ok(Self(path.to_owned()))
    }

    /// Appends one component.
    ///
    /// # Errors
    ///
    /// Returns [`VfsPathError::InvalidComponent`] for empty, `.`, `..` or
    /// names containing a separator.
    pub fn join(&self, name: &str) -> Result<Self, VfsPathError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(VfsPathError::InvalidComponent {
                name: name.to_owned(),
            });
        }
        let base = self.0.trim_end_matches('/');
        Ok(Self(format!("{base}/{name}")))
    }

    /// Path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final component.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// VFS interface revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum VfsVersion {
    /// Files: open, read, write, seek, remove, rename.
    V1 = 1,
    /// Adds truncate.
    V2 = 2,
    /// Adds stat and directories.
    V3 = 3,
}

impl VfsVersion {
    /// Converts a wire value.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }
}

impl fmt::Display for VfsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", *self as u32)
    }
}

bitflags::bitflags! {
    /// Open mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct VfsAccess: u32 {
        /// Read only.
        const READ = 1 << 0;
        /// Write; truncates unless [`VfsAccess::UPDATE_EXISTING`] is set.
        const WRITE = 1 << 1;
        /// Read and write.
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        /// Keep existing contents when writing.
        const UPDATE_EXISTING = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Access pattern hints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct VfsHints: u32 {
        /// File will be accessed often; the frontend may cache it.
        const FREQUENT_ACCESS = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Result bits of a stat call; empty for invalid paths.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct VfsStat: u32 {
        /// Path exists.
        const IS_VALID = 1 << 0;
        /// Path is a directory.
        const IS_DIRECTORY = 1 << 1;
        /// Path is a character device.
        const IS_CHARACTER_SPECIAL = 1 << 2;
    }
}

/// Seek origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum SeekPosition {
    /// From the beginning.
    Start = 0,
    /// From the current position.
    Current = 1,
    /// From the end.
    End = 2,
}

/// VFS operation failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum VfsError {
    /// Path does not exist.
    #[error("{path} does not exist")]
    NotFound {
        /// Missing path.
        path: String,
    },
    /// Host I/O failed.
    #[error("{operation} failed on {path}: {message}")]
    Io {
        /// Failed operation.
        operation: &'static str,
        /// Path involved.
        path: String,
        /// Host error text.
        message: String,
    },
    /// Operation needs a newer interface revision.
    #[error("{operation} needs VFS {required}, interface is {available}")]
    Unsupported {
        /// Rejected operation.
        operation: &'static str,
        /// Revision that introduced it.
        required: VfsVersion,
        /// Revision in use.
        available: VfsVersion,
    },
    /// Path broke the path rules.
    #[error(transparent)]
    Path(#[from] VfsPathError),
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VfsDirEntry {
    /// Entry name without the directory part.
    pub name: String,
    /// Entry is a directory.
    pub is_dir: bool,
}

/// Open file handle.
pub trait VfsFile: Send {
    /// Path the file was opened with.
    fn path(&self) -> &VfsPath;
    /// File size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] when the host cannot report it.
    fn size(&mut self) -> Result<u64, VfsError>;
    /// Current position.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] on host failure.
    fn tell(&mut self) -> Result<u64, VfsError>;
    /// Moves the position and returns the new one.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] on host failure or a negative result.
    fn seek(&mut self, offset: i64, whence: SeekPosition) -> Result<u64, VfsError>;
    /// Reads into `buf`, returning bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] on host failure.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VfsError>;
    /// Writes `buf`, returning bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] on host failure.
    fn write(&mut self, buf: &[u8]) -> Result<usize, VfsError>;
    /// Flushes buffered writes.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] on host failure.
    fn flush(&mut self) -> Result<(), VfsError>;
    /// Sets the file length.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] on host failure.
    fn truncate(&mut self, len: u64) -> Result<(), VfsError>;
}

/// File system implementation behind the interface.
pub trait Vfs: Send + Sync {
    /// Highest revision implemented.
    fn version(&self) -> VfsVersion;

    /// Opens a file.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] or [`VfsError::Io`].
    fn open(
        &self,
        path: &VfsPath,
        access: VfsAccess,
        hints: VfsHints,
    ) -> Result<Box<dyn VfsFile>, VfsError>;

    /// Deletes a file.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] or [`VfsError::Io`].
    fn remove(&self, path: &VfsPath) -> Result<(), VfsError>;

    /// Renames a file.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] or [`VfsError::Io`].
    fn rename(&self, from: &VfsPath, to: &VfsPath) -> Result<(), VfsError>;

    /// Stat bits and size; empty bits when the path is invalid.
    fn stat(&self, path: &VfsPath) -> (VfsStat, u64);

    /// Creates a directory.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] on host failure.
    fn mkdir(&self, path: &VfsPath) -> Result<(), VfsError>;

    /// Lists a directory.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] or [`VfsError::Io`].
    fn read_dir(&self, path: &VfsPath) -> Result<Vec<VfsDirEntry>, VfsError>;
}

/// Interface granted to the core: an implementation pinned to a revision.
///
/// Calls newer than `version` fail with [`VfsError::Unsupported`] even when
/// the implementation could serve them.
#[derive(Clone)]
pub struct VfsInterface {
    version: VfsVersion,
    vfs: Arc<dyn Vfs>,
}

impl fmt::Debug for VfsInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VfsInterface")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl VfsInterface {
    /// Pins `vfs` to `version`, capped at what it implements.
    #[must_use]
    pub fn new(vfs: Arc<dyn Vfs>, version: VfsVersion) -> Self {
        let version = version.min(vfs.version());
        Self { version, vfs }
    }

    /// Revision in use.
    #[must_use]
    pub const fn version(&self) -> VfsVersion {
        self.version
    }

    fn require(&self, operation: &'static str, required: VfsVersion) -> Result<(), VfsError> {
        if self.version < required {
            return Err(VfsError::Unsupported {
                operation,
                required,
                available: self.version,
            });
        }
        Ok(())
    }

    /// Opens a file.
    ///
    /// # Errors
    ///
    /// Propagates [`Vfs::open`] errors.
    pub fn open(
        &self,
        path: &VfsPath,
        access: VfsAccess,
        hints: VfsHints,
    ) -> Result<Box<dyn VfsFile>, VfsError> {
        self.vfs.open(path, access, hints)
    }

    /// Deletes a file.
    ///
    /// # Errors
    ///
    /// Propagates [`Vfs::remove`] errors.
    pub fn remove(&self, path: &VfsPath) -> Result<(), VfsError> {
        self.vfs.remove(path)
    }

    /// Renames a file.
    ///
    /// # Errors
    ///
    /// Propagates [`Vfs::rename`] errors.
    pub fn rename(&self, from: &VfsPath, to: &VfsPath) -> Result<(), VfsError> {
        self.vfs.rename(from, to)
    }

    /// Truncates an open file (revision 2).
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Unsupported`] below revision 2.
    pub fn truncate(&self, file: &mut dyn VfsFile, len: u64) -> Result<(), VfsError> {
        self.require("truncate", VfsVersion::V2)?;
        file.truncate(len)
    }

    /// Stats a path (revision 3).
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Unsupported`] below revision 3.
    pub fn stat(&self, path: &VfsPath) -> Result<(VfsStat, u64), VfsError> {
        self.require("stat", VfsVersion::V3)?;
        Ok(self.vfs.stat(path))
    }

    /// Creates a directory (revision 3).
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Unsupported`] below revision 3.
    pub fn mkdir(&self, path: &VfsPath) -> Result<(), VfsError> {
        self.require("mkdir", VfsVersion::V3)?;
        self.vfs.mkdir(path)
    }

    /// Lists a directory (revision 3).
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Unsupported`] below revision 3.
    pub fn read_dir(&self, path: &VfsPath) -> Result<Vec<VfsDirEntry>, VfsError> {
        self.require("opendir", VfsVersion::V3)?;
        self.vfs.read_dir(path)
    }
}

/// Negotiation slot for `GET_VFS_INTERFACE`.
#[derive(Debug, Clone)]
pub struct VfsInterfaceRequest {
    /// Lowest revision the core can use.
    pub required_version: VfsVersion,
    /// Filled by the frontend.
    pub interface: Option<VfsInterface>,
}

impl VfsInterfaceRequest {
    /// Empty request for at least `required_version`.
    #[must_use]
    pub const fn new(required_version: VfsVersion) -> Self {
        Self {
            required_version,
            interface: None,
        }
    }
}
