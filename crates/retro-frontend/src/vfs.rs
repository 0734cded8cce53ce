//! [`Vfs`] backed by a host directory.
//!
//! VFS paths are absolute in their own namespace; `/saves/game.srm`
//! resolves to `<root>/saves/game.srm`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use retro_contract::vfs::{SeekPosition, VfsAccess, VfsDirEntry, VfsHints, VfsStat};
use retro_contract::{Vfs, VfsError, VfsFile, VfsPath, VfsVersion};

/// Directory-rooted file system.
#[derive(Debug, Clone)]
pub struct HostVfs {
    root: PathBuf,
    version: VfsVersion,
}

impl HostVfs {
    /// File system rooted at `root`, offering up to `version`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, version: VfsVersion) -> Self {
        Self {
            root: root.into(),
            version,
        }
    }

    /// Host directory paths resolve under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for `path`.
    #[must_use]
    pub fn resolve(&self, path: &VfsPath) -> PathBuf {
        path.as_str()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |host, segment| host.join(segment))
    }
}

fn io_error(operation: &'static str, path: &VfsPath, err: &io::Error) -> VfsError {
    if err.kind() == io::ErrorKind::NotFound {
        return VfsError::NotFound {
            path: path.to_string(),
        };
    }
    VfsError::Io {
        operation,
        path: path.to_string(),
        message: err.to_string(),
    }
}

impl Vfs for HostVfs {
    fn version(&self) -> VfsVersion {
        self.version
    }

    fn open(
        &self,
        path: &VfsPath,
        access: VfsAccess,
        hints: VfsHints,
    ) -> Result<Box<dyn VfsFile>, VfsError> {
        let write = access.contains(VfsAccess::WRITE);
        let mut options = OpenOptions::new();
        options.read(access.contains(VfsAccess::READ) || !write);
        if write {
            let keep = access.contains(VfsAccess::UPDATE_EXISTING);
            options.write(true).create(true).truncate(!keep);
        }
        let host = self.resolve(path);
        let file = options
            .open(&host)
            .map_err(|err| io_error("open", path, &err))?;
        log::debug!("vfs open {path} as {} ({hints:?})", host.display());
        Ok(Box::new(HostFile {
            path: path.clone(),
            file,
        }))
    }

    fn remove(&self, path: &VfsPath) -> Result<(), VfsError> {
        fs::remove_file(self.resolve(path)).map_err(|err| io_error("remove", path, &err))
    }

    fn rename(&self, from: &VfsPath, to: &VfsPath) -> Result<(), VfsError> {
        fs::rename(self.resolve(from), self.resolve(to))
            .map_err(|err| io_error("rename", from, &err))
    }

    fn stat(&self, path: &VfsPath) -> (VfsStat, u64) {
        match fs::metadata(self.resolve(path)) {
            Ok(meta) if meta.is_dir() => (VfsStat::IS_VALID | VfsStat::IS_DIRECTORY, 0),
            Ok(meta) if meta.is_file() => (VfsStat::IS_VALID, meta.len()),
            Ok(_) => (VfsStat::IS_VALID | VfsStat::IS_CHARACTER_SPECIAL, 0),
            Err(_) => (VfsStat::empty(), 0),
        }
    }

    fn mkdir(&self, path: &VfsPath) -> Result<(), VfsError> {
        fs::create_dir(self.resolve(path)).map_err(|err| io_error("mkdir", path, &err))
    }

    fn read_dir(&self, path: &VfsPath) -> Result<Vec<VfsDirEntry>, VfsError> {
        let entries =
            fs::read_dir(self.resolve(path)).map_err(|err| io_error("opendir", path, &err))?;
        let mut listed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| io_error("readdir", path, &err))?;
            let is_dir = entry
                .file_type()
                .map_err(|err| io_error("readdir", path, &err))?
                .is_dir();
            listed.push(VfsDirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }
}

/// Open host file.
#[derive(Debug)]
struct HostFile {
    path: VfsPath,
    file: File,
}

impl VfsFile for HostFile {
    fn path(&self) -> &VfsPath {
        &self.path
    }

    fn size(&mut self) -> Result<u64, VfsError> {
        self.file
            .metadata()
            .map(|meta| meta.len())
            .map_err(|err| io_error("size", &self.path, &err))
    }

    fn tell(&mut self) -> Result<u64, VfsError> {
        self.file
            .stream_position()
            .map_err(|err| io_error("tell", &self.path, &err))
    }

    fn seek(&mut self, offset: i64, whence: SeekPosition) -> Result<u64, VfsError> {
        let target = match whence {
            SeekPosition::Start => SeekFrom::Start(u64::try_from(offset).unwrap_or(0)),
            SeekPosition::Current => SeekFrom::Current(offset),
            SeekPosition::End => SeekFrom::End(offset),
        };
        self.file
            .seek(target)
            .map_err(|err| io_error("seek", &self.path, &err))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VfsError> {
        self.file
            .read(buf)
            .map_err(|err| io_error("read", &self.path, &err))
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, VfsError> {
        self.file
            .write(buf)
            .map_err(|err| io_error("write", &self.path, &err))
    }

    fn flush(&mut self) -> Result<(), VfsError> {
        self.file
            .flush()
            .map_err(|err| io_error("flush", &self.path, &err))
    }

    fn truncate(&mut self, len: u64) -> Result<(), VfsError> {
        self.file
            .set_len(len)
            .map_err(|err| io_error("truncate", &self.path, &err))
    }
}
