//! Multi-disk swapping: the disk-control interface and a ready-made image list.

use std::fmt;
use std::path::Path;

use crate::core::GameInfo;
use crate::environment::EnvironmentGate;
use crate::ContractViolation;

/// Disk-control interface revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DiskControlVersion {
    /// Eject state, index selection and image list edits.
    #[default]
    V0,
    /// Adds initial image selection, image paths and labels.
    V1,
}

impl DiskControlVersion {
    /// Converts a wire value; anything newer is treated as version 1.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Self {
        if raw == 0 {
            Self::V0
        } else {
            Self::V1
        }
    }
}

impl fmt::Display for DiskControlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V0 => f.write_str("v0"),
            Self::V1 => f.write_str("v1"),
        }
    }
}

/// Core-side disk-control hook.
///
/// The tray is either inserted or ejected. Index selection and list edits are
/// only valid while it is ejected; an index at or past `num_images` means no
/// disk is inserted.
pub trait DiskControl {
    /// Opens (`true`) or closes the virtual tray.
    fn set_eject_state(&mut self, ejected: bool) -> bool;
    /// Returns `true` while the tray is open.
    fn eject_state(&self) -> bool;
    /// Currently selected image.
    fn image_index(&self) -> u32;
    /// Selects an image; fails unless the tray is open.
    fn set_image_index(&mut self, index: u32) -> bool;
    /// Number of images.
    fn num_images(&self) -> u32;
    /// Replaces image `index`; `None` removes it and shifts later images
    /// down by one. Fails unless the tray is open.
    fn replace_image_index(&mut self, index: u32, info: Option<&GameInfo>) -> bool;
    /// Appends an empty slot to fill with `replace_image_index`.
    fn add_image_index(&mut self) -> bool;

    /// Image to insert when content loads; called before `load_game`.
    fn set_initial_image(&mut self, index: u32, path: &str) -> bool {
        let _ = (index, path);
        false
    }

    /// Path of image `index`.
    fn image_path(&self, index: u32) -> Option<String> {
        let _ = index;
        None
    }

    /// Display label of image `index`.
    fn image_label(&self, index: u32) -> Option<String> {
        let _ = index;
        None
    }
}

/// One image in a [`DiskImageList`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiskImage {
    /// Host path, when the image came from a file.
    pub path: Option<String>,
    /// Label shown in menus; derived from the path when absent.
    pub label: Option<String>,
}

impl DiskImage {
    /// Image loaded from `path`.
    #[must_use]
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            label: None,
        }
    }

    /// Label, falling back to the file stem of the path.
    #[must_use]
    pub fn display_label(&self) -> Option<String> {
        self.label.clone().or_else(|| {
            let path = self.path.as_deref()?;
            Path::new(path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
    }
}

/// Ordered image list with a virtual tray.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiskImageList {
    images: Vec<Option<DiskImage>>,
    index: u32,
    ejected: bool,
    initial: Option<(u32, String)>,
}

impl DiskImageList {
    /// Empty list with the tray closed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            images: Vec::new(),
            index: 0,
            ejected: false,
            initial: None,
        }
    }

    /// Replaces the list with `images` and inserts the first one.
    ///
    /// When an initial image was requested and still matches its path, that
    /// image is inserted instead.
    pub fn load(&mut self, images: impl IntoIterator<Item = DiskImage>) {
        self.images = images.into_iter().map(Some).collect();
        self.ejected = false;
        self.index = match &self.initial {
            Some((index, path))
                if self
                    .images
                    .get(*index as usize)
                    .and_then(Option::as_ref)
                    .and_then(|image| image.path.as_deref())
                    == Some(path.as_str()) =>
            {
                *index
            }
            _ => 0,
        };
    }

    /// Inserted image, if any.
    #[must_use]
    pub fn current(&self) -> Option<&DiskImage> {
        self.images.get(self.index as usize)?.as_ref()
    }

    fn len(&self) -> u32 {
        u32::try_from(self.images.len()).unwrap_or(u32::MAX)
    }
}

impl DiskControl for DiskImageList {
    fn set_eject_state(&mut self, ejected: bool) -> bool {
        self.ejected = ejected;
        true
    }

    fn eject_state(&self) -> bool {
        self.ejected
    }

    fn image_index(&self) -> u32 {
        self.index
    }

    fn set_image_index(&mut self, index: u32) -> bool {
        if !self.ejected {
            log::debug!("disk index change to {index} refused: tray closed");
            return false;
        }
        self.index = index;
        true
    }

    fn num_images(&self) -> u32 {
        self.len()
    }

    fn replace_image_index(&mut self, index: u32, info: Option<&GameInfo>) -> bool {
        if !self.ejected || index >= self.len() {
            return false;
        }
        let slot = index as usize;
        match info {
            Some(info) => {
                self.images[slot] = Some(DiskImage {
                    path: info
                        .path
                        .as_ref()
                        .map(|path| path.to_string_lossy().into_owned()),
                    label: None,
                });
            }
            None => {
                self.images.remove(slot);
                if index < self.index {
                    self.index -= 1;
                }
            }
        }
        true
    }

    fn add_image_index(&mut self) -> bool {
        if !self.ejected {
            return false;
        }
        self.images.push(None);
        true
    }

    fn set_initial_image(&mut self, index: u32, path: &str) -> bool {
        self.initial = Some((index, path.to_owned()));
        true
    }

    fn image_path(&self, index: u32) -> Option<String> {
        self.images.get(index as usize)?.as_ref()?.path.clone()
    }

    fn image_label(&self, index: u32) -> Option<String> {
        self.images.get(index as usize)?.as_ref()?.display_label()
    }
}

/// Session-routed access to the core's disk control.
///
/// Version 1 calls are refused unless the core registered the extended
/// interface.
pub struct DiskControlHandle<'a> {
    control: &'a mut dyn DiskControl,
    gate: &'a mut EnvironmentGate,
    version: DiskControlVersion,
}

impl fmt::Debug for DiskControlHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskControlHandle")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<'a> DiskControlHandle<'a> {
    pub(crate) fn new(
        control: &'a mut dyn DiskControl,
        gate: &'a mut EnvironmentGate,
        version: DiskControlVersion,
    ) -> Self {
        Self {
            control,
            gate,
            version,
        }
    }

    /// Registered interface revision.
    #[must_use]
    pub const fn version(&self) -> DiskControlVersion {
        self.version
    }

    /// Opens or closes the tray.
    pub fn set_eject_state(&mut self, ejected: bool) -> bool {
        self.control.set_eject_state(ejected)
    }

    /// Returns `true` while the tray is open.
    #[must_use]
    pub fn eject_state(&self) -> bool {
        self.control.eject_state()
    }

    /// Selected image.
    #[must_use]
    pub fn image_index(&self) -> u32 {
        self.control.image_index()
    }

    /// Selects an image; fails unless the tray is open.
    ///
    /// Selecting with the tray closed records
    /// [`ContractViolation::DiskSwapWithTrayClosed`] and only reaches the
    /// core under [`ViolationPolicy::Warn`](crate::ViolationPolicy::Warn).
    pub fn set_image_index(&mut self, index: u32) -> bool {
        if !self.control.eject_state() {
            let violation = ContractViolation::DiskSwapWithTrayClosed { index };
            if !self.gate.report(&violation) {
                return false;
            }
        }
        self.control.set_image_index(index)
    }

    /// Number of images.
    #[must_use]
    pub fn num_images(&self) -> u32 {
        self.control.num_images()
    }

    /// Replaces or removes image `index`.
    pub fn replace_image_index(&mut self, index: u32, info: Option<&GameInfo>) -> bool {
        self.control.replace_image_index(index, info)
    }

    /// Appends an empty slot.
    pub fn add_image_index(&mut self) -> bool {
        self.control.add_image_index()
    }

    fn require_v1(&mut self, operation: &'static str) -> Result<(), ContractViolation> {
        if self.version >= DiskControlVersion::V1 {
            return Ok(());
        }
        let violation = ContractViolation::DiskInterfaceVersion { operation };
        if self.gate.report(&violation) {
            Ok(())
        } else {
            Err(violation)
        }
    }

    /// Requests the image to insert at load.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::DiskInterfaceVersion`] when only the
    /// version 0 interface was registered.
    pub fn set_initial_image(&mut self, index: u32, path: &str) -> Result<bool, ContractViolation> {
        self.require_v1("set_initial_image")?;
        Ok(self.control.set_initial_image(index, path))
    }

    /// Path of image `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::DiskInterfaceVersion`] when only the
    /// version 0 interface was registered.
    pub fn image_path(&mut self, index: u32) -> Result<Option<String>, ContractViolation> {
        self.require_v1("image_path")?;
        Ok(self.control.image_path(index))
    }

    /// Label of image `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::DiskInterfaceVersion`] when only the
    /// version 0 interface was registered.
    pub fn image_label(&mut self, index: u32) -> Result<Option<String>, ContractViolation> {
        self.require_v1("image_label")?;
        Ok(self.control.image_label(index))
    }
}

#[cfg(test)]
mod tests {
    use super::{DiskControl, DiskImage, DiskImageList};

    fn three_disks() -> DiskImageList {
        let mut list = DiskImageList::new();
        list.load([
            DiskImage::from_path("/games/ff7/disc1.chd"),
            DiskImage::from_path("/games/ff7/disc2.chd"),
            DiskImage::from_path("/games/ff7/disc3.chd"),
        ]);
        list
    }

    #[test]
    fn index_changes_need_an_open_tray() {
        let mut list = three_disks();
        assert!(!list.set_image_index(1));
        assert!(list.set_eject_state(true));
        assert!(list.set_image_index(1));
        assert!(list.set_eject_state(false));
        assert_eq!(list.current().and_then(DiskImage::display_label).as_deref(), Some("disc2"));
    }

    #[test]
    fn removal_shifts_later_images_down() {
        let mut list = three_disks();
        list.set_eject_state(true);
        list.set_image_index(2);
        assert!(list.replace_image_index(0, None));
        assert_eq!(list.num_images(), 2);
        assert_eq!(list.image_index(), 1);
        assert_eq!(list.image_path(1).as_deref(), Some("/games/ff7/disc3.chd"));
        assert!(!list.replace_image_index(2, None));
    }

    #[test]
    fn index_past_end_means_no_disk() {
        let mut list = three_disks();
        list.set_eject_state(true);
        assert!(list.set_image_index(3));
        assert_eq!(list.current(), None);
    }

    #[test]
    fn initial_image_is_honored_when_path_matches() {
        let mut list = DiskImageList::new();
        assert!(list.set_initial_image(1, "/games/ff7/disc2.chd"));
        list.load([
            DiskImage::from_path("/games/ff7/disc1.chd"),
            DiskImage::from_path("/games/ff7/disc2.chd"),
        ]);
        assert_eq!(list.image_index(), 1);

        let mut list = DiskImageList::new();
        list.set_initial_image(1, "/elsewhere/disc2.chd");
        list.load([
            DiskImage::from_path("/games/ff7/disc1.chd"),
            DiskImage::from_path("/games/ff7/disc2.chd"),
        ]);
        assert_eq!(list.image_index(), 0);
    }

    #[test]
    fn added_slots_are_filled_by_replace() {
        let mut list = three_disks();
        list.set_eject_state(true);
        assert!(list.add_image_index());
        assert_eq!(list.num_images(), 4);
        assert_eq!(list.image_path(3), None);
        let info = crate::core::GameInfo::from_path("/games/ff7/disc4.chd");
        assert!(list.replace_image_index(3, Some(&info)));
        assert_eq!(list.image_label(3).as_deref(), Some("disc4"));
    }
}
