//! Required-document checklist and upload completeness tracking

use crate::data::{MONTH_YEAR_OPTIONS, YEAR_OPTIONS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default upload size limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions accepted by the upload inputs
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// One entry of the required-document checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub id: String,
    pub name: String,
    /// Section heading the document is listed under
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub year_selector: bool,
    #[serde(default)]
    pub month_selector: bool,
    /// Period the document covers, e.g. "2024" or "JAN 24"
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// When set, the selector metadata is also needed to count as uploaded
    #[serde(default)]
    pub metadata_required: bool,
}

impl DocumentDescriptor {
    pub fn new(id: &str, name: &str, group: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            group: group.to_string(),
            year_selector: false,
            month_selector: false,
            period: None,
            note: None,
            metadata_required: false,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn with_year(mut self, year: &str) -> Self {
        self.year_selector = true;
        self.period = Some(year.to_string());
        self
    }

    pub fn with_month_year(mut self, month_year: &str) -> Self {
        self.month_selector = true;
        self.period = Some(month_year.to_string());
        self
    }

    #[cfg(test)]
    pub fn requiring_metadata(mut self) -> Self {
        self.metadata_required = true;
        self
    }

    /// Name with the covered period, e.g. "Form 16 / ITR (2024)"
    pub fn display_name(&self) -> String {
        match &self.period {
            Some(period) => format!("{} ({period})", self.name),
            None => self.name.clone(),
        }
    }
}

/// Reference to a file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub size_bytes: u64,
    pub path: Option<PathBuf>,
}

impl FileRef {
    pub fn new(name: &str, size_bytes: u64) -> Self {
        Self {
            name: name.to_string(),
            size_bytes,
            path: None,
        }
    }

    /// Build a reference from a file on disk
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size_bytes: metadata.len(),
            path: Some(path.to_path_buf()),
        })
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

/// Metadata key of a document slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKey {
    Year,
    MonthYear,
}

impl MetadataKey {
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::Year => YEAR_OPTIONS,
            Self::MonthYear => MONTH_YEAR_OPTIONS,
        }
    }
}

/// Optional metadata supplied together with a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMetadata {
    pub year: Option<String>,
    pub month_year: Option<String>,
}

/// Upload state of one checklist entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSlot {
    pub file: Option<FileRef>,
    pub year: Option<String>,
    pub month_year: Option<String>,
}

/// Reasons an upload or metadata change is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejected {
    #[error("Unknown document '{0}'")]
    UnknownDocument(String),
    #[error("Unsupported file type '{0}', please upload PDF, JPG or PNG")]
    UnsupportedFileType(String),
    #[error("File is too large ({size} bytes, limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("A file is already selected, remove it first")]
    AlreadyUploaded,
    #[error("This document does not take that selection")]
    UnsupportedMetadata,
    #[error("'{0}' is not a valid selection")]
    InvalidMetadataValue(String),
}

/// Tracks the required documents and derives whether all are present.
///
/// Unknown document ids are rejected for every mutation. Completeness is
/// recomputed from the slots on each query.
#[derive(Debug, Clone)]
pub struct DocumentTracker {
    descriptors: Vec<DocumentDescriptor>,
    slots: HashMap<String, DocumentSlot>,
    max_upload_bytes: u64,
}

impl DocumentTracker {
    pub fn new(checklist: Vec<DocumentDescriptor>, max_upload_bytes: u64) -> Self {
        let mut descriptors: Vec<DocumentDescriptor> = Vec::with_capacity(checklist.len());
        for descriptor in checklist {
            if descriptors.iter().any(|d| d.id == descriptor.id) {
                tracing::warn!("Duplicate checklist entry '{}' ignored", descriptor.id);
                continue;
            }
            descriptors.push(descriptor);
        }
        let slots = descriptors
            .iter()
            .map(|d| (d.id.clone(), DocumentSlot::default()))
            .collect();
        Self {
            descriptors,
            slots,
            max_upload_bytes,
        }
    }

    pub fn descriptors(&self) -> &[DocumentDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, id: &str) -> Option<&DocumentDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn slot(&self, id: &str) -> Option<&DocumentSlot> {
        self.slots.get(id)
    }

    /// Attach a file to a document.
    ///
    /// Returns `Ok(false)` when the same file is already attached.
    pub fn set_file(
        &mut self,
        id: &str,
        file: FileRef,
        metadata: SlotMetadata,
    ) -> Result<bool, UploadRejected> {
        let descriptor = self
            .descriptor(id)
            .ok_or_else(|| UploadRejected::UnknownDocument(id.to_string()))?;

        let extension = file.extension().unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadRejected::UnsupportedFileType(file.name.clone()));
        }
        if file.size_bytes > self.max_upload_bytes {
            return Err(UploadRejected::FileTooLarge {
                size: file.size_bytes,
                limit: self.max_upload_bytes,
            });
        }
        if let Some(year) = &metadata.year {
            check_metadata(descriptor, MetadataKey::Year, year)?;
        }
        if let Some(month_year) = &metadata.month_year {
            check_metadata(descriptor, MetadataKey::MonthYear, month_year)?;
        }

        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| UploadRejected::UnknownDocument(id.to_string()))?;
        match &slot.file {
            Some(existing) if *existing == file => return Ok(false),
            Some(_) => return Err(UploadRejected::AlreadyUploaded),
            None => {}
        }
        slot.file = Some(file);
        if metadata.year.is_some() {
            slot.year = metadata.year;
        }
        if metadata.month_year.is_some() {
            slot.month_year = metadata.month_year;
        }
        Ok(true)
    }

    /// Detach the file of a document, keeping its metadata
    pub fn remove_file(&mut self, id: &str) -> Result<(), UploadRejected> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| UploadRejected::UnknownDocument(id.to_string()))?;
        slot.file = None;
        Ok(())
    }

    /// Set or clear a metadata value, independent of file presence
    pub fn set_metadata(
        &mut self,
        id: &str,
        key: MetadataKey,
        value: Option<String>,
    ) -> Result<(), UploadRejected> {
        let descriptor = self
            .descriptor(id)
            .ok_or_else(|| UploadRejected::UnknownDocument(id.to_string()))?;
        match &value {
            Some(v) => check_metadata(descriptor, key, v)?,
            None => check_selector(descriptor, key)?,
        }
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| UploadRejected::UnknownDocument(id.to_string()))?;
        match key {
            MetadataKey::Year => slot.year = value,
            MetadataKey::MonthYear => slot.month_year = value,
        }
        Ok(())
    }

    /// Move a metadata selection to the next option, wrapping to unset
    pub fn cycle_metadata(&mut self, id: &str, key: MetadataKey) -> Result<(), UploadRejected> {
        let current = self.slot(id).and_then(|s| match key {
            MetadataKey::Year => s.year.clone(),
            MetadataKey::MonthYear => s.month_year.clone(),
        });
        let options = key.options();
        let next = match current.and_then(|c| options.iter().position(|o| *o == c)) {
            None => options.first(),
            Some(i) => options.get(i + 1),
        };
        self.set_metadata(id, key, next.map(|s| s.to_string()))
    }

    fn is_satisfied(&self, descriptor: &DocumentDescriptor) -> bool {
        let Some(slot) = self.slots.get(&descriptor.id) else {
            return false;
        };
        if slot.file.is_none() {
            return false;
        }
        if descriptor.metadata_required {
            if descriptor.year_selector && slot.year.is_none() {
                return false;
            }
            if descriptor.month_selector && slot.month_year.is_none() {
                return false;
            }
        }
        true
    }

    /// True iff every checklist entry is satisfied
    pub fn all_required_satisfied(&self) -> bool {
        self.descriptors.iter().all(|d| self.is_satisfied(d))
    }

    /// Number of checklist entries still missing
    pub fn remaining_count(&self) -> usize {
        self.descriptors
            .iter()
            .filter(|d| !self.is_satisfied(d))
            .count()
    }

    /// Text of the proceed action
    pub fn proceed_label(&self) -> String {
        if self.all_required_satisfied() {
            "✓ All Documents Verified - Proceed".to_string()
        } else {
            format!("Verify {} more documents", self.remaining_count())
        }
    }

    /// Success notice for a freshly attached file
    pub fn upload_notice(&self, id: &str) -> Option<String> {
        self.descriptor(id)
            .map(|d| format!("{} uploaded successfully! 🎉", d.display_name()))
    }

    /// Drop every file and metadata selection
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            *slot = DocumentSlot::default();
        }
    }
}

fn check_selector(descriptor: &DocumentDescriptor, key: MetadataKey) -> Result<(), UploadRejected> {
    let supported = match key {
        MetadataKey::Year => descriptor.year_selector,
        MetadataKey::MonthYear => descriptor.month_selector,
    };
    if supported {
        Ok(())
    } else {
        Err(UploadRejected::UnsupportedMetadata)
    }
}

fn check_metadata(
    descriptor: &DocumentDescriptor,
    key: MetadataKey,
    value: &str,
) -> Result<(), UploadRejected> {
    check_selector(descriptor, key)?;
    if key.options().contains(&value) {
        Ok(())
    } else {
        Err(UploadRejected::InvalidMetadataValue(value.to_string()))
    }
}
