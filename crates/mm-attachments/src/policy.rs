//! Admission policy
//!
//! The immutable rule set governing which files may enter a collection
//! and how many may coexist.

use std::collections::HashSet;

use mm_core::config::AttachmentSettings;
use thiserror::Error;

use crate::model::extension_of;

/// Why a candidate file was refused admission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Extension is on the deny list. Wins over everything else.
    #[error("files with extension .{extension} cannot be attached")]
    Forbidden { extension: String },

    /// Extension is not on the allow list
    #[error("extension .{extension} is not an accepted file type")]
    NotAllowed { extension: String },

    /// The collection is already at capacity
    #[error("no more than {max} files can be attached")]
    CapacityExceeded { max: usize },
}

/// Extension and capacity rules for one attachment collection
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    allowed_extensions: HashSet<String>,
    denied_extensions: HashSet<String>,
    max_count: usize,
}

impl AttachmentPolicy {
    /// Build a policy, normalizing extensions to lower case without dots
    pub fn new(
        allowed: impl IntoIterator<Item = impl AsRef<str>>,
        denied: impl IntoIterator<Item = impl AsRef<str>>,
        max_count: usize,
    ) -> Self {
        let normalize = |ext: &str| ext.trim_start_matches('.').to_lowercase();
        Self {
            allowed_extensions: allowed.into_iter().map(|e| normalize(e.as_ref())).collect(),
            denied_extensions: denied.into_iter().map(|e| normalize(e.as_ref())).collect(),
            max_count: max_count.max(1),
        }
    }

    pub fn from_settings(settings: &AttachmentSettings) -> Self {
        Self::new(
            &settings.allowed_extensions,
            &settings.denied_extensions,
            settings.max_count,
        )
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Lower-cased extension of a filename
    pub fn classify(&self, filename: &str) -> String {
        extension_of(filename)
    }

    /// Decide whether a candidate file may be admitted.
    ///
    /// Checked in order: deny list, allow list, capacity. The order
    /// matters so the caller is told the most specific cause; a
    /// forbidden extension is refused even when the collection is
    /// already full.
    pub fn admits(&self, filename: &str, current_count: usize) -> Result<(), RejectReason> {
        let extension = self.classify(filename);

        if self.denied_extensions.contains(&extension) {
            return Err(RejectReason::Forbidden { extension });
        }
        if !self.allowed_extensions.is_empty() && !self.allowed_extensions.contains(&extension) {
            return Err(RejectReason::NotAllowed { extension });
        }
        if current_count >= self.max_count {
            return Err(RejectReason::CapacityExceeded {
                max: self.max_count,
            });
        }

        Ok(())
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::from_settings(&AttachmentSettings::default())
    }
}
