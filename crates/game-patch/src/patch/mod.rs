//! Patch records produced by the parser.

pub mod hash;

use serde::Serialize;

pub use hash::{calculate_patch_hash, patch_number, stringid};

/// Entries with fewer parameters are dropped as malformed.
pub const MIN_PATCH_PARAMS: usize = 3;
/// Parameters beyond this count are ignored.
pub const MAX_PATCH_PARAMS: usize = 8;
/// Maximum number of `app_ver` values kept per patch.
pub const MAX_APP_VERS: usize = 16;
/// Maximum number of document-level title ids.
pub const MAX_TITLE_IDS: usize = 16;

const PRX_SUFFIXES: [&str; 4] = [".prx", ".PRX", ".sprx", ".SPRX"];

/// One authored patch block, as accumulated while scanning `patch:`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub title: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub app_bin: Option<String>,
    pub app_ver: Vec<String>,
    pub is_app_ver_list: bool,
}

impl Patch {
    /// Number of identity variants: one per `app_ver`, at least one.
    pub fn variant_count(&self) -> usize {
        self.app_ver.len().max(1)
    }

    /// Application version for a variant slot (`None` when none declared).
    pub fn app_ver_at(&self, slot: usize) -> Option<&str> {
        self.app_ver.get(slot).map(String::as_str)
    }
}

/// One operation: a tag followed by its parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchEntry {
    pub params: Vec<String>,
}

impl PatchEntry {
    pub fn new(params: Vec<String>) -> Self {
        Self { params }
    }

    pub fn op(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Whether the entry carries enough parameters to be kept.
    pub fn is_well_formed(&self) -> bool {
        self.params.len() >= MIN_PATCH_PARAMS
    }
}

impl std::fmt::Display for PatchEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "- [ ")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", p)?;
        }
        write!(f, " ]")
    }
}

/// Per (patch, app_ver) projection with its identity and derived flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchMetadata {
    pub hash: u32,
    pub patch_number: usize,
    pub title: Option<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub app_bin: Option<String>,
    pub app_ver: Option<String>,
    pub matches_game: bool,
    pub enabled: bool,
    pub is_prx: bool,
}

impl PatchMetadata {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("N/A")
    }
}

/// Metadata plus the entries of a patch (ALL mode output).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchData {
    pub metadata: PatchMetadata,
    pub entries: Vec<PatchEntry>,
}

/// True if the binary name looks like a loadable module.
pub fn is_prx(app_bin: &str) -> bool {
    PRX_SUFFIXES.iter().any(|s| app_bin.contains(s))
}
