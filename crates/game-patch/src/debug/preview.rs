use serde::Serialize;

use crate::apply::{ApplyOutcome, PatchApplier};
use crate::error::Result;
use crate::memory::{BufferMemory, ReadMemory};
use crate::patch::PatchData;

/// One write a patch would perform, with the bytes before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewedWrite {
    pub address: u64,
    pub before: Vec<u8>,
    pub after: Vec<u8>,
}

/// Dry run of a patch against a copy of the target image.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchPreview {
    pub writes: Vec<PreviewedWrite>,
    pub skipped: usize,
}

impl PatchPreview {
    /// Apply `patch` to a scratch copy of `image` and record each write.
    pub fn run(image: &BufferMemory, patch: &PatchData) -> Result<Self> {
        let mut scratch = image.clone();
        let mut preview = Self::default();

        for entry in &patch.entries {
            let outcome = PatchApplier::new(&mut scratch).apply_entry(entry)?;
            match outcome {
                ApplyOutcome::Written { address, width } => {
                    preview.writes.push(PreviewedWrite {
                        address,
                        before: image.read_bytes(address, width)?,
                        after: scratch.read_bytes(address, width)?,
                    });
                }
                ApplyOutcome::ArgsAppended { .. } | ApplyOutcome::Skipped => preview.skipped += 1,
            }
        }
        Ok(preview)
    }
}
