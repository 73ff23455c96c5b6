use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use super::{ParseEnvironment, ParseMode, PatchSink};
use crate::error::Result;
use crate::game::GamePatchInfo;
use crate::lines::LineReader;
use crate::patch::{
    MAX_APP_VERS, MAX_PATCH_PARAMS, MAX_TITLE_IDS, Patch, PatchData, PatchEntry, PatchMetadata,
    calculate_patch_hash, is_prx, patch_number,
};
use crate::text::{
    indent_level, is_comment_or_blank, is_list_value, line_key, parse_quoted_string,
    parse_string_list, trim,
};

const INITIAL_PATCH_CAPACITY: usize = 8;
const INITIAL_ENTRY_CAPACITY: usize = 16;

/// State of one parse over one patch document.
///
/// Feed lines with [`process_line`](Self::process_line) and call
/// [`finish`](Self::finish) at end of input, or use
/// [`parse_reader`](Self::parse_reader) / [`parse_file`](Self::parse_file).
pub struct ParseContext<'s> {
    mode: ParseMode,
    game: GamePatchInfo,
    env: ParseEnvironment,
    title_filter: Option<String>,
    sink: Option<&'s mut dyn PatchSink>,

    title_ids: Vec<String>,
    current: Patch,
    current_entries: Vec<PatchEntry>,
    declaration: usize,
    in_patches: bool,
    forwarding: Option<PatchMetadata>,

    patches: Vec<PatchData>,
    metadata: Vec<PatchMetadata>,
}

impl<'s> ParseContext<'s> {
    pub fn new(game: GamePatchInfo, env: ParseEnvironment, mode: ParseMode) -> Self {
        Self {
            mode,
            game,
            env,
            title_filter: None,
            sink: None,
            title_ids: Vec::new(),
            current: Patch::default(),
            current_entries: Vec::new(),
            declaration: 0,
            in_patches: false,
            forwarding: None,
            patches: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Keep only patches with this exact title (`All` mode).
    pub fn with_title_filter(mut self, title: impl Into<String>) -> Self {
        self.title_filter = Some(title.into());
        self
    }

    /// Receiver for `LowMem` mode.
    pub fn with_sink(mut self, sink: &'s mut dyn PatchSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn game(&self) -> &GamePatchInfo {
        &self.game
    }

    /// Document-level `titleid:` values.
    pub fn title_ids(&self) -> &[String] {
        &self.title_ids
    }

    pub fn patches(&self) -> &[PatchData] {
        &self.patches
    }

    pub fn metadata(&self) -> &[PatchMetadata] {
        &self.metadata
    }

    pub fn into_patches(self) -> Vec<PatchData> {
        self.patches
    }

    pub fn into_metadata(self) -> Vec<PatchMetadata> {
        self.metadata
    }

    pub fn process_line(&mut self, line: &str) {
        if is_comment_or_blank(line) {
            return;
        }

        let indent = indent_level(line);
        let trimmed = trim(line);

        match line_key(trimmed) {
            Some("titleid") if indent == 0 => {
                self.title_ids = if is_list_value(trimmed) {
                    parse_string_list(trimmed, MAX_TITLE_IDS)
                } else {
                    parse_quoted_string(trimmed).into_iter().collect()
                };
            }
            Some("patch") if indent == 0 => self.complete_patch(),
            Some("title") => self.current.title = parse_quoted_string(trimmed),
            Some("name") => self.current.name = parse_quoted_string(trimmed),
            Some("notes") => self.current.notes = parse_quoted_string(trimmed),
            Some("author") => self.current.author = parse_quoted_string(trimmed),
            Some("version") => self.current.version = parse_quoted_string(trimmed),
            Some("app_bin") => self.current.app_bin = parse_quoted_string(trimmed),
            Some("app_ver") => {
                let list = is_list_value(trimmed);
                self.current.is_app_ver_list = list;
                self.current.app_ver = if list {
                    parse_string_list(trimmed, MAX_APP_VERS)
                } else {
                    parse_quoted_string(trimmed).into_iter().collect()
                };
            }
            Some("patches") => self.open_entries(),
            _ if self.in_patches && trimmed.starts_with("- [") => self.push_entry(trimmed),
            _ => {}
        }
    }

    /// Flush the last patch. Call once at end of input.
    pub fn finish(&mut self) {
        self.complete_patch();
    }

    /// Process every line of `source`, then [`finish`](Self::finish).
    pub fn parse_reader<R: Read>(&mut self, source: R) -> Result<()> {
        let mut reader = LineReader::new(source);
        let mut buf = Vec::new();
        let mut lines = 0usize;
        while !reader.read_line(&mut buf)?.is_eof() {
            self.process_line(&String::from_utf8_lossy(&buf));
            lines += 1;
        }
        self.finish();
        debug!(
            "Parsed {} lines ({} bytes) in {} mode",
            lines,
            reader.total_consumed(),
            self.mode
        );
        Ok(())
    }

    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Parsing patch file {}", path.display());
        let file = File::open(path)?;
        self.parse_reader(file)
    }

    /// Metadata of the current patch for one `app_ver` slot.
    fn variant_metadata(&self, slot: usize) -> PatchMetadata {
        let patch = &self.current;
        let app_ver = patch.app_ver_at(slot);
        let number = patch_number(self.declaration, slot);
        let hash = calculate_patch_hash(number, self.game.titleid(), patch, app_ver);

        PatchMetadata {
            hash,
            patch_number: number,
            title: patch.title.clone(),
            name: patch.name.clone(),
            author: patch.author.clone(),
            version: patch.version.clone(),
            app_bin: patch.app_bin.clone(),
            app_ver: app_ver.map(str::to_string),
            matches_game: self.game.matches_app_ver(app_ver),
            enabled: self.env.is_enabled(hash, patch.app_bin.as_deref()),
            is_prx: patch.app_bin.as_deref().is_some_and(is_prx),
        }
    }

    fn open_entries(&mut self) {
        self.in_patches = true;
        self.forwarding = None;

        if self.mode != ParseMode::LowMem || self.current.title.is_none() {
            return;
        }
        for slot in 0..self.current.variant_count() {
            let meta = self.variant_metadata(slot);
            if !meta.matches_game {
                continue;
            }
            if let Some(sink) = self.sink.as_deref_mut() {
                sink.on_metadata(&meta);
            }
            // Entries follow the most recently emitted variant.
            self.forwarding = meta.enabled.then_some(meta);
        }
    }

    fn push_entry(&mut self, trimmed: &str) {
        let entry = PatchEntry::new(parse_string_list(&trimmed[2..], MAX_PATCH_PARAMS));
        if !entry.is_well_formed() {
            debug!("Dropping malformed entry: {}", trimmed);
            return;
        }

        match self.mode {
            ParseMode::All => {
                if reserve_doubling(&mut self.current_entries, INITIAL_ENTRY_CAPACITY) {
                    self.current_entries.push(entry);
                } else {
                    warn!("Out of memory storing entry {}", entry);
                }
            }
            ParseMode::LowMem => {
                if let (Some(meta), Some(sink)) = (&self.forwarding, self.sink.as_deref_mut()) {
                    sink.on_entry(meta, &entry);
                }
            }
            ParseMode::Metadata => {}
        }
    }

    /// Finalize the current patch and start an empty one.
    fn complete_patch(&mut self) {
        if self.current.title.is_some() {
            self.finalize_patch();
            self.declaration += 1;
        } else if self.current != Patch::default() {
            debug!("Discarding patch without a title");
        }

        self.current = Patch::default();
        self.current_entries.clear();
        self.in_patches = false;
        self.forwarding = None;
    }

    fn finalize_patch(&mut self) {
        for slot in 0..self.current.variant_count() {
            match self.mode {
                ParseMode::All => {
                    if !self.game.matches_app_ver(self.current.app_ver_at(slot)) {
                        continue;
                    }
                    if let Some(filter) = &self.title_filter
                        && self.current.title.as_deref() != Some(filter.as_str())
                    {
                        continue;
                    }
                    if !reserve_doubling(&mut self.patches, INITIAL_PATCH_CAPACITY) {
                        warn!("Out of memory storing patch {}", self.declaration);
                        return;
                    }
                    let metadata = self.variant_metadata(slot);
                    self.patches.push(PatchData {
                        metadata,
                        entries: self.current_entries.clone(),
                    });
                }
                ParseMode::Metadata => {
                    if !reserve_doubling(&mut self.metadata, INITIAL_PATCH_CAPACITY) {
                        warn!("Out of memory storing patch {}", self.declaration);
                        return;
                    }
                    let metadata = self.variant_metadata(slot);
                    self.metadata.push(metadata);
                }
                ParseMode::LowMem => return,
            }
        }
    }
}

/// Make room for one more element, doubling the capacity when full.
/// Returns false if the allocation failed.
fn reserve_doubling<T>(items: &mut Vec<T>, initial: usize) -> bool {
    if items.len() < items.capacity() {
        return true;
    }
    let additional = items.capacity().max(initial);
    items.try_reserve_exact(additional).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PatchState;

    const DOC: &str = r#"# sample patch file
titleid: [ "BLUS30000", "BLES30000" ]

patch:
  title: "Infinite Health"
  name: "health"
  notes: "Keeps the bar full"
  author: "someone"
  version: "1.0"
  app_bin: "EBOOT.BIN"
  app_ver: [ "01.00", "01.01" ]
  patches:
    - [ "bytes32", "0x1000", "5" ]
    - [ "bytes8", "0x2000" ]
    - [ "bytes16", "0x3000", "0x7fff" ]

patch:
  title: "Skip Intro"
  app_bin: "EBOOT.BIN"
  app_ver: "01.00"
  patches:
    - [ "append_arg", "-skipintro", "" ]
"#;

    #[derive(Default)]
    struct Recorder {
        metadata: Vec<PatchMetadata>,
        entries: Vec<(u32, PatchEntry)>,
    }

    impl PatchSink for Recorder {
        fn on_metadata(&mut self, metadata: &PatchMetadata) {
            self.metadata.push(metadata.clone());
        }

        fn on_entry(&mut self, metadata: &PatchMetadata, entry: &PatchEntry) {
            self.entries.push((metadata.hash, entry.clone()));
        }
    }

    fn game(app_ver: &str) -> GamePatchInfo {
        GamePatchInfo::new("BLUS30000", app_ver)
    }

    fn parse(
        text: &str,
        mode: ParseMode,
        env: ParseEnvironment,
        app_ver: &str,
    ) -> ParseContext<'static> {
        let mut ctx = ParseContext::new(game(app_ver), env, mode);
        ctx.parse_reader(text.as_bytes()).unwrap();
        ctx
    }

    fn metadata(text: &str) -> Vec<PatchMetadata> {
        parse(text, ParseMode::Metadata, ParseEnvironment::new(), "01.00").into_metadata()
    }

    #[test]
    fn test_metadata_mode_lists_every_variant() {
        let meta = metadata(DOC);
        assert_eq!(meta.len(), 3);

        let numbers: Vec<usize> = meta.iter().map(|m| m.patch_number).collect();
        assert_eq!(numbers, vec![0, 1, 100]);
        assert_eq!(meta[0].app_ver.as_deref(), Some("01.00"));
        assert_eq!(meta[1].app_ver.as_deref(), Some("01.01"));
        assert!(meta[0].matches_game);
        assert!(!meta[1].matches_game);
        assert_eq!(meta[2].title.as_deref(), Some("Skip Intro"));
    }

    #[test]
    fn test_hashes_are_deterministic_and_unique() {
        let first = metadata(DOC);
        let second = metadata(DOC);
        let hashes: Vec<u32> = first.iter().map(|m| m.hash).collect();
        assert_eq!(hashes, second.iter().map(|m| m.hash).collect::<Vec<_>>());

        let mut unique = hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), hashes.len());
    }

    #[test]
    fn test_title_ids_and_app_ver_list() {
        let mut ctx = ParseContext::new(game("01.00"), ParseEnvironment::new(), ParseMode::All);
        for line in DOC.lines().take(12) {
            ctx.process_line(line);
        }
        assert_eq!(ctx.title_ids(), &["BLUS30000", "BLES30000"]);
        assert_eq!(ctx.current.app_ver, vec!["01.00", "01.01"]);
        assert!(ctx.current.is_app_ver_list);
        assert_eq!(ctx.current.notes.as_deref(), Some("Keeps the bar full"));
    }

    #[test]
    fn test_all_mode_keeps_matching_patches_with_entries() {
        let patches = parse(DOC, ParseMode::All, ParseEnvironment::new(), "01.00").into_patches();
        assert_eq!(patches.len(), 2);

        // the two-parameter entry is dropped
        assert_eq!(patches[0].entries.len(), 2);
        assert_eq!(patches[0].entries[0].params, vec!["bytes32", "0x1000", "5"]);
        assert_eq!(patches[0].entries[1].op(), Some("bytes16"));
        assert_eq!(patches[1].entries[0].params, vec!["append_arg", "-skipintro", ""]);
    }

    #[test]
    fn test_all_mode_selects_variant_by_game_version() {
        let patches = parse(DOC, ParseMode::All, ParseEnvironment::new(), "01.01").into_patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].metadata.patch_number, 1);
        assert_eq!(patches[0].metadata.app_ver.as_deref(), Some("01.01"));
    }

    #[test]
    fn test_all_mode_title_filter() {
        let mut ctx = ParseContext::new(game("01.00"), ParseEnvironment::new(), ParseMode::All)
            .with_title_filter("Skip Intro");
        ctx.parse_reader(DOC.as_bytes()).unwrap();
        assert_eq!(ctx.patches().len(), 1);
        assert_eq!(ctx.patches()[0].metadata.patch_number, 100);
    }

    #[test]
    fn test_low_mem_forwards_only_enabled_entries() {
        let hash = metadata(DOC)[0].hash;
        let env = ParseEnvironment::new()
            .with_states(vec![PatchState::new(hash, true)])
            .with_process_binary("EBOOT.BIN");

        let mut recorder = Recorder::default();
        let mut ctx =
            ParseContext::new(game("01.00"), env, ParseMode::LowMem).with_sink(&mut recorder);
        ctx.parse_reader(DOC.as_bytes()).unwrap();
        assert!(ctx.patches().is_empty());
        assert!(ctx.metadata().is_empty());
        drop(ctx);

        // both patches have a 01.00 variant
        assert_eq!(recorder.metadata.len(), 2);
        assert!(recorder.metadata[0].enabled);
        assert!(!recorder.metadata[1].enabled);

        assert_eq!(recorder.entries.len(), 2);
        assert!(recorder.entries.iter().all(|(h, _)| *h == hash));
        assert_eq!(recorder.entries[0].1.params, vec!["bytes32", "0x1000", "5"]);
    }

    const DUPLICATE_VERSIONS: &str = r#"patch:
  title: "Twice"
  app_bin: "EBOOT.BIN"
  app_ver: [ "01.00", "01.00" ]
  patches:
    - [ "bytes8", "0x10", "1" ]
"#;

    type Forwarded = (Vec<PatchMetadata>, Vec<(u32, PatchEntry)>);

    fn low_mem_entries(states: &[(usize, bool)]) -> Forwarded {
        let hashes: Vec<u32> = metadata(DUPLICATE_VERSIONS).iter().map(|m| m.hash).collect();
        let env = ParseEnvironment::new()
            .with_states(
                states
                    .iter()
                    .map(|&(slot, enabled)| PatchState::new(hashes[slot], enabled))
                    .collect(),
            )
            .with_process_binary("EBOOT.BIN");

        let mut recorder = Recorder::default();
        ParseContext::new(game("01.00"), env, ParseMode::LowMem)
            .with_sink(&mut recorder)
            .parse_reader(DUPLICATE_VERSIONS.as_bytes())
            .unwrap();
        (recorder.metadata, recorder.entries)
    }

    #[test]
    fn test_low_mem_follows_last_emitted_variant() {
        let (meta, entries) = low_mem_entries(&[(0, true), (1, false)]);
        let flags: Vec<bool> = meta.iter().map(|m| m.enabled).collect();
        assert_eq!(flags, vec![true, false]);
        assert!(entries.is_empty());

        let (meta, entries) = low_mem_entries(&[(0, false), (1, true)]);
        assert_eq!(meta.len(), 2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, meta[1].hash);
    }

    #[test]
    fn test_low_mem_without_enabled_state_forwards_nothing() {
        let env = ParseEnvironment::new().with_process_binary("EBOOT.BIN");
        let mut recorder = Recorder::default();
        ParseContext::new(game("01.00"), env, ParseMode::LowMem)
            .with_sink(&mut recorder)
            .parse_reader(DOC.as_bytes())
            .unwrap();
        assert_eq!(recorder.metadata.len(), 2);
        assert!(recorder.entries.is_empty());
    }

    #[test]
    fn test_document_without_patches() {
        let ctx = parse(
            "titleid: \"NPUB00001\"\n# nothing here\n",
            ParseMode::Metadata,
            ParseEnvironment::new(),
            "01.00",
        );
        assert_eq!(ctx.title_ids(), &["NPUB00001"]);
        assert!(ctx.metadata().is_empty());
        assert!(metadata("").is_empty());
    }

    #[test]
    fn test_untitled_patch_is_discarded_without_numbering() {
        let text = r#"patch:
  name: "orphan"
  app_ver: "01.00"
  patches:
    - [ "bytes8", "0", "1" ]
patch:
  title: "Real"
"#;
        let meta = metadata(text);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].patch_number, 0);
        assert_eq!(meta[0].name, None);
        assert_eq!(meta[0].app_ver, None);
    }

    #[test]
    fn test_keys_match_by_prefix_only() {
        let text = "patch:\n  title: \"patches: app_ver: name:\"\n  app_ver: \"01.00\"\n";
        let meta = metadata(text);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].title.as_deref(), Some("patches: app_ver: name:"));
        assert_eq!(meta[0].name, None);
        assert_eq!(meta[0].app_ver.as_deref(), Some("01.00"));
    }

    #[test]
    fn test_crlf_and_indented_patch_marker() {
        let text = "patch:\r\n  title: \"A\"\r\n  patch:\r\n  title: \"B\"\r\n";
        let meta = metadata(text);
        // an indented marker does not start a new patch
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].title.as_deref(), Some("B"));
        assert_eq!(meta[0].app_ver, None);
        assert!(!meta[0].matches_game);
    }

    #[test]
    fn test_entries_outside_patches_list_are_ignored() {
        let text = r#"patch:
  title: "A"
  app_ver: "01.00"
  - [ "bytes8", "0", "1" ]
"#;
        let patches = parse(text, ParseMode::All, ParseEnvironment::new(), "01.00").into_patches();
        assert_eq!(patches.len(), 1);
        assert!(patches[0].entries.is_empty());
    }

    #[test]
    fn test_prx_flag() {
        let text = "patch:\n  title: \"A\"\n  app_bin: \"libfoo.sprx\"\n";
        assert!(metadata(text)[0].is_prx);
    }

    #[test]
    fn test_reserve_doubling_grows_geometrically() {
        let mut items: Vec<u8> = Vec::new();
        assert!(reserve_doubling(&mut items, 8));
        assert!(items.capacity() >= 8);
        let cap = items.capacity();
        items.resize(cap, 0);
        assert!(reserve_doubling(&mut items, 8));
        assert!(items.capacity() >= cap * 2);
    }
}
