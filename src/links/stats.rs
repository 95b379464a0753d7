/// Counters of one attach run, fixed once the run returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachStats {
    processed_audio: usize,
    created_lyrics: usize,
    created_covers: usize,
    skipped: usize,
    errors: usize,
}

impl AttachStats {
    #[must_use]
    pub const fn processed_audio(&self) -> usize {
        self.processed_audio
    }
    #[must_use]
    pub const fn created_lyrics(&self) -> usize {
        self.created_lyrics
    }
    #[must_use]
    pub const fn created_covers(&self) -> usize {
        self.created_covers
    }
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
    #[must_use]
    pub const fn errors(&self) -> usize {
        self.errors
    }
}

/// Counters of one cleanup run, fixed once the run returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    removed_broken_links: usize,
    skipped: usize,
    errors: usize,
}

impl CleanupStats {
    #[must_use]
    pub const fn removed_broken_links(&self) -> usize {
        self.removed_broken_links
    }
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
    #[must_use]
    pub const fn errors(&self) -> usize {
        self.errors
    }
}

/// Running counters while an attach run is in progress
#[derive(Debug, Default)]
pub(crate) struct AttachTally {
    processed_audio: usize,
    created_lyrics: usize,
    created_covers: usize,
    skipped: usize,
    errors: usize,
}

impl AttachTally {
    pub const fn add_audio(&mut self) {
        self.processed_audio += 1;
    }
    pub const fn add_lyrics(&mut self) {
        self.created_lyrics += 1;
    }
    pub const fn add_cover(&mut self) {
        self.created_covers += 1;
    }
    pub const fn add_skip(&mut self) {
        self.skipped += 1;
    }
    pub const fn add_error(&mut self) {
        self.errors += 1;
    }
    pub const fn finish(self) -> AttachStats {
        AttachStats {
            processed_audio: self.processed_audio,
            created_lyrics: self.created_lyrics,
            created_covers: self.created_covers,
            skipped: self.skipped,
            errors: self.errors,
        }
    }
}

/// Running counters while a cleanup run is in progress
#[derive(Debug, Default)]
pub(crate) struct CleanupTally {
    removed_broken_links: usize,
    skipped: usize,
    errors: usize,
}

impl CleanupTally {
    pub const fn add_removed(&mut self) {
        self.removed_broken_links += 1;
    }
    pub const fn add_skip(&mut self) {
        self.skipped += 1;
    }
    pub const fn add_error(&mut self) {
        self.errors += 1;
    }
    pub const fn finish(self) -> CleanupStats {
        CleanupStats {
            removed_broken_links: self.removed_broken_links,
            skipped: self.skipped,
            errors: self.errors,
        }
    }
}
