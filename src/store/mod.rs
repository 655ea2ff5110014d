//! Flat-file JSON persistence.
//!
//! Each store is a single on-disk JSON document holding one top-level object.
//! The whole document is read on every access and rewritten on every
//! mutation; there is no in-memory cache, so a fresh read always reflects the
//! last completed write.

mod antilink;
mod group;
mod json;

pub use antilink::{AntiLinkStore, WARNING_WINDOW_MS};
pub use group::{ActivePoll, ActiveQuiz, GroupEvent, GroupRecord, GroupStore};
pub use json::JsonStore;

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// A unique file path under the system temp dir for one test.
    pub(crate) fn temp_path(tag: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "warden-test-{}-{}-{}.json",
            std::process::id(),
            tag,
            n
        ))
    }
}
