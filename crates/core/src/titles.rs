use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::sanitize::sanitize_filename;

#[derive(Default)]
struct TitleSets {
    in_flight: HashSet<String>,
    downloaded: HashSet<String>,
}

/// Titles claimed or downloaded during one run, shared by every task of that run.
///
/// Titles are keyed by the file name they are written to, so two titles that
/// sanitize to the same name are the same entry. A title is claimed before any
/// network transfer starts, so two tasks can never write the same file
/// concurrently. Only successful downloads end up in the downloaded set.
#[derive(Clone, Default)]
pub struct DownloadedTitles {
    inner: Arc<Mutex<TitleSets>>,
}

impl DownloadedTitles {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TitleSets> {
        self.inner.lock().expect("DownloadedTitles poisoned")
    }

    /// Atomically check and reserve `title`. Returns `false` when another task
    /// already holds or finished it, or one with the same file name.
    pub fn claim(&self, title: &str) -> bool {
        let key = sanitize_filename(title);
        let mut sets = self.lock();
        if sets.downloaded.contains(&key) || sets.in_flight.contains(&key) {
            return false;
        }
        sets.in_flight.insert(key)
    }

    pub fn complete(&self, title: &str) {
        let key = sanitize_filename(title);
        let mut sets = self.lock();
        sets.in_flight.remove(&key);
        sets.downloaded.insert(key);
    }

    pub fn release(&self, title: &str) {
        self.lock().in_flight.remove(&sanitize_filename(title));
    }

    pub fn contains(&self, title: &str) -> bool {
        self.lock().downloaded.contains(&sanitize_filename(title))
    }

    pub fn len(&self) -> usize {
        self.lock().downloaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
