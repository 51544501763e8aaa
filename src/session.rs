// Session state for the interactive shell: the current remote directory
// and the entries seen so far, which drive argument completion.

use crate::api::{DirEntry, EntryKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Path of the root directory, where every session starts.
pub const ROOT: &str = "/";

/// Join `arg` onto `base` the way a shell would: an absolute `arg` replaces
/// the base, anything else is appended after a single separator.
/// No `.`/`..` resolution happens here.
pub fn join_path(base: &str, arg: &str) -> String {
    if arg.starts_with('/') {
        arg.to_string()
    } else if base.ends_with('/') {
        format!("{base}{arg}")
    } else {
        format!("{base}/{arg}")
    }
}

/// Entries last observed per parent path.
///
/// The line editor's completer holds its own handle on the cache and only
/// gets `&self`, so the map lives in a `RefCell` behind an `Rc`. The shell
/// is single threaded.
#[derive(Debug, Default)]
pub struct DirCache {
    entries: RefCell<HashMap<String, Vec<DirEntry>>>,
}

impl DirCache {
    /// Replace whatever is known about `parent` with a fresh listing.
    pub fn record(&self, parent: &str, entries: &[DirEntry]) {
        self.entries
            .borrow_mut()
            .insert(parent.to_string(), entries.to_vec());
    }

    /// Names of the known entries of `parent` with the given kind, or `None`
    /// when `parent` has never been listed (or was invalidated).
    pub fn names(&self, parent: &str, kind: EntryKind) -> Option<Vec<String>> {
        self.entries.borrow().get(parent).map(|entries| {
            entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.name.clone())
                .collect()
        })
    }

    pub fn invalidate(&self, parent: &str) {
        self.entries.borrow_mut().remove(parent);
    }
}

/// State carried from one command to the next.
#[derive(Debug)]
pub struct Session {
    current_directory: String,
    known: Rc<DirCache>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            current_directory: ROOT.to_string(),
            known: Rc::default(),
        }
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    /// Path `cd <arg>` would move to.
    pub fn resolve(&self, arg: &str) -> String {
        join_path(&self.current_directory, arg)
    }

    /// Path of `name` inside the current directory, as the server expects
    /// it for child resources (`{cwd}/{name}`).
    pub fn child_path(&self, name: &str) -> String {
        format!("{}/{}", self.current_directory, name)
    }

    /// Move to `path`. Callers only do this after the server confirmed it.
    pub fn set_current_directory(&mut self, path: String) {
        self.current_directory = path;
    }

    pub fn known(&self) -> &DirCache {
        &self.known
    }

    /// Handle on the cache that outlives a borrow of the session.
    pub fn shared_known(&self) -> Rc<DirCache> {
        Rc::clone(&self.known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: EntryKind) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn join_appends_relative_paths() {
        assert_eq!(join_path("/", "docs"), "/docs");
        assert_eq!(join_path("/docs", "img"), "/docs/img");
        assert_eq!(join_path("/docs/", "img"), "/docs/img");
    }

    #[test]
    fn join_does_not_resolve_dots() {
        assert_eq!(join_path("/docs", ".."), "/docs/..");
        assert_eq!(join_path("/docs", "./a"), "/docs/./a");
    }

    #[test]
    fn join_absolute_replaces_base() {
        assert_eq!(join_path("/docs/img", "/tmp"), "/tmp");
    }

    #[test]
    fn session_starts_at_root() {
        let session = Session::new();
        assert_eq!(session.current_directory(), "/");
        assert_eq!(session.resolve("a"), "/a");
        assert_eq!(session.child_path("a"), "//a");
    }

    #[test]
    fn cache_is_keyed_by_parent() {
        let cache = DirCache::default();
        assert!(cache.names("/", EntryKind::Directory).is_none());

        cache.record(
            "/",
            &[
                entry("docs", EntryKind::Directory),
                entry("a.txt", EntryKind::File),
                entry("src", EntryKind::Directory),
            ],
        );
        cache.record("/docs", &[entry("img", EntryKind::Directory)]);

        assert_eq!(
            cache.names("/", EntryKind::Directory).unwrap(),
            vec!["docs", "src"]
        );
        assert_eq!(cache.names("/", EntryKind::File).unwrap(), vec!["a.txt"]);
        assert_eq!(
            cache.names("/docs", EntryKind::Directory).unwrap(),
            vec!["img"]
        );

        cache.invalidate("/");
        assert!(cache.names("/", EntryKind::Directory).is_none());
        assert!(cache.names("/docs", EntryKind::Directory).is_some());
    }

    #[test]
    fn record_replaces_previous_listing() {
        let cache = DirCache::default();
        cache.record("/", &[entry("old", EntryKind::Directory)]);
        cache.record("/", &[]);
        assert_eq!(cache.names("/", EntryKind::Directory).unwrap(), Vec::<String>::new());
    }
}
