// Name resolution over the page tree
//
// A query is a list of name fragments. Each fragment is looked up among the
// children of the page reached so far: first by normalized name, then among
// all descendants when recursive search is on, then through the caller's
// on-not-found callback.

use crate::error::Result;
use crate::normalize::{normalize, split_query};
use crate::page::{Children, MergedPage, Page};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Picks a replacement among the known child names for a name that was not
/// found. Receives the known names and the normalized sought name.
pub type OnNotFound<'a> = &'a dyn Fn(&[String], &str) -> Option<String>;

/// How `deep_search` behaves when a fragment has no direct match
#[derive(Clone, Copy, Default)]
pub struct SearchOptions<'a> {
    /// Look for the fragment among all descendants
    pub recursive: bool,
    /// Fallback for names that are still not found
    pub on_not_found: Option<OnNotFound<'a>>,
}

impl<'a> SearchOptions<'a> {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            on_not_found: None,
        }
    }

    pub fn with_fallback(mut self, on_not_found: OnNotFound<'a>) -> Self {
        self.on_not_found = Some(on_not_found);
        self
    }
}

impl fmt::Debug for SearchOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("recursive", &self.recursive)
            .field("on_not_found", &self.on_not_found.is_some())
            .finish()
    }
}

impl Page {
    /// Find an immediate child by name
    pub fn search(&self, name: &str, on_not_found: Option<OnNotFound<'_>>) -> Result<Option<Page>> {
        let children = self.children()?;
        let sought = normalize(name);

        if let Some(page) = children.get(&sought) {
            return Ok(Some(page.clone()));
        }
        Ok(on_not_found.and_then(|pick| pick_fallback(&children, &sought, pick).map(|(_, page)| page)))
    }

    /// Resolve a path of name fragments.
    ///
    /// Fragments may themselves contain spaces or dots. Returns the names
    /// actually consumed together with the deepest page reached; when nothing
    /// matched, the names are empty and the page is `self`.
    pub fn deep_search<S: AsRef<str>>(
        &self,
        path: &[S],
        options: SearchOptions<'_>,
    ) -> Result<(Vec<String>, Page)> {
        let trail = self.trail(path, options)?;
        let found = trail
            .last()
            .map_or_else(|| self.clone(), |(_, page)| page.clone());
        let taken = trail.into_iter().map(|(name, _)| name).collect();
        Ok((taken, found))
    }

    /// Like `deep_search`, but keeps every page passed on the way down
    pub fn trail<S: AsRef<str>>(
        &self,
        path: &[S],
        options: SearchOptions<'_>,
    ) -> Result<Vec<(String, Page)>> {
        let mut trail = Vec::new();
        descend(self, &split_query(path), options, &mut trail)?;
        Ok(trail)
    }
}

fn descend(
    page: &Page,
    path: &[String],
    options: SearchOptions<'_>,
    trail: &mut Vec<(String, Page)>,
) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(());
    };

    let children = page.children()?;
    let sought = normalize(first);

    let found = match children.get(&sought) {
        Some(child) => Some((first.clone(), child.clone())),
        None => {
            let deeper = if options.recursive {
                find_descendant(&children, &sought)
            } else {
                None
            };
            deeper.or_else(|| {
                options
                    .on_not_found
                    .and_then(|pick| pick_fallback(&children, &sought, pick))
            })
        }
    };

    let Some((name, child)) = found else {
        tracing::debug!(page = %page.name(), name = %first, "no match");
        return Ok(());
    };

    trail.push((name, child.clone()));
    descend(&child, rest, options, trail)
}

/// Look for `sought` one level deeper at a time, merging each level.
///
/// Modules and directories already expanded are not expanded again.
fn find_descendant(children: &Children, sought: &str) -> Option<(String, Page)> {
    let mut expanded = HashSet::new();
    let mut level = unexpanded(children.pages(), &mut expanded);
    while !level.is_empty() {
        let flattened = Children::collect(MergedPage::new(level).traverse());
        if let Some(page) = flattened.get(sought) {
            tracing::debug!(name = %sought, "found among descendants");
            return Some((sought.to_string(), page.clone()));
        }
        level = unexpanded(flattened.into_pages(), &mut expanded);
    }
    None
}

/// Split merges apart and drop the sources seen on an earlier level
fn unexpanded(pages: Vec<Page>, expanded: &mut HashSet<PathBuf>) -> Vec<Page> {
    pages
        .into_iter()
        .flat_map(|page| match page.as_merged() {
            Some(merged) => merged.pages().to_vec(),
            None => vec![page],
        })
        .filter(|page| match page.expansion_key() {
            Some(key) => expanded.insert(key),
            None => true,
        })
        .collect()
}

fn pick_fallback(children: &Children, sought: &str, pick: OnNotFound<'_>) -> Option<(String, Page)> {
    if children.is_empty() {
        return None;
    }
    let choice = pick(&children.names(), sought)?;
    let page = children.get(&normalize(&choice))?;
    tracing::debug!(sought = %sought, chosen = %choice, "using fallback match");
    Some((choice, page.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Loader;
    use crate::page::DirectoryPage;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// root/tools/vcs/git.md, root/notes.md, root/pages.py
    fn wiki() -> TempDir {
        let dir = TempDir::new().unwrap();
        let vcs = dir.path().join("tools").join("vcs");
        fs::create_dir_all(&vcs).unwrap();
        fs::write(vcs.join("git.md"), "git cheats").unwrap();
        fs::write(dir.path().join("notes.md"), "notes").unwrap();
        fs::write(
            dir.path().join("pages.py"),
            "def health():\n    diet = 'eat'\n    sleep = 'rest'\n",
        )
        .unwrap();
        dir
    }

    fn root(dir: &Path) -> Page {
        DirectoryPage::new(dir, Rc::new(Loader::new().unwrap())).into()
    }

    #[test]
    fn test_search_direct_child() {
        let dir = wiki();
        let page = root(dir.path()).search("Notes", None).unwrap().unwrap();
        assert_eq!(page.read().unwrap(), "notes");
        assert!(root(dir.path()).search("git", None).unwrap().is_none());
    }

    #[test]
    fn test_search_with_callback() {
        let dir = wiki();
        let pick = |known: &[String], sought: &str| {
            assert_eq!(sought, "note");
            known.iter().find(|k| k.starts_with(sought)).cloned()
        };
        let page = root(dir.path()).search("note", Some(&pick)).unwrap().unwrap();
        assert_eq!(page.name(), "notes");
    }

    #[test]
    fn test_deep_search_descends() {
        let dir = wiki();
        let (taken, page) = root(dir.path())
            .deep_search(&["tools vcs", "git"], SearchOptions::default())
            .unwrap();
        assert_eq!(taken, vec!["tools", "vcs", "git"]);
        assert_eq!(page.read().unwrap(), "git cheats");
    }

    #[test]
    fn test_deep_search_dotted_fragment() {
        let dir = wiki();
        let (taken, page) = root(dir.path())
            .deep_search(&["health.diet"], SearchOptions::default())
            .unwrap();
        assert_eq!(taken, vec!["health", "diet"]);
        assert_eq!(page.read().unwrap(), "eat");
    }

    #[test]
    fn test_deep_search_stops_at_last_match() {
        let dir = wiki();
        let (taken, page) = root(dir.path())
            .deep_search(&["tools", "missing"], SearchOptions::default())
            .unwrap();
        assert_eq!(taken, vec!["tools"]);
        assert_eq!(page.name(), "tools");
    }

    #[test]
    fn test_deep_search_not_found_returns_self() {
        let dir = wiki();
        let (taken, page) = root(dir.path())
            .deep_search(&["git"], SearchOptions::default())
            .unwrap();
        assert!(taken.is_empty());
        assert_eq!(page.name(), root(dir.path()).name());
    }

    #[test]
    fn test_recursive_finds_deep_page() {
        let dir = wiki();
        let (taken, page) = root(dir.path())
            .deep_search(&["git"], SearchOptions::recursive())
            .unwrap();
        assert_eq!(taken, vec!["git"]);
        assert_eq!(page.read().unwrap(), "git cheats");
    }

    #[test]
    fn test_recursive_continues_below_match() {
        let dir = wiki();
        let (taken, page) = root(dir.path())
            .deep_search(&["vcs", "git"], SearchOptions::recursive())
            .unwrap();
        assert_eq!(taken, vec!["vcs", "git"]);
        assert_eq!(page.read().unwrap(), "git cheats");
    }

    #[test]
    fn test_recursive_search_over_mutual_module_imports() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "from . import b\nva = 'a'\n").unwrap();
        fs::write(dir.path().join("b.py"), "from . import a\nvb = 'b'\n").unwrap();

        let (taken, _) = root(dir.path())
            .deep_search(&["nothere"], SearchOptions::recursive())
            .unwrap();
        assert!(taken.is_empty());

        let (taken, page) = root(dir.path())
            .deep_search(&["a", "vb"], SearchOptions::recursive())
            .unwrap();
        assert_eq!(taken, vec!["a", "vb"]);
        assert_eq!(page.read().unwrap(), "b");
    }

    #[test]
    fn test_fallback_used_after_recursion() {
        let dir = wiki();
        let calls = std::cell::Cell::new(0);
        let pick = |known: &[String], _: &str| {
            calls.set(calls.get() + 1);
            known.iter().find(|k| *k == "notes").cloned()
        };
        let options = SearchOptions::recursive().with_fallback(&pick);

        let (_, page) = root(dir.path()).deep_search(&["git"], options).unwrap();
        assert_eq!(page.name(), "git");
        assert_eq!(calls.get(), 0);

        let (taken, page) = root(dir.path()).deep_search(&["nots"], options).unwrap();
        assert_eq!(taken, vec!["notes"]);
        assert_eq!(page.read().unwrap(), "notes");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_empty_path_returns_self() {
        let dir = wiki();
        let empty: [&str; 0] = [];
        let (taken, page) = root(dir.path())
            .deep_search(&empty, SearchOptions::recursive())
            .unwrap();
        assert!(taken.is_empty());
        assert!(page.is_composite());
    }
}
