//! Entry point for page lookups.
//!
//! A [`Wiki`] owns the root page built from the configured directories and
//! the module loader shared by every page under it.

use crate::config::{Config, SearchConfig};
use crate::error::{Error, Result};
use crate::fuzzy::{suggest, FuzzyMatcher};
use crate::loader::Loader;
use crate::normalize::split_query;
use crate::page::{DirectoryPage, MergedPage, Page};
use crate::parser::PageStyle;
use crate::search::{OnNotFound, SearchOptions};
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

/// A page found for a query, ready to render
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Names consumed on the way to the page
    pub path: Vec<String>,
    pub page: Page,
    /// Text of the page
    pub text: String,
    /// Style of the closest function page on the path
    pub style: PageStyle,
}

/// A page whose text cannot be produced
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Dotted path from the root
    pub path: String,
    pub location: Option<PathBuf>,
    pub error: String,
}

/// Outcome of [`Wiki::doctor`]
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub visited: usize,
    pub problems: Vec<Problem>,
}

impl DoctorReport {
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }
}

#[derive(Debug)]
pub struct Wiki {
    root: Page,
    loader: Rc<Loader>,
    search: SearchConfig,
}

impl Wiki {
    /// Build the page tree for a validated configuration
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let loader = Rc::new(Loader::new()?.with_ignore(&config.wiki.ignore)?);
        let mut pages = Vec::new();
        for root in config.wiki.expanded_roots() {
            if !root.is_dir() {
                return Err(Error::PathNotFound(root));
            }
            tracing::debug!(root = %root.display(), "adding wiki root");
            pages.push(Page::from(DirectoryPage::new(root, Rc::clone(&loader))));
        }

        let root = match pages.len() {
            1 => pages.remove(0),
            _ => MergedPage::new(pages).into(),
        };

        Ok(Self {
            root,
            loader,
            search: config.search.clone(),
        })
    }

    pub fn root(&self) -> &Page {
        &self.root
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Find the page named by `query`, without reading it
    pub fn find<S: AsRef<str>>(&self, query: &[S]) -> Result<(Vec<(String, Page)>, Page)> {
        let fragments = split_query(query);
        let matcher = FuzzyMatcher::new(self.search.max_distance);
        let pick = |known: &[String], sought: &str| matcher.choose(known, sought);

        let on_not_found: Option<OnNotFound<'_>> = if self.search.fuzzy { Some(&pick) } else { None };
        let options = SearchOptions {
            recursive: self.search.recursive,
            on_not_found,
        };

        let trail = self.root.trail(&fragments, options)?;
        if trail.len() < fragments.len() {
            let reached = trail.last().map_or(&self.root, |(_, page)| page);
            let known = reached.list().unwrap_or_default();
            return Err(Error::page_not_found(
                fragments.join(" "),
                suggest(&known, &fragments[trail.len()], self.search.max_suggestions),
            ));
        }

        let page = trail
            .last()
            .map_or_else(|| self.root.clone(), |(_, page)| page.clone());
        Ok((trail, page))
    }

    /// Find the page named by `query` and read it.
    ///
    /// A page that exists but cannot be read counts as not found.
    pub fn resolve<S: AsRef<str>>(&self, query: &[S]) -> Result<Resolved> {
        let (trail, page) = self.find(query)?;
        let text = match page.read() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page = %page.name(), error = %e, "resolved page is not readable");
                return Err(Error::page_not_found(split_query(query).join(" "), Vec::new()));
            }
        };

        let style = trail
            .iter()
            .rev()
            .find_map(|(_, page)| page.style())
            .cloned()
            .unwrap_or_default();

        Ok(Resolved {
            path: trail.into_iter().map(|(name, _)| name).collect(),
            page,
            text,
            style,
        })
    }

    /// Child names of the page named by `query`
    pub fn list<S: AsRef<str>>(&self, query: &[S]) -> Result<Vec<String>> {
        let (_, page) = self.find(query)?;
        page.list()
    }

    /// Visit every reachable page and collect the ones that cannot be read.
    ///
    /// Leaf and function pages are read; directories and modules have to list
    /// their children. Each module and directory is visited once, even when
    /// re-exports make it reachable from inside itself. Merged pages are
    /// checked through their constituents.
    pub fn doctor(&self) -> Result<DoctorReport> {
        let mut report = DoctorReport::default();
        let mut visited = HashSet::new();
        let mut stack: Vec<(Vec<String>, Page)> = vec![(Vec::new(), self.root.clone())];

        while let Some((path, page)) = stack.pop() {
            if let Some(merged) = page.as_merged() {
                for constituent in merged.pages().iter().rev() {
                    stack.push((path.clone(), constituent.clone()));
                }
                continue;
            }
            if let Some(key) = page.expansion_key() {
                if !visited.insert(key) {
                    continue;
                }
            }
            report.visited += 1;

            let checks_text = page.as_function().is_some() || !page.is_composite();
            if checks_text {
                if let Err(e) = page.read() {
                    report.problems.push(problem(&path, &page, e));
                }
            }

            let children = match page.children() {
                Ok(children) => children,
                Err(e) => {
                    report.problems.push(problem(&path, &page, e));
                    continue;
                }
            };

            // Reversed so that pages are reported in discovery order
            for (name, child) in children.iter().collect::<Vec<_>>().into_iter().rev() {
                let mut child_path = path.clone();
                child_path.push(name.to_string());
                stack.push((child_path, child.clone()));
            }
        }

        tracing::debug!(visited = report.visited, problems = report.problems.len(), "doctor done");
        Ok(report)
    }
}

fn problem(path: &[String], page: &Page, error: Error) -> Problem {
    Problem {
        path: path.join("."),
        location: page.location().map(|p| p.to_path_buf()),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(roots: &[&std::path::Path]) -> Config {
        let mut config = Config::default();
        config.wiki.roots = roots.iter().map(|r| r.to_path_buf()).collect();
        config
    }

    fn sample() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("git.py"),
            "@style('monokai')\ndef commit():\n    amend = 'git commit --amend'\n    return 'git commit'\n\nbroken = missing\n",
        )
        .unwrap();
        fs::write(dir.path().join("docker.md"), "docker run").unwrap();
        dir
    }

    #[test]
    fn test_open_requires_existing_root() {
        let result = Wiki::open(&config(&[std::path::Path::new("/nonexistent/wiki")]));
        assert!(matches!(result, Err(Error::PathNotFound(_))));
        assert!(Wiki::open(&Config::default()).is_err());
    }

    #[test]
    fn test_resolve_reads_page() {
        let dir = sample();
        let wiki = Wiki::open(&config(&[dir.path()])).unwrap();
        let resolved = wiki.resolve(&["git", "commit"]).unwrap();
        assert_eq!(resolved.path, vec!["git", "commit"]);
        assert_eq!(resolved.text, "git commit");
        assert_eq!(resolved.style.default.as_deref(), Some("monokai"));
    }

    #[test]
    fn test_resolve_inherits_function_style() {
        let dir = sample();
        let wiki = Wiki::open(&config(&[dir.path()])).unwrap();
        let resolved = wiki.resolve(&["git commit amend"]).unwrap();
        assert_eq!(resolved.text, "git commit --amend");
        assert_eq!(resolved.style.default.as_deref(), Some("monokai"));
    }

    #[test]
    fn test_resolve_fuzzy() {
        let dir = sample();
        let wiki = Wiki::open(&config(&[dir.path()])).unwrap();
        let resolved = wiki.resolve(&["dokcer"]).unwrap();
        assert_eq!(resolved.path, vec!["docker"]);
        assert_eq!(resolved.text, "docker run");
    }

    #[test]
    fn test_resolve_strict_reports_suggestions() {
        let dir = sample();
        let mut cfg = config(&[dir.path()]);
        cfg.merge_cli(vec![], true, false);
        let wiki = Wiki::open(&cfg).unwrap();

        match wiki.resolve(&["gti"]) {
            Err(Error::PageNotFound { query, suggestions }) => {
                assert_eq!(query, "gti");
                assert_eq!(suggestions, vec!["git"]);
            }
            other => panic!("expected PageNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_page_is_not_found() {
        let dir = sample();
        let wiki = Wiki::open(&config(&[dir.path()])).unwrap();
        assert!(matches!(
            wiki.resolve(&["git", "broken"]),
            Err(Error::PageNotFound { .. })
        ));
    }

    #[test]
    fn test_several_roots_are_merged() {
        let first = sample();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("docker.md"), "docker ps").unwrap();

        let wiki = Wiki::open(&config(&[first.path(), second.path()])).unwrap();
        let resolved = wiki.resolve(&["docker"]).unwrap();
        assert_eq!(resolved.text, "docker run\n\ndocker ps");
    }

    #[test]
    fn test_list() {
        let dir = sample();
        let wiki = Wiki::open(&config(&[dir.path()])).unwrap();
        let empty: [&str; 0] = [];
        assert_eq!(wiki.list(&empty).unwrap(), vec!["docker", "git"]);
        assert_eq!(wiki.list(&["git"]).unwrap(), vec!["commit", "broken"]);
    }

    #[test]
    fn test_doctor_reports_unreadable() {
        let dir = sample();
        let wiki = Wiki::open(&config(&[dir.path()])).unwrap();
        let report = wiki.doctor().unwrap();

        assert!(!report.is_healthy());
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].path, "git.broken");
        assert!(report.problems[0].error.contains("missing"));
        // root, docker, git, commit, amend, commit's default, broken
        assert_eq!(report.visited, 7);
    }

    #[test]
    fn test_doctor_visits_mutually_imported_modules_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "from . import b\nva = 'a'\n").unwrap();
        fs::write(dir.path().join("b.py"), "from . import a\nvb = 'b'\n").unwrap();
        let wiki = Wiki::open(&config(&[dir.path()])).unwrap();

        let report = wiki.doctor().unwrap();
        assert!(report.is_healthy());
        // root, a, va, b, vb
        assert_eq!(report.visited, 5);
        assert!(wiki.resolve(&["nothere"]).is_err());
    }
}
