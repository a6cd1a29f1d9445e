//! Path aliases of the form `@name/rest/of/path`.
//!
//! The hosting application registers roots such as `@runtime`; configuration
//! values may then refer to paths symbolically. Plain paths pass through
//! untouched.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Alias registry. `@runtime` is pre-registered and points at the OS temp
/// directory until the host overrides it.
#[derive(Debug, Clone)]
pub struct Aliases {
    roots: HashMap<String, PathBuf>,
}

impl Aliases {
    /// An empty registry, without `@runtime`.
    pub fn empty() -> Self {
        Self {
            roots: HashMap::new(),
        }
    }

    /// Register (or replace) an alias. A missing leading `@` is added.
    pub fn set(&mut self, alias: &str, path: impl Into<PathBuf>) {
        let alias = if alias.starts_with('@') {
            alias.trim_end_matches('/').to_string()
        } else {
            format!("@{}", alias.trim_end_matches('/'))
        };
        self.roots.insert(alias, path.into());
    }

    /// Resolve `path` into a filesystem path.
    ///
    /// Returns `None` when `path` starts with `@` but no registered alias is a
    /// prefix of it. The longest matching alias wins, so `@app/web` can
    /// shadow `@app`.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        if !path.starts_with('@') {
            return Some(PathBuf::from(path));
        }

        let (alias, root) = self
            .roots
            .iter()
            .filter(|(alias, _)| {
                path == alias.as_str()
                    || path
                        .strip_prefix(alias.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(alias, _)| alias.len())?;

        let rest = path[alias.len()..].trim_start_matches('/');
        if rest.is_empty() {
            Some(root.clone())
        } else {
            Some(root.join(rest))
        }
    }
}

impl Default for Aliases {
    fn default() -> Self {
        let mut aliases = Self::empty();
        aliases.set("@runtime", env::temp_dir());
        aliases
    }
}
