// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bootstrap resource loader.
//
// Resources are logical, slash-separated names relative to one root
// directory. Absolute names and `..` segments are rejected so a resource can
// never escape the root.

use std::path::{Component, Path, PathBuf};

use metaparser_core::BridgeError;
use metaparser_core::error::Result;

/// A resolved and read bootstrap script.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Logical name the resource was requested by.
    pub name: String,
    /// Filesystem path it resolved to.
    pub path: PathBuf,
    pub source: String,
}

impl Resource {
    /// Chunk name for interpreter error messages (`@` marks a file origin).
    pub fn chunk_name(&self) -> String {
        format!("@{}", self.name)
    }
}

/// Resolves logical resource names under a root directory.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    root: PathBuf,
}

impl ResourceLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Map a logical name to a file under the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.trim().is_empty() {
            return Err(bootstrap_err(name, "empty resource name"));
        }
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(bootstrap_err(name, "resource names must stay inside the resource root"));
        }
        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(bootstrap_err(
                name,
                format!("not found under {}", self.root.display()),
            ));
        }
        Ok(path)
    }

    /// Resolve and read a resource.
    pub fn load(&self, name: &str) -> Result<Resource> {
        let path = self.resolve(name)?;
        let source = std::fs::read_to_string(&path).map_err(|e| bootstrap_err(name, e.to_string()))?;
        tracing::debug!(resource = name, path = %path.display(), bytes = source.len(), "resource read");
        Ok(Resource {
            name: name.to_string(),
            path,
            source,
        })
    }
}

fn bootstrap_err(resource: &str, reason: impl Into<String>) -> BridgeError {
    BridgeError::Bootstrap {
        resource: resource.to_string(),
        reason: reason.into(),
    }
}
