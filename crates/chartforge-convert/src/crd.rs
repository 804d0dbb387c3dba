//! CRD conversion-webhook patch resolution
//!
//! CRD base files are named `<group>.<domain>_<plural>.yaml` by the manifest
//! generator, and conversion-webhook patches live next to them as
//! `crd/patches/webhook_in_[<group>_]<plural>.yaml`. Resolution prefers a
//! patch naming both group and kind, falls back to one naming only the kind,
//! and otherwise reports no patch.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// Key that opens the conversion subtree of a patch
pub const CONVERSION_KEY: &str = "conversion:";

/// Group and kind encoded in a CRD base filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdIdentity {
    /// First label of the API group (`batch` for `batch.example.com`)
    pub group: String,
    /// Plural resource name, as used in the filename
    pub kind: String,
}

impl CrdIdentity {
    /// Parse `<group>.<rest>_<kind>.yaml`.
    ///
    /// Filenames without a `_` segment yield an empty group and kind.
    pub fn from_file_name(file_name: &str) -> Self {
        let parts: Vec<&str> = file_name.split('_').collect();
        if parts.len() < 2 {
            return Self {
                group: String::new(),
                kind: String::new(),
            };
        }

        let group = parts[0].split('.').next().unwrap_or_default();
        let kind = parts[1].strip_suffix(".yaml").unwrap_or(parts[1]);

        Self {
            group: group.to_string(),
            kind: kind.to_string(),
        }
    }

    /// A filename that did not carry a kind cannot match any patch
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty()
    }
}

/// A located conversion-webhook patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdPatch {
    pub path: PathBuf,
    pub content: String,
}

impl CrdPatch {
    /// The patch from the first `conversion:` key to end of file, or `None`
    /// when the key is absent. An empty fragment is never returned.
    pub fn conversion(&self) -> Option<ConversionFragment<'_>> {
        let start = self.content.find(CONVERSION_KEY)?;
        let column = start - self.content[..start].rfind('\n').map_or(0, |i| i + 1);
        let text = self.content[start..].trim_end();

        Some(ConversionFragment { text, column })
    }
}

/// The `conversion:` subtree of a patch, with the column its key sat at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionFragment<'a> {
    pub text: &'a str,
    pub column: usize,
}

impl ConversionFragment<'_> {
    /// Fragment lines with the patch's own indentation removed, so that the
    /// `conversion:` key sits at column zero
    pub fn dedented_lines(&self) -> Vec<String> {
        self.text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    return line.to_string();
                }
                let leading = line.len() - line.trim_start_matches(' ').len();
                line[leading.min(self.column)..].to_string()
            })
            .collect()
    }
}

/// Looks up conversion-webhook patches in a patches directory
#[derive(Debug, Clone)]
pub struct PatchResolver {
    patches_dir: PathBuf,
}

impl PatchResolver {
    pub fn new(patches_dir: impl Into<PathBuf>) -> Self {
        Self {
            patches_dir: patches_dir.into(),
        }
    }

    pub fn patches_dir(&self) -> &Path {
        &self.patches_dir
    }

    /// Resolve the patch for a CRD.
    ///
    /// The group-and-kind pattern wins outright whenever it matches anything;
    /// the kind-only pattern is consulted only when it matched nothing. Among
    /// several matches the lexicographically first path is used.
    pub fn resolve(&self, crd: &CrdIdentity) -> Result<Option<CrdPatch>> {
        if crd.is_empty() {
            return Ok(None);
        }

        let group_kind = format!(
            "webhook_*{}*{}*.yaml",
            glob::Pattern::escape(&crd.group),
            glob::Pattern::escape(&crd.kind)
        );
        let mut matches = self.glob(&group_kind)?;

        if matches.is_empty() {
            let kind_only = format!("webhook_*{}*.yaml", glob::Pattern::escape(&crd.kind));
            matches = self.glob(&kind_only)?;
        }

        let Some(path) = matches.into_iter().next() else {
            tracing::debug!(group = %crd.group, kind = %crd.kind, "no conversion patch found");
            return Ok(None);
        };

        let bytes = fs::read(&path).map_err(|e| ConvertError::read(&path, e))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        tracing::debug!(
            group = %crd.group,
            kind = %crd.kind,
            patch = %path.display(),
            "resolved conversion patch"
        );

        Ok(Some(CrdPatch { path, content }))
    }

    fn glob(&self, file_pattern: &str) -> Result<Vec<PathBuf>> {
        let dir = glob::Pattern::escape(&self.patches_dir.to_string_lossy());
        let pattern = format!("{}/{}", dir, file_pattern);

        let entries = glob::glob(&pattern).map_err(|source| ConvertError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut paths = entries
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|source| ConvertError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
        paths.sort();

        Ok(paths)
    }
}
