//! Chart template generation
//!
//! Walks the manifest categories, rewrites each generated manifest and writes
//! it under `<chart_dir>/chart/templates`. The generated manifests are the only
//! input: templates already in the chart are overwritten, never read back.

use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::category::ManifestCategory;
use crate::crd::{CrdIdentity, PatchResolver};
use crate::error::{ConvertError, Result};
use crate::rewriter::ManifestRewriter;
use crate::webhook::{WEBHOOK_MANIFEST, WebhookExtractor, WebhookSet};

/// Default directory of generated manifests
pub const DEFAULT_MANIFEST_DIR: &str = "config";

/// Default directory the chart is generated into
pub const DEFAULT_CHART_DIR: &str = "dist";

/// Location of CRD patches, relative to the manifest directory
pub const CRD_PATCHES_DIR: &str = "crd/patches";

/// Location of the chart templates, relative to the chart directory
pub const TEMPLATES_DIR: &str = "chart/templates";

/// Options for the converter
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Directory holding the generated manifests
    pub manifest_dir: PathBuf,
    /// Directory the chart lives in
    pub chart_dir: PathBuf,
    /// Project name used for resource prefixes and service names
    pub project_name: String,
    /// Only report what would be written
    pub dry_run: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            manifest_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            chart_dir: PathBuf::from(DEFAULT_CHART_DIR),
            project_name: String::new(),
            dry_run: false,
        }
    }
}

/// A chart template produced from one manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub category: ManifestCategory,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub content: String,
}

/// Rendered templates of one category
#[derive(Debug, Clone)]
pub struct CategoryRender {
    pub category: ManifestCategory,
    pub destination_dir: PathBuf,
    pub files: Vec<GeneratedFile>,
    /// Sources that are not part of the chart
    pub skipped: Vec<PathBuf>,
}

/// Result of a conversion
#[derive(Debug, Default)]
pub struct ConversionResult {
    /// Webhooks found in the generated webhook manifest
    pub webhooks: WebhookSet,
    /// Templates written (or, on a dry run, that would be written)
    pub generated_files: Vec<GeneratedFile>,
    /// Sources that were not turned into templates
    pub skipped_files: Vec<PathBuf>,
}

/// Generates chart templates from a project's manifests
pub struct ChartConverter {
    options: ConvertOptions,
    webhooks: WebhookExtractor,
    patches: PatchResolver,
    rewriter: ManifestRewriter,
}

impl ChartConverter {
    pub fn new(options: ConvertOptions) -> Result<Self> {
        if options.project_name.is_empty() {
            return Err(ConvertError::MissingProjectName);
        }

        Ok(Self {
            webhooks: WebhookExtractor::new(&options.project_name),
            patches: PatchResolver::new(options.manifest_dir.join(CRD_PATCHES_DIR)),
            rewriter: ManifestRewriter::new(options.project_name.clone()),
            options,
        })
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Directory chart templates are written to
    pub fn templates_dir(&self) -> PathBuf {
        self.options.chart_dir.join(TEMPLATES_DIR)
    }

    /// Extract webhooks and regenerate the templates of every category.
    ///
    /// Categories are written one after another; a failure aborts the run and
    /// leaves the templates of earlier categories on disk.
    pub fn convert(&self) -> Result<ConversionResult> {
        tracing::info!(
            "Generating Helm chart templates from {}",
            self.options.manifest_dir.display()
        );

        let mut result = ConversionResult {
            webhooks: self.extract_webhooks()?,
            ..Default::default()
        };

        for category in ManifestCategory::ALL {
            let Some(render) = self.render_category(category)? else {
                continue;
            };

            if !self.options.dry_run {
                write_category(&render)?;
            }

            result.generated_files.extend(render.files);
            result.skipped_files.extend(render.skipped);
        }

        Ok(result)
    }

    /// Webhooks declared in the generated webhook manifest
    pub fn extract_webhooks(&self) -> Result<WebhookSet> {
        self.webhooks
            .extract(&self.options.manifest_dir.join(WEBHOOK_MANIFEST))
    }

    /// Render every manifest of a category without writing anything.
    ///
    /// Returns `None` when the category has no source directory or no
    /// manifests in it.
    pub fn render_category(&self, category: ManifestCategory) -> Result<Option<CategoryRender>> {
        let source_dir = self.options.manifest_dir.join(category.source_dir());

        match fs::metadata(&source_dir) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(%category, "skipping {}: directory not found", source_dir.display());
                return Ok(None);
            }
            Err(e) => return Err(ConvertError::read(&source_dir, e)),
        }

        let sources = list_manifests(&source_dir)?;
        if sources.is_empty() {
            tracing::info!(%category, "skipping {}: no manifests", source_dir.display());
            return Ok(None);
        }

        let destination_dir = self.templates_dir().join(category.destination_dir());
        let mut render = CategoryRender {
            category,
            destination_dir,
            files: Vec::new(),
            skipped: Vec::new(),
        };

        for source in sources {
            match self.render_file(category, &source, &render.destination_dir)? {
                Some(file) => render.files.push(file),
                None => render.skipped.push(source),
            }
        }

        Ok(Some(render))
    }

    /// Render a single manifest. `None` means the file is not part of the chart.
    pub fn render_file(
        &self,
        category: ManifestCategory,
        source: &Path,
        destination_dir: &Path,
    ) -> Result<Option<GeneratedFile>> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let bytes = fs::read(source).map_err(|e| ConvertError::read(source, e))?;
        let content = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = content {
            tracing::warn!(
                "{} is not valid UTF-8, invalid bytes were replaced",
                source.display()
            );
        }

        let patch = match category {
            ManifestCategory::Crd => {
                self.patches
                    .resolve(&CrdIdentity::from_file_name(&file_name))?
            }
            _ => None,
        };

        let Some(rendered) = self
            .rewriter
            .rewrite(category, &file_name, &content, patch.as_ref())
        else {
            tracing::debug!("skipping kustomize file {}", source.display());
            return Ok(None);
        };

        Ok(Some(GeneratedFile {
            category,
            source: source.to_path_buf(),
            destination: destination_dir.join(&file_name),
            content: rendered,
        }))
    }
}

/// Convert with the given options
pub fn convert(options: ConvertOptions) -> Result<ConversionResult> {
    ChartConverter::new(options)?.convert()
}

/// `*.yaml` files directly inside `dir`, sorted by path
fn list_manifests(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.yaml", glob::Pattern::escape(&dir.to_string_lossy()));

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

fn write_category(render: &CategoryRender) -> Result<()> {
    fs::create_dir_all(&render.destination_dir)
        .map_err(|e| ConvertError::create_dir(&render.destination_dir, e))?;

    for file in &render.files {
        fs::write(&file.destination, &file.content)
            .map_err(|e| ConvertError::write(&file.destination, e))?;
        tracing::info!(
            "Successfully copied {} to {}",
            file.source.display(),
            file.destination.display()
        );
    }

    Ok(())
}
