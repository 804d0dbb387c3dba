//! Chartforge Convert - operator manifests to Helm chart templates
//!
//! This crate turns the manifests generated for a Kubernetes operator project
//! (`config/rbac`, `config/crd/bases`, `config/network-policy`) into Helm
//! chart templates:
//!
//! | Generated manifest                  | Chart template                                      |
//! |-------------------------------------|-----------------------------------------------------|
//! | `name: controller-manager`          | `name: {{ .Values.controllerManager.serviceAccountName }}` |
//! | `name: manager-role`                | `name: <project>-manager-role`                      |
//! | `namespace: system`                 | `namespace: {{ .Release.Namespace }}`               |
//! | `metadata.labels`                   | the chart's `chart.labels` helper                   |
//! | CRD with a conversion patch         | `spec.conversion` + cert-manager CA injection       |
//!
//! Every template is wrapped in the `values.yaml` flag of its category, so a
//! chart user can switch whole categories off.
//!
//! # Example
//!
//! ```no_run
//! use chartforge_convert::{ConvertOptions, convert};
//!
//! let result = convert(ConvertOptions {
//!     project_name: "project".to_string(),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! println!("Generated {} templates", result.generated_files.len());
//! println!("Found {} webhooks", result.webhooks.len());
//! ```

pub mod category;
pub mod converter;
pub mod crd;
pub mod document;
pub mod error;
pub mod project;
pub mod rewriter;
pub mod webhook;

// Re-exports
pub use category::ManifestCategory;
pub use converter::{
    ChartConverter, ConversionResult, ConvertOptions, GeneratedFile, convert,
};
pub use crd::{CrdIdentity, CrdPatch, PatchResolver};
pub use error::{ConvertError, Result};
pub use project::ProjectConfig;
pub use rewriter::ManifestRewriter;
pub use webhook::{
    FailurePolicy, SideEffects, WebhookDescriptor, WebhookExtractor, WebhookKind, WebhookRule,
    WebhookSet,
};
