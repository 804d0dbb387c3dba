//! Admission webhook extraction
//!
//! Reads the multi-document webhook manifest produced by the upstream manifest
//! generator and normalizes every webhook entry into a [`WebhookDescriptor`].
//! The chart-template builders consume the resulting [`WebhookSet`].
//!
//! # Example
//!
//! ```
//! use chartforge_convert::webhook::WebhookExtractor;
//!
//! let manifest = r#"
//! apiVersion: admissionregistration.k8s.io/v1
//! kind: ValidatingWebhookConfiguration
//! metadata:
//!   name: validating-webhook-configuration
//! webhooks:
//! - name: vcronjob.kb.io
//!   clientConfig:
//!     service:
//!       name: webhook-service
//!       namespace: system
//!       path: /validate-batch-v1-cronjob
//!   failurePolicy: Fail
//!   sideEffects: None
//!   admissionReviewVersions: [v1]
//!   rules:
//!   - apiVersions: [v1]
//!     operations: [CREATE, UPDATE]
//!     resources: [cronjobs]
//! "#;
//!
//! let webhooks = WebhookExtractor::new("demo").extract_from_str(manifest);
//! assert_eq!(webhooks.validating.len(), 1);
//! assert_eq!(webhooks.validating[0].service_name, "demo-webhook-service");
//! assert_eq!(webhooks.validating[0].rules[0].api_groups, vec![String::new()]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::document::{split_document_bytes, split_documents};
use crate::error::{ConvertError, Result};

/// Location of the webhook manifest, relative to the manifest directory
pub const WEBHOOK_MANIFEST: &str = "webhook/manifests.yaml";

/// The two webhook configuration kinds the chart cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookKind {
    Mutating,
    Validating,
}

impl WebhookKind {
    /// Map a document `kind` to a webhook kind. Any other kind is ignored.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "MutatingWebhookConfiguration" => Some(Self::Mutating),
            "ValidatingWebhookConfiguration" => Some(Self::Validating),
            _ => None,
        }
    }

    /// The Kubernetes kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mutating => "MutatingWebhookConfiguration",
            Self::Validating => "ValidatingWebhookConfiguration",
        }
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the API server treats a webhook call that fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    Fail,
    Ignore,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => f.write_str("Fail"),
            Self::Ignore => f.write_str("Ignore"),
        }
    }
}

/// Declared side effects of a webhook call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffects {
    None,
    NoneOnDryRun,
    Some,
    Unknown,
}

impl fmt::Display for SideEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::NoneOnDryRun => "NoneOnDryRun",
            Self::Some => "Some",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// A single admission rule, passed through verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookRule {
    pub api_groups: Vec<String>,
    pub api_versions: Vec<String>,
    pub resources: Vec<String>,
    pub operations: Vec<String>,
}

/// Normalized webhook definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDescriptor {
    pub name: String,
    /// Always `<project>-webhook-service`; the chart owns service naming
    pub service_name: String,
    pub path: String,
    /// `None` when the manifest leaves it to the API server default
    pub failure_policy: Option<FailurePolicy>,
    pub side_effects: Option<SideEffects>,
    pub admission_review_versions: Vec<String>,
    pub rules: Vec<WebhookRule>,
}

/// Extracted webhooks, bucketed by configuration kind in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebhookSet {
    pub mutating: Vec<WebhookDescriptor>,
    pub validating: Vec<WebhookDescriptor>,
}

impl WebhookSet {
    /// True when the project defines no webhooks at all
    pub fn is_empty(&self) -> bool {
        self.mutating.is_empty() && self.validating.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutating.len() + self.validating.len()
    }

    pub fn get(&self, kind: WebhookKind) -> &[WebhookDescriptor] {
        match kind {
            WebhookKind::Mutating => &self.mutating,
            WebhookKind::Validating => &self.validating,
        }
    }

    fn push(&mut self, kind: WebhookKind, webhook: WebhookDescriptor) {
        match kind {
            WebhookKind::Mutating => self.mutating.push(webhook),
            WebhookKind::Validating => self.validating.push(webhook),
        }
    }
}

// Shapes of the generated documents. Unknown fields are ignored.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfiguration {
    kind: String,
    // Decoded one by one so a bad entry does not take its siblings down
    webhooks: Vec<serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawWebhook {
    name: String,
    client_config: RawClientConfig,
    rules: Vec<WebhookRule>,
    failure_policy: Option<FailurePolicy>,
    side_effects: Option<SideEffects>,
    admission_review_versions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawClientConfig {
    service: RawService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawService {
    path: String,
}

/// Parses webhook manifests for one project
#[derive(Debug, Clone)]
pub struct WebhookExtractor {
    service_name: String,
}

impl WebhookExtractor {
    pub fn new(project_name: &str) -> Self {
        Self {
            service_name: format!("{}-webhook-service", project_name),
        }
    }

    /// Service name stamped on every descriptor
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Extract webhooks from a manifest file.
    ///
    /// A missing file means the project has no webhooks and yields an empty
    /// set. Any other read failure is returned.
    pub fn extract(&self, manifest: &Path) -> Result<WebhookSet> {
        let content = match fs::read(manifest) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("webhook manifests were not found at {}", manifest.display());
                return Ok(WebhookSet::default());
            }
            Err(e) => return Err(ConvertError::read(manifest, e)),
        };

        Ok(self.extract_from_bytes(&content))
    }

    /// Extract webhooks from raw manifest content. Documents that are not
    /// valid UTF-8 are logged and skipped like any other malformed document.
    pub fn extract_from_bytes(&self, content: &[u8]) -> WebhookSet {
        let mut set = WebhookSet::default();

        for (index, doc) in split_document_bytes(content).into_iter().enumerate() {
            match std::str::from_utf8(doc) {
                Ok(doc) => self.extract_document(index, doc, &mut set),
                Err(e) => {
                    tracing::error!(document = index, "webhook document is not valid UTF-8: {}", e);
                }
            }
        }

        set
    }

    /// Extract webhooks from manifest content. Documents that fail to parse
    /// are logged and skipped.
    pub fn extract_from_str(&self, content: &str) -> WebhookSet {
        let mut set = WebhookSet::default();

        for (index, doc) in split_documents(content).into_iter().enumerate() {
            self.extract_document(index, doc, &mut set);
        }

        set
    }

    fn extract_document(&self, index: usize, doc: &str, set: &mut WebhookSet) {
        if is_blank(doc) {
            return;
        }

        let config: RawConfiguration = match serde_yaml::from_str(doc) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(document = index, "failed to parse webhook document: {}", e);
                return;
            }
        };

        let Some(kind) = WebhookKind::from_kind(&config.kind) else {
            tracing::debug!(document = index, kind = %config.kind, "ignoring non-webhook document");
            return;
        };

        for (position, value) in config.webhooks.into_iter().enumerate() {
            match serde_yaml::from_value::<RawWebhook>(value) {
                Ok(webhook) => set.push(kind, self.normalize(webhook)),
                Err(e) => {
                    tracing::error!(
                        document = index,
                        webhook = position,
                        "failed to parse webhook: {}",
                        e
                    );
                }
            }
        }
    }

    fn normalize(&self, webhook: RawWebhook) -> WebhookDescriptor {
        let rules = webhook
            .rules
            .into_iter()
            .map(|mut rule| {
                if rule.api_groups.is_empty() {
                    rule.api_groups = vec![String::new()];
                }
                rule
            })
            .collect();

        WebhookDescriptor {
            name: webhook.name,
            service_name: self.service_name.clone(),
            path: webhook.client_config.service.path,
            failure_policy: webhook.failure_policy,
            side_effects: webhook.side_effects,
            admission_review_versions: webhook.admission_review_versions,
            rules,
        }
    }
}

fn is_blank(doc: &str) -> bool {
    doc.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}
