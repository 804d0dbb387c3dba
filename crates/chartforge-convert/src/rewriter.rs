//! Manifest to chart-template rewriting
//!
//! Every file goes through the same pipeline:
//!
//! 1. kustomize files are dropped
//! 2. RBAC: well-known resource names are renamed, the service account gets an
//!    annotations hook and leader-election RBAC gets the release namespace
//! 3. CRD: the conversion-webhook patch is spliced under `spec` and the
//!    retention (and cert-manager) annotations are added
//! 4. all: generated labels are replaced by the chart's label set and the
//!    `system` namespace becomes the release namespace
//! 5. the file is wrapped in its category's `{{- if ... }}` condition
//!
//! Steps 2 to 4 run on every document of the file. The rewrite is a pure
//! function of its inputs, so regenerating from unchanged manifests yields
//! byte-identical templates.

use phf::phf_map;

use crate::category::{ManifestCategory, is_kustomize_file};
use crate::crd::{ConversionFragment, CrdPatch};
use crate::document::{Document, ManifestFile};

/// Templated service account name
pub const SERVICE_ACCOUNT_NAME: &str = "{{ .Values.controllerManager.serviceAccountName }}";

/// Templated release namespace
pub const RELEASE_NAMESPACE: &str = "{{ .Release.Namespace }}";

/// Namespace value the manifest generator uses for the operator's namespace
pub const GENERATED_NAMESPACE: &str = "system";

/// How a generated RBAC name is carried into the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbacName {
    /// Becomes the templated service account name
    ServiceAccount,
    /// Gains a `<project>-` prefix
    ProjectScoped,
}

impl RbacName {
    pub fn apply(&self, name: &str, project_name: &str) -> String {
        match self {
            Self::ServiceAccount => SERVICE_ACCOUNT_NAME.to_string(),
            Self::ProjectScoped => format!("{}-{}", project_name, name),
        }
    }
}

/// Generated RBAC names rewritten wherever they appear as a `name:` value
pub static RBAC_RENAMES: phf::Map<&'static str, RbacName> = phf_map! {
    "controller-manager" => RbacName::ServiceAccount,
    "metrics-reader" => RbacName::ProjectScoped,
    "metrics-auth-role" => RbacName::ProjectScoped,
    "metrics-auth-rolebinding" => RbacName::ProjectScoped,
    "leader-election-role" => RbacName::ProjectScoped,
    "leader-election-rolebinding" => RbacName::ProjectScoped,
    "manager-role" => RbacName::ProjectScoped,
    "manager-rolebinding" => RbacName::ProjectScoped,
};

const SERVICE_ACCOUNT_ANNOTATIONS: [&str; 6] = [
    "{{- if and .Values.controllerManager.serviceAccount .Values.controllerManager.serviceAccount.annotations }}",
    "annotations:",
    "  {{- range $key, $value := .Values.controllerManager.serviceAccount.annotations }}",
    "  {{ $key }}: {{ $value }}",
    "  {{- end }}",
    "{{- end }}",
];

const CERT_MANAGER_ANNOTATION: [&str; 3] = [
    "{{- if .Values.certmanager.enable }}",
    "cert-manager.io/inject-ca-from: \"{{ .Release.Namespace }}/serving-cert\"",
    "{{- end }}",
];

const RESOURCE_POLICY_ANNOTATION: [&str; 3] = [
    "{{- if .Values.crd.keep }}",
    "\"helm.sh/resource-policy\": keep",
    "{{- end }}",
];

const WEBHOOK_CONDITION: &str = "{{- if .Values.webhook.enable }}";

/// Rewrites generated manifests into chart templates for one project
#[derive(Debug, Clone)]
pub struct ManifestRewriter {
    project_name: String,
}

impl ManifestRewriter {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Rewrite one manifest file.
    ///
    /// Returns `None` for kustomize files, which are not part of the chart.
    /// `patch` is only consulted for CRDs.
    pub fn rewrite(
        &self,
        category: ManifestCategory,
        file_name: &str,
        content: &str,
        patch: Option<&CrdPatch>,
    ) -> Option<String> {
        if is_kustomize_file(file_name) {
            return None;
        }

        let conversion = patch.and_then(CrdPatch::conversion);
        let mut file = ManifestFile::parse(content);

        for doc in file.documents_mut() {
            match category {
                ManifestCategory::Rbac => self.rewrite_rbac(doc),
                ManifestCategory::Crd => inject_crd_webhook(doc, conversion.as_ref()),
                ManifestCategory::NetworkPolicy => {}
            }
            apply_chart_metadata(doc);
        }

        Some(wrap_conditional(&category.condition(file_name), &file.render()))
    }

    fn rewrite_rbac(&self, doc: &mut Document) {
        doc.rewrite_scalars("name", |value| {
            RBAC_RENAMES
                .get(value)
                .map(|rename| rename.apply(value, &self.project_name))
        });

        let kind = doc.scalar(&["kind"]).map(str::to_string);
        let name = doc.scalar(&["metadata", "name"]).map(str::to_string);

        match (kind.as_deref(), name.as_deref()) {
            (Some("ServiceAccount"), Some(SERVICE_ACCOUNT_NAME)) => {
                doc.prepend_children(&["metadata"], &SERVICE_ACCOUNT_ANNOTATIONS);
            }
            (Some("Role" | "RoleBinding"), Some(name)) if self.is_leader_election(name) => {
                // The generator leaves namespaced leader-election RBAC without a namespace
                if !doc.contains(&["metadata", "namespace"]) {
                    let namespace = format!("namespace: {}", RELEASE_NAMESPACE);
                    doc.prepend_children(&["metadata"], &[namespace]);
                }
            }
            _ => {}
        }
    }

    fn is_leader_election(&self, name: &str) -> bool {
        ["leader-election-role", "leader-election-rolebinding"]
            .iter()
            .any(|generated| name == RbacName::ProjectScoped.apply(generated, &self.project_name))
    }
}

/// Splice the conversion webhook under `spec` and add the CRD annotations.
/// The cert-manager annotation only accompanies an applied conversion block.
fn inject_crd_webhook(doc: &mut Document, conversion: Option<&ConversionFragment<'_>>) {
    let with_webhook = conversion.is_some_and(|fragment| {
        let mut block = vec![WEBHOOK_CONDITION.to_string()];
        block.extend(fragment.dedented_lines());
        block.push("{{- end }}".to_string());
        doc.prepend_children(&["spec"], &block)
    });

    if !doc.ensure_mapping(&["metadata"], "annotations") {
        return;
    }

    let mut annotations: Vec<&str> = Vec::new();
    if with_webhook {
        annotations.extend(CERT_MANAGER_ANNOTATION);
    }
    annotations.extend(RESOURCE_POLICY_ANNOTATION);
    doc.prepend_children(&["metadata", "annotations"], &annotations);
}

/// Replace generated labels with the chart's labels and template the
/// operator namespace
fn apply_chart_metadata(doc: &mut Document) {
    doc.remove(&["metadata", "labels"]);

    doc.rewrite_scalars("namespace", |value| {
        (value == GENERATED_NAMESPACE).then(|| RELEASE_NAMESPACE.to_string())
    });

    let Some(metadata) = doc.find(&["metadata"]) else {
        return;
    };
    let nindent = doc.child_indent(&metadata) + 2;
    let labels = [
        "labels:".to_string(),
        format!("  {{{{- include \"chart.labels\" . | nindent {} }}}}", nindent),
    ];
    doc.prepend_children(&["metadata"], &labels);
}

/// Wrap template content in a Helm conditional block
pub fn wrap_conditional(condition: &str, content: &str) -> String {
    let mut out = format!("{{{{- if {} }}}}\n", condition);
    out.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("{{- end -}}\n");
    out
}
