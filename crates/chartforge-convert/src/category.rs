//! Manifest categories copied into the chart
//!
//! Each category maps a directory of generated manifests to a directory of
//! chart templates and to the `values.yaml` flag that switches it on.

use phf::phf_set;
use std::fmt;

/// RBAC files that also require the metrics flag
pub static METRICS_RBAC_FILES: phf::Set<&'static str> = phf_set! {
    "metrics_auth_role.yaml",
    "metrics_auth_role_binding.yaml",
    "metrics_reader_role.yaml",
};

/// Kustomize plumbing that never lands in the chart
pub static KUSTOMIZE_FILES: phf::Set<&'static str> = phf_set! {
    "kustomization.yaml",
    "kustomizeconfig.yaml",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestCategory {
    Rbac,
    Crd,
    NetworkPolicy,
}

impl ManifestCategory {
    /// All categories, in processing order
    pub const ALL: [ManifestCategory; 3] = [Self::Rbac, Self::Crd, Self::NetworkPolicy];

    /// Source directory, relative to the manifest directory
    pub fn source_dir(&self) -> &'static str {
        match self {
            Self::Rbac => "rbac",
            Self::Crd => "crd/bases",
            Self::NetworkPolicy => "network-policy",
        }
    }

    /// Destination directory, relative to `chart/templates`
    pub fn destination_dir(&self) -> &'static str {
        match self {
            Self::Rbac => "rbac",
            Self::Crd => "crd",
            Self::NetworkPolicy => "network-policy",
        }
    }

    /// Name of the values key holding this category's `enable` flag
    pub fn enable_flag(&self) -> &'static str {
        match self {
            Self::Rbac => "rbac",
            Self::Crd => "crd",
            Self::NetworkPolicy => "networkPolicy",
        }
    }

    /// Helm condition guarding a file of this category
    pub fn condition(&self, file_name: &str) -> String {
        if self.is_metrics_rbac(file_name) {
            "and .Values.rbac.enable .Values.metrics.enable".to_string()
        } else {
            format!(".Values.{}.enable", self.enable_flag())
        }
    }

    pub fn is_metrics_rbac(&self, file_name: &str) -> bool {
        *self == Self::Rbac && METRICS_RBAC_FILES.contains(file_name)
    }
}

impl fmt::Display for ManifestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.enable_flag())
    }
}

/// True for kustomize files, which are neither transformed nor written
pub fn is_kustomize_file(file_name: &str) -> bool {
    KUSTOMIZE_FILES.contains(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_table() {
        let rows: Vec<_> = ManifestCategory::ALL
            .iter()
            .map(|c| (c.source_dir(), c.destination_dir(), c.enable_flag()))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("rbac", "rbac", "rbac"),
                ("crd/bases", "crd", "crd"),
                ("network-policy", "network-policy", "networkPolicy"),
            ]
        );
    }

    #[test]
    fn test_metrics_rbac_condition() {
        let files = [
            "metrics_auth_role.yaml",
            "metrics_auth_role_binding.yaml",
            "metrics_reader_role.yaml",
        ];
        for file in files {
            assert_eq!(
                ManifestCategory::Rbac.condition(file),
                "and .Values.rbac.enable .Values.metrics.enable"
            );
        }
    }

    #[test]
    fn test_plain_conditions() {
        assert_eq!(ManifestCategory::Rbac.condition("role.yaml"), ".Values.rbac.enable");
        assert_eq!(
            ManifestCategory::Crd.condition("batch.example.com_cronjobs.yaml"),
            ".Values.crd.enable"
        );
        assert_eq!(
            ManifestCategory::NetworkPolicy.condition("allow-metrics-traffic.yaml"),
            ".Values.networkPolicy.enable"
        );
    }

    #[test]
    fn test_metrics_file_outside_rbac() {
        assert_eq!(
            ManifestCategory::NetworkPolicy.condition("metrics_auth_role.yaml"),
            ".Values.networkPolicy.enable"
        );
    }

    #[test]
    fn test_kustomize_files() {
        assert!(is_kustomize_file("kustomization.yaml"));
        assert!(is_kustomize_file("kustomizeconfig.yaml"));
        assert!(!is_kustomize_file("role.yaml"));
    }
}
