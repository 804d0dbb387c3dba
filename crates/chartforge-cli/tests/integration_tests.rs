//! Integration tests for CLI commands

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run chartforge inside a project directory
fn chartforge(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_chartforge"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("CHARTFORGE_PROJECT_NAME")
        .output()
        .expect("Failed to execute chartforge")
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A minimal generated project
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "PROJECT",
        "domain: tutorial.kubebuilder.io\nprojectName: tutorial\nversion: \"3\"\n",
    );
    write(
        dir.path(),
        "config/rbac/role.yaml",
        "apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole\nmetadata:\n  name: manager-role\n",
    );
    write(dir.path(), "config/rbac/kustomization.yaml", "resources:\n- role.yaml\n");
    write(
        dir.path(),
        "config/webhook/manifests.yaml",
        "\
---
apiVersion: admissionregistration.k8s.io/v1
kind: ValidatingWebhookConfiguration
metadata:
  name: validating-webhook-configuration
webhooks:
- name: vcronjob-v1.kb.io
  clientConfig:
    service:
      name: webhook-service
      namespace: system
      path: /validate-batch-v1-cronjob
  failurePolicy: Fail
  sideEffects: None
  admissionReviewVersions:
  - v1
",
    );
    dir
}

mod generate_command {
    use super::*;

    #[test]
    fn test_generate_writes_templates() {
        let dir = project();
        let output = chartforge(dir.path(), &["generate"]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let role =
            fs::read_to_string(dir.path().join("dist/chart/templates/rbac/role.yaml")).unwrap();
        assert!(role.starts_with("{{- if .Values.rbac.enable }}\n"));
        assert!(role.contains("  name: tutorial-manager-role\n"));
        assert!(!dir.path().join("dist/chart/templates/rbac/kustomization.yaml").exists());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("rbac/role.yaml"));
    }

    #[test]
    fn test_generate_uses_chart_dir_from_project_file() {
        let dir = project();
        write(
            dir.path(),
            "PROJECT",
            "projectName: tutorial\nplugins:\n  helm.kubebuilder.io/v1-alpha:\n    chartDir: charts\n",
        );

        let output = chartforge(dir.path(), &["generate"]);

        assert!(output.status.success());
        assert!(dir.path().join("charts/chart/templates/rbac/role.yaml").exists());
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_generate_flags_override_project_file() {
        let dir = project();
        let output = chartforge(
            dir.path(),
            &["generate", "--project-name", "other", "--chart-dir", "out"],
        );

        assert!(output.status.success());
        let role =
            fs::read_to_string(dir.path().join("out/chart/templates/rbac/role.yaml")).unwrap();
        assert!(role.contains("  name: other-manager-role\n"));
    }

    #[test]
    fn test_generate_dry_run() {
        let dir = project();
        let output = chartforge(dir.path(), &["generate", "--dry-run"]);

        assert!(output.status.success());
        assert!(!dir.path().join("dist").exists());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Dry run"));
    }

    #[test]
    fn test_generate_json_output() {
        let dir = project();
        let output = chartforge(dir.path(), &["generate", "--json", "--dry-run"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value =
            serde_json::from_str(&stdout).expect("Output should be valid JSON");

        assert_eq!(json["project"], "tutorial");
        assert_eq!(json["dryRun"], true);
        assert_eq!(json["generated"].as_array().unwrap().len(), 1);
        assert_eq!(json["generated"][0]["category"], "rbac");
        assert_eq!(json["skipped"].as_array().unwrap().len(), 1);

        let validating = &json["webhooks"]["validating"][0];
        assert_eq!(validating["name"], "vcronjob-v1.kb.io");
        assert_eq!(validating["serviceName"], "tutorial-webhook-service");
        assert_eq!(validating["failurePolicy"], "Fail");
        assert_eq!(validating["sideEffects"], "None");
    }

    #[test]
    fn test_generate_debug_logs_resolved_options() {
        let dir = project();
        let output = chartforge(dir.path(), &["generate", "--dry-run", "--debug"]);

        assert!(output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("resolved generate options"));
        assert!(stderr.contains("tutorial"));
    }

    #[test]
    fn test_generate_quiet_by_default() {
        let dir = project();
        let output = chartforge(dir.path(), &["generate", "--dry-run"]);

        assert!(output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(!stderr.contains("resolved generate options"));
    }

    #[test]
    fn test_generate_without_project_name_fails() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "config/rbac/role.yaml", "kind: ClusterRole\n");

        let output = chartforge(dir.path(), &["generate"]);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("project name"));
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_generate_with_invalid_project_file_fails() {
        let dir = project();
        write(dir.path(), "PROJECT", "projectName: [unclosed\n");

        let output = chartforge(dir.path(), &["generate"]);

        assert!(!output.status.success());
    }

    #[test]
    fn test_generate_empty_project() {
        let dir = TempDir::new().unwrap();
        let output = chartforge(dir.path(), &["generate", "--project-name", "empty"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("No manifests found"));
        assert!(!dir.path().join("dist").exists());
    }
}

mod help {
    use super::*;

    #[test]
    fn test_help_lists_generate() {
        let dir = TempDir::new().unwrap();
        let output = chartforge(dir.path(), &["--help"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("generate"));
    }
}
