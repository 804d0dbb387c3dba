//! Generate command - regenerate chart templates from manifests
//!
//! Settings come from the command line first and the project file second.
//! The chart's own templates are never read: every run regenerates them.

use chartforge_convert::converter::DEFAULT_CHART_DIR;
use chartforge_convert::{
    ConversionResult, ConvertError, ConvertOptions, ProjectConfig, WebhookKind, convert,
};
use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};

pub struct GenerateArgs {
    pub manifest_dir: PathBuf,
    pub chart_dir: Option<PathBuf>,
    pub project_name: Option<String>,
    pub project_file: PathBuf,
    pub dry_run: bool,
    pub json: bool,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let project = ProjectConfig::load(&args.project_file)?;
    let options = resolve_options(&args, project.as_ref())?;
    tracing::debug!(
        project = %options.project_name,
        manifest_dir = %options.manifest_dir.display(),
        chart_dir = %options.chart_dir.display(),
        dry_run = options.dry_run,
        "resolved generate options"
    );

    if !args.json {
        print_header(&options);
    }

    let result = convert(options.clone()).wrap_err("Chart generation failed")?;

    if args.json {
        print_json(&options, &result)?;
        return Ok(());
    }

    print_files(&result, &options);
    print_webhooks(&result);
    print_summary(&result, options.dry_run);

    Ok(())
}

/// Merge flags with the project file. Flags win.
fn resolve_options(args: &GenerateArgs, project: Option<&ProjectConfig>) -> Result<ConvertOptions> {
    let project_name = args
        .project_name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| project.and_then(|p| p.project_name.clone()))
        .filter(|name| !name.is_empty())
        .ok_or(ConvertError::MissingProjectName)?;

    let chart_dir = args
        .chart_dir
        .clone()
        .or_else(|| project.and_then(ProjectConfig::chart_dir).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_DIR));

    Ok(ConvertOptions {
        manifest_dir: args.manifest_dir.clone(),
        chart_dir,
        project_name,
        dry_run: args.dry_run,
    })
}

fn print_header(options: &ConvertOptions) {
    println!();
    println!(
        "  {} {} {}",
        style("Chartforge").bold().cyan(),
        style("─").dim(),
        style("manifests → Helm chart").dim()
    );
    println!();
    println!(
        "  {} {}",
        style("Project:").dim(),
        style(&options.project_name).bold()
    );
    println!(
        "  {} {}",
        style("Source:").dim(),
        style(options.manifest_dir.display()).cyan()
    );
    println!(
        "  {} {}",
        style("Target:").dim(),
        style(options.chart_dir.display()).green()
    );
    println!();
}

fn print_files(result: &ConversionResult, options: &ConvertOptions) {
    if result.generated_files.is_empty() {
        println!(
            "  {} {}",
            style("ℹ").cyan(),
            style("No manifests found").dim()
        );
        println!();
        return;
    }

    println!("  {}", style("Generated Templates").bold());
    println!("  {}", style("───────────────────").dim());

    for file in &result.generated_files {
        println!(
            "  {} {}",
            style("✓").green().bold(),
            relative(&file.destination, &options.chart_dir).display()
        );
    }

    if !result.skipped_files.is_empty() {
        println!();
        println!("  {}", style("Skipped Files").bold().yellow());
        println!("  {}", style("─────────────").dim());

        for file in &result.skipped_files {
            println!(
                "  {} {}",
                style("○").yellow(),
                relative(file, &options.manifest_dir).display()
            );
        }
    }

    println!();
}

fn print_webhooks(result: &ConversionResult) {
    if result.webhooks.is_empty() {
        return;
    }

    println!("  {}", style("Webhooks").bold());
    println!("  {}", style("────────").dim());

    for kind in [WebhookKind::Mutating, WebhookKind::Validating] {
        for webhook in result.webhooks.get(kind) {
            println!(
                "  {} {} {}",
                style("→").blue(),
                webhook.name,
                style(format!("({}, {})", kind, webhook.path)).dim()
            );
        }
    }

    println!();
}

fn print_summary(result: &ConversionResult, dry_run: bool) {
    let generated = result.generated_files.len();
    let skipped = result.skipped_files.len();
    let webhooks = result.webhooks.len();

    println!("  {}", style("Summary").bold());
    println!("  {}", style("───────").dim());

    println!(
        "  {} {} template{} generated",
        style(format!("{:>3}", generated)).green().bold(),
        style("files").dim(),
        if generated == 1 { "" } else { "s" }
    );

    if skipped > 0 {
        println!(
            "  {} {} skipped",
            style(format!("{:>3}", skipped)).yellow().bold(),
            style("files").dim()
        );
    }

    if webhooks > 0 {
        println!(
            "  {} webhook{} found",
            style(format!("{:>3}", webhooks)).blue().bold(),
            if webhooks == 1 { "" } else { "s" }
        );
    }

    println!();

    if dry_run {
        println!(
            "  {} {}",
            style("ℹ").cyan(),
            style("Dry run mode - no files were written").dim()
        );
        println!();
    }
}

fn print_json(options: &ConvertOptions, result: &ConversionResult) -> Result<()> {
    let generated: Vec<_> = result
        .generated_files
        .iter()
        .map(|file| {
            serde_json::json!({
                "category": file.category.to_string(),
                "source": file.source,
                "destination": file.destination,
            })
        })
        .collect();

    let output = serde_json::json!({
        "project": options.project_name,
        "chartDir": options.chart_dir,
        "dryRun": options.dry_run,
        "generated": generated,
        "skipped": result.skipped_files,
        "webhooks": result.webhooks,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}

fn relative<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            manifest_dir: PathBuf::from("config"),
            chart_dir: None,
            project_name: None,
            project_file: PathBuf::from("PROJECT"),
            dry_run: false,
            json: false,
        }
    }

    fn project(content: &str) -> ProjectConfig {
        ProjectConfig::parse(content).unwrap()
    }

    #[test]
    fn test_project_file_supplies_defaults() {
        let project = project(
            "projectName: tutorial\nplugins:\n  helm.kubebuilder.io/v1-alpha:\n    chartDir: charts\n",
        );
        let options = resolve_options(&args(), Some(&project)).unwrap();

        assert_eq!(options.project_name, "tutorial");
        assert_eq!(options.chart_dir, PathBuf::from("charts"));
        assert_eq!(options.manifest_dir, PathBuf::from("config"));
    }

    #[test]
    fn test_flags_win_over_project_file() {
        let project = project(
            "projectName: tutorial\nplugins:\n  helm.kubebuilder.io/v1-alpha:\n    chartDir: charts\n",
        );
        let args = GenerateArgs {
            project_name: Some("override".to_string()),
            chart_dir: Some(PathBuf::from("out")),
            ..args()
        };
        let options = resolve_options(&args, Some(&project)).unwrap();

        assert_eq!(options.project_name, "override");
        assert_eq!(options.chart_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_default_chart_dir() {
        let args = GenerateArgs {
            project_name: Some("demo".to_string()),
            ..args()
        };
        let options = resolve_options(&args, None).unwrap();

        assert_eq!(options.chart_dir, PathBuf::from("dist"));
    }

    #[test]
    fn test_missing_project_name() {
        assert!(resolve_options(&args(), None).is_err());
        assert!(resolve_options(&args(), Some(&project("domain: example.com\n"))).is_err());
    }
}
