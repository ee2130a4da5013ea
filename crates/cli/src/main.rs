use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{Term, style};
use statica_core::{NamingContext, Template, compile, naming};
use tracing_subscriber::EnvFilter;

mod project;

use project::{ProjectFile, SINGLE_PAGE_APP};

/// statica - compile single-page-app declarations into CDN templates
#[derive(Parser)]
#[command(name = "statica")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the project into a template
    Synth {
        /// Path to the project file (default: project.yml)
        #[arg(default_value = "project.yml")]
        project: PathBuf,

        /// Write the template to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Deployment stage
        #[arg(long, default_value = "dev")]
        stage: String,

        /// Target region
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Per-deployment token folded into the distribution's id
        /// (derived from app/stage/region when omitted)
        #[arg(long)]
        deployment_id: Option<String>,
    },

    /// Validate the project file without generating anything
    Check {
        /// Path to the project file (default: project.yml)
        #[arg(default_value = "project.yml")]
        project: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth {
            project,
            output,
            stage,
            region,
            deployment_id,
        } => cmd_synth(
            &project,
            output.as_deref(),
            &stage,
            &region,
            deployment_id,
            cli.verbose,
        ),
        Commands::Check { project } => cmd_check(&project),
    }
}

fn cmd_synth(
    project_path: &Path,
    output: Option<&Path>,
    stage: &str,
    region: &str,
    deployment_id: Option<String>,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if !project_path.exists() {
        term.write_line(&format!(
            "{} Project file not found: {}",
            style("error:").red().bold(),
            project_path.display()
        ))?;
        std::process::exit(1);
    }

    let project = ProjectFile::load(project_path)?;
    let deployment_id =
        deployment_id.unwrap_or_else(|| default_deployment_id(&project.app, stage, region));

    term.write_line(&format!(
        "{} Compiling {} ({} construct(s))",
        style("::").cyan().bold(),
        project_path.display(),
        project.constructs.len()
    ))?;

    let template = synth_project(&project, stage, region, &deployment_id, &term, verbose)?;

    let rendered = serde_json::to_string_pretty(&template)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("cannot write template to {}", path.display()))?;
            term.write_line(&format!(
                "{} Wrote {}",
                style("::").green().bold(),
                path.display()
            ))?;
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn synth_project(
    project: &ProjectFile,
    stage: &str,
    region: &str,
    deployment_id: &str,
    term: &Term,
    verbose: bool,
) -> Result<Template> {
    let mut merged = Template::new();

    for (name, decl) in &project.constructs {
        if decl.construct_type != SINGLE_PAGE_APP {
            term.write_line(&format!(
                "{} Skipping construct `{}` of unsupported type `{}`",
                style("warning:").yellow().bold(),
                name,
                decl.construct_type
            ))?;
            continue;
        }

        let naming = NamingContext {
            app: project.app.clone(),
            stage: stage.to_string(),
            region: region.to_string(),
            construct: name.clone(),
            deployment_id: deployment_id.to_string(),
        };
        let template =
            compile(&decl.config, &naming).with_context(|| format!("construct `{name}`"))?;

        if verbose {
            term.write_line(&format!(
                "  {} {} ({} resource(s))",
                style("+").green().bold(),
                name,
                template.resources.len()
            ))?;
        }
        merged.absorb(template);
    }

    Ok(merged)
}

fn cmd_check(project_path: &Path) -> Result<()> {
    let term = Term::stderr();

    if !project_path.exists() {
        term.write_line(&format!(
            "{} Project file not found: {}",
            style("error:").red().bold(),
            project_path.display()
        ))?;
        std::process::exit(1);
    }

    let project = ProjectFile::load(project_path)?;
    for (name, decl) in &project.constructs {
        if decl.construct_type != SINGLE_PAGE_APP {
            continue;
        }
        decl.config
            .validate()
            .with_context(|| format!("construct `{name}`"))?;
    }

    term.write_line(&format!(
        "{} Configuration valid ({} construct(s))",
        style("::").green().bold(),
        project.constructs.len()
    ))?;

    Ok(())
}

/// Stable fallback token so repeated synth runs are byte-identical.
fn default_deployment_id(app: &str, stage: &str, region: &str) -> String {
    naming::stable_suffix(&format!("{app}/{stage}/{region}"))
}
