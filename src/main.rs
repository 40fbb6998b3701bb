use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use workflow_cdk::construct::AnnotationLevel;
use workflow_cdk::definition::DefinitionLoader;
use workflow_cdk::{OutputFormat, SynthOutcome};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize workflow files from a project definition
    Synth {
        /// Path to the project definition file
        #[arg(short, long)]
        file: PathBuf,

        /// Output directory (overrides the definition and environment)
        #[arg(short, long)]
        outdir: Option<PathBuf>,

        /// Output format: yaml or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Write workflows even if validation reports errors
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Validate a project definition without writing anything
    Validate {
        /// Path to the project definition file
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = DefinitionLoader::new();

    match args.command {
        Commands::Synth {
            file,
            outdir,
            format,
            continue_on_error,
        } => {
            let def = loader
                .load(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;

            let mut config = def.config.clone();
            config.apply_env_overrides()?;
            if let Some(outdir) = outdir {
                config.outdir = outdir;
            }
            if let Some(format) = format {
                config.output_format = format;
            }
            if continue_on_error {
                config.continue_on_error_annotations = true;
            }

            let mut project = loader.build(&def, config)?;
            let outcome = project.synth()?;
            let manifest = project.manifest();
            for entry in manifest.workflows.values() {
                match &entry.path {
                    Some(path) => println!("{} -> {}", entry.id, path.display()),
                    None => println!("{} (not written)", entry.id),
                }
            }
            if outcome == SynthOutcome::Aborted || manifest.has_error_annotation() {
                std::process::exit(1);
            }
        }
        Commands::Validate { file } => {
            let def = loader
                .load(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            let mut config = def.config.clone();
            config.apply_env_overrides()?;

            let project = loader.build(&def, config)?;
            let annotations = project.validate()?;
            for annotation in &annotations {
                println!(
                    "{:<5} [{}] {}",
                    annotation.level, annotation.path, annotation.message
                );
            }
            let errors = annotations
                .iter()
                .filter(|a| a.level == AnnotationLevel::Error)
                .count();
            println!("{} annotation(s), {} error(s)", annotations.len(), errors);
            if errors > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
