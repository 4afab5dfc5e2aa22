//! nbpaper CLI - notebook to LaTeX paper converter

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use nbpaper::{
    convert, ConvertOptions, FigureFormat, JsonFormat, Manifest, Nbpaper, TemplateId, Warning,
};

#[derive(Parser)]
#[command(name = "nbpaper")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert Jupyter notebooks into academic LaTeX papers", long_about = None)]
struct Cli {
    /// Input notebook
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Template name
    #[arg(short, long, env = "NBPAPER_TEMPLATE")]
    template: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a notebook into main.tex, a bibliography and figures
    Convert {
        /// Input notebook
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Template name (overrides the notebook's choice)
        #[arg(short, long, env = "NBPAPER_TEMPLATE")]
        template: Option<String>,

        /// Figure format
        #[arg(long, value_enum)]
        figure_format: Option<FigureMode>,

        /// Keep code cells as listings
        #[arg(long)]
        include_code: bool,

        /// Do not extract figures
        #[arg(long)]
        no_figures: bool,

        /// Skip malformed cells instead of failing
        #[arg(long)]
        lenient: bool,

        /// JSON options file
        #[arg(long, value_name = "FILE")]
        options: Option<PathBuf>,

        /// Print the conversion manifest as JSON
        #[arg(long)]
        manifest: bool,
    },

    /// Print the document model as JSON
    Inspect {
        /// Input notebook
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Skip malformed cells instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// List available templates
    Templates,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FigureMode {
    /// Prefer SVG, pass rasters through
    Vector,
    /// PNG and JPEG only
    Raster,
}

impl From<FigureMode> for FigureFormat {
    fn from(mode: FigureMode) -> Self {
        match mode {
            FigureMode::Vector => FigureFormat::Vector,
            FigureMode::Raster => FigureFormat::Raster,
        }
    }
}

struct ConvertArgs {
    template: Option<String>,
    figure_format: Option<FigureMode>,
    include_code: bool,
    no_figures: bool,
    lenient: bool,
    options: Option<PathBuf>,
    manifest: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            template,
            figure_format,
            include_code,
            no_figures,
            lenient,
            options,
            manifest,
        }) => cmd_convert(
            &input,
            output.as_deref(),
            ConvertArgs {
                template,
                figure_format,
                include_code,
                no_figures,
                lenient,
                options,
                manifest,
            },
        ),
        Some(Commands::Inspect {
            input,
            output,
            compact,
            lenient,
        }) => cmd_inspect(&input, output.as_deref(), compact, lenient),
        Some(Commands::Templates) => {
            cmd_templates();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(
                    &input,
                    cli.output.as_deref(),
                    ConvertArgs {
                        template: cli.template,
                        figure_format: None,
                        include_code: false,
                        no_figures: false,
                        lenient: false,
                        options: None,
                        manifest: false,
                    },
                )
            } else {
                println!("{}", "Usage: nbpaper <FILE> [OUTPUT]".yellow());
                println!("       nbpaper --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_options(args: &ConvertArgs) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = match &args.options {
        Some(path) => ConvertOptions::from_json_str(&fs::read_to_string(path)?)?,
        None => ConvertOptions::new(),
    };

    // Flags win over the options file
    if let Some(template) = &args.template {
        options = options.with_template(template.clone());
    }
    if let Some(mode) = args.figure_format {
        options = options.with_figure_format(mode.into());
    }
    if args.include_code {
        options = options.with_code(true);
    }
    if args.no_figures {
        options = options.with_save_figures(false);
    }
    if args.lenient {
        options = options.lenient();
    }
    Ok(options)
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    args: ConvertArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_paper", stem))
    });

    let options = build_options(&args)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Converting {}...", input.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = convert(input, &output_dir, &options);
    pb.finish_and_clear();
    let manifest = result?;

    if args.manifest {
        println!("{}", manifest.to_json()?);
        return Ok(());
    }

    print_summary(&manifest);
    Ok(())
}

fn print_summary(manifest: &Manifest) {
    println!(
        "{} {} ({})",
        "Converted".green().bold(),
        manifest.title,
        manifest.template
    );

    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), manifest.main_tex.display());
    if manifest.figure_files.is_empty() {
        println!("  {} {}", "└─".dimmed(), manifest.bibliography.display());
    } else {
        println!("  {} {}", "├─".dimmed(), manifest.bibliography.display());
        println!(
            "  {} figures/ ({} file(s))",
            "└─".dimmed(),
            manifest.figure_files.len()
        );
    }

    let counts = &manifest.counts;
    println!();
    println!("{}: {}", "Sections".bold(), counts.sections);
    println!(
        "{}: {} ({} display)",
        "Equations".bold(),
        counts.equations,
        counts.display_equations
    );
    println!("{}: {}", "Figures".bold(), counts.figures);
    println!("{}: {}", "Citations".bold(), counts.citations);

    if manifest.has_warnings() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &manifest.warnings {
            print_warning(warning);
        }
    }
    if !manifest.complete {
        println!(
            "\n{}",
            "Some figures could not be extracted; the paper is incomplete.".yellow()
        );
    }
}

fn print_warning(warning: &Warning) {
    println!("  {} {}", "!".yellow(), warning);
}

fn cmd_inspect(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    lenient: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Nbpaper::new().save_figures(true);
    if lenient {
        builder = builder.lenient();
    }
    let result = builder.load(input)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = result.to_json(format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    for warning in result.warnings() {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }

    Ok(())
}

fn cmd_templates() {
    println!("{}", "Templates".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for id in TemplateId::ALL {
        let template = id.template();
        println!(
            "{} {}[{}]",
            format!("{:<16}", id.name()).bold(),
            template.document_class,
            template.class_options.join(",")
        );
    }
}

fn cmd_version() {
    println!("{} {}", "nbpaper".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Jupyter notebook to LaTeX paper converter");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/nbpaper".dimmed());
    println!("License: MIT");
}
