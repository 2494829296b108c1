//! Quokka CLI: lay out, paint and rasterize HTML, and drive the test
//! harness.
//!
//! - `quokka layout page.html`   # Print the fragment tree
//! - `quokka png -o out.png page.html`   # Render to PNG
//! - `quokka fuzz --count 1000`  # Fuzz the layout invariants

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{LevelFilter, info};
use owo_colors::OwoColorize;
use quokka_common::warning::{clear_warnings, warning_count};
use quokka_css::layout::FragmentTree;
use quokka_css::{
    Violation, check_display_list, check_fragment_tree, display_list_to_json,
    fragment_tree_to_json,
};
use quokka_engine::{
    ImageStore, RenderOptions, render, render_to_display_list, render_to_fragment_tree_with,
    save_png,
};
use quokka_harness::{
    CommandOracle, DifferentialRunner, FuzzFailure, GoldenOutcome, GoldenStore, HarnessConfig,
    Severity, run_fuzz,
};

/// Quokka: a deterministic CSS2.1 layout and rendering engine
#[derive(Parser, Debug)]
#[command(name = "quokka")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the fragment tree of a file
    quokka layout page.html

    # Fragment tree as JSON, for an inline document
    quokka layout --json --html '<p style="float:left">x</p>'

    # Render to PNG at a custom viewport
    quokka png -o page.png --width 1024 --height 768 page.html

    # Check layout and paint invariants
    quokka check page.html

    # Fuzz 1000 seeds and keep a JSON report
    quokka fuzz --count 1000 --report fuzz.json

    # Compare against golden files, then against headless Chromium
    quokka golden tests/cases/*.html
    quokka diff --browser chromium tests/cases/*.html
"#)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Harness configuration file (JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// A single document to render.
#[derive(Args, Debug)]
struct Input {
    /// HTML file to render
    #[arg(value_name = "FILE", required_unless_present = "html")]
    path: Option<PathBuf>,

    /// Render an HTML string instead of a file
    #[arg(long, value_name = "HTML", conflicts_with = "path")]
    html: Option<String>,

    /// Viewport width in px (default: from config, else 800)
    #[arg(long)]
    width: Option<f32>,

    /// Viewport height in px (default: from config, else 600)
    #[arg(long)]
    height: Option<f32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the fragment tree
    Layout {
        #[command(flatten)]
        input: Input,

        /// Print JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },

    /// Print the display list as JSON
    Paint {
        #[command(flatten)]
        input: Input,
    },

    /// Render to a PNG file
    Png {
        #[command(flatten)]
        input: Input,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Draw glyphs from installed fonts instead of box glyphs
        #[arg(long)]
        system_fonts: bool,
    },

    /// Run the fragment tree and display list invariant checkers
    Check {
        #[command(flatten)]
        input: Input,
    },

    /// Fuzz the invariant checkers with generated documents
    Fuzz {
        /// First seed (default: from config)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of seeds (default: from config)
        #[arg(long)]
        count: Option<u64>,

        /// Write the full report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Compare fragment trees and display lists against JSON golden files
    Golden {
        /// HTML files; each is checked against `<stem>.fragments.json` and
        /// `<stem>.display_list.json`
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Golden directory (default: from config)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Compare renders against a headless browser
    Diff {
        /// HTML files to compare
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Chromium-compatible browser executable
        #[arg(long, default_value = "chromium")]
        browser: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    let passed = match cli.command {
        Command::Layout { input, json } => {
            let (html, options) = load(&input, &config)?;
            let tree = render_to_fragment_tree_with(&html, &options);
            if json {
                println!("{}", fragment_tree_to_json(&tree)?);
            } else {
                print_fragment_tree(&tree);
            }
            true
        }
        Command::Paint { input } => {
            let (html, options) = load(&input, &config)?;
            let tree = render_to_fragment_tree_with(&html, &options);
            println!("{}", display_list_to_json(&render_to_display_list(&tree))?);
            true
        }
        Command::Png {
            input,
            output,
            system_fonts,
        } => {
            let (html, mut options) = load(&input, &config)?;
            if system_fonts {
                options = options.with_system_fonts();
            }
            let rendering = render(&html, &options)?;
            save_png(&rendering.image, &output)?;
            println!(
                "{} {} ({}x{})",
                "wrote".green(),
                output.display(),
                rendering.image.width(),
                rendering.image.height()
            );
            true
        }
        Command::Check { input } => {
            let (html, options) = load(&input, &config)?;
            let tree = render_to_fragment_tree_with(&html, &options);
            let mut violations = check_fragment_tree(&tree);
            violations.extend(check_display_list(&render_to_display_list(&tree)));
            print_violations(&violations);
            violations.is_empty()
        }
        Command::Fuzz {
            seed,
            count,
            report,
        } => {
            let config = HarnessConfig {
                fuzz_seed: seed.unwrap_or(config.fuzz_seed),
                fuzz_count: count.unwrap_or(config.fuzz_count),
                ..config
            };
            fuzz(&config, report.as_deref())?
        }
        Command::Golden { files, dir } => {
            let dir = dir.unwrap_or_else(|| config.golden_dir.clone());
            golden(&files, &GoldenStore::new(dir), &config)?
        }
        Command::Diff { files, browser } => diff(&files, browser, &config)?,
    };

    info!("{} distinct engine warnings", warning_count());
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Read the input document and build render options for it. Images
/// referenced by a file are resolved relative to its directory.
fn load(input: &Input, config: &HarnessConfig) -> Result<(String, RenderOptions)> {
    let width = input.width.unwrap_or(config.viewport_width);
    let height = input.height.unwrap_or(config.viewport_height);
    let (html, base) = match (&input.html, &input.path) {
        (Some(html), _) => (html.clone(), PathBuf::from(".")),
        (None, Some(path)) => (
            read_html(path)?,
            path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        ),
        (None, None) => bail!("either a FILE or --html is required"),
    };
    let mut images = ImageStore::new();
    let loaded = images.load_document_images(&quokka_engine::html::parse_document(&html), &base);
    info!("loaded {loaded} images from {}", base.display());
    Ok((html, RenderOptions::new(width, height).with_images(images)))
}

fn read_html(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn case_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "document".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Print fragments indented by depth, with border-box geometry.
fn print_fragment_tree(tree: &FragmentTree) {
    let mut stack = vec![(tree.root, 0_usize)];
    while let Some((id, depth)) = stack.pop() {
        let Some(fragment) = tree.get(id) else {
            continue;
        };
        let indent = "  ".repeat(depth);
        let rect = fragment.border_box();
        println!(
            "{indent}{} {:?} x={:.1} y={:.1} w={:.1} h={:.1}",
            fragment.label.cyan(),
            fragment.display,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
        for (index, line) in fragment.lines.iter().enumerate() {
            println!(
                "{indent}  {} x={:.1} y={:.1} w={:.1} h={:.1} ({} inlines)",
                format!("line[{index}]").dimmed(),
                line.x,
                line.y,
                line.width,
                line.height,
                line.inlines.len()
            );
        }
        stack.extend(fragment.children.iter().rev().map(|&child| (child, depth + 1)));
    }
}

fn print_violations(violations: &[Violation]) {
    if violations.is_empty() {
        println!("{}", "no invariant violations".green());
        return;
    }
    for violation in violations {
        println!(
            "{} {}: {} = {}",
            "violation".red().bold(),
            violation.path,
            violation.field.yellow(),
            violation.value
        );
    }
    println!("{} violations", violations.len());
}

fn fuzz(config: &HarnessConfig, report_path: Option<&Path>) -> Result<bool> {
    let report = run_fuzz(config);
    for case in report.violations.iter().chain(&report.panics) {
        match &case.failure {
            FuzzFailure::Violations {
                violations,
                minimized,
            } => {
                println!(
                    "{} seed {}: {} violations, minimized to:\n  {minimized}",
                    "FAIL".red().bold(),
                    case.seed,
                    violations.len()
                );
            }
            FuzzFailure::Panic { message } => {
                println!("{} seed {}: {message}", "PANIC".magenta().bold(), case.seed);
            }
        }
    }
    println!(
        "{} seeds, {} with violations, {} panicked",
        report.cases_run,
        report.violations.len(),
        report.panics.len()
    );
    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(report.is_clean())
}

fn golden(files: &[PathBuf], store: &GoldenStore, config: &HarnessConfig) -> Result<bool> {
    let options = RenderOptions::new(config.viewport_width, config.viewport_height);
    let mut passed = true;
    for path in files {
        clear_warnings();
        let html = read_html(path)?;
        let name = case_name(path);
        let tree = render_to_fragment_tree_with(&html, &options);
        let display_list = render_to_display_list(&tree);
        for (suffix, json) in [
            ("fragments", fragment_tree_to_json(&tree)?),
            ("display_list", display_list_to_json(&display_list)?),
        ] {
            let label = format!("{name}.{suffix}");
            match store.check(&label, &json)? {
                GoldenOutcome::Created => println!("{} {label}", "NEW ".yellow()),
                GoldenOutcome::Matched => println!("{} {label}", "OK  ".green()),
                GoldenOutcome::Mismatch {
                    actual_path,
                    first_difference,
                    ..
                } => {
                    passed = false;
                    println!(
                        "{} {label}: line {first_difference}, see {}",
                        "FAIL".red().bold(),
                        actual_path.display()
                    );
                }
            }
        }
    }
    Ok(passed)
}

fn diff(files: &[PathBuf], browser: PathBuf, config: &HarnessConfig) -> Result<bool> {
    let oracle = CommandOracle::chromium(browser);
    let mut runner = DifferentialRunner::new(&oracle, config)?;
    let mut passed = true;
    for path in files {
        let report = runner.run(&case_name(path), &read_html(path)?)?;
        passed &= report.passed;
        let severity = report.severity.to_string();
        let severity = match report.severity {
            Severity::Identical | Severity::Low => severity.green().to_string(),
            Severity::Medium => severity.yellow().to_string(),
            Severity::High | Severity::Critical => severity.red().bold().to_string(),
        };
        println!(
            "{severity} {} {:.2}% {} overlaps={}",
            report.name,
            report.ratio * 100.0,
            report.classification,
            report.overlap_count
        );
    }
    println!("log: {}", config.report_dir.join("mismatches.csv").display());
    Ok(passed)
}
