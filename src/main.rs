//! lyrics-doctor - diagnose, check and repair static lyrics pages.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lyrics_doctor::{
    Console, DefectKind, HandlerRegistry, Page, PageLayout, Result, Session, check, diagnose,
    interaction_suite,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "lyrics-doctor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Id of the element new lyric sections are inserted before
    #[arg(long, global = true)]
    anchor_id: Option<String>,

    /// Selector of the container used when the anchor is absent
    #[arg(long, global = true)]
    container: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the layered diagnosis and print its findings
    Diagnose {
        file: PathBuf,

        /// Page URL, used to check the location fragment
        #[arg(long)]
        url: Option<String>,
    },

    /// Report index links without a matching lyric section
    Check { file: PathBuf },

    /// Create missing lyric sections and link toggles to their content
    Repair {
        file: PathBuf,

        /// Write the repaired page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the interaction checks against the page
    Suite { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut layout = PageLayout::default();
    if let Some(anchor_id) = &cli.anchor_id {
        layout.set_anchor_id(anchor_id);
    }
    if let Some(container) = &cli.container {
        layout.set_fallback_container(container);
    }

    let mut console = Console::echoing();
    match &cli.command {
        Commands::Diagnose { file, url } => {
            let mut page = load_page(file, layout)?;
            if let Some(url) = url {
                page = page.with_url(url);
            }
            let report = diagnose(&mut page, &HandlerRegistry::standard(), &mut console)?;
            Ok(if report.has_critical_problems() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Check { file } => {
            let page = load_page(file, layout)?;
            let defects = check(&page.navigation_entries()?, &page.content_sections()?);
            for defect in &defects {
                let problem = match defect.kind {
                    DefectKind::Missing => "missing".to_string(),
                    DefectKind::Ambiguous { matches } => format!("ambiguous ({matches} matches)"),
                };
                console.line(format!(
                    "{}. \"{}\" -> \"{}\": {problem}",
                    defect.index, defect.display_text, defect.expected_title
                ));
            }
            console.line(format!("{} defects", defects.len()));
            Ok(if defects.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Repair { file, output } => {
            let mut page = load_page(file, layout)?;
            let report = page.repair_in_place()?;
            for id in &report.created {
                eprintln!("created #{id}");
            }
            for id in &report.linked_controls {
                eprintln!("linked toggle to #{id}");
            }
            eprintln!("{} repairs", report.repairs);

            let html = page.to_html();
            match output {
                Some(path) => std::fs::write(path, html)?,
                None => println!("{html}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Suite { file } => {
            let page = load_page(file, layout)?;
            let mut session = Session::standard(page)?;
            let report = interaction_suite().run(&mut session, &mut console)?;
            console.line(format!(
                "{} passed, {} failed, {} skipped",
                report.passed(),
                report.failed(),
                report.skipped()
            ));
            Ok(if report.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn load_page(path: &Path, layout: PageLayout) -> Result<Page> {
    let html = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = html.len(), "loaded page");
    Page::from_html_with_layout(&html, layout)
}
