use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use ai_llm_service::config::default_config::{
    config_embedding, config_generation_fast, config_generation_slow,
};
use ai_llm_service::telemetry;
use clap::{Parser, Subcommand};
use colored::Colorize;
use fiscal_analyst::Document;
use legis_corpus::{CorpusOutcome, PortalConfig, SefazPortal};
use legis_store::{ServiceEmbedder, format_results};
use nfe_legis_rag::progress::IndicatifProgress;
use nfe_legis_rag::{Pipeline, PipelineConfig, PipelineError};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "nfe-legis-rag")]
#[command(about = "Legislation lookup and tax analysis for NF-e documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the per-keyword index files.
    #[arg(long, global = true, env = "LEGIS_INDEX_DIR")]
    index_dir: Option<PathBuf>,

    /// Log level for workspace crates (`RUST_LOG` takes precedence).
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Extract the search terms of a document and print them as JSON")]
    ExtractTerms {
        #[arg(help = "NF-e XML or text file")]
        document: PathBuf,
    },

    #[command(about = "Query the legislation portal and build the index for a keyword")]
    BuildCorpus {
        #[arg(help = "Short keyword (e.g. 'borracha')")]
        keyword: String,
    },

    #[command(about = "Search the index of a keyword and print the ranked passages")]
    Search {
        keyword: String,
        query: String,
        #[arg(short, long, help = "Number of passages [default: RAG_TOP_K or 5]")]
        k: Option<usize>,
    },

    #[command(about = "Analyze a document and render the report")]
    Report {
        document: PathBuf,
        #[arg(long, help = "File with retrieved legislation passages")]
        context: Option<PathBuf>,
    },

    #[command(about = "Run every stage for one document")]
    Run { document: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; real environment variables win.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} [{}] {e}", "error:".red().bold(), e.kind());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    let mut cfg = PipelineConfig::from_env()?;
    if let Some(dir) = cli.index_dir {
        cfg.index_dir = dir;
    }

    let svc = Arc::new(LlmServiceProfiles::new(
        config_generation_fast()?,
        config_generation_slow()?,
        config_embedding()?,
    ));
    let embedder = ServiceEmbedder::new(Arc::clone(&svc), cfg.embedding_dim);
    let portal = SefazPortal::new(PortalConfig::from_env()?)?;
    let pipeline = Pipeline::new(&portal, &embedder, svc.as_ref(), &cfg);

    match cli.command {
        Commands::ExtractTerms { document } => {
            let (_, terms) = pipeline.extract_terms(&document).await?;
            println!("{}", serde_json::to_string_pretty(&terms).map_err(std::io::Error::from)?);
        }
        Commands::BuildCorpus { keyword } => match pipeline.build_corpus(&keyword).await? {
            CorpusOutcome::Built {
                paths, passages, ..
            } => println!(
                "{} {} passages indexed in {}",
                "✓".green().bold(),
                passages,
                paths.index.display().to_string().cyan()
            ),
            CorpusOutcome::Empty => println!(
                "{} no passages found for '{keyword}', nothing written",
                "!".yellow().bold()
            ),
        },
        Commands::Search { keyword, query, k } => {
            let hits = pipeline
                .search(&keyword, &query, k.unwrap_or(cfg.top_k))
                .await?;
            if hits.is_empty() {
                println!("Nenhum resultado relevante encontrado.");
            } else {
                print!("{}", format_results(&hits));
            }
        }
        Commands::Report { document, context } => {
            let doc = Document::read(&document)?;
            let context = match context {
                Some(p) => std::fs::read_to_string(p)?,
                None => String::new(),
            };
            let (report, rendered) = pipeline.report(&doc, &context).await?;
            println!("{}", report.markdown);
            print_rendered(rendered);
        }
        Commands::Run { document } => {
            let progress = IndicatifProgress::spinner();
            let out = pipeline.with_progress(&progress).run(&document).await?;
            println!(
                "{} {} / {}",
                "Termos:".bold(),
                out.terms.short.cyan(),
                out.terms.phrase
            );
            println!("{} {}", "Trechos:".bold(), out.results.len());
            println!();
            println!("{}", out.report.markdown);
            print_rendered(out.rendered);
        }
    }
    Ok(())
}

fn print_rendered(rendered: Option<PathBuf>) {
    match rendered {
        Some(p) => println!("{} report written to {}", "✓".green().bold(), p.display()),
        None => println!("{} fallback analysis, report not rendered", "!".yellow().bold()),
    }
}
