//! The four stages chained in-process with typed hand-offs.

use std::path::{Path, PathBuf};

use fiscal_analyst::render::render_report;
use fiscal_analyst::{AnalysisReport, AnalystLlm, Document, SearchTerms, analyze, extract_terms};
use legis_corpus::{CorpusBuilder, CorpusOutcome, LegislationSource};
use legis_store::{EmbeddingsProvider, RetrievalResult, format_results, search_keyword};
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::progress::{NoopProgress, Progress};

static NOOP: NoopProgress = NoopProgress;

/// Everything one full run produced.
#[derive(Debug)]
pub struct PipelineRun {
    pub document: Document,
    pub terms: SearchTerms,
    pub corpus: CorpusOutcome,
    pub results: Vec<RetrievalResult>,
    pub report: AnalysisReport,
    /// Rendered report path; `None` for fallback reports.
    pub rendered: Option<PathBuf>,
}

/// Explicit handles to every external dependency of the pipeline.
pub struct Pipeline<'a> {
    source: &'a dyn LegislationSource,
    embedder: &'a dyn EmbeddingsProvider,
    llm: &'a dyn AnalystLlm,
    cfg: &'a PipelineConfig,
    progress: &'a dyn Progress,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn LegislationSource,
        embedder: &'a dyn EmbeddingsProvider,
        llm: &'a dyn AnalystLlm,
        cfg: &'a PipelineConfig,
    ) -> Self {
        Self {
            source,
            embedder,
            llm,
            cfg,
            progress: &NOOP,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Stage 1: read the document and ask for its search terms.
    pub async fn extract_terms(&self, document: &Path) -> Result<(Document, SearchTerms)> {
        let doc = Document::read(document)?;
        let terms = extract_terms(self.llm, &doc, self.cfg.analyst.max_doc_chars).await?;
        Ok((doc, terms))
    }

    /// Stage 2: build (or replace) the index for `keyword`.
    pub async fn build_corpus(&self, keyword: &str) -> Result<CorpusOutcome> {
        let builder = CorpusBuilder::new(self.source, self.embedder, &self.cfg.index_dir);
        Ok(builder.build(keyword).await?)
    }

    /// Stage 3: top-`k` passages for `query` from the index built for `keyword`.
    pub async fn search(
        &self,
        keyword: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        Ok(search_keyword(&self.cfg.index_dir, keyword, self.embedder, query, k).await?)
    }

    /// Stage 4: analyze with `context` and render unless the analysis fell back.
    pub async fn report(
        &self,
        doc: &Document,
        context: &str,
    ) -> Result<(AnalysisReport, Option<PathBuf>)> {
        let a = &self.cfg.analyst;
        let report = analyze(self.llm, doc, context, a.max_doc_chars).await;
        let rendered = render_report(&report, doc, a.output_dir.as_deref(), &a.footer)?;
        Ok((report, rendered))
    }

    /// Runs all stages in order. Any stage error halts the chain.
    #[instrument(skip_all, fields(document = %document.display()))]
    pub async fn run(&self, document: &Path) -> Result<PipelineRun> {
        let p = self.progress;
        p.set_total(4);

        p.message("extracting search terms");
        let (doc, terms) = self.extract_terms(document).await?;
        p.step(&format!("terms: {}", terms.short));

        p.message("building legislation corpus");
        let corpus = self.build_corpus(&terms.short).await?;
        p.step("corpus ready");

        let results = match &corpus {
            CorpusOutcome::Built { .. } => {
                p.message("retrieving passages");
                self.search(&terms.short, &terms.phrase, self.cfg.top_k).await?
            }
            CorpusOutcome::Empty => {
                warn!(
                    target: "nfe_legis_rag::pipeline",
                    keyword = %terms.short,
                    "empty corpus, analysis continues without legislation context"
                );
                Vec::new()
            }
        };
        p.step(&format!("{} passages", results.len()));

        let delay = self.cfg.analyst.rate_limit_delay;
        if !delay.is_zero() {
            p.message("waiting for rate limit");
            tokio::time::sleep(delay).await;
        }

        p.message("analyzing");
        let context = format_results(&results);
        let (report, rendered) = self.report(&doc, &context).await?;
        p.step("report done");

        info!(
            target: "nfe_legis_rag::pipeline",
            passages = results.len(),
            fallback = report.fallback,
            rendered = ?rendered,
            "pipeline finished"
        );
        p.finish("done");

        Ok(PipelineRun {
            document: doc,
            terms,
            corpus,
            results,
            report,
            rendered,
        })
    }
}
