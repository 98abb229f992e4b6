use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use fiscal_analyst::error::AnalystError;
use fiscal_analyst::{AnalystConfig, AnalystLlm, LlmFuture};
use legis_corpus::{CorpusError, CorpusOutcome, LegislationSource, SourceFuture};
use legis_store::EmbeddingsProvider;
use legis_store::embed::EmbedFuture;
use nfe_legis_rag::{ErrorKind, Pipeline, PipelineConfig};
use pretty_assertions::assert_eq;

const TERMS: &str = r#"{"termo_curto": "sugar sale tax", "termo_completo": "Legislation on sales tax for sugar products"}"#;

const REPORT: &str = "# Análise Fiscal\n\n## Resumo da NF-e\nVenda de açúcar.\n\n## Relevância Legal\nAplicável.\n\n## Trecho de Lei Chave\n> Art. 1\n\n## Oportunidade de Economia/Benefício\n- Economia estimada de R$ 50,00\n";

fn rows_body(n: usize) -> String {
    let rows: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"Path": "https://legis/{i}", "PublishingPageContentOWSHTML": "Art. {i} sugar {}"}}"#,
                "a".repeat(i)
            )
        })
        .collect();
    format!(
        r#"garbage [{{"Tables": {{"ResultRows": [{}]}}}}] garbage"#,
        rows.join(",")
    )
}

struct FakePortal {
    body: Result<String, u16>,
    keywords: Mutex<Vec<String>>,
}

impl FakePortal {
    fn ok(body: String) -> Self {
        Self {
            body: Ok(body),
            keywords: Mutex::new(Vec::new()),
        }
    }

    fn forbidden() -> Self {
        Self {
            body: Err(403),
            keywords: Mutex::new(Vec::new()),
        }
    }
}

impl LegislationSource for FakePortal {
    fn search<'a>(&'a self, keyword: &'a str) -> SourceFuture<'a> {
        self.keywords.lock().expect("lock").push(keyword.to_string());
        Box::pin(async move {
            match &self.body {
                Ok(b) => Ok(b.clone()),
                Err(_) => Err(CorpusError::StaleCredential {
                    status: reqwest::StatusCode::FORBIDDEN,
                    url: "https://portal".into(),
                }),
            }
        })
    }
}

/// Length and count of 'a' as a 2-d embedding.
struct ShapeEmbedder;

impl EmbeddingsProvider for ShapeEmbedder {
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        Box::pin(async move {
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, t.matches('a').count() as f32])
                .collect())
        })
    }
}

struct ScriptedLlm {
    terms: String,
    report: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(terms: &str, report: &str) -> Self {
        Self {
            terms: terms.to_string(),
            report: report.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, prompt: &str, answer: &str) -> Result<String, AnalystError> {
        self.prompts.lock().expect("lock").push(prompt.to_string());
        Ok(answer.to_string())
    }
}

impl AnalystLlm for ScriptedLlm {
    fn generate_json<'a>(&'a self, _system: &'a str, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move { self.record(prompt, &self.terms) })
    }

    fn generate_markdown<'a>(&'a self, _system: &'a str, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move { self.record(prompt, &self.report) })
    }
}

fn config(index_dir: &Path, out_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        index_dir: index_dir.to_path_buf(),
        top_k: 5,
        embedding_dim: None,
        analyst: AnalystConfig {
            rate_limit_delay: Duration::ZERO,
            max_doc_chars: 10_000,
            output_dir: Some(out_dir.to_path_buf()),
            footer: "Confidencial".into(),
        },
    }
}

fn write_document(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("nota.txt");
    std::fs::write(&path, "Product: sugar, Operation: sale").expect("write");
    path
}

#[tokio::test]
async fn end_to_end_sugar_sale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("reports");
    let cfg = config(dir.path(), &out);
    let doc = write_document(dir.path());

    let portal = FakePortal::ok(rows_body(8));
    let llm = ScriptedLlm::new(TERMS, REPORT);
    let pipeline = Pipeline::new(&portal, &ShapeEmbedder, &llm, &cfg);

    let run = pipeline.run(&doc).await.expect("run");

    assert_eq!(run.terms.short, "sugar sale tax");
    assert_eq!(run.terms.phrase, "Legislation on sales tax for sugar products");
    assert_eq!(*portal.keywords.lock().expect("lock"), vec!["sugar sale tax".to_string()]);
    assert!(matches!(run.corpus, CorpusOutcome::Built { passages: 8, .. }));

    assert!(run.results.len() <= 5);
    let ranks: Vec<usize> = run.results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    assert!(run.results.windows(2).all(|w| w[0].distance <= w[1].distance));

    assert!(run.report.markdown.starts_with("# "));
    for section in fiscal_analyst::prompt::REPORT_SECTIONS {
        assert!(run.report.markdown.contains(section), "missing {section}");
    }

    let rendered = run.rendered.expect("rendered");
    assert_eq!(rendered, out.join("nota_analise.pdf"));
    assert!(std::fs::read(&rendered).expect("pdf").starts_with(b"%PDF-"));

    let prompts = llm.prompts.lock().expect("lock");
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Product: sugar, Operation: sale"));
    assert!(prompts[1].contains("--- DOCUMENTO RANK 1 ---"));
}

#[tokio::test]
async fn empty_corpus_still_produces_a_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("reports");
    let cfg = config(dir.path(), &out);
    let doc = write_document(dir.path());

    let portal = FakePortal::ok(r#"[{"ResultRows": []}]"#.to_string());
    let llm = ScriptedLlm::new(TERMS, REPORT);
    let run = Pipeline::new(&portal, &ShapeEmbedder, &llm, &cfg)
        .run(&doc)
        .await
        .expect("run");

    assert_eq!(run.corpus, CorpusOutcome::Empty);
    assert!(run.results.is_empty());
    assert!(!run.report.fallback);
    assert!(llm.prompts.lock().expect("lock")[1].contains("nenhum trecho"));
}

#[tokio::test]
async fn stale_digest_halts_before_analysis() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path(), dir.path());
    let doc = write_document(dir.path());

    let portal = FakePortal::forbidden();
    let llm = ScriptedLlm::new(TERMS, REPORT);
    let err = Pipeline::new(&portal, &ShapeEmbedder, &llm, &cfg)
        .run(&doc)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamRequestFailed);
    assert_eq!(llm.prompts.lock().expect("lock").len(), 1, "only the terms call ran");
}

#[tokio::test]
async fn missing_document_is_input_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path(), dir.path());
    let portal = FakePortal::ok(rows_body(1));
    let llm = ScriptedLlm::new(TERMS, REPORT);

    let err = Pipeline::new(&portal, &ShapeEmbedder, &llm, &cfg)
        .run(&dir.path().join("nope.xml"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputNotFound);
    assert!(llm.prompts.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn malformed_terms_halt_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path(), dir.path());
    let doc = write_document(dir.path());
    let portal = FakePortal::ok(rows_body(1));
    let llm = ScriptedLlm::new(r#"{"termo_curto": "", "termo_completo": "x"}"#, REPORT);

    let err = Pipeline::new(&portal, &ShapeEmbedder, &llm, &cfg)
        .run(&doc)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    assert!(portal.keywords.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn search_without_corpus_is_index_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config(dir.path(), dir.path());
    let portal = FakePortal::ok(rows_body(1));
    let llm = ScriptedLlm::new(TERMS, REPORT);

    let err = Pipeline::new(&portal, &ShapeEmbedder, &llm, &cfg)
        .search("never built", "query", 5)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexNotFound);
}

#[tokio::test]
async fn unheaded_analysis_skips_rendering() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("reports");
    let cfg = config(dir.path(), &out);
    let doc = write_document(dir.path());
    let portal = FakePortal::ok(rows_body(2));
    let llm = ScriptedLlm::new(TERMS, "Sure, here is the analysis.");

    let run = Pipeline::new(&portal, &ShapeEmbedder, &llm, &cfg)
        .run(&doc)
        .await
        .expect("run");
    assert!(run.report.fallback);
    assert_eq!(run.rendered, None);
    assert!(!out.exists());
}
