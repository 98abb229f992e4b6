use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use fiscal_analyst::error::AnalystError;
use fiscal_analyst::{
    AnalysisReport, AnalystLlm, Document, FALLBACK_REPORT, LlmFuture, analyze, extract_terms,
    render_report,
};
use pretty_assertions::assert_eq;

/// Returns canned answers and records the prompts it saw.
struct MockLlm {
    json: Result<String, String>,
    markdown: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    fn new(json: &str, markdown: &str) -> Self {
        Self {
            json: Ok(json.to_string()),
            markdown: Ok(markdown.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            json: Err("quota".into()),
            markdown: Err("quota".into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn answer(&self, canned: &Result<String, String>, prompt: &str) -> fiscal_analyst::error::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("lock").push(prompt.to_string());
        canned.clone().map_err(|reason| AnalystError::MalformedResponse {
            reason,
            excerpt: String::new(),
        })
    }
}

impl AnalystLlm for MockLlm {
    fn generate_json<'a>(&'a self, _system: &'a str, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move { self.answer(&self.json, prompt) })
    }

    fn generate_markdown<'a>(&'a self, _system: &'a str, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move { self.answer(&self.markdown, prompt) })
    }
}

const GOOD_REPORT: &str = "# Análise da NF-e 42\n\n## Resumo da NF-e\nVenda de açúcar.\n\n## Relevância Legal\nAplicável.\n\n## Trecho de Lei Chave\n> Art. 1\n\n## Oportunidade de Economia/Benefício\n- R$ 120,00\n";

fn write_doc(dir: &std::path::Path, name: &str, text: &str) -> Document {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write doc");
    Document::read(&path).expect("read doc")
}

#[tokio::test]
async fn extracts_terms_from_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_doc(dir.path(), "nfe.xml", "<xProd>ACUCAR CRISTAL</xProd><CFOP>5102</CFOP>");
    let llm = MockLlm::new(
        r#"{"termo_curto": "açúcar venda", "termo_completo": "ICMS na venda de açúcar"}"#,
        GOOD_REPORT,
    );

    let terms = extract_terms(&llm, &doc, 60_000).await.expect("terms");
    assert_eq!(terms.short, "açúcar venda");
    assert_eq!(terms.phrase, "ICMS na venda de açúcar");

    let prompts = llm.prompts.lock().expect("lock");
    assert!(prompts[0].contains("ACUCAR CRISTAL"));
}

#[tokio::test]
async fn empty_short_term_is_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_doc(dir.path(), "nfe.xml", "x");
    let llm = MockLlm::new(r#"{"termo_curto": "", "termo_completo": "algo"}"#, GOOD_REPORT);

    let err = extract_terms(&llm, &doc, 100).await.unwrap_err();
    assert!(matches!(err, AnalystError::EmptyTerm("termo_curto")));
}

#[tokio::test]
async fn analysis_embeds_document_and_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_doc(dir.path(), "nfe.xml", "<xProd>ACUCAR</xProd>");
    let llm = MockLlm::new("{}", GOOD_REPORT);

    let report = analyze(&llm, &doc, "--- DOCUMENTO RANK 1 ---\nArt. 1", 60_000).await;
    assert!(!report.fallback);
    assert!(report.markdown.starts_with("# Análise"));

    let prompts = llm.prompts.lock().expect("lock");
    assert!(prompts[0].contains("<xProd>ACUCAR</xProd>"));
    assert!(prompts[0].contains("--- DOCUMENTO RANK 1 ---"));
}

#[tokio::test]
async fn unheaded_answer_becomes_fallback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_doc(dir.path(), "nfe.xml", "x");
    let llm = MockLlm::new("{}", "Segue a análise:\n## Resumo");

    let report = analyze(&llm, &doc, "", 100).await;
    assert_eq!(report, AnalysisReport::fallback());
    assert_eq!(report.markdown, FALLBACK_REPORT);
}

#[tokio::test]
async fn llm_error_becomes_fallback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_doc(dir.path(), "nfe.xml", "x");
    let llm = MockLlm::failing();

    let report = analyze(&llm, &doc, "", 100).await;
    assert!(report.fallback);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn report_sections_are_laid_out_as_headings() {
    let blocks = fiscal_analyst::layout::blocks(GOOD_REPORT);
    for section in fiscal_analyst::prompt::REPORT_SECTIONS {
        assert!(
            blocks.iter().any(|b| matches!(
                b,
                fiscal_analyst::layout::Block::Heading { level: 2, text } if text == section
            )),
            "missing heading {section}"
        );
    }
}

#[tokio::test]
async fn renders_next_to_source_and_skips_fallback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_doc(dir.path(), "nota_7.xml", "x");
    let llm = MockLlm::new("{}", GOOD_REPORT);

    let report = analyze(&llm, &doc, "", 100).await;
    let path = render_report(&report, &doc, None, "Confidencial")
        .expect("render")
        .expect("rendered path");
    assert_eq!(path, dir.path().join("nota_7_analise.pdf"));

    let pdf = std::fs::read(&path).expect("pdf");
    assert!(pdf.starts_with(b"%PDF-"));

    let out = dir.path().join("out");
    let skipped = render_report(&AnalysisReport::fallback(), &doc, Some(&out), "x").expect("skip");
    assert_eq!(skipped, None);
    assert!(!out.exists());
}
