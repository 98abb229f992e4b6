//! Prompt builders for term extraction and the final analysis.

/// System message for the term-extraction call.
pub const TERMS_SYSTEM: &str = "Você é um especialista em tributação brasileira. \
Responda somente com JSON válido, sem texto adicional.";

/// System message for the analysis call.
pub const ANALYSIS_SYSTEM: &str = "Você é um consultor tributário que analisa NF-e à luz da \
legislação fornecida. Escreva somente Markdown.";

/// Section headings the analysis must contain, in order.
pub const REPORT_SECTIONS: [&str; 4] = [
    "Resumo da NF-e",
    "Relevância Legal",
    "Trecho de Lei Chave",
    "Oportunidade de Economia/Benefício",
];

const OMITTED_MARKER: &str = "... [Conteúdo Omitido]";

/// Document text cut to its first `max_chars` characters, with a marker when cut.
pub fn document_excerpt(text: &str, max_chars: usize) -> String {
    let cut = safe_truncate(text, max_chars);
    if cut.len() < text.len() {
        format!("{cut}{OMITTED_MARKER}")
    } else {
        cut.to_string()
    }
}

/// User prompt asking for `{termo_curto, termo_completo}`.
pub fn build_terms_prompt(document: &str, max_chars: usize) -> String {
    format!(
        r#"Analise o conteúdo desta Nota Fiscal Eletrônica e produza dois termos de busca:

1. "termo_curto": termo conciso (uma a três palavras) com o produto mais relevante do campo xProd
   e a operação realizada, para restringir a pesquisa de legislação a uma base direcionada.
2. "termo_completo": frase curta e descritiva sobre os produtos da nota, para uma busca de
   similaridade refinada (ex.: "Legislação sobre ICMS-ST de produtos alimentícios").

Responda estritamente neste formato JSON:
{{"termo_curto": "termo conciso", "termo_completo": "frase curta e descritiva"}}

Conteúdo da NF-e:
---
{}
---
"#,
        document_excerpt(document, max_chars)
    )
}

/// User prompt for the four-section markdown analysis.
pub fn build_analysis_prompt(document: &str, context: &str, max_chars: usize) -> String {
    let context = if context.trim().is_empty() {
        "(nenhum trecho de legislação relevante foi encontrado)"
    } else {
        context.trim_end()
    };
    format!(
        r#"Abaixo estão o conteúdo de uma Nota Fiscal Eletrônica e os trechos de legislação mais próximos encontrados na base.

Gere uma análise ESTRITAMENTE em Markdown, começando com um título de nível 1 (#), com estas seções de nível 2 (##):

1. **{}:** breve resumo do que a nota trata.
2. **{}:** se os trechos parecem aplicáveis à NF-e, com o link da fonte.
3. **{}:** cite o trecho de lei mais importante ou aplicável.
4. **{}:** dicas de aplicação da lei para reduzir o recolhimento ou obter benefício legal, mensurando a economia em R$ quando possível.

Conteúdo da NF-e:
---
{}
---

Trechos de legislação:
---
{}
---
"#,
        REPORT_SECTIONS[0],
        REPORT_SECTIONS[1],
        REPORT_SECTIONS[2],
        REPORT_SECTIONS[3],
        document_excerpt(document, max_chars),
        context
    )
}

fn safe_truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_chars_not_bytes() {
        assert_eq!(safe_truncate("ação", 2), "aç");
        assert_eq!(safe_truncate("ação", 4), "ação");
        assert_eq!(safe_truncate("abc", 10), "abc");
    }

    #[test]
    fn excerpt_marks_cut_documents() {
        assert_eq!(document_excerpt("abcdef", 3), "abc... [Conteúdo Omitido]");
        assert_eq!(document_excerpt("abc", 3), "abc");
        assert_eq!(document_excerpt("ÇÃOÉ", 3), "ÇÃO... [Conteúdo Omitido]");
        assert_eq!(document_excerpt("ÇÃO", 3), "ÇÃO");
    }

    #[test]
    fn analysis_prompt_names_every_section_and_embeds_inputs() {
        let p = build_analysis_prompt("<xProd>AÇÚCAR</xProd>", "--- DOCUMENTO RANK 1 ---", 1000);
        for s in REPORT_SECTIONS {
            assert!(p.contains(s), "missing {s}");
        }
        assert!(p.contains("<xProd>AÇÚCAR</xProd>"));
        assert!(p.contains("--- DOCUMENTO RANK 1 ---"));
    }

    #[test]
    fn empty_context_is_stated() {
        let p = build_analysis_prompt("doc", "  \n", 1000);
        assert!(p.contains("nenhum trecho"));
    }

    #[test]
    fn terms_prompt_requests_both_fields() {
        let p = build_terms_prompt("doc", 1000);
        assert!(p.contains("\"termo_curto\""));
        assert!(p.contains("\"termo_completo\""));
    }
}
