//! PDF extraction, directly and through batch ingestion.
#![cfg(feature = "pdf")]

use std::sync::Arc;

use async_trait::async_trait;
use ragdoc_rag::completion::{CompletionProvider, GenerationParams};
use ragdoc_rag::embedding::EmbeddingProvider;
use ragdoc_rag::error::{RagError, Result};
use ragdoc_rag::extraction::{DefaultExtractor, DocumentPayload, TextExtractor};
use ragdoc_rag::inmemory::InMemoryVectorStore;
use ragdoc_rag::pipeline::{DocumentStatus, RagPipeline};
use ragdoc_rag::prompt::Conversation;
use ragdoc_rag::vectorstore::IndexSpec;

const HELVETICA: &str = "<< /Font << /F1 << /Type /Font /Subtype /Type1 \
                         /BaseFont /Helvetica /Encoding /WinAnsiEncoding >> >> >>";

/// A one-page PDF showing `text` in `/F1`, with a correct cross-reference table.
fn single_page_pdf(resources: &str, text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources {resources} /Contents 4 0 R >>"
        ),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_offset = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

struct SilentCompletion;

#[async_trait]
impl CompletionProvider for SilentCompletion {
    async fn complete(&self, _: &Conversation, _: &GenerationParams) -> Result<String> {
        Ok(String::new())
    }
}

fn pipeline() -> RagPipeline {
    RagPipeline::builder()
        .config(Default::default())
        .embedding_provider(Arc::new(ConstantEmbedder))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .completion_provider(Arc::new(SilentCompletion))
        .index_spec(IndexSpec::new("pdf-docs", 2))
        .build()
        .unwrap()
}

#[test]
fn pdf_page_text_is_extracted() {
    let doc = DocumentPayload::new("paper.pdf", single_page_pdf(HELVETICA, "Hello ragdoc"));

    let text = DefaultExtractor.extract(&doc).unwrap();

    assert!(text.contains("Hello ragdoc"), "extracted {text:?}");
}

#[test]
fn unparseable_pdf_is_an_extraction_error() {
    let doc = DocumentPayload::new("paper.pdf", b"%PDF-1.4\nnot really a pdf".to_vec());

    let err = DefaultExtractor.extract(&doc).unwrap_err();

    assert!(matches!(err, RagError::ExtractionError { ref name, .. } if name == "paper.pdf"));
}

#[tokio::test]
async fn broken_pdf_between_text_files_does_not_stop_the_batch() {
    let pipeline = pipeline();
    let documents = vec![
        DocumentPayload::new("a.txt", "First file."),
        DocumentPayload::new("bad.pdf", single_page_pdf("<< >>", "Missing font")),
        DocumentPayload::new("c.txt", "Last file."),
    ];

    let report = pipeline.ingest_documents(&documents, Arc::new(DefaultExtractor)).await;

    assert_eq!(report.documents.len(), 3);
    assert!(matches!(report.documents[0].status, DocumentStatus::Ingested(_)));
    assert!(matches!(report.documents[1].status, DocumentStatus::Skipped { .. }));
    assert!(matches!(report.documents[2].status, DocumentStatus::Ingested(_)));
    assert_eq!(report.summary(), "Processed 2 chunks from 3 documents");
}
