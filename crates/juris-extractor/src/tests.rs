//! Integration tests for the extraction pipeline

#[cfg(test)]
mod tests {
    use crate::text::fixtures::single_page_pdf;
    use crate::{
        ExtractionOrchestrator, ExtractorError, LanguageDetector, ParseError, PipelineConfig,
        PipelineStage, TextExtractor,
    };
    use juris_domain::{is_calendar_date, FileType, Language};
    use juris_llm::{LlmError, MockProvider};
    use juris_store::{
        Database, ExtractionRepository, QueryEngine, RetryingStore, TransactionOptions,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const ENGLISH_TEXT: &str = "JUDGMENT OF THE COURT. The Supreme Court holds that the \
        appellant, Nordic Shipping Ltd, is entitled to rely on Article 10(1), point 3 of the \
        Regulation, and that the lower court erred in refusing the application for relief.";

    const DANISH_TEXT: &str = "Højesteret finder, at der ikke er grundlag for at tilsidesætte \
        landsrettens vurdering af bevisførelsen, og stadfæster derfor dommen. Sagsøgte skal \
        betale sagens omkostninger for Højesteret til sagsøgeren.";

    const ENGLISH_ANSWER: &str = r#"{
        "title": "JUDGMENT OF THE COURT",
        "dateOfDecision": "2023-09-07",
        "office": null,
        "court": "Supreme Court",
        "caseNumber": "SC-42/2023",
        "summary": "Nordic Shipping Ltd appealed.",
        "conclusion": "The appeal is allowed.",
        "decisionType": "JUDGMENT"
    }"#;

    const DANISH_ANSWER: &str = r#"{
        "title": "DOM",
        "dateOfDecision": null,
        "office": null,
        "court": "Højesteret",
        "caseNumber": null,
        "summary": "Resumé",
        "conclusion": "Dommen stadfæstes.",
        "decisionType": "DOM"
    }"#;

    /// Returns fixed text and counts its invocations
    #[derive(Clone)]
    struct FixedText {
        text: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl FixedText {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextExtractor for FixedText {
        fn extract(&self, _bytes: &[u8], _file_type: FileType) -> Result<String, ParseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    struct Harness {
        model: MockProvider,
        queries: QueryEngine,
        repository: ExtractionRepository,
    }

    fn harness(answer: &str) -> Harness {
        let options = TransactionOptions {
            base_delay: Duration::from_millis(1),
            ..TransactionOptions::default()
        };
        let store = RetryingStore::with_defaults(Database::in_memory().unwrap(), options);
        Harness {
            model: MockProvider::new(answer).with_model_name("openai/gpt-5"),
            queries: QueryEngine::new(store.clone()),
            repository: ExtractionRepository::new(store),
        }
    }

    impl Harness {
        fn orchestrator(&self, config: PipelineConfig) -> ExtractionOrchestrator<MockProvider> {
            ExtractionOrchestrator::new(self.model.clone(), self.repository.clone(), config)
        }

        async fn stored(&self) -> u64 {
            self.queries.list(None, None, None).await.unwrap().total
        }
    }

    fn small_limits() -> PipelineConfig {
        PipelineConfig {
            max_file_size_pdf: 2048,
            max_file_size_html: 1024,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pdf_end_to_end() {
        let h = harness(ENGLISH_ANSWER);
        let orchestrator = h
            .orchestrator(PipelineConfig::default())
            .with_text_extractor(FixedText::new(ENGLISH_TEXT));

        let pdf = vec![0u8; 500 * 1024];
        let record = orchestrator
            .process(&pdf, "application/pdf", pdf.len() as u64, Some("judgment.pdf"))
            .await
            .unwrap();

        assert_eq!(record.file_type, FileType::Pdf);
        assert_eq!(record.language, Language::English);
        assert_eq!(record.language.code(), "en");
        assert!(Language::English.is_decision_type(&record.decision_type));
        assert!(record
            .date_of_decision
            .as_deref()
            .map_or(true, is_calendar_date));
        assert_eq!(record.source, "openai/gpt-5");
        assert_eq!(record.original_file_name.as_deref(), Some("judgment.pdf"));
        assert_eq!(record.created_at, record.updated_at);

        let stored = h.repository.find_by_id(record.id).await.unwrap();
        assert_eq!(stored, Some(record));
        assert_eq!(h.model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_danish_document_uses_danish_schema() {
        let h = harness(DANISH_ANSWER);
        let orchestrator = h
            .orchestrator(PipelineConfig::default())
            .with_text_extractor(FixedText::new(DANISH_TEXT));

        let record = orchestrator
            .process(b"<p>dom</p>", "text/html", 10, None)
            .await
            .unwrap();

        assert_eq!(record.language, Language::Danish);
        assert_eq!(record.decision_type, "DOM");
        assert_eq!(record.date_of_decision, None);
        assert_eq!(record.original_file_name, None);

        let request = h.model.last_request().unwrap();
        assert_eq!(request.schema_name, "legal_extraction_da");
        assert!(request.system_prompt.contains("ordret"));
    }

    #[tokio::test]
    async fn test_size_ceiling_is_inclusive() {
        for (media_type, limit) in [("text/html", 1024usize), ("application/pdf", 2048usize)] {
            let h = harness(ENGLISH_ANSWER);
            let orchestrator = h
                .orchestrator(small_limits())
                .with_text_extractor(FixedText::new(ENGLISH_TEXT));

            let at_limit = vec![b'a'; limit];
            assert!(orchestrator
                .process(&at_limit, media_type, limit as u64, None)
                .await
                .is_ok());

            let over = vec![b'a'; limit + 1];
            let err = orchestrator
                .process(&over, media_type, over.len() as u64, None)
                .await
                .unwrap_err();
            assert!(matches!(err, ExtractorError::FileTooLarge { .. }));
            assert!(err.is_client_error());
            assert_eq!(h.model.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_declared_size_over_ceiling_rejected() {
        let h = harness(ENGLISH_ANSWER);
        let orchestrator = h.orchestrator(small_limits());

        let err = orchestrator
            .process(b"<p>short</p>", "text/html", 5000, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::FileTooLarge { size: 5000, limit: 1024, .. }));
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected_before_parsing() {
        let h = harness(ENGLISH_ANSWER);
        let extractor = FixedText::new(ENGLISH_TEXT);
        let orchestrator = h
            .orchestrator(PipelineConfig::default())
            .with_text_extractor(extractor.clone());

        for media_type in ["image/png", "text/plain", "application/json", ""] {
            let err = orchestrator
                .process(b"data", media_type, 4, Some("file.bin"))
                .await
                .unwrap_err();
            assert!(err.is_client_error(), "{} should be a client error", media_type);
            assert!(err.to_string().contains("HTML or PDF"));
        }

        assert_eq!(extractor.calls(), 0);
        assert_eq!(h.model.call_count(), 0);
        assert_eq!(h.stored().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_fails_at_parse_stage() {
        let h = harness(ENGLISH_ANSWER);
        let orchestrator = h.orchestrator(PipelineConfig::default());

        let err = orchestrator
            .process(b"%PDF-1.7 garbage", "application/pdf", 16, Some("broken.pdf"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Parse));
        assert!(!err.is_client_error());
        assert_eq!(h.model.call_count(), 0);
        assert_eq!(h.stored().await, 0);
    }

    #[tokio::test]
    async fn test_model_failure_called_once_nothing_stored() {
        let h = harness(ENGLISH_ANSWER);
        let model = MockProvider::failing(LlmError::Api {
            status: 502,
            body: "upstream unavailable".to_string(),
        });
        let orchestrator = ExtractionOrchestrator::new(
            model.clone(),
            h.repository.clone(),
            PipelineConfig::default(),
        )
        .with_text_extractor(FixedText::new(ENGLISH_TEXT));

        let err = orchestrator
            .process(b"<p>x</p>", "text/html", 8, Some("a.html"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Extract));
        assert!(err.to_string().contains("upstream unavailable"));
        assert_eq!(model.call_count(), 1);
        assert_eq!(h.stored().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_model_output_nothing_stored() {
        let h = harness(r#"{"title": "JUDGMENT", "decisionType": "VERDICT"}"#);
        let orchestrator = h
            .orchestrator(PipelineConfig::default())
            .with_text_extractor(FixedText::new(ENGLISH_TEXT));

        let err = orchestrator
            .process(b"<p>x</p>", "text/html", 8, None)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Extract));
        match err {
            ExtractorError::Processing { source, .. } => {
                assert!(matches!(*source, ExtractorError::SchemaValidation(_)));
            }
            other => panic!("Expected Processing, got {:?}", other),
        }
        assert_eq!(h.model.call_count(), 1);
        assert_eq!(h.stored().await, 0);
    }

    #[tokio::test]
    async fn test_context_ceiling_rejects_before_model_call() {
        let h = harness(ENGLISH_ANSWER);
        let long_text: &'static str = Box::leak("word ".repeat(1000).into_boxed_str());
        let config = PipelineConfig {
            max_context_tokens: Some(1000),
            ..Default::default()
        };
        let orchestrator = h
            .orchestrator(config)
            .with_text_extractor(FixedText::new(long_text));

        let err = orchestrator
            .process(b"<p>x</p>", "text/html", 8, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractorError::ContextTooLarge { estimated: 1250, limit: 1000 }
        ));
        assert!(err.is_client_error());
        assert_eq!(h.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_html_is_cleaned_before_model_call() {
        let h = harness(ENGLISH_ANSWER);
        let orchestrator = h.orchestrator(PipelineConfig::default());

        let html = format!(
            "<html><head><script>track()</script><style>p {{ margin: 0 }}</style></head>\
             <body><p style=\"color:red\">{}</p></body></html>",
            ENGLISH_TEXT
        );
        let record = orchestrator
            .process(html.as_bytes(), "text/html; charset=utf-8", html.len() as u64, None)
            .await
            .unwrap();
        assert_eq!(record.file_type, FileType::Html);
        assert_eq!(record.language, Language::English);

        let prompt = h.model.last_request().unwrap().prompt;
        assert!(!prompt.contains("track()"));
        assert!(!prompt.contains("margin"));
        assert!(!prompt.contains("color:red"));
        assert!(prompt.contains("Nordic Shipping Ltd"));
    }

    #[tokio::test]
    async fn test_real_pdf_text_reaches_model() {
        let h = harness(ENGLISH_ANSWER);
        let orchestrator = h
            .orchestrator(PipelineConfig::default())
            .with_language_detector(LanguageDetector::with_fallback(Language::English));

        let pdf = single_page_pdf(&[
            "JUDGMENT OF THE COURT",
            "The Supreme Court holds that the appeal is allowed.",
        ]);
        let record = orchestrator
            .process(&pdf, "application/pdf", pdf.len() as u64, Some("judgment.pdf"))
            .await
            .unwrap();
        assert_eq!(record.file_type, FileType::Pdf);

        let prompt = h.model.last_request().unwrap().prompt;
        assert!(prompt.contains("JUDGMENT OF THE COURT"));
        assert!(prompt.contains("The Supreme Court holds that the appeal is allowed."));
    }

    #[tokio::test]
    async fn test_concurrent_uploads_are_independent() {
        let h = harness(ENGLISH_ANSWER);
        let orchestrator = Arc::new(
            h.orchestrator(PipelineConfig::default())
                .with_text_extractor(FixedText::new(ENGLISH_TEXT)),
        );

        let mut handles = Vec::new();
        for n in 0..5 {
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                let name = format!("doc-{}.pdf", n);
                orchestrator
                    .process(b"pdf", "application/pdf", 3, Some(&name))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(h.stored().await, 5);
        assert_eq!(h.model.call_count(), 5);
    }
}
