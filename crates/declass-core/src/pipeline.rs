//! End-to-end metadata extraction: payload in, stamp fields out.
//!
//! A [`MetadataPipeline`] is built once per process and shared by reference.
//! It assembles the model directory on first use and keeps the recognizer it
//! builds for every later call.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::assembly::{ArtifactSource, AssembledModels, ModelAssembler};
use crate::models::config::DeclassConfig;
use crate::models::metadata::{new_image_id, DocumentMetadata, ProcessedDocument};
use crate::ocr::{OcrResult, Recognizer, RecognizerFactory};
use crate::payload::ImagePayload;
use crate::stamp::{StampExtractor, StampParser};

/// Shared extraction pipeline.
pub struct MetadataPipeline {
    config: DeclassConfig,
    assembler: ModelAssembler,
    factory: Box<dyn RecognizerFactory>,
    recognizer: Mutex<Option<Arc<dyn Recognizer>>>,
    parser: StampParser,
}

impl MetadataPipeline {
    /// Create a pipeline reading staged models from `source` and building its
    /// recognizer with `factory`.
    pub fn new(
        config: DeclassConfig,
        source: impl ArtifactSource + 'static,
        factory: impl RecognizerFactory + 'static,
    ) -> Self {
        let assembler = ModelAssembler::new(source, config.models.plan());
        Self {
            config,
            assembler,
            factory: Box::new(factory),
            recognizer: Mutex::new(None),
            parser: StampParser::new(),
        }
    }

    /// Pipeline over the configured import directory with the `pure-onnx-ocr` engine.
    #[cfg(feature = "native")]
    pub fn from_config(config: DeclassConfig) -> Self {
        use crate::models::assembly::DirectorySource;
        use crate::ocr::PureOcrFactory;

        let source = DirectorySource::new(&config.models.import_dir);
        let factory = PureOcrFactory::new(config.models.clone());
        Self::new(config, source, factory)
    }

    pub fn config(&self) -> &DeclassConfig {
        &self.config
    }

    /// Assemble the models and build the recognizer if not done yet.
    pub fn prepare(&self) -> Result<Arc<dyn Recognizer>> {
        let models = self.assembler.ensure(&self.config.models.model_dir)?;
        self.recognizer(&models)
    }

    fn recognizer(&self, models: &AssembledModels) -> Result<Arc<dyn Recognizer>> {
        let mut slot = self.recognizer.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(recognizer) = slot.as_ref() {
            return Ok(Arc::clone(recognizer));
        }

        info!(
            "Initializing {} recognizer from {}",
            self.config.ocr.language,
            models.model_dir.display()
        );
        let recognizer: Arc<dyn Recognizer> =
            Arc::from(self.factory.create(models, &self.config.ocr)?);
        *slot = Some(Arc::clone(&recognizer));
        Ok(recognizer)
    }

    /// Extract stamp metadata from a hex-encoded image.
    pub fn extract_hex(&self, hex: &str) -> Result<DocumentMetadata> {
        self.extract_payload(&ImagePayload::from_hex(hex)?)
    }

    /// Extract stamp metadata from raw image bytes.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<DocumentMetadata> {
        self.extract_payload(&ImagePayload::from_bytes(bytes)?)
    }

    /// Extract stamp metadata from a decoded payload.
    pub fn extract_payload(&self, payload: &ImagePayload) -> Result<DocumentMetadata> {
        let ocr_result = self.recognize_payload(payload)?;
        Ok(self.parser.extract(&ocr_result)?)
    }

    /// Run recognition on a payload without parsing the stamp.
    pub fn recognize_payload(&self, payload: &ImagePayload) -> Result<OcrResult> {
        let recognizer = self.prepare()?;

        let scratch = payload.write_scratch(&self.scratch_dir())?;
        let result = recognizer.recognize(scratch.path())?;

        debug!(
            "Recognized {} regions from {} byte payload",
            result.boxes.len(),
            payload.len()
        );

        Ok(result)
    }

    /// Process one uploaded file into a record with id, metadata and timing.
    pub fn process_upload(&self, file_name: &str, bytes: &[u8]) -> Result<ProcessedDocument> {
        let start = Instant::now();
        let image_id = new_image_id();

        let metadata = self.extract_bytes(bytes)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("Processed {} as {} in {}ms", file_name, image_id, duration_ms);

        Ok(ProcessedDocument {
            image_id,
            file_name: file_name.to_string(),
            metadata,
            processed_at: Utc::now(),
            duration_ms,
        })
    }

    fn scratch_dir(&self) -> PathBuf {
        self.config
            .extraction
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeclassError, ExtractionError, OcrError, PayloadError};
    use crate::models::assembly::DirectorySource;
    use crate::models::config::OcrConfig;
    use std::io::{self, Read};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FIRST: &str = "Declassified per Executive Order 13526, Section 3.3";
    const SECOND: &str = "NND Project Number: 2021-045 By: J. Smith NND Date: 2019";

    struct CountingSource {
        inner: DirectorySource,
        opens: Arc<AtomicUsize>,
    }

    impl ArtifactSource for CountingSource {
        fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.inner.open(name)
        }

        fn location(&self) -> String {
            self.inner.location()
        }
    }

    /// Returns fixed lines and remembers the scratch paths it was given.
    struct FixedRecognizer {
        lines: Vec<String>,
        seen: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl Recognizer for FixedRecognizer {
        fn recognize(&self, image_path: &Path) -> std::result::Result<OcrResult, OcrError> {
            assert!(image_path.exists());
            self.seen.lock().unwrap().push(image_path.to_path_buf());
            Ok(OcrResult::from_lines(&self.lines))
        }
    }

    struct FixedFactory {
        lines: Vec<String>,
        creates: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl RecognizerFactory for FixedFactory {
        fn create(
            &self,
            models: &AssembledModels,
            config: &OcrConfig,
        ) -> std::result::Result<Box<dyn Recognizer>, OcrError> {
            assert!(models.artifact.exists());
            assert_eq!(config.language, "en");
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixedRecognizer {
                lines: self.lines.clone(),
                seen: Arc::clone(&self.seen),
            }))
        }
    }

    struct Harness {
        pipeline: MetadataPipeline,
        opens: Arc<AtomicUsize>,
        creates: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<PathBuf>>>,
        _import: tempfile::TempDir,
        _work: tempfile::TempDir,
    }

    fn harness(lines: &[&str]) -> Harness {
        let import = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        for (name, data) in [
            ("det.onnx.1", &b"D1"[..]),
            ("det.onnx.2", &b"D2"[..]),
            ("det.onnx.3", &b"D3"[..]),
            ("en_rec.onnx", &b"REC"[..]),
            ("en_dict.txt", &b"a\nb\n"[..]),
        ] {
            std::fs::write(import.path().join(name), data).unwrap();
        }

        let mut config = DeclassConfig::default();
        config.models.import_dir = import.path().to_path_buf();
        config.models.model_dir = work.path().join("models");
        config.extraction.scratch_dir = Some(work.path().to_path_buf());

        let opens = Arc::new(AtomicUsize::new(0));
        let creates = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let pipeline = MetadataPipeline::new(
            config,
            CountingSource {
                inner: DirectorySource::new(import.path()),
                opens: Arc::clone(&opens),
            },
            FixedFactory {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                creates: Arc::clone(&creates),
                seen: Arc::clone(&seen),
            },
        );

        Harness {
            pipeline,
            opens,
            creates,
            seen,
            _import: import,
            _work: work,
        }
    }

    #[test]
    fn test_extract_hex_returns_fields_in_order() {
        let h = harness(&[FIRST, SECOND]);
        let metadata = h.pipeline.extract_hex(&hex::encode(b"\x89PNG fake")).unwrap();

        assert_eq!(
            metadata.as_row(),
            ["13526", "3.3", "2021-045", "J. Smith", "2019"]
        );
        let assembled = h.pipeline.config().model_path("det.onnx");
        assert_eq!(std::fs::read(assembled).unwrap(), b"D1D2D3");
    }

    #[test]
    fn test_second_call_reuses_models_and_recognizer() {
        let h = harness(&[FIRST, SECOND]);

        h.pipeline.extract_bytes(b"first image").unwrap();
        let opens_after_first = h.opens.load(Ordering::SeqCst);
        h.pipeline.extract_bytes(b"second image").unwrap();

        assert_eq!(opens_after_first, 5);
        assert_eq!(h.opens.load(Ordering::SeqCst), opens_after_first);
        assert_eq!(h.creates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_calls_initialize_once() {
        let h = harness(&[FIRST, SECOND]);

        std::thread::scope(|scope| {
            for i in 0..4 {
                let pipeline = &h.pipeline;
                scope.spawn(move || {
                    pipeline.extract_bytes(format!("image {}", i).as_bytes()).unwrap();
                });
            }
        });

        assert_eq!(h.opens.load(Ordering::SeqCst), 5);
        assert_eq!(h.creates.load(Ordering::SeqCst), 1);

        let seen = h.seen.lock().unwrap();
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_scratch_removed_after_success_and_failure() {
        let ok = harness(&[FIRST, SECOND]);
        ok.pipeline.extract_bytes(b"image").unwrap();

        let failing = harness(&[FIRST]);
        assert!(failing.pipeline.extract_bytes(b"image").is_err());

        for h in [&ok, &failing] {
            let seen = h.seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert!(!seen[0].exists());
        }
    }

    #[test]
    fn test_single_region_is_insufficient() {
        let h = harness(&[FIRST]);
        let err = h.pipeline.extract_bytes(b"image").unwrap_err();

        assert!(matches!(
            err,
            DeclassError::Extraction(ExtractionError::InsufficientRegions { found: 1, required: 2 })
        ));
    }

    #[test]
    fn test_invalid_hex_skips_model_work() {
        let h = harness(&[FIRST, SECOND]);
        let err = h.pipeline.extract_hex("not hex!").unwrap_err();

        assert!(matches!(
            err,
            DeclassError::Payload(PayloadError::InvalidDigit { position: 0, .. })
        ));
        assert_eq!(h.opens.load(Ordering::SeqCst), 0);
        assert_eq!(h.creates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_process_upload_record() {
        let h = harness(&[FIRST, SECOND]);
        let record = h.pipeline.process_upload("scan_001.png", b"image").unwrap();

        assert!(record.image_id.starts_with("img_"));
        assert_eq!(record.file_name, "scan_001.png");
        assert_eq!(record.metadata.author, "J. Smith");
    }
}
