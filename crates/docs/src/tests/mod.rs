//! Shared fixtures for pipeline and session tests.


use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::pipeline::PipelineServices;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use reviewer_core::{AppError, AppResult};
use reviewer_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use reviewer_prompt::{builtin_prompt, QA_WITH_SOURCES};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Build an in-memory PDF with one text line per page.
pub(crate) fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Language model that records requests and returns a fixed reply.
pub(crate) struct ScriptedLlm {
    reply: Option<String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some(reply) => Ok(LlmResponse {
                content: reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
            }),
            None => Err(AppError::Llm("service unavailable".to_string())),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FailingEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("quota exceeded".to_string()))
    }
}

/// Returns one vector fewer than asked for.
#[derive(Debug)]
pub(crate) struct ShortEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for ShortEmbedder {
    fn provider_name(&self) -> &str {
        "short"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(4)
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0; 4]; texts.len().saturating_sub(1)])
    }
}

/// Mock embeddings that can be switched to fail between actions.
#[derive(Debug)]
pub(crate) struct SwitchableEmbedder {
    inner: MockProvider,
    failing: AtomicBool,
}

impl SwitchableEmbedder {
    pub(crate) fn new() -> Self {
        Self {
            inner: MockProvider::new(256),
            failing: AtomicBool::new(false),
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for SwitchableEmbedder {
    fn provider_name(&self) -> &str {
        "switchable"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> Option<usize> {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("connection reset".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

/// Services with the given embedder, a scripted model and the built-in prompt.
pub(crate) fn services_with(
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<ScriptedLlm>,
) -> PipelineServices {
    PipelineServices {
        embedder,
        llm,
        prompt: builtin_prompt(QA_WITH_SOURCES).unwrap().unwrap(),
    }
}

/// Offline services: mock embeddings and a model that always says `reply`.
pub(crate) fn mock_services(reply: &str) -> (PipelineServices, Arc<ScriptedLlm>) {
    let llm = Arc::new(ScriptedLlm::replying(reply));
    let services = services_with(Arc::new(MockProvider::new(256)), llm.clone());
    (services, llm)
}
