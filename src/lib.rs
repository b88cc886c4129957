//! JPF properties Language Server implementation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

pub mod analysis;
mod document;
mod lsp;
pub(crate) mod settings;

pub use document::{
    DocumentStore, Finding, LineAnalysis, LineIndex, PropertyDocument, Region, RegionKind,
};
pub use lsp::{
    hover_at_position, legend, to_diagnostics, token_modifiers, token_types, tokens_for_document,
};
pub use settings::{
    build_environment, current_origin, discover_settings, load_settings, load_source,
    load_sources, origin_of, Settings, SETTINGS_FILE,
};

use analysis::FileSystem;

/// Settings shared by every document in the workspace.
struct Workspace {
    settings: Settings,
    settings_dir: PathBuf,
}

impl Workspace {
    fn discover(dir: &Path) -> Self {
        let (settings, settings_dir) = settings::discover_settings(dir);
        Self {
            settings,
            settings_dir,
        }
    }
}

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    workspace: OnceLock<Workspace>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            workspace: OnceLock::new(),
        }
    }

    /// Workspace settings, discovered from the document's directory if the
    /// client didn't send a workspace root.
    fn workspace_for(&self, document: Option<&Path>) -> &Workspace {
        self.workspace.get_or_init(|| {
            let dir = document
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_default();
            Workspace::discover(&dir)
        })
    }

    /// Load sources and analyze a freshly opened document.
    async fn open_document(&self, uri: Url, text: String, version: i32) {
        let path = uri.to_file_path().ok();
        let workspace = self.workspace_for(path.as_deref());

        let registry = settings::load_sources(&workspace.settings, &workspace.settings_dir);
        let origin = settings::current_origin(
            &workspace.settings,
            &workspace.settings_dir,
            path.as_deref(),
        );
        let variables = Arc::new(settings::build_environment(&workspace.settings));
        let paths = Arc::new(match path.as_deref().and_then(Path::parent) {
            Some(dir) => FileSystem::with_base(dir),
            None => FileSystem::new(),
        });

        let mut document = PropertyDocument::attach(text, registry, origin, variables, paths);
        document.version = version;
        self.documents.open(uri.clone(), document);
        self.publish_for(&uri).await;
    }

    /// Publish diagnostics and the current warning line for a document.
    async fn publish_for(&self, uri: &Url) {
        let Some((diagnostics, version, warning)) = self.documents.with(uri, |doc| {
            (
                lsp::to_diagnostics(doc),
                doc.version,
                doc.warning().to_string(),
            )
        }) else {
            return;
        };

        self.client
            .publish_diagnostics(uri.clone(), diagnostics, Some(version))
            .await;

        if has_message(&warning) {
            self.client.log_message(MessageType::WARNING, warning).await;
        }
    }
}

/// Whether a warning line carries anything worth showing.
fn has_message(warning: &str) -> bool {
    !warning.is_empty() && warning != analysis::build_error_message::<&str>(&[])
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Extract workspace root from params
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        if let Some(root) = workspace_root {
            let _ = self.workspace.set(Workspace::discover(&root));
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..Default::default()
                    },
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: lsp::legend(),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: None,
                            work_done_progress_options: WorkDoneProgressOptions::default(),
                        },
                    ),
                ),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "JPF properties language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.open_document(
            params.text_document.uri,
            params.text_document.text,
            params.text_document.version,
        )
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let errors = self.documents.with_mut(&uri, |doc| {
            let mut errors = Vec::new();
            for change in params.content_changes {
                let result = match change.range {
                    Some(range) => match doc.line_index().range_to_span(range) {
                        Some(span) => doc.replace(span, &change.text),
                        None => Err(format!("change range {:?} is outside the document", range)),
                    },
                    None => doc.set_text(&change.text),
                };
                if let Err(e) = result {
                    errors.push(e);
                }
            }
            doc.version = version;
            errors
        });

        for error in errors.unwrap_or_default() {
            self.client
                .log_message(MessageType::ERROR, format!("ignored edit: {}", error))
                .await;
        }
        self.publish_for(&uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let path = uri.to_file_path().ok();
        let workspace = self.workspace_for(path.as_deref());

        // Sources may have changed on disk; pick them up and re-highlight.
        let registry = settings::load_sources(&workspace.settings, &workspace.settings_dir);
        self.documents.with_mut(&uri, |doc| {
            doc.reload(registry);
            doc.rescan();
        });
        self.publish_for(&uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.close(&params.text_document.uri);
        // Clear diagnostics
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self
            .documents
            .with(uri, |doc| lsp::hover_at_position(doc, position))
            .flatten())
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let uri = &params.text_document.uri;

        let Some(tokens) = self.documents.with(uri, lsp::tokens_for_document) else {
            return Ok(None);
        };

        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data: tokens,
        })))
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(Backend::new)
}
