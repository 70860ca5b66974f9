//! Language server backend
//!
//! Holds one [`TextBuffer`] per open document and a process-wide
//! [`TokenCache`]. Text synchronization is incremental: every change reports
//! its replaced line range, and the cache repairs only that region instead of
//! reclassifying the whole document on each keystroke.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, DocumentSymbolParams, DocumentSymbolResponse, FoldingRange,
    FoldingRangeParams, FoldingRangeProviderCapability, InitializeParams, InitializeResult,
    InitializedParams, MessageType, OneOf, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use gamscope_core::{CancelFlag, LineEdit, LineToken, Position, Range, TextBuffer, TokenCache};

use crate::config::{Settings, CONFIG_FILE};
use crate::structural::{FoldingBuilder, SymbolBuilder};

/// LSP backend state
pub struct Backend {
    /// LSP client for sending notifications
    client: Client,
    /// Text buffers for open documents
    documents: Arc<RwLock<HashMap<Url, TextBuffer>>>,
    /// Per-line token cache shared across requests
    cache: Arc<RwLock<TokenCache>>,
    /// Settings loaded from the workspace root
    settings: Arc<RwLock<Settings>>,
}

impl Backend {
    /// Create a new backend instance
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(HashMap::new())),
            cache: Arc::new(RwLock::new(TokenCache::new())),
            settings: Arc::new(RwLock::new(Settings::default())),
        }
    }

    /// Assemble tokens for an open document, or `None` if it is unknown
    async fn tokens_for(&self, uri: &Url) -> Option<Vec<LineToken>> {
        let docs = self.documents.read().await;
        let buffer = docs.get(uri)?;
        Some(self.cache.write().await.tokens(buffer))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("gamscope LSP server initializing");

        // Workspace settings live in gamscope.toml next to the model files
        #[allow(deprecated)]
        if let Some(root) = params.root_uri.as_ref().and_then(|u| u.to_file_path().ok()) {
            match Settings::load(root.join(CONFIG_FILE)) {
                Ok(loaded) => *self.settings.write().await = loaded,
                Err(err) => warn!("ignoring bad {}: {}", CONFIG_FILE, err),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "gamscope-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("gamscope LSP server initialized");
        self.client
            .log_message(MessageType::INFO, "gamscope language server ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("gamscope LSP server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document opened: {}", uri);

        let buffer = TextBuffer::new(
            uri.as_str(),
            params.text_document.version,
            &params.text_document.text,
        );
        self.cache.write().await.tokens(&buffer);
        self.documents.write().await.insert(uri, buffer);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document changed: {}", uri);

        let mut docs = self.documents.write().await;
        let Some(buffer) = docs.get_mut(&uri) else {
            warn!("change for unopened document: {}", uri);
            return;
        };

        let mut edits: Vec<LineEdit> = Vec::new();
        let mut full_replace = false;
        for change in &params.content_changes {
            match change.range {
                Some(range) => edits.push(buffer.apply_change(convert_range(range), &change.text)),
                None => {
                    buffer.replace_all(&change.text);
                    full_replace = true;
                }
            }
        }
        buffer.set_version(params.text_document.version);

        let mut cache = self.cache.write().await;
        if full_replace {
            cache.invalidate(uri.as_str());
            cache.tokens(buffer);
        } else {
            cache.update(buffer, &edits);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document saved: {}", uri);

        // Resynchronize from the full text when the host provides it
        if let Some(text) = params.text {
            let mut docs = self.documents.write().await;
            if let Some(buffer) = docs.get_mut(&uri) {
                buffer.replace_all(&text);
                let mut cache = self.cache.write().await;
                cache.invalidate(uri.as_str());
                cache.tokens(buffer);
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document closed: {}", uri);
        self.documents.write().await.remove(&uri);
        self.cache.write().await.invalidate(uri.as_str());
    }

    async fn folding_range(
        &self,
        params: FoldingRangeParams,
    ) -> Result<Option<Vec<FoldingRange>>> {
        let uri = params.text_document.uri;
        debug!("Folding range request for: {}", uri);

        let Some(tokens) = self.tokens_for(&uri).await else {
            warn!("document not found for folding: {}", uri);
            return Ok(None);
        };

        let settings = self.settings.read().await;
        let ranges = FoldingBuilder::generate(&tokens, &CancelFlag::new(), &settings.folding);
        debug!("Generated {} folding ranges for {}", ranges.len(), uri);

        Ok(Some(ranges))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        debug!("Document symbol request for: {}", uri);

        let Some(tokens) = self.tokens_for(&uri).await else {
            warn!("document not found for symbols: {}", uri);
            return Ok(None);
        };

        let settings = self.settings.read().await;
        let symbols = SymbolBuilder::generate(&tokens, &CancelFlag::new(), &settings.outline);
        debug!("Generated {} document symbols for {}", symbols.len(), uri);

        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

fn convert_range(range: tower_lsp::lsp_types::Range) -> Range {
    Range::new(
        Position::new(range.start.line as usize, range.start.character as usize),
        Position::new(range.end.line as usize, range.end.character as usize),
    )
}

/// Run the language server over stdio
pub async fn run_server() {
    // Logs go to stderr; stdout carries the LSP wire protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting gamscope Language Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamscope_core::LineKind;

    #[test]
    fn test_range_conversion() {
        let lsp_range = tower_lsp::lsp_types::Range {
            start: tower_lsp::lsp_types::Position {
                line: 2,
                character: 4,
            },
            end: tower_lsp::lsp_types::Position {
                line: 3,
                character: 0,
            },
        };
        let range = convert_range(lsp_range);
        assert_eq!(range.start, Position::new(2, 4));
        assert_eq!(range.end, Position::new(3, 0));
    }

    #[test]
    fn test_incremental_change_flow() {
        // Mirrors did_change: apply the range edit, then repair the cache
        let mut buffer = TextBuffer::new("file:///m.gms", 1, "SETS\n  i;\nx = 1;");
        let mut cache = TokenCache::new();
        cache.tokens(&buffer);

        let edit = buffer.apply_change(
            convert_range(tower_lsp::lsp_types::Range {
                start: tower_lsp::lsp_types::Position {
                    line: 2,
                    character: 0,
                },
                end: tower_lsp::lsp_types::Position {
                    line: 2,
                    character: 6,
                },
            }),
            "* Done ---",
        );
        buffer.set_version(2);

        let tokens = cache.update(&buffer, &[edit]);
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[2].kind, LineKind::Section { level: 1, .. }));
    }
}
