//! MCP server surface
//!
//! Exposes the knowledge base to agent hosts as MCP tools plus a stats
//! resource. The transport (stdio framing, request routing) belongs to rmcp;
//! this module only maps tool calls onto the RAG service.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
    PaginatedRequestParam, RawResource, ReadResourceRequestParam, ReadResourceResult,
    ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::rag::service::LoadedFile;
use crate::rag::RagService;

const STATS_URI: &str = "rag://stats";

/// How many chunk ids an add_document response carries at most
const MAX_REPORTED_IDS: usize = 5;

/// Preview lengths (characters) for search results and listings
const SEARCH_PREVIEW_CHARS: usize = 200;
const LIST_PREVIEW_CHARS: usize = 100;

/// RAG MCP service
#[derive(Clone)]
pub struct RagMcpServer {
    service: Arc<RagService>,
    tool_router: ToolRouter<Self>,
}

impl RagMcpServer {
    pub fn new(service: Arc<RagService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Tool Input/Output Schemas
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddDocumentRequest {
    /// Document content to add
    #[schemars(description = "Full text of the document to add to the knowledge base")]
    pub content: String,

    /// Document title, used to identify the source
    #[schemars(description = "Document title used as the source label")]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct AddDocumentResponse {
    pub message: String,
    pub chunk_count: usize,
    /// First few chunk ids; large documents produce many more
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query text
    #[schemars(description = "Natural language query to search the knowledge base")]
    pub query: String,

    /// Maximum results (default: 3)
    #[schemars(description = "Maximum number of chunks to return")]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct SearchHit {
    pub title: String,
    /// Chunk content, capped at 200 characters
    pub content: String,
    pub score: f32,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct SearchResponse {
    pub message: String,
    pub results: Vec<SearchHit>,
    /// Formatted context block ready to paste into a prompt
    pub context: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDocumentsRequest {
    /// Maximum entries (default: 20)
    #[schemars(description = "Maximum number of chunk entries to return")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct DocumentEntry {
    pub id: String,
    pub title: String,
    /// Chunk content, capped at 100 characters
    pub preview: String,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ListDocumentsResponse {
    pub message: String,
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct LoadSampleDataResponse {
    pub message: String,
    pub loaded_files: Vec<LoadedFileEntry>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct LoadedFileEntry {
    pub file: String,
    pub chunks: usize,
}

impl From<LoadedFile> for LoadedFileEntry {
    fn from(f: LoadedFile) -> Self {
        Self {
            file: f.file,
            chunks: f.chunks,
        }
    }
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ClearResponse {
    pub message: String,
    pub success: bool,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl RagMcpServer {
    /// Add a document to the knowledge base
    #[tool(
        description = "Add a document to the knowledge base. The content is split into overlapping chunks and stored in the vector database for later semantic search."
    )]
    pub async fn add_document(
        &self,
        Parameters(request): Parameters<AddDocumentRequest>,
    ) -> Result<CallToolResult, McpError> {
        let title = request.title.unwrap_or_else(|| "Untitled".to_string());

        let result = match self.service.add_document(&request.content, &title, None).await {
            Ok(r) => r,
            Err(e) => return Ok(tool_error("add_document", &e)),
        };

        let ids: Vec<String> = result.ids.into_iter().take(MAX_REPORTED_IDS).collect();
        json_result(&AddDocumentResponse {
            message: format!("Added document '{}'", title),
            chunk_count: result.chunk_count,
            ids,
        })
    }

    /// Semantic search over the knowledge base
    #[tool(
        description = "Search the knowledge base by semantic similarity. Returns the most relevant chunks with scores and a formatted context block."
    )]
    pub async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let chunks = match self.service.retrieve(&request.query, request.top_k).await {
            Ok(c) => c,
            Err(e) => return Ok(tool_error("search", &e)),
        };

        if chunks.is_empty() {
            return json_result(&SearchResponse {
                message: "No relevant documents found".to_string(),
                results: Vec::new(),
                context: String::new(),
            });
        }

        let results: Vec<SearchHit> = chunks
            .iter()
            .map(|chunk| SearchHit {
                title: chunk
                    .metadata
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown")
                    .to_string(),
                content: preview(&chunk.text, SEARCH_PREVIEW_CHARS),
                score: (chunk.score * 1000.0).round() / 1000.0,
            })
            .collect();

        let context = self.service.format_context(&chunks);

        json_result(&SearchResponse {
            message: format!("Found {} relevant results", results.len()),
            results,
            context,
        })
    }

    /// List stored chunks
    #[tool(description = "List chunks stored in the knowledge base with short previews.")]
    pub async fn list_documents(
        &self,
        Parameters(request): Parameters<ListDocumentsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let limit = request.limit.unwrap_or(20);

        let chunks = match self.service.list(limit).await {
            Ok(c) => c,
            Err(e) => return Ok(tool_error("list_documents", &e)),
        };

        let documents: Vec<DocumentEntry> = chunks
            .iter()
            .map(|chunk| DocumentEntry {
                id: chunk.id.clone(),
                title: chunk
                    .metadata
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown")
                    .to_string(),
                preview: preview(&chunk.text, LIST_PREVIEW_CHARS),
            })
            .collect();

        json_result(&ListDocumentsResponse {
            message: format!("{} chunk(s) stored", documents.len()),
            documents,
        })
    }

    /// Ingest the sample data directory
    #[tool(
        description = "Load every .txt and .md file from the configured data directory into the knowledge base."
    )]
    pub async fn load_sample_data(&self) -> Result<CallToolResult, McpError> {
        let report = match self.service.load_data_directory().await {
            Ok(r) => r,
            Err(e) => return Ok(tool_error("load_sample_data", &e)),
        };

        json_result(&LoadSampleDataResponse {
            message: format!("Loaded {} file(s)", report.total_files),
            loaded_files: report.loaded_files.into_iter().map(Into::into).collect(),
        })
    }

    /// Wipe the knowledge base
    #[tool(
        description = "Delete every document from the knowledge base. This cannot be undone."
    )]
    pub async fn clear_knowledge_base(&self) -> Result<CallToolResult, McpError> {
        if let Err(e) = self.service.clear().await {
            return Ok(tool_error("clear_knowledge_base", &e));
        }

        json_result(&ClearResponse {
            message: "Knowledge base cleared".to_string(),
            success: true,
        })
    }
}

// ============================================================================
// Server handler: info + resources
// ============================================================================

#[tool_handler]
impl ServerHandler for RagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "RAG knowledge base with local embeddings and qdrant storage. \
                 Use 'add_document' to ingest text, 'search' for semantic queries, \
                 'list_documents' to inspect stored chunks, 'load_sample_data' to \
                 ingest the data directory, and 'clear_knowledge_base' to wipe it. \
                 The 'rag://stats' resource reports knowledge-base statistics."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut stats = RawResource::new(STATS_URI, "Knowledge base statistics");
        stats.description = Some(
            "Collection name, stored chunk count, storage URL and data directory".to_string(),
        );
        stats.mime_type = Some("application/json".to_string());

        Ok(ListResourcesResult {
            resources: vec![stats.no_annotation()],
            next_cursor: None,
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if request.uri != STATS_URI {
            return Err(McpError::resource_not_found(
                "unknown resource",
                Some(json!({ "uri": request.uri })),
            ));
        }

        let stats = self
            .service
            .stats()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let text = serde_json::to_string_pretty(&stats)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, STATS_URI)],
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Serialize a response payload into a successful tool result
fn json_result<T: Serialize>(payload: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(payload)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Report a pipeline failure as a tool error, not a transport error
fn tool_error(tool: &str, err: &anyhow::Error) -> CallToolResult {
    warn!(tool, error = %err, "tool call failed");
    CallToolResult::error(vec![Content::text(format!("Error: {:#}", err))])
}

/// Cap text at `max_chars` characters, marking truncation with an ellipsis
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}
