// file: src/mcp/server.rs
// description: MCP tool server exposing paper search and deep-dive lookups
// reference: https://docs.rs/rmcp

use crate::error::XplorerError;
use crate::models::{SearchMethod, SectionAddress};
use crate::service::XplorerService;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Free text for keyword and semantic search, or a paper id for similarity search
    pub query: String,
    /// keyword, semantic or similarity (default: semantic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<SearchMethod>,
    /// Results per page (default: 8)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// 1-indexed page (default: 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Only papers published in this year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct PaperMetadataRequest {
    /// arXiv id such as 1706.03762 or quant-ph/9802065
    pub paper_id: String,
    /// Include the abstract (default: true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_abstract: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ReadSectionRequest {
    /// arXiv id of the paper
    pub paper_id: String,
    /// Top-level section number, or a path such as [3, 1] for subsection 1 of section 3
    pub section_id: SectionAddress,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ChunkSearchRequest {
    /// arXiv id of the paper
    pub paper_id: String,
    /// What to look for inside the paper
    pub query: String,
    /// Chunks per page (default: 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// 1-indexed page (default: 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ReadCitationRequest {
    /// arXiv id of the paper
    pub paper_id: String,
    /// Citation key or the full <cit. KEY> marker from section text
    pub citation: String,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct GetFigureRequest {
    /// arXiv id of the paper
    pub paper_id: String,
    /// Figure label from a <fig. LABEL: caption> marker
    pub figure_id: String,
}

#[derive(Clone)]
pub struct XplorerMcp {
    service: Arc<XplorerService>,
    tool_router: ToolRouter<Self>,
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize result: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Domain failures are tool results the agent can read and act on, not
/// protocol errors.
fn error_result(tool: &str, err: XplorerError) -> Result<CallToolResult, McpError> {
    warn!("MCP: {} failed: {}", tool, err);
    let body = serde_json::json!({
        "error": err.kind(),
        "message": err.to_string(),
        "retriable": err.is_retriable(),
    });
    Ok(CallToolResult::error(vec![Content::text(body.to_string())]))
}

#[tool_router]
impl XplorerMcp {
    pub fn new(service: Arc<XplorerService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search the paper corpus by keyword, semantic similarity to a query, or similarity to another paper. Returns id, title, first author, date and an abstract snippet per paper.")]
    async fn search(
        &self,
        Parameters(SearchRequest {
            query,
            method,
            count,
            page,
            year,
        }): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let method = method.unwrap_or(SearchMethod::Semantic);
        info!("MCP: {} search for '{}'", method, query);

        match self.service.search(&query, method, count, page, year).await {
            Ok(results) => json_result(&results),
            Err(e) => error_result("search", e),
        }
    }

    #[tool(description = "Read a paper's metadata: title, authors, date, optional abstract, an indented table of contents with word and figure counts, whether citations can be read, and the number of figures.")]
    async fn read_paper_metadata(
        &self,
        Parameters(PaperMetadataRequest {
            paper_id,
            show_abstract,
        }): Parameters<PaperMetadataRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: metadata for {}", paper_id);

        match self
            .service
            .read_paper_metadata(&paper_id, show_abstract.unwrap_or(true))
            .await
        {
            Ok(metadata) => json_result(&metadata),
            Err(e) => error_result("read_paper_metadata", e),
        }
    }

    #[tool(description = "Read a section including all of its subsections. Text contains <cit. KEY> and <fig. LABEL: caption> markers usable with read_citation and get_figure.")]
    async fn read_section(
        &self,
        Parameters(ReadSectionRequest {
            paper_id,
            section_id,
        }): Parameters<ReadSectionRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: section {} of {}", section_id, paper_id);

        match self.service.read_section(&paper_id, &section_id).await {
            Ok(section) => json_result(&section),
            Err(e) => error_result("read_section", e),
        }
    }

    #[tool(description = "Semantic search inside one paper. Returns the most relevant text chunks, each starting with its section title.")]
    async fn chunk_search(
        &self,
        Parameters(ChunkSearchRequest {
            paper_id,
            query,
            count,
            page,
        }): Parameters<ChunkSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: chunk search in {} for '{}'", paper_id, query);

        match self.service.chunk_search(&paper_id, &query, count, page).await {
            Ok(chunks) => json_result(&chunks),
            Err(e) => error_result("chunk_search", e),
        }
    }

    #[tool(description = "Resolve a citation marker to its bibliography entry. Only works when read_paper_metadata reports can_read_citation.")]
    async fn read_citation(
        &self,
        Parameters(ReadCitationRequest { paper_id, citation }): Parameters<ReadCitationRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: citation {} in {}", citation, paper_id);

        match self.service.read_citation(&paper_id, &citation).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => error_result("read_citation", e),
        }
    }

    #[tool(description = "Get a figure's caption, the section it appears in and its image urls.")]
    async fn get_figure(
        &self,
        Parameters(GetFigureRequest {
            paper_id,
            figure_id,
        }): Parameters<GetFigureRequest>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: figure {} in {}", figure_id, paper_id);

        match self.service.get_figure(&paper_id, &figure_id).await {
            Ok(figure) => json_result(&figure),
            Err(e) => error_result("get_figure", e),
        }
    }
}

#[tool_handler]
impl ServerHandler for XplorerMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(
                Implementation::new("paper_xplorer", env!("CARGO_PKG_VERSION"))
                    .with_title("Paper Xplorer"),
            )
            .with_instructions(
                "Tools for finding and reading research papers. \
                Start with 'search' to find papers, then 'read_paper_metadata' for the table of contents. \
                Use 'read_section' with a section number or path, and 'chunk_search' to locate passages. \
                Section text carries <cit. KEY> and <fig. LABEL: caption> markers for 'read_citation' and 'get_figure'. \
                Errors with retriable=true may be retried.",
            )
    }
}
