//! MCP server exposing catalog search and downloads.

use crate::state::VaultState;
use crate::tools::download::{DownloadRequest, handle_download};
use crate::tools::reload::{ReloadRequest, handle_reload};
use crate::tools::search::{SearchRequest, handle_search};
use crate::tools::stats::handle_stats;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP Server for past-paper search
#[derive(Clone)]
pub struct VaultServer {
    /// Shared session state (catalog, blob cache, in-flight fetches)
    state: Arc<VaultState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for VaultServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl VaultServer {
    pub fn new(state: Arc<VaultState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub const fn state(&self) -> &Arc<VaultState> {
        &self.state
    }

    #[tool(
        description = "Search the past-paper catalog. Understands subjects, years, language medium (sinhala/tamil/english), document type (paper, marking scheme) and level (A/L, O/L, grade). Returns ranked results with relevance and the file id to download.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search_papers(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Download a paper by the file id shown in search results and save it to a local directory. Returns the saved path.",
        input_schema = inline_schema_for_type::<DownloadRequest>()
    )]
    async fn download_paper(
        &self,
        Parameters(request): Parameters<DownloadRequest>,
    ) -> std::result::Result<String, String> {
        handle_download(&self.state, request).await
    }

    #[tool(
        description = "Re-read the catalog from its CSV so newly added papers become searchable. Optionally clears downloaded files kept in memory.",
        input_schema = inline_schema_for_type::<ReloadRequest>()
    )]
    async fn reload_catalog(
        &self,
        Parameters(request): Parameters<ReloadRequest>,
    ) -> std::result::Result<String, String> {
        handle_reload(&self.state, request).await
    }

    #[tool(description = "Show how many papers the catalog holds and how many distinct file names.")]
    async fn catalog_stats(&self) -> std::result::Result<String, String> {
        Ok(handle_stats(&self.state).await)
    }
}

#[tool_handler]
impl ServerHandler for VaultServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.instructions = Some(
            "papervault: search a catalog of past exam papers and download them. \
             Use search_papers with a free-text query such as 'a/l physics 2021 sinhala', \
             then download_paper with a file id from the results."
                .to_string(),
        );
        info
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this sets `inline_subschemas = true`
/// so clients render optional fields directly instead of following `$ref`s.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}
