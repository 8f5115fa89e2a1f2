use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ListResourcesResult, PaginatedRequestParam,
        ProtocolVersion, ReadResourceRequestParam, ReadResourceResult, ResourceContents,
        ServerCapabilities, ServerInfo,
    },
    schemars::{self, JsonSchema},
    service::RequestContext,
    tool, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::executor::{run_shell, CommandError};
use crate::filter::OutputFilter;
use crate::resource::{ReadmeResource, README_URI};

/// Parameters for the run_command tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunCommandRequest {
    /// The terminal command to execute
    pub command: String,

    #[serde(flatten)]
    pub filter: OutputFilter,
}

#[derive(Clone)]
pub struct TerminalServer {
    config: Arc<ServerConfig>,
    readme: ReadmeResource,
    tool_router: ToolRouter<Self>,
}

impl TerminalServer {
    pub fn new(config: ServerConfig) -> Self {
        let readme = ReadmeResource::new(config.readme_path.clone());
        Self {
            config: Arc::new(config),
            readme,
            tool_router: Self::tool_router(),
        }
    }

    /// Validate, run and filter a command. Every failure comes back as a
    /// typed `CommandError`; nothing here is a protocol error.
    ///
    /// The invocation is logged before validation, so rejected commands are
    /// recorded too.
    pub async fn execute(&self, req: &RunCommandRequest) -> Result<String, CommandError> {
        info!(command = %req.command, "Running command");
        self.config.policy.validate(&req.command)?;
        let grep = req.filter.compile()?;
        let output = run_shell(&req.command, &self.config.execution).await?;
        Ok(req.filter.apply(grep.as_ref(), output))
    }

    fn instructions(&self) -> String {
        format!(
            "A terminal MCP server.\n\n\
             Tool run_command: run a shell command and return its standard output. \
             Failures are returned as text starting with \"Error:\" (non-zero exit returns standard error). \
             Commands are killed after {} seconds.\n\
             Optional output filters: grep_pattern (with invert_grep), head, tail.\n\
             Shell policy: {}.\n\n\
             Resource {}: the MCP README.",
            self.config.execution.timeout.as_secs(),
            self.config.policy.describe(),
            README_URI,
        )
    }
}

#[rmcp::tool_router]
impl TerminalServer {
    #[tool(description = "Run a terminal command and return the output.

Args:
- command: the terminal command to execute

Returns the command's standard output. If the command exits non-zero the result is \"Error: \" followed by its standard error.

Optional output filters applied to successful output: grep_pattern (regex, invert_grep to exclude), head, tail.")]
    async fn run_command(
        &self,
        Parameters(req): Parameters<RunCommandRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.execute(&req).await {
            Ok(output) => Ok(CallToolResult::success(vec![Content::text(output)])),
            Err(e) => {
                debug!(
                    command = %req.command,
                    exit_code = ?e.exit_code(),
                    error = %e,
                    "run_command failed"
                );
                Ok(CallToolResult::error(vec![Content::text(e.to_tool_text())]))
            }
        }
    }
}

#[rmcp::tool_handler]
impl ServerHandler for TerminalServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(self.instructions()),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(vec![self.readme.descriptor()]))
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if uri != README_URI {
            warn!(uri = %uri, "Unknown resource requested");
            return Err(McpError::resource_not_found(
                format!("Unknown resource: {}", uri),
                None,
            ));
        }
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(self.readme.contents(), uri)],
        })
    }
}
