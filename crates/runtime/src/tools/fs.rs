//! Filesystem tools, all confined to the sandbox root.

use super::{Tool, ToolError, parse_args};
use crate::model::ToolSpec;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sandbox::Sandbox;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// Entries per page of `listProjectFiles`.
const PAGE_SIZE: usize = 100;

/// Content encoding for file reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Encoding {
    #[default]
    Utf8,
    Base64,
}

/// All entries under `base`, as `/`-separated paths relative to it, sorted.
fn walk_relative(base: &Path) -> Vec<String> {
    WalkDir::new(base)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(base).ok()?;
            Some(relative.to_string_lossy().replace('\\', "/"))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// saveProjectFile
// ─────────────────────────────────────────────────────────────────────────────

pub struct SaveProjectFile {
    sandbox: Arc<Sandbox>,
}

impl SaveProjectFile {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct SaveProjectFileArgs {
    path: String,
    content: String,
    #[serde(default)]
    encoding: Encoding,
}

#[async_trait]
impl Tool for SaveProjectFile {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "saveProjectFile".into(),
            description: "Allows to create a file in the project folder, for binary files it is \
                          possible to send the content via Base64"
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path of the file relative to the project root folder",
                    },
                    "content": {
                        "type": "string",
                        "description": "The content of the file",
                    },
                    "encoding": {
                        "type": "string",
                        "description": "The encoding of the content, default is utf8",
                        "enum": ["utf8", "base64"],
                    },
                },
                "required": ["path", "content", "encoding"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: SaveProjectFileArgs = parse_args(args)?;
        let resolved = self.sandbox.resolve(&args.path)?;

        let bytes = match args.encoding {
            Encoding::Utf8 => args.content.into_bytes(),
            Encoding::Base64 => BASE64
                .decode(args.content)
                .map_err(|e| ToolError::InvalidInput(format!("invalid base64 content: {e}")))?,
        };

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::Execution(format!("Error creating folder: {e}")))?;
        }
        tokio::fs::write(&resolved, bytes)
            .await
            .map_err(|e| ToolError::Execution(format!("Error writing file: {e}")))?;

        Ok(Value::String("File created successfully".into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// readProjectFile
// ─────────────────────────────────────────────────────────────────────────────

pub struct ReadProjectFile {
    sandbox: Arc<Sandbox>,
}

impl ReadProjectFile {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct ReadProjectFileArgs {
    path: String,
    #[serde(default)]
    encoding: Encoding,
}

#[async_trait]
impl Tool for ReadProjectFile {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "readProjectFile".into(),
            description: "Allows to read a file in the project folder".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path of the file relative to the project root folder",
                    },
                    "encoding": {
                        "type": "string",
                        "description": "The encoding of the content, default is utf8",
                        "enum": ["utf8", "base64"],
                    },
                },
                "required": ["path"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: ReadProjectFileArgs = parse_args(args)?;
        let resolved = self.sandbox.resolve(&args.path)?;

        // Read failures are an expected outcome the model adapts to, so
        // they are returned as result text rather than as an error.
        match tokio::fs::read(&resolved).await {
            Ok(bytes) => Ok(Value::String(match args.encoding {
                Encoding::Utf8 => String::from_utf8_lossy(&bytes).into_owned(),
                Encoding::Base64 => BASE64.encode(bytes),
            })),
            Err(e) => Ok(Value::String(format!("Error reading file: {e}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// deleteProjectFile / deleteProjectFolder
// ─────────────────────────────────────────────────────────────────────────────

pub struct DeleteProjectFile {
    sandbox: Arc<Sandbox>,
}

impl DeleteProjectFile {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

#[async_trait]
impl Tool for DeleteProjectFile {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "deleteProjectFile".into(),
            description: "Allows to delete a file in the project folder".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path of the file relative to the project root folder",
                    },
                },
                "required": ["path"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: PathArgs = parse_args(args)?;
        let resolved = self.sandbox.resolve(&args.path)?;

        tokio::fs::remove_file(&resolved)
            .await
            .map_err(|e| ToolError::Execution(format!("Error deleting file: {e}")))?;

        Ok(Value::String("File deleted successfully".into()))
    }
}

pub struct DeleteProjectFolder {
    sandbox: Arc<Sandbox>,
}

impl DeleteProjectFolder {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for DeleteProjectFolder {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "deleteProjectFolder".into(),
            description: "Allows to delete a folder recursively".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path of the folder relative to the project root folder",
                    },
                },
                "required": ["path"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: PathArgs = parse_args(args)?;
        let resolved = self.sandbox.resolve(&args.path)?;

        tokio::fs::remove_dir_all(&resolved)
            .await
            .map_err(|e| ToolError::Execution(format!("Error deleting folder: {e}")))?;

        Ok(Value::String("Folder deleted successfully".into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// listProjectFiles
// ─────────────────────────────────────────────────────────────────────────────

pub struct ListProjectFiles {
    sandbox: Arc<Sandbox>,
}

impl ListProjectFiles {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct ListProjectFilesArgs {
    path: String,
    page: Option<u32>,
}

#[async_trait]
impl Tool for ListProjectFiles {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "listProjectFiles".into(),
            description: "Allows to list all files in the project folder, paginated, please go \
                          through the pages by incrementing the page number until total pages \
                          are reached"
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path of the folder relative to the project root folder",
                    },
                    "page": {
                        "type": "number",
                        "description": "The page number",
                    },
                },
                "required": ["path"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: ListProjectFilesArgs = parse_args(args)?;
        let resolved = self.sandbox.resolve(&args.path)?;
        let page = args.page.unwrap_or(1).max(1) as usize;

        // A missing folder is a hint, not an error: the model often probes
        // paths that do not exist yet.
        if !resolved.is_dir() {
            return Ok(json!({
                "files": [],
                "totalFiles": 0,
                "currentPage": 1,
                "totalPages": 1,
                "instructions": format!("The path {} does not exist", args.path),
            }));
        }

        let files = walk_relative(&resolved);
        let total = files.len();
        let start = (page - 1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(total);
        let paged: Vec<&str> = files
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .collect();

        Ok(json!({
            "files": paged,
            "totalFiles": total,
            "currentPage": page,
            "totalPages": total.div_ceil(PAGE_SIZE),
            "instructions": if end < total {
                "There are more files, please go to the next page"
            } else {
                "You fetched all files"
            },
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// findProjectFilesByName / findProjectFilesByContent
// ─────────────────────────────────────────────────────────────────────────────

pub struct FindProjectFilesByName {
    sandbox: Arc<Sandbox>,
}

impl FindProjectFilesByName {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

#[async_trait]
impl Tool for FindProjectFilesByName {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "findProjectFilesByName".into(),
            description: "Allows to find files in the project folder, matching the search query"
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find files in the project root folder",
                    },
                },
                "required": ["query"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: QueryArgs = parse_args(args)?;
        let matches: Vec<String> = walk_relative(self.sandbox.root())
            .into_iter()
            .filter(|path| path.contains(&args.query))
            .collect();
        Ok(json!(matches))
    }
}

pub struct FindProjectFilesByContent {
    sandbox: Arc<Sandbox>,
}

impl FindProjectFilesByContent {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for FindProjectFilesByContent {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "findProjectFilesByContent".into(),
            description: "Allows to find files in the project folder, matching the search query \
                          in the content of the files"
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query to find files in the project root folder",
                    },
                },
                "required": ["query"],
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value, ToolError> {
        let args: QueryArgs = parse_args(args)?;
        let root = self.sandbox.root();

        let mut matches = Vec::new();
        for relative in walk_relative(root) {
            // Directories and binary files are skipped, not errors.
            let Ok(content) = tokio::fs::read_to_string(root.join(&relative)).await else {
                continue;
            };
            if content.contains(&args.query) {
                matches.push(relative);
            }
        }
        Ok(json!(matches))
    }
}
