//! Configuration management for the Pathway assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config file (`pathway.yaml` in the workspace)
//!
//! Precedence is CLI flags over environment variables over the config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Which tool set the orchestrator is wired with.
///
/// Variant A pairs document retrieval with a secondary web search; variant B
/// pairs it with the human-escalation workflow. Switching variants is pure
/// configuration — the orchestrator code is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ToolVariant {
    /// Retrieval + secondary web search
    #[serde(rename = "A", alias = "search")]
    Search,

    /// Retrieval + human escalation via email
    #[default]
    #[serde(rename = "B", alias = "escalation")]
    Escalation,
}

impl ToolVariant {
    /// Parse a variant from a CLI/env string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SEARCH" => Some(Self::Search),
            "B" | "ESCALATION" => Some(Self::Escalation),
            _ => None,
        }
    }
}

/// Language-model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider identifier (e.g., "ollama")
    pub provider: String,

    /// Optional custom endpoint URL
    pub endpoint: Option<String>,

    /// Model identifier
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(), // Local-first default
            endpoint: None,
            model: "llama3.2".to_string(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider identifier ("trigram" or "ollama")
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        }
    }
}

/// SMTP settings for the escalation mail dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Sender address (also the SMTP username)
    pub from_address: String,

    /// Environment variable holding the SMTP password
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Support inbox that receives escalated questions
    pub support_address: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_password_env() -> String {
    "PATHWAY_SMTP_PASSWORD".to_string()
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            from_address: String::new(),
            password_env: default_password_env(),
            support_address: String::new(),
        }
    }
}

/// Timeouts and retry bounds for external network calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bounded retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Directory holding the document corpus
    pub corpus_path: PathBuf,

    /// Where the index snapshot is persisted
    pub snapshot_path: PathBuf,

    /// Characters per chunk
    pub chunk_size: usize,

    /// Characters shared between adjacent chunks (must be < chunk_size)
    pub chunk_overlap: usize,

    /// Maximum retrieval hits returned per query
    pub top_k: usize,

    /// Tool-set variant (A: web search, B: escalation)
    pub tool_variant: ToolVariant,

    /// Upper bound on tool-calling iterations per turn
    pub max_orchestration_iterations: u32,

    /// Keywords that force the safety disclaimer onto an answer
    pub sensitive_keywords: Vec<String>,

    pub llm: LlmSettings,

    pub embedding: EmbeddingSettings,

    pub mail: MailSettings,

    pub network: NetworkSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (`pathway.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    corpus_path: Option<PathBuf>,
    snapshot_path: Option<PathBuf>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
    tool_variant: Option<String>,
    max_orchestration_iterations: Option<u32>,
    sensitive_keywords: Option<Vec<String>>,
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    mail: Option<MailSettings>,
    network: Option<NetworkSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

fn default_sensitive_keywords() -> Vec<String> {
    ["visa", "migration", "immigration", "guarantee", "guaranteed"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            corpus_path: workspace.join("docs"),
            snapshot_path: workspace.join(".pathway").join("index.json"),
            workspace,
            config_file: None,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            tool_variant: ToolVariant::default(),
            max_orchestration_iterations: 5,
            sensitive_keywords: default_sensitive_keywords(),
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            mail: MailSettings::default(),
            network: NetworkSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `PATHWAY_WORKSPACE`: Override workspace path
    /// - `PATHWAY_CONFIG`: Path to config file
    /// - `PATHWAY_CORPUS`: Document corpus directory
    /// - `PATHWAY_VARIANT`: Tool-set variant ("A" or "B")
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("PATHWAY_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
            config.corpus_path = config.workspace.join("docs");
            config.snapshot_path = config.workspace.join(".pathway").join("index.json");
        }

        if let Ok(config_file) = std::env::var("PATHWAY_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join("pathway.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(corpus) = std::env::var("PATHWAY_CORPUS") {
            config.corpus_path = PathBuf::from(corpus);
        }

        if let Ok(variant) = std::env::var("PATHWAY_VARIANT") {
            config.tool_variant = ToolVariant::parse(&variant).ok_or_else(|| {
                AppError::Config(format!("Invalid PATHWAY_VARIANT: {}", variant))
            })?;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(corpus_path) = file.corpus_path {
            result.corpus_path = corpus_path;
        }
        if let Some(snapshot_path) = file.snapshot_path {
            result.snapshot_path = snapshot_path;
        }
        if let Some(chunk_size) = file.chunk_size {
            result.chunk_size = chunk_size;
        }
        if let Some(chunk_overlap) = file.chunk_overlap {
            result.chunk_overlap = chunk_overlap;
        }
        if let Some(top_k) = file.top_k {
            result.top_k = top_k;
        }
        if let Some(variant) = file.tool_variant {
            result.tool_variant = ToolVariant::parse(&variant).ok_or_else(|| {
                AppError::Config(format!("Invalid tool_variant in {:?}: {}", path, variant))
            })?;
        }
        if let Some(max_iters) = file.max_orchestration_iterations {
            result.max_orchestration_iterations = max_iters;
        }
        if let Some(keywords) = file.sensitive_keywords {
            result.sensitive_keywords = keywords;
        }
        if let Some(llm) = file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }
        if let Some(mail) = file.mail {
            result.mail = mail;
        }
        if let Some(network) = file.network {
            result.network = network;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and file values.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        corpus: Option<PathBuf>,
        variant: Option<ToolVariant>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(corpus) = corpus {
            self.corpus_path = corpus;
        }

        if let Some(variant) = variant {
            self.tool_variant = variant;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate the chunking and orchestration parameters.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        if self.max_orchestration_iterations == 0 {
            return Err(AppError::Config(
                "max_orchestration_iterations must be at least 1".to_string(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the path to the .pathway state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(".pathway")
    }

    /// Ensure the .pathway state directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .pathway directory: {}", e))
            })?;
        }
        Ok(())
    }
}
