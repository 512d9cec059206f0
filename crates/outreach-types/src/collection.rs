//! Lead-collection tool vocabulary.
//!
//! These types describe what input an operator has, what they are willing
//! to spend, and which integrations are configured. The selector in
//! `outreach-core` turns them into a [`Selection`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the operator wants to collect leads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InputDescriptor {
    /// LinkedIn profile URLs.
    #[serde(rename = "linkedin_urls")]
    LinkedInUrls(Vec<String>),
    /// Company website URLs.
    CompanyUrls(Vec<String>),
    /// Free-text search queries ("CTO fintech Berlin").
    SearchQueries(Vec<String>),
    /// A Sales Navigator CSV export on disk.
    SalesNavCsv { path: String },
}

impl InputDescriptor {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::LinkedInUrls(_) => InputKind::LinkedInUrl,
            Self::CompanyUrls(_) => InputKind::CompanyUrl,
            Self::SearchQueries(_) => InputKind::SearchQuery,
            Self::SalesNavCsv { .. } => InputKind::SalesNavCsv,
        }
    }

    /// Number of targets (URLs, queries); a CSV counts as one.
    pub fn target_count(&self) -> usize {
        match self {
            Self::LinkedInUrls(v) | Self::CompanyUrls(v) | Self::SearchQueries(v) => v.len(),
            Self::SalesNavCsv { .. } => 1,
        }
    }
}

/// Payload-free discriminant of [`InputDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[serde(rename = "linkedin_url")]
    LinkedInUrl,
    CompanyUrl,
    SearchQuery,
    SalesNavCsv,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinkedInUrl => "linkedin_url",
            Self::CompanyUrl => "company_url",
            Self::SearchQuery => "search_query",
            Self::SalesNavCsv => "sales_nav_csv",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative spend, shared by budgets and tool costs so they compare directly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CostLevel {
    #[default]
    Free,
    Low,
    Medium,
    High,
}

impl CostLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for CostLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator budget for a collection request.
pub type Budget = CostLevel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Speed,
    #[default]
    Balanced,
    Accuracy,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Balanced => "balanced",
            Self::Accuracy => "accuracy",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub priority: Priority,
}

/// Which optional integrations are configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableCredentials {
    /// Headless browser automation is installed.
    #[serde(default)]
    pub browser_automation: bool,
    /// A search-API key is configured.
    #[serde(default)]
    pub search_api: bool,
    /// An enrichment-API key is configured.
    #[serde(default)]
    pub enrichment_api: bool,
}

impl AvailableCredentials {
    /// Requirements of `tool` that are not satisfied.
    pub fn missing_for(&self, tool: CollectionTool) -> Vec<&'static str> {
        match tool {
            CollectionTool::BrowserScraper if !self.browser_automation => {
                vec!["browser automation"]
            }
            CollectionTool::SearchApi if !self.search_api => vec!["search API key"],
            _ => Vec::new(),
        }
    }

    pub fn supports(&self, tool: CollectionTool) -> bool {
        self.missing_for(tool).is_empty()
    }
}

/// External method used to acquire raw contact candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionTool {
    BrowserScraper,
    SearchApi,
    SalesNavProcessor,
}

impl CollectionTool {
    pub const ALL: [CollectionTool; 3] = [
        Self::BrowserScraper,
        Self::SearchApi,
        Self::SalesNavProcessor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BrowserScraper => "browser_scraper",
            Self::SearchApi => "search_api",
            Self::SalesNavProcessor => "sales_nav_processor",
        }
    }

    /// Static description of what the tool does and what it costs.
    pub fn capability(self) -> ToolCapability {
        match self {
            Self::BrowserScraper => ToolCapability {
                tool: self,
                name: "Browser Scraper",
                description: "Scrapes LinkedIn profiles, company websites, and directories",
                inputs: vec![InputKind::LinkedInUrl, InputKind::CompanyUrl],
                cost: CostLevel::Free,
                accuracy: Accuracy::High,
                estimated_time: "2-5 seconds per profile",
                round_trips: 1,
            },
            Self::SearchApi => ToolCapability {
                tool: self,
                name: "Search API Collector",
                description: "Collects leads from web search results",
                inputs: vec![InputKind::SearchQuery],
                cost: CostLevel::Low,
                accuracy: Accuracy::Medium,
                estimated_time: "1-2 seconds per search",
                round_trips: 1,
            },
            Self::SalesNavProcessor => ToolCapability {
                tool: self,
                name: "Sales Navigator CSV Processor",
                description: "Cleans and normalizes Sales Navigator exports",
                inputs: vec![InputKind::SalesNavCsv],
                cost: CostLevel::Free,
                accuracy: Accuracy::High,
                estimated_time: "Instant",
                round_trips: 0,
            },
        }
    }
}

impl fmt::Display for CollectionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCapability {
    pub tool: CollectionTool,
    pub name: &'static str,
    pub description: &'static str,
    pub inputs: Vec<InputKind>,
    pub cost: CostLevel,
    pub accuracy: Accuracy,
    pub estimated_time: &'static str,
    /// Network round trips per target.
    pub round_trips: u32,
}

/// A tool, optionally with enrichment chained after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOption {
    pub tool: CollectionTool,
    pub enrich: bool,
    pub confidence: f64,
    pub cost: CostLevel,
    /// Expected network round trips per target.
    pub round_trips: u32,
}

/// Why the selector chose what it chose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    pub summary: String,
    /// The chosen option costs more than the stated budget.
    pub over_budget: bool,
    /// Constraints that could not be honored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Selector output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub chosen: ToolOption,
    pub fallbacks: Vec<ToolOption>,
    pub confidence: f64,
    pub rationale: Rationale,
}
