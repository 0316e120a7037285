use serde::Deserialize;

use crate::services::{
    knapsack::TableLimits, planner::PlannerSettings, AssemblySettings,
};

/// Which candidate source backs the outfit endpoint
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSourceKind {
    /// In-memory catalog, optionally loaded from `CATALOG_PATH`
    Catalog,
    /// Supabase vector search RPC
    Supabase,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_candidate_source")]
    pub candidate_source: CandidateSourceKind,

    /// JSON catalog used by the catalog source
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Supabase project URL
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase API key
    #[serde(default)]
    pub supabase_key: Option<String>,

    /// Retries for transient candidate source failures
    #[serde(default = "default_source_max_retries")]
    pub source_max_retries: u32,

    #[serde(default = "default_candidates_per_category")]
    pub candidates_per_category: usize,

    #[serde(default)]
    pub match_threshold: f64,

    /// Largest accepted cost ceiling in cents
    #[serde(default = "default_max_ceiling_cents")]
    pub max_ceiling_cents: u64,

    /// Largest accepted DP path table
    #[serde(default = "default_max_table_cells")]
    pub max_table_cells: u64,

    /// Headroom added to the full-outfit ceiling, in cents
    #[serde(default = "default_full_outfit_margin_cents")]
    pub full_outfit_margin_cents: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_candidate_source() -> CandidateSourceKind {
    CandidateSourceKind::Catalog
}

fn default_source_max_retries() -> u32 {
    2
}

fn default_candidates_per_category() -> usize {
    10
}

fn default_max_ceiling_cents() -> u64 {
    TableLimits::default().max_ceiling
}

fn default_max_table_cells() -> u64 {
    TableLimits::default().max_cells
}

fn default_full_outfit_margin_cents() -> u64 {
    PlannerSettings::default().full_outfit_margin_cents
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that serde defaults cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.candidate_source == CandidateSourceKind::Supabase
            && (self.supabase_url.is_none() || self.supabase_key.is_none())
        {
            anyhow::bail!("SUPABASE_URL and SUPABASE_KEY must be set for the supabase source");
        }
        if self.candidates_per_category == 0 {
            anyhow::bail!("CANDIDATES_PER_CATEGORY must be at least 1");
        }
        Ok(())
    }

    /// Engine and retrieval settings derived from this configuration
    pub fn assembly_settings(&self) -> AssemblySettings {
        AssemblySettings {
            planner: PlannerSettings {
                limits: TableLimits {
                    max_ceiling: self.max_ceiling_cents,
                    max_cells: self.max_table_cells,
                },
                full_outfit_margin_cents: self.full_outfit_margin_cents,
            },
            candidates_per_category: self.candidates_per_category,
            match_threshold: self.match_threshold,
        }
    }
}
