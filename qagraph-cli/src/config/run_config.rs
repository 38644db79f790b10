//! Run config: pipeline settings from env / .env plus CLI output switches.

use qagraph::PipelineConfig;

use super::RunOptions;

/// Error type used by config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    pub pipeline: PipelineConfig,
    /// Print one line per finished stage on stdout.
    pub stream: bool,
    /// Show debug logs on stderr.
    pub verbose: bool,
}

impl RunConfig {
    /// Reads `.env` and the process environment. See [`PipelineConfig::from_env`].
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            pipeline: PipelineConfig::from_env()?,
            ..Default::default()
        })
    }

    /// Applies the set fields of `options`.
    pub fn apply_options(&mut self, options: &RunOptions) {
        if let Some(model) = &options.model {
            self.pipeline.model = model.clone();
        }
        if let Some(n) = options.max_subquestions {
            self.pipeline.max_subquestions = n.max(1);
        }
        if let Some(n) = options.max_enrich_attempts {
            self.pipeline.max_enrich_attempts = n;
        }
        if let Some(url) = &options.context_api_url {
            self.pipeline.context_api_url = url.clone();
        }
        if options.db_path.is_some() {
            self.pipeline.db_path = options.db_path.clone();
        }
        if options.stream {
            self.stream = true;
        }
        self.verbose = options.verbose;
    }

    /// Session storage is on when a DB path is configured.
    pub fn persists_sessions(&self) -> bool {
        self.pipeline.db_path.is_some()
    }
}
