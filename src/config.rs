use std::fmt;
use std::time::Duration;

use crate::args::Args;
use crate::error::ConfigError;

pub const DEFAULT_PERCENTILES: [f64; 3] = [50.0, 90.0, 99.0];

/// Ordered percentile targets. Starts out holding [`DEFAULT_PERCENTILES`];
/// the first explicit target replaces them, later ones append.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileSpec {
    targets: Vec<f64>,
    defaulted: bool,
}

impl Default for PercentileSpec {
    fn default() -> Self {
        Self {
            targets: DEFAULT_PERCENTILES.to_vec(),
            defaulted: true,
        }
    }
}

impl PercentileSpec {
    pub fn add_target(&mut self, text: &str) -> Result<(), ConfigError> {
        let value: f64 = text.parse().map_err(|source| ConfigError::Percentile {
            text: text.to_string(),
            source,
        })?;

        if self.defaulted {
            self.targets.clear();
            self.defaulted = false;
        }
        self.targets.push(value);
        Ok(())
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn is_defaulted(&self) -> bool {
        self.defaulted
    }
}

impl fmt::Display for PercentileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.targets {
            write!(f, "{},", p)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub percentiles: PercentileSpec,
    pub show_mean: bool,
    pub show_max: bool,
    pub refresh_rate: Duration,
}

impl RunConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let mut percentiles = PercentileSpec::default();
        for text in &args.percentiles {
            percentiles.add_target(text)?;
        }

        if args.refresh_rate == 0 {
            return Err(ConfigError::RefreshRate(args.refresh_rate));
        }

        Ok(Self {
            percentiles,
            show_mean: args.mean,
            show_max: args.max,
            refresh_rate: Duration::from_secs(args.refresh_rate),
        })
    }
}
