use clap::Parser;
use std::ffi::OsString;

const SINGLE_DASH_LONG_FLAGS: &[&str] = &["mean", "max", "refreshRate"];

#[derive(Parser, Debug)]
#[command(
    name = "stat_stream",
    about = "Read one number per line from stdin and periodically print percentiles over everything seen so far"
)]
pub struct Args {
    /// The percentile you want. Repeatable; defaults to 50/90/99 if not specified
    #[arg(
        short = 'p',
        value_name = "PERCENTILE",
        action = clap::ArgAction::Append,
        allow_negative_numbers = true
    )]
    pub percentiles: Vec<String>,

    /// If the mean should be shown
    #[arg(long = "mean")]
    pub mean: bool,

    /// If the max should be shown
    #[arg(long = "max")]
    pub max: bool,

    /// The rate at which to refresh the calculated values in seconds
    #[arg(
        long = "refresh-rate",
        visible_alias = "refreshRate",
        value_name = "SECONDS",
        default_value_t = 1
    )]
    pub refresh_rate: u64,
}

impl Args {
    /// Parses the process arguments, accepting `-mean`, `-max` and
    /// `-refreshRate` in their single-dash spelling.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_flags(std::env::args_os()))
    }
}

/// Rewrites single-dash long flags (`-mean`, `-refreshRate=5`) into the
/// double-dash form clap expects. Everything else passes through untouched.
pub fn normalize_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if SINGLE_DASH_LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}
