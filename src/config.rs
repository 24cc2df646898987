use crate::domain::household::CorrelationKey;
use crate::domain::rules::{BasePolicy, RateSchedule};
use crate::error::{Result, SupplementError};
use crate::infrastructure::bus::DEFAULT_CAPACITY;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INPUT_PREFIX: &str = "BRE/calculateWinterSupplementInput";
pub const DEFAULT_OUTPUT_PREFIX: &str = "BRE/calculateWinterSupplementOutput";

/// Command-line and environment configuration.
///
/// Every global option can also be supplied through the environment variable
/// named next to it.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "winter-supplement",
    version,
    about = "Computes winter supplements through an asynchronous request/result pipeline"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Topic prefix requests are published under, as `<prefix>/<id>`.
    ///
    /// Environment variable: `INPUT_TOPIC_PREFIX`
    #[arg(long, env = "INPUT_TOPIC_PREFIX", default_value = DEFAULT_INPUT_PREFIX, global = true)]
    pub input_prefix: String,

    /// Topic prefix results are published under, as `<prefix>/<id>`.
    ///
    /// Environment variable: `OUTPUT_TOPIC_PREFIX`
    #[arg(long, env = "OUTPUT_TOPIC_PREFIX", default_value = DEFAULT_OUTPUT_PREFIX, global = true)]
    pub output_prefix: String,

    /// Base amount rule for households with children.
    ///
    /// Environment variable: `BASE_POLICY`
    #[arg(long, env = "BASE_POLICY", value_enum, default_value_t = PolicyArg::ChildrenAtCoupleRate, global = true)]
    pub base_policy: PolicyArg,

    /// Buffer size of each subscriber channel on the message bus.
    ///
    /// Environment variable: `CHANNEL_CAPACITY`
    #[arg(long, env = "CHANNEL_CAPACITY", default_value_t = DEFAULT_CAPACITY, global = true)]
    pub channel_capacity: usize,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve `POST /submit` and `GET /result/{id}` over HTTP.
    Serve(ServeArgs),
    /// Compute supplements for every household in a CSV file.
    Batch(BatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address the HTTP listener binds to.
    ///
    /// Environment variable: `HTTP_ADDR`
    #[arg(long, env = "HTTP_ADDR", default_value = "127.0.0.1:5000")]
    pub http_addr: SocketAddr,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Input households CSV file
    pub input: PathBuf,

    /// Delay between polls for a pending result.
    #[arg(long, default_value_t = 10)]
    pub poll_interval_ms: u64,

    /// How long to wait for each result before reporting it as pending.
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
}

impl BatchArgs {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    ChildrenAtCoupleRate,
    CompositionOnly,
}

impl From<PolicyArg> for BasePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::ChildrenAtCoupleRate => BasePolicy::ChildrenAtCoupleRate,
            PolicyArg::CompositionOnly => BasePolicy::CompositionOnly,
        }
    }
}

/// Topic names for the request and result channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    input_prefix: String,
    output_prefix: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            input_prefix: DEFAULT_INPUT_PREFIX.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl Topics {
    pub fn new(input_prefix: impl Into<String>, output_prefix: impl Into<String>) -> Result<Self> {
        let input_prefix = input_prefix.into();
        let output_prefix = output_prefix.into();
        check_prefix("input", &input_prefix)?;
        check_prefix("output", &output_prefix)?;
        if input_prefix == output_prefix {
            return Err(SupplementError::Config(
                "input and output topic prefixes must differ".to_string(),
            ));
        }
        Ok(Self {
            input_prefix,
            output_prefix,
        })
    }

    pub fn input(&self, key: &CorrelationKey) -> String {
        format!("{}/{key}", self.input_prefix)
    }

    pub fn output(&self, key: &CorrelationKey) -> String {
        format!("{}/{key}", self.output_prefix)
    }

    /// Filter matching one request topic per correlation key.
    pub fn input_filter(&self) -> String {
        format!("{}/+", self.input_prefix)
    }

    pub fn output_filter(&self) -> String {
        format!("{}/+", self.output_prefix)
    }

    /// The topic level after the input prefix, if `topic` is a request topic.
    pub fn key_from_input<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic
            .strip_prefix(self.input_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.contains('/'))
    }
}

fn check_prefix(which: &str, prefix: &str) -> Result<()> {
    if prefix.is_empty() || prefix.ends_with('/') || prefix.contains(['+', '#']) {
        return Err(SupplementError::Config(format!(
            "{which} topic prefix `{prefix}` must be non-empty, without wildcards or a trailing '/'"
        )));
    }
    Ok(())
}

/// Validated settings shared by every run mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub topics: Topics,
    pub schedule: RateSchedule,
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topics: Topics::default(),
            schedule: RateSchedule::default(),
            channel_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl TryFrom<&CliArgs> for Config {
    type Error = SupplementError;

    fn try_from(args: &CliArgs) -> Result<Self> {
        if args.channel_capacity == 0 {
            return Err(SupplementError::Config(
                "CHANNEL_CAPACITY must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            topics: Topics::new(args.input_prefix.clone(), args.output_prefix.clone())?,
            schedule: RateSchedule::with_policy(args.base_policy.into()),
            channel_capacity: args.channel_capacity,
        })
    }
}
