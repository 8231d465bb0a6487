use std::{env, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};
use tracing::debug;

mod demos;

use demos::{DemoConfig, DEFAULT_UNSUBSCRIBE_MS};

const MIN_LENGTH_VAR: &str = "RXSANDBOX_MIN_LENGTH";
const UNSUBSCRIBE_MS_VAR: &str = "RXSANDBOX_UNSUBSCRIBE_MS";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Demo {
    Creation,
    Observer,
    Operators,
    Input,
    Events,
    Interval,
}

const ALL_DEMOS: [Demo; 6] = [
    Demo::Creation,
    Demo::Observer,
    Demo::Operators,
    Demo::Input,
    Demo::Events,
    Demo::Interval,
];

impl FromStr for Demo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "creation" => Demo::Creation,
            "observer" => Demo::Observer,
            "operators" => Demo::Operators,
            "input" => Demo::Input,
            "events" => Demo::Events,
            "interval" => Demo::Interval,
            other => bail!(
                "unknown demo {:?}, expected one of: creation, observer, operators, input, events, interval, all",
                other
            ),
        })
    }
}

fn selected_demos(args: impl IntoIterator<Item = String>) -> Result<Vec<Demo>> {
    let mut demos = Vec::new();
    for arg in args {
        if arg == "all" {
            demos.extend(ALL_DEMOS);
        } else {
            demos.push(arg.parse()?);
        }
    }
    if demos.is_empty() {
        demos.extend(ALL_DEMOS);
    }
    Ok(demos)
}

fn setting<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value {:?} for {}", raw, name)),
        None => Ok(default),
    }
}

fn config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DemoConfig> {
    let defaults = DemoConfig::default();
    let unsubscribe_ms = setting(
        UNSUBSCRIBE_MS_VAR,
        lookup(UNSUBSCRIBE_MS_VAR),
        DEFAULT_UNSUBSCRIBE_MS,
    )?;
    Ok(DemoConfig {
        min_length: setting(MIN_LENGTH_VAR, lookup(MIN_LENGTH_VAR), defaults.min_length)?,
        unsubscribe_after: Duration::from_millis(unsubscribe_ms),
        ..defaults
    })
}

async fn run(demo: Demo, config: &DemoConfig) -> Vec<String> {
    debug!(?demo, "running demo");
    match demo {
        Demo::Creation => demos::creation(),
        Demo::Observer => demos::observer(config).await,
        Demo::Operators => demos::operators(),
        Demo::Input => demos::input(config),
        Demo::Events => demos::events(config).await,
        Demo::Interval => demos::ticks(config).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let demos = selected_demos(env::args().skip(1))?;
    let config = config_from(|name| env::var(name).ok())?;
    debug!(?config, "configuration loaded");

    for demo in demos {
        println!("--- {:?}", demo);
        for line in run(demo, &config).await {
            println!("{}", line);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_runs_everything() {
        assert_eq!(selected_demos(Vec::new()).unwrap(), ALL_DEMOS);
        assert_eq!(selected_demos(args(&["all"])).unwrap(), ALL_DEMOS);
    }

    #[test]
    fn demos_run_in_the_given_order() {
        assert_eq!(
            selected_demos(args(&["events", "observer", "creation"])).unwrap(),
            [Demo::Events, Demo::Observer, Demo::Creation]
        );
    }

    #[test]
    fn unknown_demo_is_rejected() {
        let err = selected_demos(args(&["creation", "subjects"])).unwrap_err();
        assert!(err.to_string().contains("subjects"));
    }

    #[test]
    fn config_defaults() {
        let config = config_from(|_| None).unwrap();

        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.unsubscribe_after, Duration::from_millis(3000));
    }

    #[test]
    fn large_unsubscribe_delay_is_kept() {
        let config = config_from(|name| (name == UNSUBSCRIBE_MS_VAR).then(|| u64::MAX.to_string())).unwrap();

        assert_eq!(config.unsubscribe_after, Duration::from_millis(u64::MAX));
    }

    #[test]
    fn config_overrides() {
        let config = config_from(|name| match name {
            MIN_LENGTH_VAR => Some("3".to_string()),
            UNSUBSCRIBE_MS_VAR => Some(" 250 ".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.min_length, 3);
        assert_eq!(config.unsubscribe_after, Duration::from_millis(250));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let err = config_from(|name| (name == MIN_LENGTH_VAR).then(|| "five".to_string())).unwrap_err();
        assert!(format!("{:#}", err).contains(MIN_LENGTH_VAR));
    }
}
