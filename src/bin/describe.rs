//! flownodes-describe: print the built-in node descriptors as JSON.
//!
//! Hosts that do not link the crate read node metadata from this output.
//!
//! # Usage
//!
//! ```bash
//! flownodes-describe                        # every node
//! flownodes-describe --base-class Tool      # nodes producing tools
//! flownodes-describe --category "Chat Models"
//! flownodes-describe --names                # node names only
//! ```
//!
//! `RUST_LOG` sets the log filter (default: "info,flownodes=debug"). Logs go
//! to stderr; stdout carries only JSON.

use anyhow::{bail, Context};

use flownodes::nodes::{CapabilityDescriptor, NodeRegistry};

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    base_class: Option<String>,
    category: Option<String>,
    names_only: bool,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut args = Args::default();
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--base-class" => {
                    args.base_class = Some(raw.next().context("--base-class needs a value")?)
                }
                "--category" => {
                    args.category = Some(raw.next().context("--category needs a value")?)
                }
                "--names" => args.names_only = true,
                other => bail!("unknown argument: {}", other),
            }
        }
        Ok(args)
    }

    fn matches(&self, descriptor: &CapabilityDescriptor) -> bool {
        self.base_class
            .as_deref()
            .map_or(true, |class| descriptor.satisfies(class))
            && self
                .category
                .as_deref()
                .map_or(true, |category| descriptor.category() == category)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flownodes=debug".into()),
        )
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let registry = NodeRegistry::with_builtin_nodes().context("built-in nodes failed validation")?;

    let selected: Vec<&CapabilityDescriptor> = registry
        .descriptors()
        .into_iter()
        .filter(|d| args.matches(d))
        .collect();

    tracing::info!(
        "flownodes {}: {} of {} node(s) selected",
        flownodes::VERSION,
        selected.len(),
        registry.len()
    );

    let output = if args.names_only {
        let names: Vec<&str> = selected.iter().map(|d| d.name()).collect();
        serde_json::to_string_pretty(&names)?
    } else {
        serde_json::to_string_pretty(&selected)?
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_filters() {
        let args = parse(&["--base-class", "Tool", "--category", "Tools", "--names"]).unwrap();
        assert_eq!(args.base_class.as_deref(), Some("Tool"));
        assert_eq!(args.category.as_deref(), Some("Tools"));
        assert!(args.names_only);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["--base-class"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_matches() {
        let registry = NodeRegistry::with_builtin_nodes().unwrap();
        let args = parse(&["--base-class", "BaseChatModel"]).unwrap();
        let names: Vec<&str> = registry
            .descriptors()
            .into_iter()
            .filter(|d| args.matches(d))
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["chatAnthropic"]);
    }
}
