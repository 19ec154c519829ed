//! `show` and `refresh`

use anyhow::Result;
use colored::Colorize;
use declarative::{REDACTED, Schema, StateModel, Value};
use serde_json::json;
use std::collections::BTreeMap;

use super::{RefreshReport, gateway, manifest_or_default, refresh_tracked, save_state};
use crate::Context;
use crate::cli::ShowArgs;
use crate::resource::repository::{model, reconciler::describe};
use crate::resource::workspace;
use crate::state::TrackedState;
use crate::ui;

pub fn show(ctx: &Context, args: ShowArgs) -> Result<()> {
    let state = TrackedState::load(&ctx.state_path)?;
    let filter = Filter::parse(args.address.as_deref());

    let workspace_schema = workspace::schema();
    let repository_schema = model::schema();

    let workspaces: Vec<_> = state
        .workspaces
        .iter()
        .filter(|(address, _)| filter.matches("workspace", address))
        .collect();
    let repositories: Vec<_> = state
        .repositories
        .iter()
        .filter(|(address, _)| filter.matches("repository", address))
        .collect();

    if args.json {
        let view = json!({
            "last_updated": state.last_updated,
            "workspaces": workspaces
                .iter()
                .map(|(address, record)| ((*address).clone(), redacted_json(&workspace_schema, *record)))
                .collect::<BTreeMap<_, _>>(),
            "repositories": repositories
                .iter()
                .map(|(address, record)| ((*address).clone(), redacted_json(&repository_schema, *record)))
                .collect::<BTreeMap<_, _>>(),
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    ui::header("RepoFlow State");
    if workspaces.is_empty() && repositories.is_empty() {
        println!();
        ui::info("No tracked resources");
        return Ok(());
    }
    ui::dim(&format!(
        "{} (updated {})",
        ctx.state_path.display(),
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for (address, record) in &workspaces {
        ui::section(&format!("workspace.{address}"));
        print_attributes(&workspace_schema, *record);
    }
    for (address, record) in &repositories {
        ui::section(&format!("repository.{address}"));
        ui::dim(&describe(record));
        print_attributes(&repository_schema, *record);
    }
    Ok(())
}

pub fn refresh(ctx: &Context) -> Result<()> {
    ui::header("RepoFlow Refresh");

    let manifest = manifest_or_default(ctx)?;
    let gateway = gateway(ctx, &manifest.provider)?;
    let mut state = TrackedState::load(&ctx.state_path)?;

    let tracked = state.workspaces.len() + state.repositories.len();
    let report = refresh_tracked(&gateway, &mut state);
    save_state(ctx, &mut state)?;

    print_report(&report);
    ui::success(&format!(
        "Refreshed {} of {} tracked resource(s)",
        tracked - report.dropped.len() - report.failed.len(),
        tracked
    ));
    Ok(())
}

fn print_report(report: &RefreshReport) {
    for address in &report.dropped {
        println!("  {} {} (no longer exists)", "-".red(), address);
    }
    for (address, error) in &report.failed {
        println!("  {} {}: {}", "!".yellow(), address, error);
    }
}

fn print_attributes<M: StateModel>(schema: &Schema, record: &M) {
    for (name, value) in redacted(schema, record) {
        if !value.is_null() {
            ui::kv(&name, &value.to_string());
        }
    }
}

/// Flattened record with sensitive values masked
fn redacted<M: StateModel>(schema: &Schema, record: &M) -> BTreeMap<String, Value> {
    record
        .attributes()
        .into_iter()
        .map(|(name, value)| {
            if schema.is_sensitive(&name) && !value.is_null() {
                (name, Value::String(REDACTED.to_string()))
            } else {
                (name, value)
            }
        })
        .collect()
}

fn redacted_json<M: StateModel>(schema: &Schema, record: &M) -> serde_json::Value {
    redacted(schema, record)
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Null => serde_json::Value::Null,
                Value::Bool(b) => json!(b),
                Value::Int(i) => json!(i),
                Value::String(s) => json!(s),
                Value::List(items) => json!(items),
            };
            (name, value)
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Address filter: "type", "type.address", or a bare address
#[derive(Debug, PartialEq, Eq)]
enum Filter<'a> {
    All,
    Type(&'a str),
    Address(Option<&'a str>, &'a str),
}

impl<'a> Filter<'a> {
    fn parse(raw: Option<&'a str>) -> Self {
        match raw {
            None => Self::All,
            Some(raw) => match raw.split_once('.') {
                Some((kind @ ("workspace" | "repository"), "")) => Self::Type(kind),
                Some((kind @ ("workspace" | "repository"), address)) => {
                    Self::Address(Some(kind), address)
                }
                _ if raw == "workspace" || raw == "repository" => Self::Type(raw),
                _ => Self::Address(None, raw),
            },
        }
    }

    fn matches(&self, kind: &str, address: &str) -> bool {
        match self {
            Self::All => true,
            Self::Type(k) => *k == kind,
            Self::Address(k, a) => k.is_none_or(|k| k == kind) && *a == address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::RepositoryDesired;
    use repoflow_api::Secret;

    #[test]
    fn test_filter_parse() {
        assert_eq!(Filter::parse(None), Filter::All);
        assert_eq!(Filter::parse(Some("repository")), Filter::Type("repository"));
        assert_eq!(
            Filter::parse(Some("repository.npm-local")),
            Filter::Address(Some("repository"), "npm-local")
        );
        assert_eq!(
            Filter::parse(Some("npm-local")),
            Filter::Address(None, "npm-local")
        );
    }

    #[test]
    fn test_filter_matches() {
        let bare = Filter::parse(Some("example"));
        assert!(bare.matches("workspace", "example"));
        assert!(bare.matches("repository", "example"));
        assert!(!bare.matches("repository", "other"));

        let typed = Filter::parse(Some("workspace.example"));
        assert!(typed.matches("workspace", "example"));
        assert!(!typed.matches("repository", "example"));
    }

    #[test]
    fn test_password_is_redacted() {
        let record = RepositoryDesired {
            id: Some("w1/r1".into()),
            name: "npm-proxy".into(),
            workspace_ref: "example".into(),
            repository_type: Some("remote".into()),
            package_type: Some("npm".into()),
            remote_url: Some("https://registry.npmjs.org".into()),
            remote_password: Some(Secret::new("hunter2")),
            ..RepositoryDesired::default()
        };

        let view = redacted_json(&model::schema(), &record);
        assert_eq!(view["remote_password"], json!(REDACTED));
        assert_eq!(view["metadata_cache_ttl_ms"], serde_json::Value::Null);
        assert_eq!(view["name"], json!("npm-proxy"));
        assert!(!view.to_string().contains("hunter2"));
    }
}
