//! Command execution
//!
//! Every command reads an already-built forest and renders either text or
//! pretty JSON. Lookups that find nothing are reported, not raised.

use crate::cli::Command;
use anyhow::{Context, Result};
use hierarchy_model::{Permission, RawNode, RoleId, TreeNode};
use hierarchy_tree::{
    aggregated_permissions, find_node_by_role_id, flatten_tree, path_to_role, search_tree,
    transform_tree, tree_stats, validate_hierarchy, AggregateOptions, BuildReport, IngestMode,
    SearchCriteria, TransformOptions, TreeBuilder,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Rendered command result
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) output: String,
    pub(crate) success: bool,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }

    fn failed(output: String) -> Self {
        Self {
            output,
            success: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct RoleSummary<'a> {
    id: RoleId,
    name: &'a str,
    depth: usize,
}

impl<'a> From<&'a TreeNode> for RoleSummary<'a> {
    fn from(node: &'a TreeNode) -> Self {
        Self {
            id: node.role.id,
            name: &node.role.name,
            depth: node.metadata().map_or(0, |meta| meta.depth),
        }
    }
}

/// Read and build a forest from a JSON file
pub(crate) fn load_tree(path: &Path, mode: IngestMode) -> Result<BuildReport> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Vec<RawNode> = serde_json::from_str(&source)
        .with_context(|| format!("{} is not a JSON array of tree nodes", path.display()))?;

    let report = TreeBuilder::new()
        .with_mode(mode)
        .build(&raw)
        .with_context(|| format!("failed to build tree from {}", path.display()))?;

    tracing::info!(
        file = %path.display(),
        roots = report.tree.len(),
        rejected = report.rejected.len(),
        "loaded tree"
    );
    Ok(report)
}

/// Run one command against a forest
pub(crate) fn run(command: &Command, tree: &[TreeNode], json: bool) -> Result<Outcome> {
    match command {
        Command::Validate => {
            let report = validate_hierarchy(tree);
            let output = if json {
                to_json(&report)?
            } else {
                let mut text = String::from(if report.is_valid { "valid" } else { "invalid" });
                for error in &report.errors {
                    let _ = write!(text, "\nerror: {error}");
                }
                for warning in &report.warnings {
                    let _ = write!(text, "\nwarning: {warning}");
                }
                for suggestion in &report.suggestions {
                    let _ = write!(text, "\nsuggestion: {suggestion}");
                }
                text
            };
            Ok(Outcome {
                output,
                success: report.is_valid,
            })
        }

        Command::Flatten => {
            let rows = flatten_tree(tree);
            if json {
                return Ok(Outcome::ok(to_json(&rows)?));
            }
            let lines: Vec<String> = rows
                .iter()
                .map(|row| format!("{}\t{}", row.role.id, row.flat_path))
                .collect();
            Ok(Outcome::ok(lines.join("\n")))
        }

        Command::Find { role } => match find_node_by_role_id(tree, RoleId(*role)) {
            Some(node) if json => Ok(Outcome::ok(to_json(node)?)),
            Some(node) => {
                let summary = RoleSummary::from(node);
                let mut text = format!("{} ({}) depth {}", summary.name, summary.id, summary.depth);
                if !node.permissions.is_empty() {
                    let _ = write!(text, "\npermissions: {}", permission_names(&node.permissions));
                }
                if !node.children.is_empty() {
                    let children: Vec<&str> = node.children.iter().map(|c| c.role.name.as_str()).collect();
                    let _ = write!(text, "\nchildren: {}", children.join(", "));
                }
                Ok(Outcome::ok(text))
            }
            None => not_found(*role, json),
        },

        Command::Path { role } => {
            let path = path_to_role(tree, RoleId(*role));
            if path.is_empty() {
                return not_found(*role, json);
            }
            if json {
                let summaries: Vec<RoleSummary<'_>> = path.into_iter().map(RoleSummary::from).collect();
                return Ok(Outcome::ok(to_json(&summaries)?));
            }
            let names: Vec<&str> = path.iter().map(|node| node.role.name.as_str()).collect();
            Ok(Outcome::ok(names.join(" > ")))
        }

        Command::Permissions {
            role,
            no_inherit,
            guard,
            keep_duplicates,
        } => {
            if find_node_by_role_id(tree, RoleId(*role)).is_none() {
                return not_found(*role, json);
            }
            let mut options = AggregateOptions::default()
                .with_inherited(!no_inherit)
                .with_deduplicate(!keep_duplicates);
            if let Some(guard) = guard {
                options = options.with_guard(guard.clone());
            }

            let permissions = aggregated_permissions(tree, RoleId(*role), &options);
            if json {
                return Ok(Outcome::ok(to_json(&permissions)?));
            }
            let lines: Vec<String> = permissions.iter().map(describe_permission).collect();
            Ok(Outcome::ok(lines.join("\n")))
        }

        Command::Search {
            role,
            name,
            permission,
        } => {
            let mut criteria = SearchCriteria::new();
            if let Some(role) = role {
                criteria = criteria.with_role_id(*role);
            }
            if let Some(name) = name {
                criteria = criteria.with_role_name(name.clone());
            }
            if let Some(permission) = permission {
                criteria = criteria.with_permission_name(permission.clone());
            }

            let matches = search_tree(tree, &criteria);
            tracing::debug!(matches = matches.len(), "searched tree");
            if json {
                let summaries: Vec<RoleSummary<'_>> = matches.into_iter().map(RoleSummary::from).collect();
                return Ok(Outcome::ok(to_json(&summaries)?));
            }
            let lines: Vec<String> = matches
                .iter()
                .map(|node| format!("{}\t{}", node.role.id, node.role.name))
                .collect();
            Ok(Outcome::ok(lines.join("\n")))
        }

        Command::Transform {
            max_depth,
            no_permissions,
            no_metadata,
        } => {
            let mut options = TransformOptions::default()
                .with_permissions(!no_permissions)
                .with_metadata(!no_metadata);
            if let Some(depth) = max_depth {
                options = options.with_max_depth(*depth);
            }

            let transformed = transform_tree(tree, &options);
            if json {
                return Ok(Outcome::ok(to_json(&transformed)?));
            }
            let mut lines = Vec::new();
            render(&transformed, 0, &mut lines);
            Ok(Outcome::ok(lines.join("\n")))
        }

        Command::Stats => {
            let stats = tree_stats(tree);
            if json {
                return Ok(Outcome::ok(to_json(&stats)?));
            }
            Ok(Outcome::ok(format!(
                "nodes: {}\nroots: {}\nleaves: {}\nmax depth: {}",
                stats.node_count, stats.root_count, stats.leaf_count, stats.max_depth
            )))
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

fn not_found(role: u64, json: bool) -> Result<Outcome> {
    let output = if json {
        to_json(&serde_json::Value::Null)?
    } else {
        format!("role {role} not found")
    };
    Ok(Outcome::failed(output))
}

fn describe_permission(permission: &Permission) -> String {
    match &permission.guard_name {
        Some(guard) => format!("{} ({guard})", permission.name),
        None => permission.name.clone(),
    }
}

fn permission_names(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render(nodes: &[TreeNode], indent: usize, lines: &mut Vec<String>) {
    for node in nodes {
        let mut line = format!("{}{} ({})", "  ".repeat(indent), node.role.name, node.role.id);
        if !node.permissions.is_empty() {
            let _ = write!(line, " [{}]", permission_names(&node.permissions));
        }
        lines.push(line);
        render(&node.children, indent + 1, lines);
    }
}
