//! Info command implementation
//!
//! Prints a metadata tree either as JSON or as an indented listing.

use std::path::Path;

use console::Style;

use crate::cli::InfoArgs;
use bundlefs::domain::{Backend, MetadataNode, NodeKind};
use bundlefs::error::Result;

/// Run info command
pub fn run(config: Option<&Path>, args: InfoArgs) -> Result<()> {
    let fs = super::open_bundle_fs(config)?;
    let target = super::parse_target(&args.target)?;
    let node = fs.resolve_and_index(&target, args.depth)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&node)?);
        return Ok(());
    }

    if let Some(resolved) = node.resolved_target.as_ref().filter(|t| **t != target) {
        println!(
            "{} {}",
            Style::new().bold().apply_to("Resolved:"),
            Style::new().cyan().apply_to(resolved)
        );
    }
    print_node(&node, 0);
    Ok(())
}

fn print_node(node: &MetadataNode, level: usize) {
    let name = match node.kind {
        NodeKind::Directory => Style::new().bold().blue().apply_to(display_name(node)),
        NodeKind::Link => Style::new().cyan().apply_to(display_name(node)),
        NodeKind::File => Style::new().apply_to(display_name(node)),
    };
    println!(
        "{}{} {}",
        "  ".repeat(level),
        name,
        Style::new().dim().apply_to(details(node))
    );
    for child in node.contents.iter().flatten() {
        print_node(child, level + 1);
    }
}

/// Name as listed: directories end in `/`, links show their target
fn display_name(node: &MetadataNode) -> String {
    match (node.kind, node.link.as_deref()) {
        (NodeKind::Directory, _) => format!("{}/", node.name),
        (NodeKind::Link, Some(target)) => format!("{} -> {target}", node.name),
        _ => node.name.clone(),
    }
}

fn details(node: &MetadataNode) -> String {
    let kind = match node.kind {
        NodeKind::File => "file",
        NodeKind::Directory => "directory",
        NodeKind::Link => "link",
    };
    let backend = match node.backend {
        Backend::Local => "",
        Backend::Archive => ", archive",
    };
    format!("({kind}, {} bytes, {:03o}{backend})", node.size, node.perm)
}
