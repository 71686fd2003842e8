//! framedom CLI
//!
//! Renders a heading and a numbered list into an `<iframe>` through the
//! adapter, the way a virtual-DOM renderer would, then runs the host's event
//! loop and prints the resulting tree.
//!
//! Run with: `cargo run --bin framedom -- --clean --items 5`

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use framedom_api::{Config, ContentPolicy, Dispatch, DomApi, OperationKind};
use framedom_dom::trusted_types::{TrustedHtml, TrustedScript, TrustedScriptUrl};
use framedom_dom::{DomTree, FrameLoading, NodeId, NodeType};
use log::info;
use owo_colors::OwoColorize;

/// framedom: render into an iframe before it has loaded
#[derive(Parser, Debug)]
#[command(name = "framedom")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Render three items into a loading iframe
    framedom

    # Create nodes in an isolated document with an uppercasing policy
    framedom --clean --policy upper

    # Simulate a frame that never finishes loading
    framedom --stall

    # Dump the final tree as JSON
    framedom --json --items 2
"#)]
struct Cli {
    /// Number of list items to render
    #[arg(long, default_value = "3")]
    items: usize,

    /// Heading text
    #[arg(long, default_value = "framedom")]
    title: String,

    /// Create nodes in an isolated nested document
    #[arg(long)]
    clean: bool,

    /// Content policy installed in the isolated document
    #[arg(long, value_enum, requires = "clean")]
    policy: Option<PolicyKind>,

    /// Nested documents never finish loading on their own
    #[arg(long)]
    stall: bool,

    /// Print the final tree as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyKind {
    /// Uppercase markup, tag script text, prefix script URLs
    Upper,
    /// Drop angle brackets from markup
    Strip,
}

struct DemoPolicy(PolicyKind);

impl ContentPolicy for DemoPolicy {
    fn sanitize_markup(&self, input: &str) -> TrustedHtml {
        match self.0 {
            PolicyKind::Upper => TrustedHtml::new(input.to_uppercase()),
            PolicyKind::Strip => TrustedHtml::new(input.replace(['<', '>'], "")),
        }
    }

    fn sanitize_script_text(&self, input: &str) -> TrustedScript {
        TrustedScript::new(format!("/* approved */ {input}"))
    }

    fn sanitize_script_reference(&self, input: &str) -> TrustedScriptUrl {
        TrustedScriptUrl::new(format!("https://static.invalid{input}"))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut tree = DomTree::html_document();
    if cli.stall {
        tree.set_frame_loading(FrameLoading::Stalled);
    }

    let mut config = Config::new().clean(cli.clean);
    if let Some(kind) = cli.policy {
        config = config.with_content_policy(Rc::new(DemoPolicy(kind)));
    }
    let mut api = DomApi::with_config(tree, config);

    let body = api
        .environment()
        .body(NodeId::ROOT)
        .context("ambient document has no <body>")?;
    let frame = api.create_element("iframe");
    let _ = api.append_child(&body, &frame)?;
    info!("rendering into {frame:?}, state {}", api.frame_state(&frame));

    render(&mut api, frame, &cli)?;

    println!(
        "{} {} ({} queued)",
        "before load:".bold(),
        api.frame_state(&frame),
        api.pending_operations(&frame)
    );
    let ran = api.run_until_idle();
    println!(
        "{} {} ({} queued, {ran} tasks run)",
        "after load:".bold(),
        api.frame_state(&frame),
        api.pending_operations(&frame)
    );
    if api.pending_operations(&frame) > 0 {
        println!(
            "{}",
            "frame never finished loading; operations are still waiting".yellow()
        );
    }

    let tree = api.environment();
    if cli.json {
        let snapshot = tree
            .snapshot(NodeId::ROOT)
            .context("top-level document missing")?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!();
        print_tree(tree, NodeId::ROOT, 0);
    }
    Ok(())
}

/// Issue the renderer calls: heading, list, and a markup note in clean mode.
fn render(api: &mut DomApi<DomTree>, frame: NodeId, cli: &Cli) -> Result<()> {
    let heading = api.create_element("h1");
    let _ = api.set_text_content(&heading, &cli.title)?;
    report(OperationKind::AppendChild, api.append_child(&frame, &heading)?);

    let list = api.create_element("ol");
    for n in 1..=cli.items {
        let item = api.create_element("li");
        let _ = api.set_text_content(&item, &format!("item {n}"))?;
        let _ = api.append_child(&list, &item)?;
    }
    report(OperationKind::AppendChild, api.append_child(&frame, &list)?);

    if api.config().content_policy().is_some() {
        let note = api.create_element("aside");
        api.environment_mut()
            .set_inner_markup(note, "<em>approved by policy</em>")?;
        report(OperationKind::AppendChild, api.append_child(&frame, &note)?);
    }

    let footer = api.create_text_node("end");
    report(
        OperationKind::InsertBefore,
        api.insert_before(&frame, &footer, None)?,
    );
    Ok(())
}

fn report(kind: OperationKind, outcome: Dispatch) {
    match outcome {
        Dispatch::Applied => println!("{} {kind}", "applied ".green()),
        Dispatch::Deferred => println!("{} {kind}", "deferred".yellow()),
    }
}

/// Print a subtree, descending into the nested documents of iframes.
fn print_tree(tree: &DomTree, id: NodeId, indent: usize) {
    let prefix = "  ".repeat(indent);
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.node_type {
        NodeType::Document(data) => {
            println!("{prefix}{} ({})", "#document".bold(), data.ready_state);
        }
        NodeType::Element(data) => {
            let attrs: BTreeMap<_, _> = data.attrs.iter().collect();
            let attrs: String = attrs
                .into_iter()
                .map(|(k, v)| format!(" {k}=\"{v}\""))
                .collect();
            println!("{prefix}<{}{attrs}>", data.tag_name.cyan());
            if let Some(markup) = &data.markup {
                println!("{prefix}  {}", markup.magenta());
            }
        }
        NodeType::Text(data) => {
            let display = data.replace('\n', "\\n");
            println!("{prefix}{}", format!("\"{display}\"").green());
        }
        NodeType::Comment(data) => {
            println!("{prefix}{}", format!("<!-- {data} -->").dimmed());
        }
    }
    for &child in tree.children(id) {
        print_tree(tree, child, indent + 1);
    }
    if let Some(document) = tree.content_document(id) {
        print_tree(tree, document, indent + 1);
    }
}
