use clap::{Args, Parser, Subcommand};
use semantic_rewrite::{
    ChangeSet, EntityTree, Error, Literal, Result, SyntaxProvider, read_file,
    json::{NodeJson, Response, generate_execution_id},
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Rewrite source regions addressed by syntactic meaning
#[derive(Parser, Debug)]
#[command(name = "semantic-rewrite")]
#[command(version = "0.1.0")]
#[command(about = "Address classes, functions and variables by dotted path and rewrite them", long_about = None)]
struct Cli {
    /// Output structured JSON instead of human-readable
    #[arg(short, long, global = true)]
    json: bool,

    /// Log span resolution and change application to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every node in a project
    Tree {
        /// Project directory
        dir: PathBuf,
    },
    /// Print the source of one node
    Show {
        dir: PathBuf,
        /// Dotted path of the node, e.g. `lib.employee.Employee`
        path: String,
        /// Print only the body
        #[arg(long)]
        body: bool,
    },
    /// Replace a node's text
    Overwrite {
        dir: PathBuf,
        path: String,
        #[command(flatten)]
        text: NewText,
        /// Replace only the body
        #[arg(long)]
        body: bool,
        /// Write the change instead of previewing it
        #[arg(long)]
        commit: bool,
    },
    /// Replace a variable's value with a literal
    SetValue {
        dir: PathBuf,
        path: String,
        /// Literal in the project's language, e.g. `[1, 2]`
        literal: String,
        /// Write the change instead of previewing it
        #[arg(long)]
        commit: bool,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct NewText {
    /// Replacement text
    #[arg(long)]
    text: Option<String>,
    /// File holding the replacement text
    #[arg(long)]
    from: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    let response = match execute(cli.command) {
        Ok(response) => response,
        Err(e) => Response::failure(generate_execution_id(), e.to_string()),
    };

    output_response(&response, json);

    if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Initialize tracing subscriber; `RUST_LOG` overrides the level
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(command: Command) -> Result<Response> {
    match command {
        Command::Tree { dir } => {
            let mut tree = EntityTree::open(&dir)?;
            let mut nodes = Vec::new();
            for id in tree.descendants(tree.root())? {
                nodes.push(NodeJson::describe(&tree, id)?);
            }
            Ok(Response::nodes(generate_execution_id(), nodes))
        }
        Command::Show { dir, path, body } => {
            let mut tree = EntityTree::open(&dir)?;
            let id = tree.find(&path)?;
            let source = if body {
                tree.get_body_source(id)?
            } else {
                tree.get_source(id)?
            };
            Ok(Response::source(generate_execution_id(), source))
        }
        Command::Overwrite {
            dir,
            path,
            text,
            body,
            commit,
        } => {
            let new_text = match (text.text, text.from) {
                (Some(text), _) => text,
                (None, Some(from)) => read_file(&from)?.content,
                (None, None) => String::new(),
            };
            let mut tree = EntityTree::open(&dir)?;
            let id = tree.find(&path)?;
            let generator = tree.change(id);
            let change = if body {
                generator.overwrite_body(new_text)?
            } else {
                generator.overwrite(new_text)?
            };
            finish(ChangeSet::from_iter([change]), commit)
        }
        Command::SetValue {
            dir,
            path,
            literal,
            commit,
        } => {
            let mut tree = EntityTree::open(&dir)?;
            let id = tree.find(&path)?;
            let value = parse_literal(&tree, &literal)?;
            let change = tree.change(id).value(&value)?;
            finish(ChangeSet::from_iter([change]), commit)
        }
    }
}

fn parse_literal<P: SyntaxProvider>(tree: &EntityTree<P>, text: &str) -> Result<Literal> {
    tree.provider()
        .parse_literal(text)
        .ok_or_else(|| Error::Parse {
            source_name: "<literal>".to_string(),
            reason: format!("'{}' is not a constant literal", text),
        })
}

/// Preview the set, then commit it when asked
fn finish(set: ChangeSet, commit: bool) -> Result<Response> {
    let execution_id = set.id().to_string();
    let diff = set.preview()?;
    let report = if commit { Some(set.commit()?) } else { None };
    Ok(Response::change(execution_id, diff, report))
}

/// Format and output the response
fn output_response(response: &Response, json_mode: bool) {
    if json_mode {
        let output = serde_json::to_string_pretty(response)
            .unwrap_or_else(|_| r#"{"error": "Failed to serialize response"}"#.to_string());
        println!("{}", output);
        return;
    }

    if let Some(error) = &response.error {
        eprintln!("Error: {}", error);
        return;
    }

    if let Some(nodes) = &response.nodes {
        for node in nodes {
            match (&node.file, &node.whole) {
                (Some(file), Some(whole)) => println!(
                    "{:<10} {}  ({}:{})",
                    node.kind.as_str(),
                    node.path,
                    file,
                    whole.start.line + 1
                ),
                _ => println!("{:<10} {}", node.kind.as_str(), node.path),
            }
        }
    }

    if let Some(source) = &response.source {
        println!("{}", source);
    }

    if let Some(diff) = &response.diff {
        print!("{}", diff);
    }

    if let Some(commit) = &response.commit {
        println!(
            "Committed {} file(s), total byte shift {}",
            commit.files.len(),
            commit.total_byte_shift()
        );
    }
}
