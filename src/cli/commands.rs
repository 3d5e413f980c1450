use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use uast_query::uast::decode_nodes;
use uast_query::{
    Config, Datum, EvalContext, FileWalker, FunctionRegistry, Mode, Node, UastContext,
};

use super::{Cli, Commands, TreeArgs};

enum Job {
    Language,
    Tree(TreeArgs, TreeJob),
}

enum TreeJob {
    Parse { mode: String },
    Extract { key: String },
    Children,
    Imports,
}

/// One output line per input file.
#[derive(Serialize)]
struct Line {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Output>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Null,
    Text(String),
    Array(Vec<Output>),
    Nodes(Vec<Node>),
}

impl From<Datum> for Output {
    fn from(datum: Datum) -> Self {
        match datum {
            Datum::Null => Output::Null,
            Datum::Text(s) => Output::Text(s),
            Datum::Array(items) => Output::Array(items.into_iter().map(Output::from).collect()),
            Datum::Blob(blob) => match decode_nodes(&blob) {
                Ok(nodes) => Output::Nodes(nodes),
                Err(_) => Output::Text(String::from_utf8_lossy(&blob).into_owned()),
            },
        }
    }
}

pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let config = Config::from_env().with_overrides(cli.cache_size, cli.max_blob_size);

    let (paths, job) = match cli.command {
        Commands::Parse { tree, mode } => {
            mode.parse::<Mode>()?;
            (tree.paths.clone(), Job::Tree(tree, TreeJob::Parse { mode }))
        }
        Commands::Extract { tree, key } => (tree.paths.clone(), Job::Tree(tree, TreeJob::Extract { key })),
        Commands::Children { tree } => (tree.paths.clone(), Job::Tree(tree, TreeJob::Children)),
        Commands::Imports { tree } => (tree.paths.clone(), Job::Tree(tree, TreeJob::Imports)),
        Commands::Language { paths } => (paths, Job::Language),
    };

    let files = FileWalker::default().expand(&paths)?;
    tracing::debug!(files = files.len(), "processing inputs");

    let uast = Arc::new(UastContext::with_tree_sitter(config));
    let worker = Arc::clone(&uast);
    let lines = tokio::task::spawn_blocking(move || process(&worker, &job, &files, &cancel))
        .await
        .context("worker pool panicked")?;

    for line in &lines {
        println!("{}", serde_json::to_string(line)?);
    }

    if cli.stats {
        eprintln!("{}", serde_json::to_string(&uast.resolver().stats())?);
    }
    Ok(())
}

fn process(uast: &UastContext, job: &Job, files: &[PathBuf], cancel: &CancellationToken) -> Vec<Line> {
    let functions = FunctionRegistry::new();
    files
        .par_iter()
        .map(|path| {
            let mut line = Line {
                path: path.display().to_string(),
                language: None,
                result: None,
                error: None,
                warnings: Vec::new(),
            };
            if cancel.is_cancelled() {
                line.error = Some("cancelled".to_string());
                return line;
            }

            let ctx = EvalContext::with_cancel(cancel.clone());
            match evaluate(&functions, uast, &ctx, job, path) {
                Ok((language, datum)) => {
                    line.language = language;
                    line.result = Some(datum.into());
                }
                Err(err) => line.error = Some(format!("{:#}", err)),
            }
            line.warnings = ctx.warnings();
            line
        })
        .collect()
}

fn evaluate(
    functions: &FunctionRegistry,
    uast: &UastContext,
    ctx: &EvalContext,
    job: &Job,
    path: &Path,
) -> Result<(Option<String>, Datum)> {
    let content = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let path_text = path.to_string_lossy().into_owned();

    let (tree_args, tree_job) = match job {
        Job::Language => {
            let datum = functions.call("language", uast, ctx, &[Datum::Text(path_text), Datum::Blob(content)])?;
            return Ok((datum.as_text().map(str::to_string), datum));
        }
        Job::Tree(args, tree_job) => (args, tree_job),
    };

    let language = tree_args
        .language
        .clone()
        .or_else(|| uast.detector().detect(&path_text, &content));
    let lang = language.clone().map_or(Datum::Null, Datum::Text);
    let xpath = tree_args.xpath.clone().map_or(Datum::Null, Datum::Text);

    let nodes = match tree_job {
        TreeJob::Parse { mode } => {
            let tree = functions.call("uast_mode", uast, ctx, &[Datum::from(mode.as_str()), Datum::Blob(content), lang])?;
            if tree.is_null() || xpath.is_null() {
                tree
            } else {
                functions.call("uast_xpath", uast, ctx, &[tree, xpath])?
            }
        }
        _ => functions.call("uast", uast, ctx, &[Datum::Blob(content), lang, xpath])?,
    };

    let result = match tree_job {
        TreeJob::Parse { .. } => nodes,
        TreeJob::Extract { key } => functions.call("uast_extract", uast, ctx, &[nodes, Datum::from(key.as_str())])?,
        TreeJob::Children => functions.call("uast_children", uast, ctx, &[nodes])?,
        TreeJob::Imports => functions.call("uast_imports", uast, ctx, &[nodes])?,
    };
    Ok((language, result))
}
