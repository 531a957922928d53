//! Subcommand handlers.

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use keel_config::ResolvedConfig;
use keel_engine::{
    Agent, AgentOptions, AutoConfirm, Confirmer, PromptConfirmer, analyze, build_context,
    relevant_files,
};
use keel_tools::{
    CommandBlacklist, CommandRunner, FileStore, Indexer, Sandbox, ToolError, load_index,
    search_workspace,
};
use keel_types::NonEmptyString;
use keel_utils::{diff_lines, render_diff, render_unified};

use crate::{Cli, Command, FilesCommand};

const UNIFIED_CONTEXT_LINES: usize = 3;

/// Root, resolved configuration and the sandbox built from both.
struct Workspace {
    config: ResolvedConfig,
    sandbox: Sandbox,
}

impl Workspace {
    fn open(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir().context("failed to read the current directory")?,
        };
        if !root.is_dir() {
            bail!("workspace root {} is not a directory", root.display());
        }
        let config = keel_config::load_resolved(&root)?;
        let sandbox = Sandbox::new(
            &root,
            config.workspace.forbidden_dirs.clone(),
            config.workspace.deny_patterns.clone(),
        )?;
        tracing::debug!(
            root = %sandbox.root().display(),
            config = ?config.source,
            "Workspace opened"
        );
        Ok(Self { config, sandbox })
    }

    fn root(&self) -> &Path {
        self.sandbox.root()
    }

    /// `path` as given when absolute, otherwise joined onto the root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        }
    }

    fn store(&self) -> FileStore {
        FileStore::open(self.sandbox.clone(), self.config.store.clone())
    }
}

pub(crate) fn dispatch(cli: Cli) -> Result<ExitCode> {
    let workspace = Workspace::open(cli.root)?;
    match cli.command {
        Command::Index => index(&workspace),
        Command::Search { query } => search(&workspace, &query),
        Command::Analyze { question, context } => analyze_question(&workspace, &question, context),
        Command::Agent {
            instruction,
            apply,
            yes,
        } => agent(&workspace, &instruction, apply.as_deref(), yes),
        Command::Diff { old, new, unified } => diff(&old, &new, unified),
        Command::Files { command } => files(&workspace, command),
        Command::Run { command } => run(&workspace, &command),
    }
}

fn index(workspace: &Workspace) -> Result<ExitCode> {
    let indexer = Indexer::new(workspace.config.indexer.clone());
    let (index, path) = indexer.build_and_persist(workspace.root())?;
    println!("Workspace: {}", workspace.root().display());
    println!("Index: {}", path.display());
    println!("Files indexed: {}", index.count);
    Ok(ExitCode::SUCCESS)
}

fn search(workspace: &Workspace, query: &[String]) -> Result<ExitCode> {
    let query = query.join(" ");
    if query.trim().is_empty() {
        println!("Usage: keel search <query...>");
        return Ok(ExitCode::FAILURE);
    }
    let hits = search_workspace(
        workspace.root(),
        &workspace.config.indexer.file_name,
        &query,
        workspace.config.search.max_results,
    )?;
    println!("{}", serde_json::to_string(&hits)?);
    Ok(ExitCode::SUCCESS)
}

fn analyze_question(workspace: &Workspace, words: &[String], context: bool) -> Result<ExitCode> {
    let mut question = words.join(" ");
    if question.trim().is_empty() {
        let mut stdin = io::stdin();
        if stdin.is_terminal() {
            println!("Usage: keel analyze <question>");
            println!("   or: echo \"<question>\" | keel analyze");
            return Ok(ExitCode::FAILURE);
        }
        stdin
            .read_to_string(&mut question)
            .context("failed to read the question from stdin")?;
    }
    let Ok(question) = NonEmptyString::new(question) else {
        eprintln!("Empty question.");
        return Ok(ExitCode::FAILURE);
    };

    let index = match load_index(workspace.root(), &workspace.config.indexer.file_name) {
        Ok(index) => index,
        Err(e @ ToolError::IndexMissing { .. }) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };
    let max_results = workspace.config.search.max_results;

    if context {
        let hits = relevant_files(question.as_str(), &index, max_results);
        println!("{}", build_context(&hits));
    } else {
        let report = analyze(question.as_str(), &index, max_results);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(ExitCode::SUCCESS)
}

fn agent(
    workspace: &Workspace,
    words: &[String],
    apply: Option<&Path>,
    yes: bool,
) -> Result<ExitCode> {
    let Ok(instruction) = NonEmptyString::new(words.join(" ")) else {
        println!("Usage: keel agent \"<instruction>\" [--apply modifications.json] [--yes]");
        println!("   ex: keel agent \"improve auth\" --apply suggested.json");
        return Ok(ExitCode::FAILURE);
    };

    let store = workspace.store();
    let options = AgentOptions {
        index_file: workspace.config.indexer.file_name.clone(),
        max_results: workspace.config.search.max_results,
        auto_confirm: yes,
    };
    let mut confirmer: Box<dyn Confirmer> = if yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirmer::new(io::stdin().lock()))
    };
    let mut out = io::stdout().lock();

    let payload = apply.map(|path| workspace.resolve(path));

    let report = Agent::new(&store, options).run(
        &instruction,
        payload.as_deref(),
        confirmer.as_mut(),
        &mut out,
    )?;
    out.flush()?;

    Ok(if report.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn diff(old: &Path, new: &Path, unified: bool) -> Result<ExitCode> {
    let old_content = read_or_empty(old)?;
    let new_content = read_or_empty(new)?;
    let (old_label, new_label) = (old.display().to_string(), new.display().to_string());

    if unified {
        print!(
            "{}",
            render_unified(
                &old_content,
                &new_content,
                &old_label,
                &new_label,
                UNIFIED_CONTEXT_LINES
            )
        );
    } else {
        let result = diff_lines(&old_content, &new_content);
        let header = format!("{old_label} -> {new_label}");
        println!("{}", render_diff(&result, Some(&header)));
    }
    Ok(ExitCode::SUCCESS)
}

fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn files(workspace: &Workspace, command: FilesCommand) -> Result<ExitCode> {
    let store = workspace.store();
    match command {
        FilesCommand::List {
            dir,
            shallow,
            extensions,
        } => {
            let listing = if shallow {
                store.list(&dir)?
            } else {
                let filter = (!extensions.is_empty()).then_some(extensions.as_slice());
                store.list_recursive(&dir, filter)?
            };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        FilesCommand::Read { file, bounded } => {
            let content = if bounded {
                store.read_bounded(&file)?
            } else {
                store.read(&file)?
            };
            print!("{content}");
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run(workspace: &Workspace, words: &[String]) -> Result<ExitCode> {
    let command = words.join(" ");
    let runner = CommandRunner::new(
        workspace.root(),
        CommandBlacklist::with_defaults()?,
        workspace.config.commands.max_output_bytes,
    );
    let output = workspace.store().run_command(&runner, &command)?;
    print!("{output}");
    io::stdout().flush()?;
    Ok(ExitCode::SUCCESS)
}
