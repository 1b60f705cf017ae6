use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use sift_core::{OutputFormat, QueryResult, SiftConfig, SiftError};
use sift_search::{EmbeddingBackend, IndexBuilder, IndexReport, Retriever, VectorStore};

const CONFIG_FILE: &str = ".sift.toml";

const GREEN: &str = "\x1b[92m";
const BLUE: &str = "\x1b[94m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

#[derive(Parser)]
#[command(
    name = "sift",
    version,
    about = "Chunk, embed and search code and PDFs",
    long_about = "sift splits source files into line-respecting chunks and PDFs into lines,\n\
                   embeds them into a local vector store, and answers natural-language\n\
                   queries with exact cosine re-scoring.\n\n\
                   Examples:\n  \
                     sift index --path .            Rebuild the index from the current tree\n  \
                     sift search 'open database'    Run one query\n  \
                     sift shell                     Interactive search (type 'exit' to quit)\n  \
                     sift doctor                    Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .sift.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable listing (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the index from a directory tree
    #[command(long_about = "Rebuild the index from a directory tree.\n\n\
        Walks the tree, deletes the store directory, then chunks every source\n\
        file and PDF, embeds each chunk and writes it to a single collection.\n\
        Unreadable documents are logged and skipped.\n\n\
        Examples:\n  sift index\n  sift index --path ./project --max-tokens 300")]
    Index {
        /// Directory to index (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Token budget per source chunk (overrides index.max_tokens)
        #[arg(long)]
        max_tokens: Option<usize>,
    },
    /// Run a single query against the index
    #[command(long_about = "Run a single query against the index.\n\n\
        Fetches the nearest chunks from the store, re-scores them by cosine\n\
        similarity and flags the best one.\n\n\
        Examples:\n  sift search 'where is the retry logic'\n  sift search 'parse config' --limit 10 --sort")]
    Search {
        /// Natural-language query
        query: String,

        /// Maximum results to return (overrides search.top_k)
        #[arg(long)]
        limit: Option<usize>,

        /// Order results by similarity instead of store order
        #[arg(long)]
        sort: bool,
    },
    /// Interactive search loop
    #[command(long_about = "Interactive search loop.\n\n\
        Reads one query per line and prints ranked results. Type 'exit' to quit.")]
    Shell {
        /// Maximum results per query (overrides search.top_k)
        #[arg(long)]
        limit: Option<usize>,

        /// Order results by similarity instead of store order
        #[arg(long)]
        sort: bool,
    },
    /// Create a default .sift.toml configuration file
    #[command(long_about = "Create a default .sift.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .sift.toml already exists.")]
    Init,
    /// Check your sift setup and environment
    #[command(long_about = "Check your sift setup and environment.\n\n\
        Reports the config file, embedding provider, API key and index state.\n\
        Use --format json for machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<SiftConfig> {
    let config = match path {
        Some(path) => SiftConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                SiftConfig::from_file(default_path)?
            } else {
                SiftConfig::default()
            }
        }
    };
    Ok(config)
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1msift\x1b[0m v{version}: semantic search over code and PDFs\n");

        println!("Quick start:");
        println!("  \x1b[36msift init\x1b[0m              Create a .sift.toml config file");
        println!("  \x1b[36msift index\x1b[0m             Index the current directory");
        println!("  \x1b[36msift shell\x1b[0m             Search interactively\n");

        println!("All commands:");
        println!("  \x1b[32mindex\x1b[0m     Rebuild the index (destructive)");
        println!("  \x1b[32msearch\x1b[0m    Run one query");
        println!("  \x1b[32mshell\x1b[0m     Interactive query loop");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("sift v{version}: semantic search over code and PDFs\n");

        println!("Quick start:");
        println!("  sift init              Create a .sift.toml config file");
        println!("  sift index             Index the current directory");
        println!("  sift shell             Search interactively\n");

        println!("All commands:");
        println!("  index     Rebuild the index (destructive)");
        println!("  search    Run one query");
        println!("  shell     Interactive query loop");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'sift <command> --help' for details.");
}

fn render_results(
    results: &[QueryResult],
    format: OutputFormat,
    use_color: bool,
) -> std::result::Result<String, SiftError> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            out.push_str(&serde_json::to_string_pretty(results)?);
            out.push('\n');
        }
        OutputFormat::Markdown => {
            out.push_str("# Search Results\n\n");
            for (i, r) in results.iter().enumerate() {
                let best = if r.is_best { " **best**" } else { "" };
                out.push_str(&format!(
                    "## {}. `{}` chunk {} (similarity: {:.4}){best}\n\n```\n{}\n```\n\n",
                    i + 1,
                    r.metadata.path.display(),
                    r.metadata.chunk_index,
                    r.similarity,
                    r.document,
                ));
            }
        }
        OutputFormat::Text => {
            for r in results {
                let location = format!(
                    "({}  chunk {})",
                    r.metadata.path.display(),
                    r.metadata.chunk_index
                );
                if use_color {
                    let colour = if r.is_best { GREEN } else { BLUE };
                    out.push_str(&format!(
                        "{colour}{}{RESET}  {RED}{:.4}{RESET}  {location}\n\n",
                        r.document, r.similarity,
                    ));
                } else {
                    let marker = if r.is_best { "  [best]" } else { "" };
                    out.push_str(&format!(
                        "{}  {:.4}  {location}{marker}\n\n",
                        r.document, r.similarity,
                    ));
                }
            }
        }
    }
    Ok(out)
}

/// Run one query and print its outcome. Empty-collection and no-match
/// outcomes are printed as messages rather than returned as errors.
async fn run_query(
    retriever: &Retriever<'_, &EmbeddingBackend>,
    query: &str,
    limit: usize,
    format: OutputFormat,
    use_color: bool,
) -> std::result::Result<(), SiftError> {
    let results = match retriever.submit_query(query, limit).await {
        Ok(results) => results,
        Err(e) if e.is_query_outcome() => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&outcome_json(&e))?);
            } else {
                println!("{}", outcome_message(&e));
            }
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if format == OutputFormat::Text {
        let total = retriever.collection().count()?;
        println!("Collection contains {total} chunks.");
    }
    print!("{}", render_results(&results, format, use_color)?);
    Ok(())
}

fn outcome_json(e: &SiftError) -> serde_json::Value {
    let outcome = match e {
        SiftError::EmptyCollection { .. } => "emptyCollection",
        SiftError::NoMatches => "noMatches",
        _ => "error",
    };
    serde_json::json!({
        "outcome": outcome,
        "message": outcome_message(e),
        "results": [],
    })
}

fn outcome_message(e: &SiftError) -> String {
    match e {
        SiftError::EmptyCollection { .. } => "Collection is empty, nothing to search.".into(),
        SiftError::NoMatches => "No matches found.".into(),
        other => other.to_string(),
    }
}

fn run_shell(
    input: &mut dyn BufRead,
    mut on_query: impl FnMut(&str) -> std::result::Result<(), SiftError>,
) -> Result<()> {
    println!("Enter your search query (type 'exit' to quit):");
    loop {
        print!("Search: ");
        std::io::stdout().flush().into_diagnostic()?;

        let mut line = String::new();
        if input.read_line(&mut line).into_diagnostic()? == 0 {
            println!();
            break;
        }
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") {
            println!("Exiting search.");
            break;
        }
        if query.is_empty() {
            println!("Please enter a valid query.");
            continue;
        }
        if let Err(e) = on_query(query) {
            eprintln!("{:?}", miette::Report::new(e));
        }
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(
    config: &SiftConfig,
    config_path: Option<&Path>,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    let config_path = config_path.unwrap_or(Path::new(CONFIG_FILE));
    if config_path.exists() {
        checks.push(CheckResult::pass(
            "config_file",
            format!("{} found", config_path.display()),
        ));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            format!("{} not found", config_path.display()),
            "run 'sift init' to create a default config",
        ));
    }

    // 2. Embedding provider + API key
    match EmbeddingBackend::from_config(&config.embedding) {
        Ok(backend) => checks.push(CheckResult::pass(
            "embedding_provider",
            format!("{} ({})", config.embedding.provider, backend.describe()),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "embedding_provider",
            e.to_string(),
            "fix the [embedding] section of .sift.toml",
        )),
    }
    if config.embedding.api_key.is_some() || std::env::var("SIFT_API_KEY").is_ok() {
        checks.push(CheckResult::pass("embedding_api_key", "API key set"));
    } else {
        checks.push(CheckResult::info(
            "embedding_api_key",
            "not set (fine for local servers)",
        ));
    }

    // 3. Index
    let store_path = &config.index.store_path;
    if VectorStore::exists(store_path) {
        let store = VectorStore::open(store_path)?;
        match store.collection(&config.index.collection)? {
            Some(collection) => {
                let dims = collection
                    .dimension()?
                    .map(|d| format!(", {d} dimensions"))
                    .unwrap_or_default();
                checks.push(CheckResult::pass(
                    "index",
                    format!(
                        "'{}' has {} chunks ({} space{dims})",
                        collection.name(),
                        collection.count()?,
                        collection.space(),
                    ),
                ));
            }
            None => checks.push(CheckResult::info(
                "index",
                format!("no collection '{}' (run 'sift index')", config.index.collection),
            )),
        }
    } else {
        checks.push(CheckResult::info(
            "index",
            format!("not found at {} (run 'sift index' to create)", store_path.display()),
        ));
    }

    // Output
    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("sift v{version} environment check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<20} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

fn print_report(report: &IndexReport, store_path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# Index Report\n");
            println!("| Documents indexed | Documents skipped | Chunks written |");
            println!("|---|---|---|");
            println!(
                "| {} | {} | {} |",
                report.documents_indexed, report.documents_skipped, report.records_written
            );
        }
        OutputFormat::Text => {
            println!(
                "Indexed {} documents ({} chunks, {} skipped) into {}",
                report.documents_indexed,
                report.records_written,
                report.documents_skipped,
                store_path.display(),
            );
        }
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# sift configuration

[index]
# store_path = ".sift"
# collection = "codebase"
# max_tokens = 500
# extensions = ["py", "rs", "go", "js", "ts", "java", "c", "h", "cpp", "hpp", "rb", "sh"]
# include_pdfs = true
# skip_dirs = [".git", ".hg", ".svn", "__pycache__", "node_modules", ".venv", "venv", "env", "py_env", "site-packages"]
# reserved_prefix = "."
# respect_gitignore = false
# max_file_bytes = 1048576

[embedding]
# provider = "openai"          # OpenAI-compatible /embeddings endpoint, or "hash" (offline)
# base_url = "http://localhost:11434/v1"
# model = "all-minilm"
# api_key = "..."              # or SIFT_API_KEY
# dimensions = 384             # hash provider only

[search]
# top_k = 5
# sort_by_similarity = false
# distance = "l2"              # l2, cosine or ip
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    // Init and completions must work even when the config is broken.
    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!(".sift.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .sift.toml with default configuration");
            return Ok(());
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sift", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut config = load_config(cli.config.as_deref())?;
    tracing::debug!(
        format = %cli.format,
        provider = %config.embedding.provider,
        "configuration loaded"
    );

    match cli.command {
        Some(Command::Index { ref path, max_tokens }) => {
            if let Some(max_tokens) = max_tokens {
                if max_tokens == 0 {
                    miette::bail!(miette::miette!(
                        help = "use a positive token budget, e.g. --max-tokens 500",
                        "--max-tokens must be greater than zero"
                    ));
                }
                config.index.max_tokens = max_tokens;
            }

            let embedder = EmbeddingBackend::from_config(&config.embedding)?;
            let builder = IndexBuilder::new(embedder, config.index.clone())
                .with_space(config.search.distance);

            let is_tty = std::io::stderr().is_terminal();
            let spinner = if is_tty {
                let pb = indicatif::ProgressBar::new_spinner();
                pb.set_style(
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                        .into_diagnostic()?,
                );
                pb.set_message(format!("Indexing {} ...", path.display()));
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let report = builder
                .run_with_progress(path, |doc| {
                    if let Some(pb) = &spinner {
                        pb.set_message(format!("Indexing {}", doc.path.display()));
                    }
                })
                .await
                .inspect_err(|_e| {
                    if let Some(pb) = &spinner {
                        pb.finish_with_message("Failed");
                    }
                })?;

            if let Some(pb) = spinner {
                pb.finish_with_message("Done");
            }

            print_report(&report, &config.index.store_path, cli.format)?;
        }
        Some(Command::Search {
            ref query,
            limit,
            sort,
        }) => {
            let embedder = EmbeddingBackend::from_config(&config.embedding)?;
            let store = VectorStore::open(&config.index.store_path)?;
            let collection =
                store.get_or_create_collection(&config.index.collection, config.search.distance)?;
            let retriever = Retriever::new(collection, &embedder)
                .sort_by_similarity(sort || config.search.sort_by_similarity);

            let limit = limit.unwrap_or(config.search.top_k);
            run_query(&retriever, query, limit, cli.format, use_color).await?;
        }
        Some(Command::Shell { limit, sort }) => {
            let embedder = EmbeddingBackend::from_config(&config.embedding)?;
            let store = VectorStore::open(&config.index.store_path)?;
            let collection =
                store.get_or_create_collection(&config.index.collection, config.search.distance)?;
            let retriever = Retriever::new(collection, &embedder)
                .sort_by_similarity(sort || config.search.sort_by_similarity);
            let limit = limit.unwrap_or(config.search.top_k);

            let runtime = tokio::runtime::Handle::current();
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            tokio::task::block_in_place(|| {
                run_shell(&mut input, |query| {
                    runtime.block_on(run_query(&retriever, query, limit, cli.format, use_color))
                })
            })?;
        }
        Some(Command::Doctor) => {
            run_doctor(&config, cli.config.as_deref(), cli.format, use_color)?;
        }
        None | Some(Command::Init) | Some(Command::Completions { .. }) => unreachable!(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sift_core::ChunkMetadata;

    use super::*;

    fn result(id: &str, similarity: f64, is_best: bool) -> QueryResult {
        QueryResult {
            id: id.into(),
            document: format!("body of {id}"),
            metadata: ChunkMetadata {
                path: PathBuf::from("src/lib.py"),
                chunk_index: 3,
            },
            similarity,
            distance: 0.5,
            is_best,
        }
    }

    #[test]
    fn text_output_colours_best_green_and_scores_red() {
        let out = render_results(
            &[result("a", 0.5, false), result("b", 0.9, true)],
            OutputFormat::Text,
            true,
        )
        .unwrap();
        assert!(out.contains(&format!("{BLUE}body of a{RESET}")));
        assert!(out.contains(&format!("{GREEN}body of b{RESET}")));
        assert!(out.contains(&format!("{RED}0.9000{RESET}")));
        assert!(out.contains("(src/lib.py  chunk 3)"));
    }

    #[test]
    fn plain_text_output_marks_best() {
        let out = render_results(&[result("a", 0.25, true)], OutputFormat::Text, false).unwrap();
        assert_eq!(out, "body of a  0.2500  (src/lib.py  chunk 3)  [best]\n\n");
    }

    #[test]
    fn json_output_uses_camel_case() {
        let out = render_results(&[result("a", 0.1, true)], OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["isBest"], true);
        assert_eq!(value[0]["metadata"]["chunkIndex"], 3);
    }

    #[test]
    fn markdown_output_lists_results() {
        let out = render_results(&[result("a", 0.1, true)], OutputFormat::Markdown, false).unwrap();
        assert!(out.starts_with("# Search Results"));
        assert!(out.contains("**best**"));
    }

    #[test]
    fn shell_exits_on_sentinel_and_skips_blank_lines() {
        let mut input = std::io::Cursor::new("  \nfirst query\nEXIT\nnever seen\n");
        let mut seen = Vec::new();
        run_shell(&mut input, |q| {
            seen.push(q.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["first query"]);
    }

    #[test]
    fn shell_continues_after_failed_query() {
        let mut input = std::io::Cursor::new("bad\ngood\n");
        let mut seen = Vec::new();
        run_shell(&mut input, |q| {
            seen.push(q.to_string());
            if q == "bad" {
                Err(SiftError::Embedding("server down".into()))
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(seen, vec!["bad", "good"]);
    }

    #[test]
    fn default_config_template_parses() {
        let config = SiftConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.index.collection, "codebase");
        assert_eq!(config.search.top_k, 5);
    }

    #[test]
    fn json_outcomes_stay_parseable() {
        let empty = SiftError::EmptyCollection {
            collection: "codebase".into(),
        };
        let value = outcome_json(&empty);
        assert_eq!(value["outcome"], "emptyCollection");
        assert_eq!(value["results"], serde_json::json!([]));
        assert_eq!(outcome_json(&SiftError::NoMatches)["outcome"], "noMatches");
    }

    #[test]
    fn outcome_messages_are_human_readable() {
        assert_eq!(outcome_message(&SiftError::NoMatches), "No matches found.");
        let empty = SiftError::EmptyCollection {
            collection: "codebase".into(),
        };
        assert!(outcome_message(&empty).contains("empty"));
    }
}
