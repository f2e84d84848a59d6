use docqa::chunking::Document;
use docqa::cli::{Cli, Commands, ConfigAction};
use docqa::config::{Config, ConfigValidator};
use docqa::error::{DocQaError, Result};
use docqa::models::ModelContext;
use docqa::pipeline::{answer_with_timeout, AnswerStatus, QaPipeline};
use docqa::retrieval::RetrievalResult;
use docqa::storage::IndexStore;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Characters of each source chunk shown under an answer
const PREVIEW_CHARS: usize = 200;

fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        if e.is_operational() {
            tracing::error!("{:?}", e);
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Index {
            file,
            output,
            chunk_size,
            chunk_overlap,
            id,
        } => {
            let mut config = load_config(config_path, profile)?;
            if let Some(size) = chunk_size {
                config.chunking.size = size;
            }
            if let Some(overlap) = chunk_overlap {
                config.chunking.overlap = overlap;
            }
            ConfigValidator::validate(&config)?;
            cmd_index(config, &file, output, id)
        }
        Commands::Ask {
            question,
            index,
            top_k,
            max_context_chars,
            offline,
            json,
        } => {
            let mut config = load_config(config_path, profile)?;
            if let Some(k) = top_k {
                config.retrieval.top_k = k;
            }
            if let Some(max) = max_context_chars {
                config.retrieval.max_context_chars = max;
            }
            if offline {
                config.llm.enabled = false;
            }
            ConfigValidator::validate(&config)?;
            cmd_ask(config, &question, &index, json)
        }
        Commands::Chat {
            file,
            top_k,
            offline,
        } => {
            let mut config = load_config(config_path, profile)?;
            if let Some(k) = top_k {
                config.retrieval.top_k = k;
            }
            if offline {
                config.llm.enabled = false;
            }
            ConfigValidator::validate(&config)?;
            cmd_chat(config, &file)
        }
        Commands::Config { action } => cmd_config(config_path, profile, action),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "docqa=debug" } else { "docqa=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_index(
    mut config: Config,
    file: &Path,
    output: Option<PathBuf>,
    id: Option<String>,
) -> Result<()> {
    // Indexing never calls the generator
    config.llm.enabled = false;

    let text = read_document(file)?;
    let document = match id {
        Some(id) => Document::new(id, text),
        None => Document::from_text(text),
    };

    let output = match output {
        Some(path) => path,
        None => default_index_path(&config, file)?,
    };

    let models = Arc::new(ModelContext::init(&config)?);
    let pipeline = QaPipeline::from_config(models, &config);
    let index =
        pipeline.process_document(document, config.chunking.size, config.chunking.overlap)?;

    let store = IndexStore::open(&output)?;
    store.save(&index)?;
    let stats = store.stats()?;

    println!("✓ Indexed {}", file.display());
    println!("  Document: {}", index.document_id());
    println!(
        "  Chunks: {} ({} chars, {} overlap)",
        index.len(),
        config.chunking.size,
        config.chunking.overlap
    );
    println!(
        "  Encoder: {} ({}D, {} index)",
        index.settings().encoder_model,
        index.dimension(),
        index.settings().strategy
    );
    println!("  Vectors: {} bytes compressed", stats.vector_bytes);
    println!("  Saved to: {}", output.display());
    Ok(())
}

fn cmd_ask(config: Config, question: &str, index_path: &Path, json: bool) -> Result<()> {
    if !index_path.exists() {
        return Err(DocQaError::InvalidInput(format!(
            "Index {} not found. Run 'docqa index <FILE>' first.",
            index_path.display()
        )));
    }

    let models = Arc::new(ModelContext::init(&config)?);
    let pipeline = Arc::new(QaPipeline::from_config(models.clone(), &config));
    let store = IndexStore::open(index_path)?;
    let index = Arc::new(pipeline.load_index(&store)?);
    pipeline.check_context_budget(&index, config.retrieval.max_context_chars)?;

    if !models.has_generator() {
        let results = pipeline.retrieve(&index, question, config.retrieval.top_k)?;
        if json {
            print_json(&results)?;
        } else {
            print_retrieval(&results);
        }
        return Ok(());
    }

    let runtime = build_runtime()?;
    let answer = runtime.block_on(answer_with_timeout(
        pipeline,
        index,
        question.to_string(),
        config.retrieval.top_k,
        config.retrieval.max_context_chars,
        Duration::from_secs(config.llm.timeout_secs),
    ));
    runtime.shutdown_timeout(Duration::from_secs(1));
    let answer = answer?;

    if json {
        print_json(&answer)?;
    } else {
        print!("{}", answer.render(PREVIEW_CHARS));
    }
    Ok(())
}

fn cmd_chat(config: Config, file: &Path) -> Result<()> {
    let text = read_document(file)?;
    let models = Arc::new(ModelContext::init(&config)?);
    let pipeline = Arc::new(QaPipeline::from_config(models.clone(), &config));
    let index = Arc::new(pipeline.process_document(
        Document::from_text(text),
        config.chunking.size,
        config.chunking.overlap,
    )?);

    println!(
        "✓ Loaded {} ({} chunks). Ask a question, or 'exit' to quit.",
        file.display(),
        index.len()
    );
    if !models.has_generator() {
        println!("  Generation disabled: showing retrieved chunks only.");
    }

    let runtime = build_runtime()?;
    let timeout = Duration::from_secs(config.llm.timeout_secs);
    let mut history: Vec<(String, AnswerStatus)> = Vec::new();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next() else { break };
        let line = line.map_err(|e| DocQaError::Io {
            source: e,
            context: "Failed to read question".to_string(),
        })?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        if !models.has_generator() {
            match pipeline.retrieve(&index, question, config.retrieval.top_k) {
                Ok(results) => print_retrieval(&results),
                Err(e) => eprintln!("Error: {}", e),
            }
            continue;
        }

        let result = runtime.block_on(answer_with_timeout(
            pipeline.clone(),
            index.clone(),
            question.to_string(),
            config.retrieval.top_k,
            config.retrieval.max_context_chars,
            timeout,
        ));
        match result {
            Ok(answer) => {
                print!("{}", answer.render(PREVIEW_CHARS));
                history.push((question.to_string(), answer.status));
            }
            Err(e) => {
                if e.is_operational() {
                    tracing::warn!("Question failed: {}", e);
                }
                eprintln!("Error: {}", e);
            }
        }
    }

    runtime.shutdown_timeout(Duration::from_secs(1));
    print_history(&history);
    Ok(())
}

fn cmd_config(
    config_path: Option<&Path>,
    profile: Option<&str>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, profile)?;
            let value = serde_json::to_value(&config).map_err(|e| DocQaError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            match section {
                Some(section) => {
                    let part = value.get(&section).ok_or_else(|| {
                        DocQaError::InvalidInput(format!("Unknown config section '{}'", section))
                    })?;
                    print_json(part)?;
                }
                None => print_json(&value)?,
            }
        }
        ConfigAction::Validate { file } => {
            let path = match file.or_else(|| config_path.map(Path::to_path_buf)) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>, profile: Option<&str>) -> Result<Config> {
    if let (Some(path), Some(profile)) = (path, profile) {
        return Config::load_with_profile(path, profile);
    }

    let mut config = Config::load_or_default(path)?;
    if let Some(profile) = profile {
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
    }
    Ok(config)
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DocQaError::Io {
        source: e,
        context: format!("Failed to read document {}", path.display()),
    })
}

fn default_index_path(config: &Config, file: &Path) -> Result<PathBuf> {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    Ok(expand_path(&config.storage.data_dir)?.join(format!("{}.db", stem)))
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| DocQaError::invalid_config("storage.data_dir", "Invalid path encoding"))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            DocQaError::invalid_config("storage.data_dir", "Cannot determine home directory")
        })?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .map_err(|e| DocQaError::Io {
            source: e,
            context: "Failed to start async runtime".to_string(),
        })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DocQaError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn print_retrieval(results: &[RetrievalResult]) {
    if results.is_empty() {
        println!("No matching chunks.");
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. Chunk {} (chars {}-{}), relevance {}\n   {}",
            rank + 1,
            result.chunk.index,
            result.chunk.start,
            result.chunk.end,
            result.confidence(),
            result.chunk.preview(PREVIEW_CHARS).replace('\n', " ")
        );
    }
}

fn print_history(history: &[(String, AnswerStatus)]) {
    if history.is_empty() {
        return;
    }
    println!("\nSession: {} questions", history.len());
    for (i, (question, status)) in history.iter().enumerate() {
        let mark = if *status == AnswerStatus::Generated {
            "✓"
        } else {
            "-"
        };
        println!("  {} {}. {}", mark, i + 1, question);
    }
}

