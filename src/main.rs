//! holo-embed CLI - Holographic Word Embeddings
//!
//! Command-line interface for training and querying vector tables.

use clap::{Args, Parser, Subcommand, ValueEnum};
use holo_embed::model::{ContextEncoder, OrderEncoder, SyntaxEncoder};
use holo_embed::{
    ConllCorpus, ContextModel, Corpus, EmbedError, EmbeddingConfig, EmbeddingModel, Encoder,
    ModelKind, OrderModel, ResonanceWeighting, Result, SyntaxModel, TableFormat, TextConfig,
    TextCorpus, TrainingReport, Vocabulary,
};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "holo-embed")]
#[command(version)]
#[command(about = "Holographic word embeddings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Co-occurrence windows over plain text
    Context,
    /// Position-bound windows over plain text
    Order,
    /// Dependency relations over CoNLL-U
    Syntax,
}

#[derive(Args)]
struct TrainArgs {
    /// Model variant
    #[arg(short, long, value_enum, default_value = "context")]
    kind: KindArg,

    /// Input corpus (one sentence per line, or CoNLL-U for syntax)
    #[arg(short, long)]
    input: PathBuf,

    /// Output vector table
    #[arg(short, long)]
    output: PathBuf,

    /// Vector dimensionality
    #[arg(short, long, default_value = "512")]
    dim: usize,

    /// Context window half-width
    #[arg(short, long, default_value = "2")]
    window: usize,

    /// Sentences per batch
    #[arg(short, long, default_value = "256")]
    batch_size: usize,

    /// Passes over the corpus
    #[arg(short, long, default_value = "1")]
    epochs: usize,

    /// Minimum word count for the vocabulary
    #[arg(short, long, default_value = "1")]
    min_count: usize,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Use unitary role vectors (exact unbinding)
    #[arg(long)]
    unitary_roles: bool,

    /// Use lemmas instead of word forms (syntax only)
    #[arg(long)]
    lemmas: bool,

    /// Worker threads (0 = all cores)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model from a corpus and save its vector table
    Train(TrainArgs),

    /// Find the nearest words by composite vector
    Nearest {
        /// Vector table to use
        #[arg(short, long)]
        model: PathBuf,

        /// Query word
        word: String,

        /// Number of results
        #[arg(short = 'k', long, default_value = "5")]
        count: usize,
    },

    /// Compute the similarity between two words
    Similarity {
        /// Vector table to use
        #[arg(short, long)]
        model: PathBuf,

        /// First word
        word1: String,

        /// Second word
        word2: String,
    },

    /// Predict the word at a relative position (order models)
    Complete {
        /// Vector table to use
        #[arg(short, long)]
        model: PathBuf,

        /// Query word
        word: String,

        /// Relative position, e.g. 1 or -1
        #[arg(allow_hyphen_values = true)]
        position: isize,

        /// Number of results
        #[arg(short = 'k', long, default_value = "5")]
        count: usize,
    },

    /// Fill the blank in a phrase such as "the _ ruled" (order models)
    Resonate {
        /// Vector table to use
        #[arg(short, long)]
        model: PathBuf,

        /// Phrase with exactly one "_"
        phrase: String,

        /// Number of results
        #[arg(short = 'k', long, default_value = "5")]
        count: usize,

        /// Weight context words by inverse distance to the blank
        #[arg(long)]
        inverse_distance: bool,
    },

    /// Find words in a dependency relation to a word (syntax models)
    Relation {
        /// Vector table to use
        #[arg(short, long)]
        model: PathBuf,

        /// Query word (usually a verb)
        word: String,

        /// Relation label, e.g. nsubj or dobj
        relation: String,

        /// Number of results
        #[arg(short = 'k', long, default_value = "5")]
        count: usize,
    },

    /// Show vector table statistics
    Info {
        /// Vector table to inspect
        model: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Train(args) => train(args),

        Commands::Nearest { model, word, count } => {
            LoadedModel::load(&model).and_then(|m| m.nearest(&word, count)).map(|r| print_ranked(&r))
        }

        Commands::Similarity { model, word1, word2 } => similarity(model, word1, word2),

        Commands::Complete {
            model,
            word,
            position,
            count,
        } => complete(model, word, position, count),

        Commands::Resonate {
            model,
            phrase,
            count,
            inverse_distance,
        } => resonate(model, phrase, count, inverse_distance),

        Commands::Relation {
            model,
            word,
            relation,
            count,
        } => relation_neighbors(model, word, relation, count),

        Commands::Info { model } => show_info(model),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn train(args: TrainArgs) -> Result<()> {
    let start_time = Instant::now();

    let config = EmbeddingConfig {
        dim: args.dim,
        batch_size: args.batch_size,
        window: args.window,
        seed: args.seed,
        epochs: args.epochs,
        unitary_roles: args.unitary_roles,
        num_threads: args.threads,
    };
    config.validate()?;

    println!("holo-embed");
    println!("   Training from: {}", args.input.display());
    println!();

    let text_config = TextConfig::default();
    let (report, vocab_size) = match args.kind {
        KindArg::Context => {
            let corpus = TextCorpus::new(&args.input, text_config);
            train_and_save::<ContextEncoder, _>(&corpus, config, args.min_count, &args.output)?
        }
        KindArg::Order => {
            let corpus = TextCorpus::new(&args.input, text_config);
            train_and_save::<OrderEncoder, _>(&corpus, config, args.min_count, &args.output)?
        }
        KindArg::Syntax => {
            let corpus = ConllCorpus::new(&args.input, text_config).with_lemmas(args.lemmas);
            train_and_save::<SyntaxEncoder, _>(&corpus, config, args.min_count, &args.output)?
        }
    };

    println!();
    println!("Training complete in {}", HumanDuration(start_time.elapsed()));
    println!("   Vocabulary: {} words", format_number(vocab_size));
    println!("   Sentences: {}", format_number(report.units));
    println!("   Updates: {}", format_number(report.updates));
    println!("   Unknown tokens skipped: {}", format_number(report.skipped_tokens));
    if report.skipped_edges > 0 {
        println!("   Malformed edges skipped: {}", format_number(report.skipped_edges));
    }
    println!("   Output: {}", args.output.display());

    Ok(())
}

fn train_and_save<E, C>(
    corpus: &C,
    config: EmbeddingConfig,
    min_count: usize,
    output: &Path,
) -> Result<(TrainingReport, usize)>
where
    E: Encoder,
    C: Corpus<Unit = E::Unit> + Sync,
{
    let pb = spinner("Building vocabulary...");
    let vocab = Vocabulary::from_corpus(corpus, min_count)?;
    pb.finish_and_clear();
    println!("✓ Vocabulary of {} words", format_number(vocab.len()));

    let pb = spinner(&format!("Training ({} dimensions)...", config.dim));
    let mut model = EmbeddingModel::<E>::new(vocab, config)?;
    let report = model.train(corpus)?;
    pb.finish_and_clear();
    println!("✓ Trained on {} sentences", format_number(report.units));

    model.save(output)?;
    println!("✓ Saved vector table to {}", output.display());

    Ok((report, model.vocabulary().len()))
}

/// A vector table loaded as whichever model variant it was trained with.
enum LoadedModel {
    Context(ContextModel),
    Order(OrderModel),
    Syntax(SyntaxModel),
}

impl LoadedModel {
    fn load(path: &Path) -> Result<Self> {
        let pb = spinner("Loading vector table...");
        let header = TableFormat::read_header(path)?;
        let model = match header.kind {
            ModelKind::Context => LoadedModel::Context(ContextModel::load(path)?),
            ModelKind::Order => LoadedModel::Order(OrderModel::load(path)?),
            ModelKind::Syntax => LoadedModel::Syntax(SyntaxModel::load(path)?),
        };
        pb.finish_and_clear();
        Ok(model)
    }

    fn kind(&self) -> ModelKind {
        match self {
            LoadedModel::Context(_) => ModelKind::Context,
            LoadedModel::Order(_) => ModelKind::Order,
            LoadedModel::Syntax(_) => ModelKind::Syntax,
        }
    }

    fn nearest(&self, word: &str, k: usize) -> Result<Vec<(String, f64)>> {
        match self {
            LoadedModel::Context(m) => m.get_nearest(word, k),
            LoadedModel::Order(m) => m.get_nearest(word, k),
            LoadedModel::Syntax(m) => m.get_nearest(word, k),
        }
    }

    fn similarity(&self, word1: &str, word2: &str) -> Result<f64> {
        match self {
            LoadedModel::Context(m) => m.similarity(word1, word2),
            LoadedModel::Order(m) => m.similarity(word1, word2),
            LoadedModel::Syntax(m) => m.similarity(word1, word2),
        }
    }

    fn into_order(self) -> Result<OrderModel> {
        match self {
            LoadedModel::Order(m) => Ok(m),
            other => Err(EmbedError::InvalidQuery(format!(
                "this query needs an order model, found a {} model",
                other.kind()
            ))),
        }
    }

    fn into_syntax(self) -> Result<SyntaxModel> {
        match self {
            LoadedModel::Syntax(m) => Ok(m),
            other => Err(EmbedError::InvalidQuery(format!(
                "this query needs a syntax model, found a {} model",
                other.kind()
            ))),
        }
    }
}

fn print_ranked(results: &[(String, f64)]) {
    for (rank, (word, score)) in results.iter().enumerate() {
        println!("{:>3}. {:<24} {:.4}", rank + 1, word, score);
    }
}

fn similarity(model_path: PathBuf, word1: String, word2: String) -> Result<()> {
    let model = LoadedModel::load(&model_path)?;
    let sim = model.similarity(&word1, &word2)?;
    println!("Similarity between \"{}\" and \"{}\": {:.4}", word1, word2, sim);
    Ok(())
}

fn complete(model_path: PathBuf, word: String, position: isize, count: usize) -> Result<()> {
    let model = LoadedModel::load(&model_path)?.into_order()?;
    print_ranked(&model.get_completions(&word, position, count)?);
    Ok(())
}

fn resonate(model_path: PathBuf, phrase: String, count: usize, inverse_distance: bool) -> Result<()> {
    let model = LoadedModel::load(&model_path)?.into_order()?;
    let weighting = if inverse_distance {
        ResonanceWeighting::InverseDistance
    } else {
        ResonanceWeighting::Uniform
    };
    print_ranked(&model.get_resonants_weighted(&phrase, count, weighting)?);
    Ok(())
}

fn relation_neighbors(model_path: PathBuf, word: String, relation: String, count: usize) -> Result<()> {
    let model = LoadedModel::load(&model_path)?.into_syntax()?;
    print_ranked(&model.get_verb_neighbors(&word, &relation, count)?);
    Ok(())
}

fn show_info(model_path: PathBuf) -> Result<()> {
    let table = TableFormat::read(&model_path)?;
    let config = &table.meta.config;

    println!("Vector table: {:?}", model_path);
    println!("  Model: {}", table.header.kind);
    println!("  Format version: {}", table.header.version);
    println!("  Dimension: {}", table.header.dim);
    println!("  Vocabulary size: {}", format_number(table.words.len()));
    println!("  Window: {}", config.window);
    println!("  Epochs: {}", config.epochs);
    if let Some(seed) = config.seed {
        println!("  Seed: {}", seed);
    }
    println!("  Unitary roles: {}", config.unitary_roles);
    if !table.meta.relations.is_empty() {
        println!("  Relations: {}", table.meta.relations.join(", "));
    }
    println!("  File size: {} bytes", format_number(table.header.file_len as usize));

    Ok(())
}

/// Format large numbers with commas for readability
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_relation() {
        let cli = Cli::try_parse_from(["holo-embed", "relation", "-m", "verbs.hrr", "chased", "nsubj", "-k", "3"]).unwrap();
        match cli.command {
            Commands::Relation {
                model,
                word,
                relation,
                count,
            } => {
                assert_eq!(model, PathBuf::from("verbs.hrr"));
                assert_eq!(word, "chased");
                assert_eq!(relation, "nsubj");
                assert_eq!(count, 3);
            }
            _ => panic!("expected the relation command"),
        }
    }

    #[test]
    fn test_parse_negative_position() {
        let cli = Cli::try_parse_from(["holo-embed", "complete", "-m", "royals.hrr", "ruled", "-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Complete { position: -1, .. }));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
