use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pinyin_predict::{Engine, LanguageFeatures, PinyinConfig};
use tracing_subscriber::EnvFilter;

/// Interactive pinyin prediction.
///
/// Type pinyin and press Enter to see suggestions. `:N` accepts the N-th
/// suggestion, `:reset` starts a fresh session, punctuation is committed as-is.
#[derive(Parser, Debug)]
#[command(name = "pinyin-predict", version)]
struct Args {
    /// Dictionary file (line table, or JSON when the extension is .json)
    #[arg(long)]
    dict: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of suggestions to show
    #[arg(long)]
    limit: Option<usize>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn load_config(args: &Args) -> Result<PinyinConfig> {
    let mut config = match &args.config {
        Some(path) => PinyinConfig::load_toml(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PinyinConfig::default(),
    };
    if let Some(limit) = args.limit {
        config.base.candidate_limit = limit;
    }
    Ok(config)
}

/// Line-oriented session state: the text committed so far and the
/// suggestions `:N` picks from.
struct Repl {
    engine: Engine,
    committed: String,
    last: Vec<String>,
}

impl Repl {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            committed: String::new(),
            last: Vec::new(),
        }
    }

    /// Handle one input line and return the lines to print.
    fn handle(&mut self, line: &str) -> Vec<String> {
        let input = line.trim();
        if input.is_empty() {
            return Vec::new();
        }

        if let Some(command) = input.strip_prefix(':') {
            return match command {
                "reset" => {
                    self.engine.reset();
                    self.committed.clear();
                    self.last.clear();
                    vec!["  (session reset)".to_string()]
                }
                n => match n.parse::<usize>() {
                    Ok(i) if (1..=self.last.len()).contains(&i) => {
                        // suggestions are spent once one of them is accepted
                        let word = self.last.swap_remove(i - 1);
                        self.last.clear();
                        self.engine.commit(&word);
                        self.committed.push_str(&word);
                        vec![format!("  → {}", self.committed)]
                    }
                    _ => vec![format!("  ? unknown command :{}", n)],
                },
            };
        }

        if self.engine.inner().language_features().is_separator(input) {
            self.committed.push_str(input);
            self.last.clear();
            return vec![format!("  → {}", self.committed)];
        }

        let prediction = self.engine.predict(&self.committed, input);
        let lines = if prediction.suggestions.is_empty() {
            vec!["  (no candidates)".to_string()]
        } else {
            prediction
                .suggestions
                .iter()
                .zip(self.engine.candidates())
                .enumerate()
                .map(|(i, (text, cand))| format!("  {}. {} ({:.1})", i + 1, text, cand.score))
                .collect()
        };
        self.last = prediction.suggestions;
        lines
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args)?;

    let engine = match &args.dict {
        Some(path) => Engine::from_path(path, config)
            .with_context(|| format!("failed to load dictionary {}", path.display()))?,
        None => Engine::demo(config).context("failed to load bundled demo table")?,
    };
    let mut repl = Repl::new(engine);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "pinyin-predict: type pinyin, `:N` to pick, `:reset` to start over")?;

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        for printed in repl.handle(&line) {
            writeln!(out, "{}", printed)?;
        }
    }

    Ok(())
}
