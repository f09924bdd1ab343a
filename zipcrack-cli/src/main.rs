//! Zipcrack CLI
//!
//! Recover forgotten passwords of ZipCrypto-protected ZIP archives from the
//! command line.

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use zipcrack_engine::{CrackConfig, CrackEvent, crack, estimate, test_single};

#[derive(Parser)]
#[command(name = "zipcrack")]
#[command(author, version, about = "ZipCrypto password recovery for ZIP archives")]
#[command(long_about = "
Zipcrack recovers passwords of ZIP archives encrypted with the traditional
PKWARE stream cipher (ZipCrypto). AES-encrypted archives are not supported.

Examples:
  zipcrack crack locked.zip --digits --lowercase --max-length 6
  zipcrack crack locked.zip --dictionary --wordlist extra-words.txt
  zipcrack test locked.zip hunter2
  zipcrack estimate --digits --symbols --min-length 4 --max-length 8
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Character-class and length selection, shared by `crack` and `estimate`.
#[derive(Args, Clone)]
struct SpaceArgs {
    /// Shortest candidate length
    #[arg(long, default_value_t = 1)]
    min_length: u32,

    /// Longest candidate length (at most 16)
    #[arg(long, default_value_t = 8)]
    max_length: u32,

    /// Include lowercase letters a-z
    #[arg(long)]
    lowercase: bool,

    /// Include uppercase letters A-Z
    #[arg(long)]
    uppercase: bool,

    /// Include digits 0-9
    #[arg(long)]
    digits: bool,

    /// Include ASCII punctuation
    #[arg(long)]
    symbols: bool,

    /// Try the embedded common-password corpus first
    #[arg(long)]
    dictionary: bool,
}

impl SpaceArgs {
    /// Build the engine configuration. With no selection at all, fall back
    /// to the default of lowercase + digits + dictionary.
    fn into_config(self, custom_words: Vec<String>) -> CrackConfig {
        let nothing_selected = !self.lowercase
            && !self.uppercase
            && !self.digits
            && !self.symbols
            && !self.dictionary
            && custom_words.is_empty();

        CrackConfig {
            min_length: self.min_length,
            max_length: self.max_length,
            use_lowercase: self.lowercase || nothing_selected,
            use_uppercase: self.uppercase,
            use_numbers: self.digits || nothing_selected,
            use_symbols: self.symbols,
            use_dictionary: self.dictionary || nothing_selected,
            custom_words,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Recover the password of an encrypted archive
    #[command(alias = "c")]
    Crack {
        /// Archive file to attack
        archive: PathBuf,

        #[command(flatten)]
        space: SpaceArgs,

        /// File of extra candidate words, one per line, tried first
        #[arg(short, long)]
        wordlist: Option<PathBuf>,

        /// Emit progress as JSON lines instead of a progress bar
        #[arg(short, long)]
        json: bool,
    },

    /// Test a single password against an archive
    #[command(alias = "t")]
    Test {
        /// Archive file to test against
        archive: PathBuf,

        /// The password to try
        password: String,
    },

    /// Print the size of the configured search space
    #[command(alias = "e")]
    Estimate {
        #[command(flatten)]
        space: SpaceArgs,
    },

    /// Generate shell completion scripts
    #[command(hide = true)]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Crack {
            archive,
            space,
            wordlist,
            json,
        } => cmd_crack(&archive, space, wordlist.as_deref(), json),
        Commands::Test { archive, password } => cmd_test(&archive, &password),
        Commands::Estimate { space } => cmd_estimate(space),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "zipcrack", &mut io::stdout());
            return;
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the recovery and stream progress to the terminal.
fn cmd_crack(
    archive_path: &Path,
    space: SpaceArgs,
    wordlist: Option<&Path>,
    json: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let archive = std::fs::read(archive_path)?;

    let custom_words = match wordlist {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
        None => Vec::new(),
    };
    let config = space.into_config(custom_words);

    eprintln!(
        "Searching {} candidates across {} threads",
        estimate(&config),
        std::thread::available_parallelism().map_or(1, usize::from)
    );

    let handle = crack(archive, config)?;
    let bar = progress_bar(!json);

    for event in handle.events().iter() {
        match event {
            CrackEvent::Progress(snap) => {
                if json {
                    println!("{}", serde_json::to_string(&snap)?);
                } else {
                    bar.set_message(format!(
                        "{} tried · {} · current: {}",
                        snap.attempts,
                        format_rate(snap.passwords_per_second),
                        snap.current_password
                    ));
                    bar.tick();
                }
            }
            CrackEvent::Finished(result) => {
                bar.finish_and_clear();
                return match result {
                    Ok(password) => {
                        if json {
                            println!("{}", serde_json::json!({ "password": password }));
                        } else {
                            println!("Password found: {}", password);
                        }
                        Ok(0)
                    }
                    Err(e) => {
                        if json {
                            println!("{}", serde_json::json!({ "error": e.token() }));
                            Ok(2)
                        } else {
                            Err(e.into())
                        }
                    }
                };
            }
        }
    }

    Err("progress stream ended unexpectedly".into())
}

fn cmd_test(
    archive_path: &Path,
    password: &str,
) -> Result<i32, Box<dyn std::error::Error>> {
    let archive = std::fs::read(archive_path)?;
    if test_single(&archive, password.as_bytes())? {
        println!("Password is correct");
        Ok(0)
    } else {
        println!("Password does not match");
        Ok(1)
    }
}

fn cmd_estimate(space: SpaceArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = space.into_config(Vec::new());
    println!("{}", estimate(&config));
    Ok(0)
}

/// Spinner showing live attempt counters, hidden in JSON mode.
fn progress_bar(enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .expect("progress template is valid"),
    );
    bar
}

/// Human-readable rate: "893/s", "2.4 k/s", "17.8 M/s".
fn format_rate(rate: f64) -> String {
    if rate >= 1_000_000.0 {
        format!("{:.1} M/s", rate / 1_000_000.0)
    } else if rate >= 1_000.0 {
        format!("{:.1} k/s", rate / 1_000.0)
    } else {
        format!("{:.0}/s", rate)
    }
}
