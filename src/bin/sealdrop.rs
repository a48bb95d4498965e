//! Sealdrop CLI - zero-knowledge file and text sharing
//!
//! Encrypts content locally under a secret word before uploading it, and
//! decrypts downloads locally. Also seals and opens armored envelope files
//! without any storage service.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use sealdrop::config::Config;
use sealdrop::content::RecoveredContent;
use sealdrop::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use sealdrop::file_ops;
use sealdrop::secret_word::{ReaderSecretWordReader, SecretWordReader, TerminalSecretWordReader};
use sealdrop::share;
use sealdrop::sharelink::ShareLink;
use sealdrop::size::format_file_size;
use sealdrop::storage::HttpStorage;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "sealdrop")]
#[command(version)]
#[command(about = "Zero-knowledge file and text sharing.", long_about = None)]
struct Cli {
    /// Path to a TOML config file (default: $SEALDROP_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read the secret word from stdin instead of generating or prompting for it
    #[arg(long, global = true)]
    secret_word_stdin: bool,

    /// Log more (-v for info, -vv for debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file or text and upload it
    ///
    /// Prints the access code, the secret word and a share link. Anyone
    /// holding the share link can decrypt the content; send the access code
    /// and secret word over different channels to keep them apart.
    #[command(alias = "u")]
    Upload {
        /// Path to the file to share
        #[arg(
            short,
            long,
            value_name = "FILE",
            conflicts_with = "text",
            required_unless_present = "text"
        )]
        input: Option<PathBuf>,

        /// Text to share instead of a file
        #[arg(long, value_name = "TEXT")]
        text: Option<String>,
    },

    /// Download and decrypt shared content
    ///
    /// Text is printed to stdout unless --output is given; files are saved
    /// to --output or to a new file.<extension> in the current directory.
    #[command(alias = "d")]
    Download {
        /// Access code assigned on upload
        #[arg(
            long,
            value_name = "CODE",
            conflicts_with = "link",
            required_unless_present = "link"
        )]
        access_code: Option<String>,

        /// Share link carrying both access code and secret word
        #[arg(long, value_name = "URL")]
        link: Option<String>,

        /// Path to write the decrypted content to
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Encrypt a file into an armored envelope file, without uploading
    #[command(alias = "s")]
    Seal {
        /// Path to the file whose contents is to be sealed
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the armored envelope to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Decrypt an armored envelope file
    #[command(alias = "o")]
    Open {
        /// Path to the armored envelope file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the decrypted contents to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Print a freshly generated secret word
    Word,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        report(&e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Upload { input, text } => {
            let secret_word = if cli.secret_word_stdin {
                get_secret_word_reader(true).read_secret_word()?
            } else {
                config.word_list()?.choose()
            };
            let storage = HttpStorage::new(&config.storage)?;
            let shared = match (input, text) {
                (Some(path), _) => share::share_file(&storage, &config.upload, &path, &secret_word)?,
                (None, Some(text)) => {
                    share::share_text(&storage, &config.upload, &text, &secret_word)?
                }
                (None, None) => {
                    return Err(SealdropError::with_kind(
                        ErrorCategory::User,
                        ErrorKind::Io,
                        "nothing to upload: pass --input or --text",
                    ));
                }
            };

            eprintln!(
                "Encrypted {} ({}) into {} of ciphertext: {}",
                shared.tag.kind_label(),
                format_file_size(shared.plaintext_len as u64),
                format_file_size(shared.ciphertext_len as u64),
                shared.preview
            );
            println!("Access code: {}", shared.link.access_code);
            println!("Secret word: {}", shared.link.secret_word.as_str());
            println!("Share link:  {}", shared.link.to_url(&config.share.origin)?);
            Ok(())
        }
        Commands::Download {
            access_code,
            link,
            output,
        } => {
            let (access_code, secret_word) = match (link, access_code) {
                (Some(link), _) => {
                    let link = ShareLink::parse(&link)?;
                    let secret_word = if cli.secret_word_stdin {
                        get_secret_word_reader(true).read_secret_word()?
                    } else {
                        link.secret_word.clone()
                    };
                    (link.access_code, secret_word)
                }
                (None, Some(code)) => {
                    let secret_word =
                        get_secret_word_reader(cli.secret_word_stdin).read_secret_word()?;
                    (code, secret_word)
                }
                (None, None) => {
                    return Err(SealdropError::with_kind(
                        ErrorCategory::User,
                        ErrorKind::InvalidShareLink,
                        "nothing to download: pass --access-code or --link",
                    ));
                }
            };

            let storage = HttpStorage::new(&config.storage)?;
            let content = share::fetch(&storage, &access_code, &secret_word)?;
            save_content(content, output.as_deref())
        }
        Commands::Seal { input, output } => {
            let mut reader = get_secret_word_reader(cli.secret_word_stdin);
            file_ops::seal_file(&input, &output, &mut *reader, config.upload.scheme)
        }
        Commands::Open { input, output } => {
            let mut reader = get_secret_word_reader(cli.secret_word_stdin);
            file_ops::open_file(&input, &output, &mut *reader).map(|_| ())
        }
        Commands::Word => {
            let word: Zeroizing<String> = config.word_list()?.choose();
            println!("{}", word.as_str());
            Ok(())
        }
    }
}

fn save_content(content: RecoveredContent, output: Option<&Path>) -> Result<()> {
    match (content, output) {
        (RecoveredContent::Text(text), None) => {
            let mut stdout = std::io::stdout().lock();
            let newline = if text.ends_with('\n') { "" } else { "\n" };
            write!(stdout, "{}{}", text, newline)
                .and_then(|()| stdout.flush())
                .map_err(|e| {
                    SealdropError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write to stdout",
                        e,
                    )
                })
        }
        (content, Some(path)) => {
            file_ops::write_file_secure(path, content.as_bytes())
                .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))?;
            eprintln!(
                "Saved {} to {}",
                format_file_size(content.len() as u64),
                path.display()
            );
            Ok(())
        }
        (content, None) => {
            // A default name never replaces an existing file.
            let path = match &content {
                RecoveredContent::Binary { file_name, .. } => PathBuf::from(file_name),
                RecoveredContent::Text(_) => PathBuf::from("file.txt"),
            };
            file_ops::write_new_file_secure(&path, content.as_bytes()).map_err(|e| {
                e.with_context(format!(
                    "not saving to {}; pass --output to choose a path",
                    path.display()
                ))
            })?;
            eprintln!(
                "Saved {} to {}",
                format_file_size(content.len() as u64),
                path.display()
            );
            Ok(())
        }
    }
}

fn get_secret_word_reader(use_stdin: bool) -> Box<dyn SecretWordReader> {
    if use_stdin {
        Box::new(ReaderSecretWordReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalSecretWordReader)
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn report(err: &SealdropError) {
    eprintln!("Error: {}", err.user_message());
    if err.user_message() != err.message() {
        eprintln!("  caused by: {}", err.message());
    }
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}
