use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::record::RecordStatus;
use crate::parsers::line_kind::Language;

#[derive(Parser, Debug)]
#[command(name = "vocab-cards")]
#[command(about = "Turns photographed vocabulary pages into Anki import files", long_about = None)]
pub struct Cli {
    /// TOML config file (default: vocab-cards.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// OCR a folder of page images and write an Anki import file
    Extract(ExtractArgs),

    /// Re-check an import file against the translation service
    Validate(ValidateArgs),

    /// Manage the vocabulary database
    Db(DbArgs),
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Folder with page images, e.g. input/english/unit-1
    pub folder: PathBuf,

    /// Textbook language: english, french or german
    #[arg(short, long, default_value = "english")]
    pub language: Language,

    /// Deck name (default: derived from the folder, e.g. "English Unit-1")
    #[arg(short, long)]
    pub deck: Option<String>,

    /// Note type (default from config)
    #[arg(short, long)]
    pub notetype: Option<String>,

    /// Output folder
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also save the raw OCR text
    #[arg(short, long)]
    pub raw: bool,

    /// Overwrite an existing output file
    #[arg(short, long)]
    pub force: bool,

    /// Delete all files in the output folder first
    #[arg(long)]
    pub reset: bool,

    /// Tag for every card; repeatable, `::` for hierarchy
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Import file written by `extract`
    pub file: PathBuf,

    /// Source language code (default from config)
    #[arg(long = "from")]
    pub from_lang: Option<String>,

    /// Target language code (default from config)
    #[arg(long = "to")]
    pub to_lang: Option<String>,

    /// Similarity below which an entry is suspicious
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Raw OCR text (default: the raw_ file next to the input)
    #[arg(long)]
    pub raw: Option<PathBuf>,

    /// Output folder (default: next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Deck name for the annotated file
    #[arg(short, long)]
    pub deck: Option<String>,

    /// Overwrite an existing final_ file
    #[arg(short, long)]
    pub force: bool,

    /// Do not read or update the translation memory
    #[arg(long)]
    pub no_memory: bool,

    /// Import the file into the vocabulary database and store the results
    #[arg(long)]
    pub record: bool,
}

#[derive(Args, Debug)]
pub struct DbArgs {
    /// Database file (default from config)
    #[arg(long)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Import an Anki import file
    Import {
        file: PathBuf,
        /// Source name (default: file stem)
        #[arg(long)]
        source: Option<String>,
        /// Raw OCR text for context
        #[arg(long)]
        raw: Option<PathBuf>,
    },

    /// List entries
    List {
        #[arg(long)]
        status: Option<RecordStatus>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Store a corrected translation
    Correct {
        id: u64,
        #[arg(long)]
        translation: String,
    },

    /// Mark an entry deleted so it is left out of exports
    Delete { id: u64 },

    /// Search raw OCR text for the translation of an entry
    FindMatch {
        id: u64,
        #[arg(long)]
        raw: PathBuf,
    },

    /// Export entries as an Anki import file
    Export {
        #[arg(short, long, default_value = "output/exported_vocabulary.txt")]
        output: PathBuf,
        /// Comma-separated statuses (default: all but deleted)
        #[arg(long, value_delimiter = ',')]
        status: Vec<RecordStatus>,
        #[arg(short, long, default_value = "Vocabulary")]
        deck: String,
        #[arg(short, long)]
        force: bool,
    },

    /// Show statistics
    Stats,
}
