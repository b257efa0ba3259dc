//! SectionDB CLI
//!
//! Command-line interface for working with a storage root.

use std::path::PathBuf;
use std::process;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sectiondb::document::{DbConfig, JsonDocument};
use sectiondb::{
    BlockMode, Cursor, DataType, Datum, IndexProvider, Result, SectionId, StorageProvider,
    StoreError, Value, NIL_SECTION,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Header written before each value: tag (1) + payload length (8)
const VALUE_HEADER_SIZE: u64 = 9;

/// SectionDB CLI
#[derive(Parser, Debug)]
#[command(name = "sectiondb-cli")]
#[command(about = "CLI for the SectionDB sectioned object store")]
#[command(version)]
struct Args {
    /// Storage root directory
    #[arg(short, long, default_value = "./sectiondb_data")]
    root: PathBuf,

    /// Optional database configuration document (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create (or validate) the storage root
    Init {
        /// Database name recorded in the configuration document
        #[arg(short, long, default_value = "sectiondb")]
        name: String,
    },

    /// Allocate a new empty section
    CreateSection {
        /// Register the section under this key
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Point a key at an existing section
    Link {
        key: String,
        id: SectionId,
    },

    /// Resolve keys to section ids
    Query {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Number of index entries
    Count,

    /// Store a typed value in the section registered under a key
    Put {
        key: String,

        /// text, number, boolean, datetime (RFC 3339) or bytes
        data_type: DataType,

        value: String,
    },

    /// Print the value stored under a key
    Get {
        key: String,
    },

    /// List all section files
    Sections,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sectiondb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("SectionDB CLI v{}", sectiondb::VERSION);
    tracing::debug!("Storage root: {}", args.root.display());

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let storage: StorageProvider = StorageProvider::open(&args.root)?;
    let document = load_document(&args)?;

    match args.command {
        Commands::Init { name } => {
            if let Some(path) = &args.config {
                if document.is_none() {
                    JsonDocument::new(DbConfig::new(name), path).save()?;
                    println!("Wrote configuration to {}", path.display());
                }
            }
            println!(
                "Storage root {} ready ({} entries)",
                storage.root().display(),
                storage.index().count()
            );
        }
        Commands::CreateSection { key } => {
            let id = match key {
                Some(key) => storage.register_section(&key)?,
                None => storage.create_section()?,
            };
            if let Some(mut document) = document {
                document.set_current_section(id);
                document.save()?;
            }
            println!("{}", id);
        }
        Commands::Link { key, id } => {
            if !storage.section_exists(id) {
                return Err(StoreError::SectionNotFound(id));
            }
            let count = storage.index().upsert([(key, id)])?;
            println!("{} entries", count);
        }
        Commands::Query { keys } => {
            for (key, id) in storage.index().query(keys) {
                println!("{}\t{}", key, id);
            }
        }
        Commands::Count => {
            let count = storage.index().count();
            println!("{}", count);
            if let Some(document) = document {
                if document.should_rotate(count) {
                    println!(
                        "index reached {} entries (limit {}), consider a new section",
                        count, document.max_section_index_size
                    );
                }
            }
        }
        Commands::Put {
            key,
            data_type,
            value,
        } => {
            let value = parse_value(data_type, &value)?;
            let id = match storage.index().resolve(&key) {
                id if id == NIL_SECTION => storage.register_section(&key)?,
                id => id,
            };
            write_value(&storage, id, &value)?;
            println!("{}\t{}", key, id);
        }
        Commands::Get { key } => {
            let id = storage.index().resolve(&key);
            if id == NIL_SECTION {
                return Err(StoreError::NotFound(key));
            }
            let value = read_value(&storage, id)?;
            println!("{}", format_datum(&value.to_datum()?));
        }
        Commands::Sections => {
            for id in storage.list_sections()? {
                println!("{}", id);
            }
        }
    }

    storage.close()
}

fn load_document(args: &Args) -> Result<Option<JsonDocument<DbConfig>>> {
    match &args.config {
        Some(path) if path.exists() => Ok(Some(JsonDocument::open(path)?)),
        _ => Ok(None),
    }
}

/// Write `[tag][len][payload]` at the start of the section
fn write_value(storage: &StorageProvider, id: SectionId, value: &Value) -> Result<()> {
    let block = storage.open_section(id, BlockMode::READ_WRITE)?;

    let mut header = Vec::with_capacity(VALUE_HEADER_SIZE as usize);
    header.push(value.data_type().tag());
    header.extend_from_slice(&(value.len() as u64).to_le_bytes());

    let header_cursor = Cursor::new(0, VALUE_HEADER_SIZE);
    block.put(header_cursor, &header)?;
    block.put(header_cursor.next(value.len() as u64)?, value.as_bytes())?;
    block.close()
}

fn read_value(storage: &StorageProvider, id: SectionId) -> Result<Value> {
    let block = storage.open_section(id, BlockMode::READ)?;

    let header_cursor = Cursor::new(0, VALUE_HEADER_SIZE);
    let header = block.get(header_cursor)?;
    let data_type = DataType::from_tag(header[0])
        .ok_or_else(|| StoreError::InvalidEncoding(format!("unknown tag 0x{:02x}", header[0])))?;
    let mut len = [0u8; 8];
    len.copy_from_slice(&header[1..]);

    let payload = block.get(header_cursor.next(u64::from_le_bytes(len))?)?;
    block.close()?;
    Value::from_raw(payload, data_type)
}

fn parse_value(data_type: DataType, raw: &str) -> Result<Value> {
    let invalid = |what: &str| StoreError::Config(format!("'{}' is not a valid {}", raw, what));

    let value = match data_type {
        DataType::Text => Value::from_text(raw),
        DataType::Number => Value::from_number(raw.parse().map_err(|_| invalid("number"))?),
        DataType::Boolean => Value::from_boolean(raw.parse().map_err(|_| invalid("boolean"))?),
        DataType::DateTime => {
            let parsed = DateTime::parse_from_rfc3339(raw).map_err(|_| invalid("RFC 3339 date"))?;
            Value::from_date_time(parsed.with_timezone(&Utc))
        }
        DataType::Bytes => Value::from_bytes(raw.as_bytes().to_vec()),
        DataType::Unknown => return Err(StoreError::UnsupportedType(DataType::Unknown)),
    };
    Ok(value)
}

fn format_datum(datum: &Datum) -> String {
    match datum {
        Datum::Text(text) => text.clone(),
        Datum::Number(number) => number.to_string(),
        Datum::Boolean(boolean) => boolean.to_string(),
        Datum::DateTime(date_time) => date_time.to_rfc3339(),
        Datum::Bytes(bytes) => format!("{:?}", bytes),
    }
}
