// Command-line front end: OCR text in, extracted fields out as JSON.

use clap::{Parser, ValueEnum};
use log::{error, info};
use scanfields::{DocumentExtractor, DocumentType, ExtractionRules, Result};
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Identity,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DocumentKind {
    Passport,
    DriverLicense,
    IdCard,
}

impl From<DocumentKind> for DocumentType {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Passport => DocumentType::Passport,
            DocumentKind::DriverLicense => DocumentType::DriverLicense,
            DocumentKind::IdCard => DocumentType::IdCard,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "scanfields", version, about = "Extract structured fields from OCR text")]
struct Cli {
    /// OCR text file; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "identity")]
    kind: Kind,

    #[arg(long, value_enum, default_value = "passport")]
    document_type: DocumentKind,

    /// JSON file overriding the extraction thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, help = "Pretty-print the JSON output")]
    pretty: bool,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let rules = match &cli.config {
        Some(path) => ExtractionRules::from_json_file(path)?,
        None => ExtractionRules::default(),
    };
    let extractor = DocumentExtractor::with_rules(rules);
    let text = read_input(cli.input.as_ref())?;

    let json = match cli.kind {
        Kind::Identity => {
            let result = extractor.extract_identity(&text, cli.document_type.into());
            info!("Extracted {} identity field(s)", result.provenance.len());
            to_json(&result, cli.pretty)?
        }
        Kind::Property => {
            let result = extractor.extract_property(&text);
            info!("Extracted {} property field(s)", result.provenance.len());
            to_json(&result, cli.pretty)?
        }
    };
    Ok(json)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(&cli) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            error!("Extraction failed: {}", err);
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}
