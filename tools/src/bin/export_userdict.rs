//! Export the user dictionary to JSON or CSV.
//!
//! Usage:
//!   cargo run -p pinyin-ime-tools --bin export_userdict -- --db userdict.redb --format json
//!   cargo run -p pinyin-ime-tools --bin export_userdict -- --db userdict.redb --format csv --output phrases.csv

use std::path::PathBuf;

use clap::Parser;
use pinyin_ime_core::UserDict;

#[derive(Parser, Debug)]
#[command(name = "export_userdict")]
#[command(about = "Export the user dictionary to JSON or CSV")]
struct Args {
    /// Path to the user dictionary database
    #[arg(short, long)]
    db: PathBuf,

    /// Output format: json or csv
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sort by choice count, descending
    #[arg(long)]
    sort_by_count: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let userdict = UserDict::open(&args.db)
        .map_err(|e| anyhow::anyhow!("open user dict {}: {}", args.db.display(), e))?;

    let mut entries = userdict
        .entries()
        .map_err(|e| anyhow::anyhow!("read user dict: {}", e))?;

    if args.sort_by_count {
        entries.sort_by(|a, b| b.2.cmp(&a.2));
    } else {
        entries.sort();
    }

    let output = match args.format.as_str() {
        "json" => export_json(&entries)?,
        "csv" => export_csv(&entries),
        _ => anyhow::bail!("unsupported format {:?}, use 'json' or 'csv'", args.format),
    };

    if let Some(path) = args.output {
        std::fs::write(path, output)?;
    } else {
        print!("{}", output);
    }

    Ok(())
}

fn export_json(entries: &[(String, String, u64)]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

fn export_csv(entries: &[(String, String, u64)]) -> String {
    let mut output = String::from("key,hanzi,count\n");
    for (key, hanzi, count) in entries {
        let escaped_key = key.replace('"', "\"\"");
        let escaped_hanzi = hanzi.replace('"', "\"\"");
        output.push_str(&format!("\"{}\",\"{}\",{}\n", escaped_key, escaped_hanzi, count));
    }
    output
}
