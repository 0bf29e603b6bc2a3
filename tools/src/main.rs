//! Pack a raw phrase table into the binary system dictionary blob.
//!
//! Input is a tab-separated text file, one phrase per line:
//!
//!   ni'hao<TAB>你好<TAB>200
//!
//! Keys are pinyin syllables joined with apostrophes. Lines starting with
//! `#` and blank lines are skipped. The output blob can be shipped as its
//! own file or concatenated into a larger resource file; the decoder opens
//! it by byte range either way.
//!
//! Usage:
//!   cargo run -p pinyin-ime-tools --bin pack_dict -- --input phrases.tsv --output sysdict.dat

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pinyin_ime_core::DictBuilder;

#[derive(Parser, Debug)]
#[command(name = "pack_dict")]
#[command(about = "Pack a tab-separated phrase table into a system dictionary blob")]
struct Args {
    /// Phrase table: key<TAB>hanzi<TAB>frequency per line
    #[arg(short, long)]
    input: PathBuf,

    /// Output blob path
    #[arg(short, long, default_value = "sysdict.dat")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("open {}", args.input.display()))?;
    let reader = BufReader::new(file);

    let mut builder = DictBuilder::new();
    let mut phrases = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let (key, hanzi, freq) = match (fields.next(), fields.next(), fields.next()) {
            (Some(k), Some(h), Some(f)) => (k, h, f),
            _ => bail!("line {}: expected key<TAB>hanzi<TAB>frequency", lineno + 1),
        };
        let freq: u32 = freq
            .trim()
            .parse()
            .with_context(|| format!("line {}: bad frequency {:?}", lineno + 1, freq))?;

        builder.push(key, hanzi, freq);
        phrases += 1;
    }

    if builder.is_empty() {
        bail!("{}: no phrases found", args.input.display());
    }

    let keys = builder.len();
    builder
        .write_to_file(&args.output)
        .with_context(|| format!("write {}", args.output.display()))?;

    println!(
        "Packed {} phrases under {} keys into {}",
        phrases,
        keys,
        args.output.display()
    );
    Ok(())
}
