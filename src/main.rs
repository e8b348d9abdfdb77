use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use compact_fm::index::{BuildParams, FMBuilder, FMIndex, IndexMeta, ReferenceIndex, SampleStrategy};
use compact_fm::io::fasta::assemble_text;
use compact_fm::succinct::BwtEncoding;
use compact_fm::util::alphabet::{self, Alphabet};
use compact_fm::util::size::{format_size, parse_size};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "compact-fm",
    author,
    version,
    about = "Compressed FM-index over DNA/protein sequences",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an index from a FASTA file
    Build {
        /// Reference FASTA file
        reference: String,
        /// Output prefix; the index is written to <output>.cfm
        #[arg(short, long, default_value = "ref")]
        output: String,
        /// Alphabet: `dna`, `protein`, or an explicit ordered symbol list
        #[arg(short, long, default_value = "dna")]
        alphabet: String,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
        /// Target number of suffixes per sorted block
        #[arg(long = "block-size", default_value_t = 1 << 24)]
        block_size: usize,
        /// Difference-cover period
        #[arg(long = "dc-period", default_value_t = 4096)]
        dc_period: usize,
        /// Suffix-array sample rate
        #[arg(short = 'r', long = "sample-rate", default_value_t = 32)]
        sample_rate: usize,
        #[arg(long = "sample-strategy", value_enum, default_value_t = SampleStrategy::Row)]
        sample_strategy: SampleStrategy,
        /// Prefix length of the precomputed range table (0 disables it)
        #[arg(short = 'w', long = "precompute-width", default_value_t = 10)]
        precompute_width: usize,
        /// Record adjacent-row LCP flags against this threshold (0 disables them)
        #[arg(long = "max-lcp", default_value_t = 0)]
        max_lcp: usize,
        /// Memory ceiling, e.g. 4G or 512M; block size and dc period are inferred from it
        #[arg(short = 'm', long = "memory")]
        memory: Option<String>,
        #[arg(short, long, value_enum, default_value_t = BwtEncoding::RunBlock)]
        encoding: BwtEncoding,
    },
    /// Search patterns in an index and report their positions
    Search {
        /// Path to the index (.cfm)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Patterns to look up
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Report at most this many positions per pattern
        #[arg(short = 'n', long = "max-hits", default_value_t = 20)]
        max_hits: usize,
    },
    /// Print index statistics
    Inspect {
        #[arg(short = 'i', long = "index")]
        index: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            reference,
            output,
            alphabet,
            threads,
            block_size,
            dc_period,
            sample_rate,
            sample_strategy,
            precompute_width,
            max_lcp,
            memory,
            encoding,
        } => {
            let memory_limit = memory.as_deref().map(parse_size).transpose()?;
            let params = BuildParams {
                threads,
                sa_block_size: block_size,
                dc_period,
                sample_rate,
                sample_strategy,
                precompute_width,
                max_lcp,
                memory_limit,
                encoding,
                ..BuildParams::default()
            };
            run_build(&reference, &output, &alphabet, params)
        }
        Commands::Search {
            index,
            patterns,
            max_hits,
        } => run_search(&index, &patterns, max_hits),
        Commands::Inspect { index } => run_inspect(&index),
    }
}

fn parse_alphabet(name: &str) -> Result<Alphabet> {
    let list = match name.to_ascii_lowercase().as_str() {
        "dna" => alphabet::DNA.to_string(),
        "protein" => alphabet::PROTEIN.to_string(),
        _ => name.to_string(),
    };
    Ok(Alphabet::new(&list)?)
}

fn run_build(reference: &str, output: &str, alphabet: &str, params: BuildParams) -> Result<()> {
    let alphabet = parse_alphabet(alphabet)?;
    let fh = File::open(reference)
        .with_context(|| format!("cannot open reference FASTA '{}'", reference))?;
    let asm = assemble_text(BufReader::new(fh), &alphabet)
        .with_context(|| format!("cannot read '{}'", reference))?;

    let encoding = params.encoding;
    let out = FMBuilder::new(&asm.text, alphabet.size(), params)
        .select_offsets(asm.contig_starts())
        .build()
        .context("index construction failed")?;
    let used = out.params.clone();
    let fm = FMIndex::from_build(out, alphabet, encoding);
    let mut idx = ReferenceIndex::new(fm, asm.contigs);
    idx.set_meta(IndexMeta {
        reference_file: Some(reference.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        params: Some(used),
    });

    let out_path = format!("{}.cfm", output);
    idx.save_to_file(&out_path)?;
    info!(
        "index saved: {} ({} in memory)",
        out_path,
        format_size(idx.fm.space().total())
    );
    Ok(())
}

fn run_search(index_path: &str, patterns: &[String], max_hits: usize) -> Result<()> {
    let idx = ReferenceIndex::load_from_file(index_path)?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for pattern in patterns {
        let hit = idx.fm.backward_search(pattern.as_bytes());
        if !hit.is_full_match(pattern.len()) {
            writeln!(
                out,
                "{}\tmatched {}/{} suffix symbols\t0 hits",
                pattern,
                hit.matched_len,
                pattern.len()
            )?;
            continue;
        }
        writeln!(out, "{}\t{} hits", pattern, hit.range.len())?;
        let shown = hit.range.start..hit.range.end.min(hit.range.start + max_hits);
        let mut positions = idx.fm.locate_range(shown);
        positions.sort_unstable();
        for pos in positions {
            match idx.map_text_pos(pos) {
                Some((ci, off)) => writeln!(out, "\t{}:{}", idx.contigs[ci].name, off + 1)?,
                None => writeln!(out, "\t?:{}", pos)?,
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn run_inspect(index_path: &str) -> Result<()> {
    let idx = ReferenceIndex::load_from_file(index_path)?;
    let fm = &idx.fm;
    let space = fm.space();
    println!("symbols:        {}", fm.len());
    println!("alphabet:       {}", String::from_utf8_lossy(fm.alphabet.symbols()));
    println!("sequences:      {}", idx.contigs.len());
    println!("encoding:       {:?}", fm.encoding());
    println!(
        "sampling:       {:?} every {}",
        fm.aux.sample_strategy, fm.aux.sample_rate
    );
    println!("prefix table:   width {}", fm.aux.precompute_width);
    println!("selected rows:  {}", fm.aux.selected_sa.len());
    println!("bwt:            {}", format_size(space.bwt));
    println!("aux:            {}", format_size(space.aux));
    println!("total:          {}", format_size(space.total()));
    if let Some(ts) = &idx.meta.build_timestamp {
        println!("built:          {}", ts);
    }
    if let Some(args) = &idx.meta.build_args {
        println!("command:        {}", args);
    }
    Ok(())
}
