use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use gsweep_exp::aggregate::{block_sums, read_states, write_blocks, DEFAULT_BLOCK};

/// Sum a headerless sus,inf,rec trajectory in fixed-size index blocks.
#[derive(Parser, Debug)]
#[command(name = "gsweep-downsample", version)]
struct Args {
    /// Headerless three-column CSV.
    #[arg(long, short = 'i', default_value = "reference.csv")]
    input: PathBuf,
    /// Rows summed into one block.
    #[arg(long, short = 'b', default_value_t = DEFAULT_BLOCK)]
    block: usize,
    /// Destination CSV with a `block,sus,inf,rec` header.
    #[arg(long, short = 'o', default_value = "reference_blocks.csv")]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let rows = read_states(&args.input)?;
    let blocks = block_sums(&rows, args.block)?;
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_blocks(&args.out, &blocks)?;
    println!(
        "{} rows summed into {} blocks of {} -> {}",
        rows.len(),
        blocks.len(),
        args.block,
        args.out.display()
    );
    Ok(())
}
