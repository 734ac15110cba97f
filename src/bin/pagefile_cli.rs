//! Small manual smoke-test driver for the page file and buffer pool. Not
//! part of the library's tested contract — exercises the public API against
//! a real file so behavior can be poked at by hand.

use clap::{Parser, Subcommand};

use pagedb::{BufferPool, PageFile, ReplacementStrategy, PAGE_SIZE};

#[derive(Parser)]
#[command(name = "pagefile_cli", about = "Smoke-test driver for pagedb")]
struct Cli {
    /// Path to the backing database file.
    file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new page file with one zero page.
    Create,
    /// Print total page count.
    Stat,
    /// Pin a page through a buffer pool of the given capacity/strategy and
    /// print its first bytes as hex.
    Pin {
        page_id: i32,
        #[arg(long, default_value_t = 4)]
        capacity: usize,
        #[arg(long, default_value = "fifo")]
        strategy: String,
    },
}

fn parse_strategy(s: &str) -> ReplacementStrategy {
    match s.to_lowercase().as_str() {
        "lru" => ReplacementStrategy::Lru,
        _ => ReplacementStrategy::Fifo,
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Create => {
            PageFile::create(&cli.file).expect("failed to create page file");
            println!("created {}", cli.file);
        }
        Command::Stat => {
            let pf = PageFile::open(&cli.file).expect("failed to open page file");
            println!("{} has {} pages", cli.file, pf.total_pages());
        }
        Command::Pin {
            page_id,
            capacity,
            strategy,
        } => {
            let mut pool = BufferPool::init(&cli.file, capacity, parse_strategy(&strategy))
                .expect("failed to init buffer pool");
            let handle = pool.pin(page_id).expect("pin failed");
            let data = handle.data();
            let preview = &data[..16.min(PAGE_SIZE)];
            println!("page {} first bytes: {:02x?}", page_id, preview);
        }
    }
}
