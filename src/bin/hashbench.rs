//! Fills a position cache with random Quoridor games and reports how the tables behaved.

use std::error::Error;
use std::io;
use std::time::Instant;

use arrayvec::ArrayVec;
use clap::{Arg, Command};
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use poshash::generations::NUM_GENERATIONS;
use poshash::hash::{available_memory, ByteHash, GrowHashSettings, TeardownStats};
use poshash::position::{
    Direction, Move, Orientation, Player, Position, PositionInfo, WALL_SLOTS,
};
use poshash::PositionCache;

#[cfg(all(feature = "mimalloc", not(feature = "dhat-heap")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

/// Fraction of free memory the cache may size its buckets for
const MEMORY_FRACTION: u64 = 4;

pub fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let matches = Command::new("poshash benchmark")
        .version("0.1")
        .arg(
            Arg::new("positions")
                .long("positions")
                .env("POSITIONS")
                .help("Number of positions to visit")
                .num_args(1)
                .default_value("1000000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("buckets")
                .long("buckets")
                .env("BUCKETS")
                .help("Buckets per generation. Defaults to a share of available memory")
                .num_args(1)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("blockSize")
                .long("block-size")
                .env("BLOCK_SIZE")
                .help("Number of slots allocated at a time")
                .num_args(1)
                .default_value("1024")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .env("SEED")
                .help("Seed for the random games")
                .num_args(1)
                .default_value("0")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("logfile")
                .long("logfile")
                .env("LOGFILE")
                .value_name("hashbench.log")
                .help("Name of debug logfile")
                .num_args(1),
        )
        .get_matches();

    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });

    if let Some(log_file) = matches.get_one::<String>("logfile") {
        log_dispatcher
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Debug)
                    .chain(fern::log_file(log_file)?),
            )
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Warn)
                    .chain(io::stderr()),
            )
            .apply()?
    } else {
        log_dispatcher
            .level(log::LevelFilter::Warn)
            .chain(io::stderr())
            .apply()?
    }

    let num_positions = *matches.get_one::<u64>("positions").unwrap();
    let block_size = *matches.get_one::<u32>("blockSize").unwrap();
    let seed = *matches.get_one::<u64>("seed").unwrap();

    let mut settings = GrowHashSettings::default()
        .initial_block_size(block_size)
        .block_grow_size(block_size);
    settings = match matches.get_one::<usize>("buckets") {
        Some(buckets) => settings.bucket_count(*buckets),
        None => match available_memory() {
            Some(bytes) => {
                let per_generation = bytes / MEMORY_FRACTION / NUM_GENERATIONS as u64;
                settings.mem_usage::<Position, PositionInfo>(per_generation as usize)
            }
            None => {
                warn!("Could not detect available memory, using default bucket count");
                settings
            }
        },
    };
    info!("Using {:?}", settings);

    let mut cache = PositionCache::new(ByteHash, settings)?;
    let mut rng = SmallRng::seed_from_u64(seed);
    let start_time = Instant::now();

    let mut hits = 0u64;
    let mut discarded = TeardownStats::default();
    let mut games = 0u64;
    let mut visited = 0u64;

    while visited < num_positions {
        let mut position = Position::default();
        games += 1;
        // Every game starts from scratch, so nothing from the previous game is reachable
        discarded += cache.discard_below(NUM_GENERATIONS as u8);

        loop {
            let info = cache.entry(&position)?;
            if info.is_computed() {
                hits += 1;
            } else {
                info.set_evaluated(rng.gen());
            }
            visited += 1;
            if visited >= num_positions {
                break;
            }

            let Some(mv) = random_move(&position, &mut rng) else {
                break;
            };
            let walls_before = position.walls_placed();
            position.do_move(mv);
            if position.walls_placed() > walls_before {
                let stats = cache.discard_below(position.walls_placed());
                debug!(
                    "Wall {} played, discarded {} positions in {} blocks",
                    mv, stats.elements, stats.blocks
                );
                discarded += stats;
            }
            if reached_goal(&position) {
                break;
            }
        }
    }

    let elapsed = start_time.elapsed();
    println!(
        "{} positions in {} games, {:.1}s, {:.0} positions/s",
        visited,
        games,
        elapsed.as_secs_f64(),
        visited as f64 / elapsed.as_secs_f64()
    );
    println!(
        "{} cache hits ({:.1}%)",
        hits,
        100.0 * hits as f64 / visited as f64
    );
    println!(
        "Discarded {} positions in {} blocks",
        discarded.elements, discarded.blocks
    );
    for walls in cache.open_generations() {
        if let Some(generation) = cache.generation(walls) {
            println!(
                "Generation {:2}: {} positions, {} blocks, longest chain {}",
                walls,
                generation.len(),
                generation.block_count(),
                generation.longest_chain()
            );
        }
    }
    println!("Cache memory usage: {}MB", cache.mem_usage() / (1024 * 1024));
    Ok(())
}

/// Picks a random pawn step or wall placement, without checking Quoridor rules beyond
/// staying on the board and not placing the same wall twice
fn random_move<R: Rng>(position: &Position, rng: &mut R) -> Option<Move> {
    let mut candidates: ArrayVec<Move, 8> = ArrayVec::new();
    let mover = position.side_to_move();
    let pawn = position.pawn(mover);
    for direction in Direction::all() {
        if pawn.go_direction(direction).is_some() {
            candidates.push(Move::step(direction));
        }
    }
    if position.walls_left(mover) > 0 {
        for _ in 0..2 {
            let orientation = if rng.gen() {
                Orientation::Row
            } else {
                Orientation::Column
            };
            let groove = rng.gen_range(0..WALL_SLOTS);
            let slot = rng.gen_range(0..WALL_SLOTS);
            if !position.has_wall(orientation, groove, slot) {
                candidates.push(Move::wall(orientation, groove, slot));
            }
        }
    }
    candidates.choose(rng).copied()
}

fn reached_goal(position: &Position) -> bool {
    position.pawn(Player::White).y() == 8 || position.pawn(Player::Black).y() == 0
}
