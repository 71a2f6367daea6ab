//! pipepool CLI
//!
//! Runs commands against a RESP2 server through a connection pool, or pushes
//! a stream of writes through a batch queue.

use std::process;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use pipepool::batch::BatchCommandSet;
use pipepool::config::{InitializationMode, PoolConfig, QueueConfig};
use pipepool::{BatchCommand, BatchQueue, ConnectionPool, PipeError, Reply, Result, TcpConnection};
use tracing_subscriber::{fmt, EnvFilter};

/// pipepool CLI
#[derive(Parser, Debug)]
#[command(name = "pipepool-cli")]
#[command(about = "Pooled and pipelined commands against a RESP2 server")]
#[command(version)]
struct Args {
    /// Server address; repeat to round-robin over several
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: Vec<String>,

    /// Connections held by the pool
    #[arg(short, long, default_value = "4")]
    pool_size: usize,

    /// Connect/read/write timeout in seconds (0 = default)
    #[arg(short, long, default_value = "0")]
    timeout_secs: u64,

    /// lazy or aggressive connection setup
    #[arg(short, long, default_value = "lazy")]
    mode: InitializationMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Expire after this many seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Delete keys
    Del {
        /// The keys to delete
        keys: Vec<String>,
    },

    /// Ping the server
    Ping,

    /// Increment hash fields asynchronously through a batch queue (single --server)
    Load {
        /// Hash key to increment fields of
        key: String,

        /// Number of HINCRBY commands to submit
        #[arg(short, long, default_value = "10000")]
        count: usize,

        /// Distinct fields to spread increments over
        #[arg(short, long, default_value = "16")]
        fields: usize,

        /// Worker threads
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Commands pipelined per round trip
        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Queue capacity
        #[arg(short, long, default_value = "1024")]
        queue_size: usize,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,pipepool=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::debug!("pipepool CLI v{}", pipepool::VERSION);

    let config = PoolConfig::builder()
        .capacity(args.pool_size)
        .addresses(args.server.clone())
        .timeout(Duration::from_secs(args.timeout_secs))
        .init_mode(args.mode)
        .build();

    if let Err(e) = run(config, args.command) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(config: PoolConfig, command: Commands) -> Result<()> {
    let command = match command {
        Commands::Load {
            key,
            count,
            fields,
            workers,
            batch_size,
            queue_size,
        } => {
            let queue_config = QueueConfig::builder()
                .queue_size(queue_size)
                .workers(workers)
                .batch_size(batch_size)
                .build();
            return load(&config, queue_config, &key, count, fields.max(1));
        }
        Commands::Get { key } => BatchCommand::get(key),
        Commands::Set { key, value, ttl: None } => BatchCommand::set(key, value),
        Commands::Set {
            key,
            value,
            ttl: Some(secs),
        } => BatchCommand::set_with_expiry(key, value, Duration::from_secs(secs)),
        Commands::Del { keys } => BatchCommand::del(keys),
        Commands::Ping => BatchCommand::new("PING", Vec::new()),
    };
    single(config, command)
}

/// Run one command through the pool and print the reply
fn single(config: PoolConfig, command: BatchCommand) -> Result<()> {
    let pool: ConnectionPool<TcpConnection> = ConnectionPool::new(config);
    pool.open()?;

    let mut set = BatchCommandSet::new();
    set.push(command);
    let result = pool.execute_batch(&mut set);
    pool.close();
    result?;

    match set[0].reply() {
        Some(reply) => print_reply(reply, 0),
        None => println!("(no reply)"),
    }
    Ok(())
}

/// Push `count` increments through a batch queue and report throughput
///
/// Every worker clones one seed connection, so `load` talks to exactly one
/// upstream and refuses a repeated `--server`.
fn load(config: &PoolConfig, queue_config: QueueConfig, key: &str, count: usize, fields: usize) -> Result<()> {
    let addr = match config.addresses.as_slice() {
        [addr] => addr.clone(),
        addrs => {
            return Err(PipeError::Config(format!(
                "load needs exactly one --server, got {}",
                addrs.len()
            )))
        }
    };
    let seed = TcpConnection::new(addr, config.effective_timeout());

    let queue = BatchQueue::new(queue_config)
        .with_current_logger()
        .with_connection(seed);
    queue.open()?;

    let start = Instant::now();
    for i in 0..count {
        let field = format!("f{}", i % fields);
        queue.run_async([BatchCommand::hincrby(key, field, 1)])?;
    }
    queue.close();
    let elapsed = start.elapsed();

    println!(
        "{} commands in {:.3}s ({:.0} ops/s)",
        count,
        elapsed.as_secs_f64(),
        count as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    Ok(())
}

fn print_reply(reply: &Reply, depth: usize) {
    let indent = "  ".repeat(depth);
    match reply {
        Reply::Nil => println!("{}(nil)", indent),
        Reply::Status(text) => println!("{}{}", indent, text),
        Reply::Integer(value) => println!("{}(integer) {}", indent, value),
        Reply::Bulk(data) => println!("{}\"{}\"", indent, String::from_utf8_lossy(data)),
        Reply::Error(message) => println!("{}(error) {}", indent, message),
        Reply::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                println!("{}{})", indent, i + 1);
                print_reply(item, depth + 1);
            }
        }
    }
}
