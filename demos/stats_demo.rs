use cellar_hash::HashMap;
use cellar_hash::KeyFns;
use cellar_hash::KeyHasher;
use cellar_hash::StrHashMap;
use cellar_hash::key_hash::djb2;
use clap::Parser;
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Keys {
    /// "node_<i>" strings hashed with djb2
    Names,
    /// Names hashed into a handful of buckets, forcing heavy chaining
    Clustered,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: usize,

    /// Remove every other key after filling, leaving pass-through slots
    #[arg(short = 'r', long = "remove_half")]
    remove_half: bool,

    #[arg(short = 'k', long = "keys", value_enum, default_value_t = Keys::Names)]
    keys: Keys,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    println!("Inserting {} {:?} keys", args.count, args.keys);

    match args.keys {
        Keys::Names => {
            let mut map = StrHashMap::new();
            fill(&mut map, args.count, args.remove_half);
            map.stats().print();
        }
        Keys::Clustered => {
            let policy = KeyFns::new(
                |name: &String| djb2(name.as_bytes()) as u64 % 7,
                |a: &String, b: &String| a == b,
            );
            let mut map = HashMap::with_hasher(policy);
            fill(&mut map, args.count, args.remove_half);
            map.stats().print();
        }
    }
}

fn fill<H>(map: &mut HashMap<String, usize, H>, count: usize, remove_half: bool)
where
    H: KeyHasher<String>,
{
    for i in 0..count {
        if let Err(err) = map.insert(format!("node_{i}"), i) {
            eprintln!("insert of node_{i} failed: {err}");
            return;
        }
    }

    if remove_half {
        for i in (0..count).step_by(2) {
            if let Err(err) = map.remove(&format!("node_{i}")) {
                eprintln!("removal of node_{i} failed: {err}");
                return;
            }
        }
    }

    println!("Final size: {} entries in {} slots", map.len(), map.capacity());
}
