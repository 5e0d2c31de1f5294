use anyhow::{bail, Context as _, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, System};
use tracing_subscriber::EnvFilter;
use wikigraph_core::import::import_markdown_dir;
use wikigraph_core::settings::{load_effective_settings, EngineSettings};
use wikigraph_core::{DocumentStore, LinkEngine, MemoryStore, NoteId, VaultId};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(cmd) = args.next() else {
        print_help();
        return Ok(());
    };

    match cmd.as_str() {
        "gen-vault" => cmd_gen_vault(args.collect()),
        "perf" => cmd_perf(args.collect()),
        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            print_help();
            bail!("unknown xtask command: {other}");
        }
    }
}

fn print_help() {
    eprintln!(
        r#"xtask (wikigraph)

Commands:
  gen-vault   Generate a synthetic markdown vault with wiki-links
  perf        Load a vault and time backlinks/mentions/rename/search/context

Examples:
  cargo run -p xtask -- gen-vault --path ./Synthetic.vault --notes 20000 --clean
  cargo run -p xtask -- perf --path ./Synthetic.vault --query note --iterations 20

Set RUST_LOG=wikigraph_core=debug for per-call summaries.
"#
    );
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // splitmix64
        self.0 = self.0.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn gen_range_usize(&mut self, max_exclusive: usize) -> usize {
        if max_exclusive == 0 {
            return 0;
        }
        (self.next_u64() as usize) % max_exclusive
    }

    fn gen_bool_percent(&mut self, percent: u32) -> bool {
        (self.next_u32() % 100) < percent
    }
}

struct GenVaultArgs {
    path: PathBuf,
    notes: usize,
    max_depth: usize,
    seed: u64,
    clean: bool,
    content_min_bytes: usize,
    content_max_bytes: usize,
    link_percent: u32,
    mention_percent: u32,
}

fn cmd_gen_vault(args: Vec<String>) -> Result<()> {
    let args = parse_gen_vault_args(args)?;

    if args.clean && args.path.exists() {
        fs::remove_dir_all(&args.path)
            .with_context(|| format!("remove_dir_all: {}", args.path.display()))?;
    }

    let notes_root = args.path.join("notes");
    fs::create_dir_all(&notes_root)
        .with_context(|| format!("create_dir_all: {}", notes_root.display()))?;

    let mut folders = Vec::with_capacity(args.max_depth + 1);
    let mut fs_path = notes_root.clone();
    folders.push(fs_path.clone());
    for depth in 1..=args.max_depth {
        fs_path.push(format!("d{:03}", depth - 1));
        fs::create_dir_all(&fs_path)
            .with_context(|| format!("create_dir_all: {}", fs_path.display()))?;
        folders.push(fs_path.clone());
    }

    let mut rng = Rng::new(args.seed);
    let started = Instant::now();
    let mut links = 0usize;

    for i in 0..args.notes {
        let depth = gen_depth(&mut rng, args.max_depth);
        let full_path = folders[depth].join(format!("{}.md", note_title(i)));

        let size = if args.content_max_bytes <= args.content_min_bytes {
            args.content_min_bytes
        } else {
            args.content_min_bytes
                + rng.gen_range_usize(args.content_max_bytes - args.content_min_bytes + 1)
        };
        let content = gen_markdown_content(&mut rng, i, size, &args);
        links += content.matches("[[").count();

        fs::write(&full_path, content)
            .with_context(|| format!("write: {}", full_path.display()))?;

        if i > 0 && i % 10_000 == 0 {
            eprintln!("gen-vault: wrote {i} notes...");
        }
    }

    eprintln!(
        "gen-vault: done\n  path: {}\n  notes: {}\n  links: {}\n  max_depth: {}\n  time_ms: {}",
        args.path.display(),
        args.notes,
        links,
        args.max_depth,
        started.elapsed().as_millis()
    );
    Ok(())
}

fn parse_gen_vault_args(args: Vec<String>) -> Result<GenVaultArgs> {
    let mut path: Option<PathBuf> = None;
    let mut notes: usize = 20_000;
    let mut max_depth: usize = 8;
    let mut seed: u64 = 1;
    let mut clean = false;
    let mut content_min_bytes: usize = 512;
    let mut content_max_bytes: usize = 4096;
    let mut link_percent: u32 = 30;
    let mut mention_percent: u32 = 10;

    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--path" => path = Some(PathBuf::from(it.next().context("--path requires a value")?)),
            "--notes" => notes = it.next().context("--notes requires a value")?.parse()?,
            "--max-depth" => {
                max_depth = it.next().context("--max-depth requires a value")?.parse()?
            }
            "--seed" => seed = it.next().context("--seed requires a value")?.parse()?,
            "--clean" => clean = true,
            "--content-min" => {
                content_min_bytes = it
                    .next()
                    .context("--content-min requires a value")?
                    .parse()?
            }
            "--content-max" => {
                content_max_bytes = it
                    .next()
                    .context("--content-max requires a value")?
                    .parse()?
            }
            "--link-percent" => {
                link_percent = it
                    .next()
                    .context("--link-percent requires a value")?
                    .parse()?
            }
            "--mention-percent" => {
                mention_percent = it
                    .next()
                    .context("--mention-percent requires a value")?
                    .parse()?
            }
            other => bail!("unknown gen-vault arg: {other}"),
        }
    }

    Ok(GenVaultArgs {
        path: path.unwrap_or_else(|| PathBuf::from("Synthetic.vault")),
        notes,
        max_depth,
        seed,
        clean,
        content_min_bytes,
        content_max_bytes,
        link_percent,
        mention_percent,
    })
}

fn gen_depth(rng: &mut Rng, max_depth: usize) -> usize {
    // Geometric-ish distribution biased toward shallow paths.
    let mut depth = 0usize;
    while depth < max_depth && (rng.next_u32() & 0b11) == 0 {
        depth += 1;
    }
    depth
}

fn note_title(ix: usize) -> String {
    format!("Note {ix:06}")
}

fn gen_markdown_content(rng: &mut Rng, ix: usize, target_bytes: usize, args: &GenVaultArgs) -> String {
    let mut s = format!("# {}\n\n", note_title(ix));

    if args.notes > 0 {
        if rng.gen_bool_percent(args.link_percent) {
            let target = note_title(rng.gen_range_usize(args.notes));
            let link = match rng.gen_range_usize(3) {
                0 => format!("[[{target}]]"),
                1 => format!("[[{target}|see also]]"),
                _ => format!("[[{target}#Details]]"),
            };
            s.push_str(&format!("Related: {link}\n\n"));
        }
        if rng.gen_bool_percent(args.mention_percent) {
            let target = note_title(rng.gen_range_usize(args.notes));
            s.push_str(&format!("Earlier I wrote {target} without a link.\n\n"));
        }
    }
    let keep = s.len();

    while s.len() < target_bytes {
        s.push_str("Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n");
        s.push_str("- Item A\n- Item B\n- Item C\n\n");
    }

    // Ensure ASCII-only content so truncation stays valid UTF-8.
    s.truncate(target_bytes.max(keep));
    s.push('\n');
    s
}

struct PerfArgs {
    path: PathBuf,
    config_dir: Option<PathBuf>,
    query: String,
    iterations: usize,
    seed: u64,
}

#[derive(Default)]
struct Samples {
    backlinks: Vec<u128>,
    mentions: Vec<u128>,
    search: Vec<u128>,
    context: Vec<u128>,
    quick_switch: Vec<u128>,
    rename: Vec<u128>,
}

fn cmd_perf(args: Vec<String>) -> Result<()> {
    let args = parse_perf_args(args)?;

    let settings = match &args.config_dir {
        Some(dir) => load_effective_settings(dir, Some(&args.path))?,
        None => EngineSettings::default(),
    };

    let vault = VaultId::new("perf");
    let store = MemoryStore::new();
    let import_start = Instant::now();
    let report = import_markdown_dir(&store, &vault, &args.path)?;
    let import_ms = import_start.elapsed().as_millis();
    if report.imported.is_empty() {
        bail!("no markdown notes found under {}", args.path.display());
    }

    let engine = LinkEngine::new(store, settings);
    let ids: Vec<NoteId> = report.imported.clone();
    let mut rng = Rng::new(args.seed);
    let mut samples = Samples::default();
    let mut backlink_hits = 0usize;
    let mut mention_hits = 0usize;
    let mut rewritten = 0usize;

    let graph_start = Instant::now();
    let graph = engine.link_graph(&vault)?;
    let graph_ms = graph_start.elapsed().as_millis();

    for _ in 0..args.iterations {
        let id = &ids[rng.gen_range_usize(ids.len())];

        let t = Instant::now();
        backlink_hits += engine.backlinks(&vault, id)?.len();
        samples.backlinks.push(t.elapsed().as_millis());

        let t = Instant::now();
        mention_hits += engine.unlinked_mentions(&vault, id)?.len();
        samples.mentions.push(t.elapsed().as_millis());

        let t = Instant::now();
        engine.search(&vault, &args.query)?;
        samples.search.push(t.elapsed().as_millis());

        let t = Instant::now();
        engine.build_context(&vault, &args.query)?;
        samples.context.push(t.elapsed().as_millis());

        let t = Instant::now();
        engine.quick_switch(&vault, &args.query)?;
        samples.quick_switch.push(t.elapsed().as_millis());

        let title = engine.note(&vault, id)?.title;
        let t = Instant::now();
        let outcome = engine.rename(&vault, id, &format!("{title} renamed"))?;
        samples.rename.push(t.elapsed().as_millis());
        rewritten += outcome.rewritten.len();
        engine.rename(&vault, id, &title)?;
    }

    println!("perf:");
    println!("  path: {}", args.path.display());
    println!("  import_ms: {import_ms}");
    println!("  note_count: {}", engine.store().list_notes_by_vault(&vault)?.len());
    println!("  skipped_files: {}", report.skipped.len());
    println!("  graph_build_ms: {graph_ms}");
    println!("  graph_edges: {}", graph.edges.len());
    println!("  query: {}", args.query);
    println!("  iterations: {}", args.iterations);
    println!("  backlink_hits: {backlink_hits}");
    println!("  mention_hits: {mention_hits}");
    println!("  rename_rewritten: {rewritten}");
    print_percentiles("backlinks", &samples.backlinks);
    print_percentiles("mentions", &samples.mentions);
    print_percentiles("search", &samples.search);
    print_percentiles("context", &samples.context);
    print_percentiles("quick_switch", &samples.quick_switch);
    print_percentiles("rename", &samples.rename);
    if let Some((rss, vmem)) = current_process_memory() {
        println!("  rss_bytes: {rss}");
        println!("  vmem_bytes: {vmem}");
    } else {
        println!("  rss_bytes: N/A");
        println!("  vmem_bytes: N/A");
    }

    Ok(())
}

fn parse_perf_args(args: Vec<String>) -> Result<PerfArgs> {
    let mut path: Option<PathBuf> = None;
    let mut config_dir: Option<PathBuf> = None;
    let mut query: String = "note".to_string();
    let mut iterations: usize = 20;
    let mut seed: u64 = 7;
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--path" | "--vault" => {
                path = Some(PathBuf::from(it.next().context("--path requires a value")?))
            }
            "--config-dir" => {
                config_dir = Some(PathBuf::from(
                    it.next().context("--config-dir requires a value")?,
                ))
            }
            "--query" => query = it.next().context("--query requires a value")?,
            "--iterations" => {
                let raw = it.next().context("--iterations requires a value")?;
                iterations = raw
                    .parse::<usize>()
                    .with_context(|| format!("invalid --iterations: {raw}"))?;
            }
            "--seed" => seed = it.next().context("--seed requires a value")?.parse()?,
            other => bail!("unknown perf arg: {other}"),
        }
    }
    Ok(PerfArgs {
        path: path.unwrap_or_else(|| PathBuf::from("Synthetic.vault")),
        config_dir,
        query,
        iterations: iterations.max(1),
        seed,
    })
}

fn print_percentiles(name: &str, samples: &[u128]) {
    if samples.is_empty() {
        return;
    }
    println!("  {name}_samples: {}", samples.len());
    println!("  {name}_p50_ms: {}", percentile_ms(samples, 50.0));
    println!("  {name}_p95_ms: {}", percentile_ms(samples, 95.0));
}

fn percentile_ms(samples: &[u128], percentile: f64) -> u128 {
    if samples.is_empty() {
        return 0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let rank = ((percentile / 100.0) * ((sorted.len() - 1) as f64)).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

fn current_process_memory() -> Option<(u64, u64)> {
    let mut system = System::new();
    system.refresh_processes();
    let pid = Pid::from_u32(std::process::id());
    let process = system.process(pid)?;
    Some((process.memory(), process.virtual_memory()))
}
