use clap::{Parser, ValueEnum};
use log::info;

use cal_bdd::bdd::Bdd;
use cal_bdd::config::{BddConfig, ReorderTechnique};
use cal_bdd::function::Function;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Technique {
    None,
    Sift,
    Window,
}

impl From<Technique> for ReorderTechnique {
    fn from(t: Technique) -> Self {
        match t {
            Technique::None => ReorderTechnique::None,
            Technique::Sift => ReorderTechnique::Sift,
            Technique::Window => ReorderTechnique::Window,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of queens.
    #[arg(value_name = "INT", default_value = "8")]
    n: usize,

    /// Operation cache size (in bits, so the actual size is `2^bits` slots).
    #[clap(long, value_name = "INT", default_value = "18")]
    cache_bits: usize,

    /// Dynamic reordering heuristic.
    #[clap(long, value_enum, default_value = "none")]
    reorder: Technique,

    /// Node limit.
    #[clap(long, value_name = "INT")]
    node_limit: Option<usize>,
}

/// `x_ij` implies that no other queen attacks square `(i, j)`.
fn queen_at<'a>(bdd: &'a Bdd, queens: &[Vec<Function<'a>>], i: usize, j: usize) -> color_eyre::Result<Function<'a>> {
    let n = queens.len();
    let mut attacked = Vec::new();
    for k in 0..n {
        for l in 0..n {
            if (k, l) == (i, j) {
                continue;
            }
            let same_row = k == i;
            let same_col = l == j;
            let same_diag = k as isize - l as isize == i as isize - j as isize || k + l == i + j;
            if same_row || same_col || same_diag {
                attacked.push(queens[k][l].not());
            }
        }
    }
    let refs: Vec<&Function<'a>> = attacked.iter().collect();
    let free = bdd.and_many(&refs)?;
    Ok(queens[i][j].imply(&free)?)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    info!("args = {:?}", args);

    let technique: ReorderTechnique = args.reorder.into();
    let config = BddConfig::default()
        .with_cache_bits(args.cache_bits)
        .with_node_limit(args.node_limit)
        .with_reorder_technique(technique)
        .with_dynamic_reordering(technique != ReorderTechnique::None);
    let bdd = Bdd::with_config(config);

    // Encode N-queens problem:
    // - one queen per row
    // - no two queens attack each other
    let n = args.n;
    info!("Encoding n-queens problem with n = {}", n);
    let mut queens = Vec::with_capacity(n);
    for _ in 0..n {
        let row = (0..n).map(|_| bdd.new_var_last()).collect::<Result<Vec<_>, _>>()?;
        queens.push(row);
    }

    let mut res = bdd.one();
    for i in 0..n {
        let row: Vec<&Function<'_>> = queens[i].iter().collect();
        res = res.and(&bdd.or_many(&row)?)?;
        for j in 0..n {
            res = res.and(&queen_at(&bdd, &queens, i, j)?)?;
        }
        info!("row {}: {} nodes in result, {} in manager", i, res.size(), bdd.node_count());
    }

    let solutions = res.sat_count(n * n);
    println!("{}-queens has {} solutions", n, solutions);
    println!("res of size {}", res.size());
    println!("stats = {:?}", bdd.stats());
    println!("All done in {:.3} s", time_total.elapsed().as_secs_f64());

    Ok(())
}
