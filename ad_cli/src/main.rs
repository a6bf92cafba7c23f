//! CLI demo for the scalar and tensor engines.
//!
//! `scalar` builds `ln(x1) + x1*x2 - sin(x2)`, runs a backward pass and
//! validates the gradients against finite differences. `tensor` builds a few
//! `arange` tensors and combines them with broadcasting add and mul.

use std::error::Error;

use ad_core::{check_gradients, Graph, Propagation};
use ad_tensor::{Shape, Tensor};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "ad_cli", version, about = "Reverse-mode autodiff demos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate and differentiate ln(x1) + x1*x2 - sin(x2)
    Scalar {
        #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
        x1: f64,
        #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
        x2: f64,
        /// Use depth-first per-edge propagation instead of a topological pass
        #[arg(long)]
        per_edge: bool,
    },
    /// Combine arange tensors with broadcasting add and mul
    Tensor {
        /// Seed for the random fill demo
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Scalar { x1, x2, per_edge } => {
            let propagation = if per_edge {
                Propagation::PerEdge
            } else {
                Propagation::Topological
            };
            run_scalar(x1, x2, propagation)
        }
        Command::Tensor { seed } => run_tensor(seed),
    }
}

fn run_scalar(x1_val: f64, x2_val: f64, propagation: Propagation) -> Result<(), Box<dyn Error>> {
    println!("=== Scalar graph ===\n");
    println!("Expression: v = ln(x1) + x1*x2 - sin(x2)");
    println!("At point:   x1 = {x1_val}, x2 = {x2_val}\n");

    let graph = Graph::new();
    let x1 = graph.constant(x1_val);
    let x2 = graph.constant(x2_val);

    let v1 = x1.try_log()? + x1 * x2;
    let v = v1 - x2.sin();

    println!("v  = {v}");
    let stats = v.backward_with(propagation);
    log::info!(
        "{propagation:?} backward over {} nodes: {} visits, {} edge contributions",
        graph.len(),
        stats.nodes_visited,
        stats.edges_propagated
    );
    println!("x1 = {x1}");
    println!("x2 = {x2}\n");

    println!(
        "{propagation:?} pass: {} node visits, {} edge contributions, {} nodes in graph\n",
        stats.nodes_visited,
        stats.edges_propagated,
        graph.len()
    );

    let check = check_gradients(
        |_, v| v[0].log() + v[0] * v[1] - v[1].sin(),
        &[x1_val, x2_val],
        1e-7,
    );

    println!("Finite difference gradients (eps=1e-7):");
    println!("  dv/dx1 = {:.10}", check.numeric[0]);
    println!("  dv/dx2 = {:.10}", check.numeric[1]);

    let max_err = check.max_error();
    log::info!("finite-difference check at {:?}: max error {max_err:e}", [x1_val, x2_val]);
    let tolerance = 1e-5;
    println!("  Max absolute error: {max_err:.2e}\n");

    if check.passes(tolerance) {
        println!("PASS: Max error ({max_err:.2e}) < tolerance ({tolerance:.2e})");
    } else {
        println!("FAIL: Max error ({max_err:.2e}) >= tolerance ({tolerance:.2e})");
        std::process::exit(1);
    }

    Ok(())
}

fn run_tensor(seed: u64) -> Result<(), Box<dyn Error>> {
    println!("=== Tensors ===\n");

    let t1 = Tensor::arange(0, 5)?;
    let t2 = Tensor::arange(1, 2)?;
    let t3 = Tensor::arange(5, 10)?;
    let t4 = t1.add(&t2)?;
    let t5 = t3.mul(&t4)?;

    println!("t1 = arange(0, 5)  {t1}");
    println!("t2 = arange(1, 2)  {t2}");
    println!("t3 = arange(5, 10) {t3}");
    println!("t4 = t1 + t2       {t4}  ({:?})", t4.op());
    println!("t5 = t3 * t4       {t5}  ({:?})\n", t5.op());

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Tensor::rand(&Shape::new(vec![2, 3])?, &mut rng);
    log::info!("random fill of shape {} from seed {seed}", noise.shape());
    let bias = Tensor::arange(0, 3)?;
    let shifted = noise.add(&bias)?;

    println!("noise (seed {seed}, shape {}):\n{noise}", noise.shape());
    println!("noise + arange(0, 3):\n{shifted}");

    Ok(())
}
