//! Minerva - command-line runner for query plans.
//!
//! Usage:
//!   minerva --plan query.sse --data data.nt
//!   minerva --plan query.sse --data data.nt --named g1=extra.nt --output json
//!   minerva --plan query.sse --data data.nt --no-optimize

use clap::Parser;
use minerva::algebra::builder::build_plan;
use minerva::algebra::executor::{ExecContext, QueryResult};
use minerva::parsing::reader::read_form;
use minerva::store::{Dataset, MemoryDataset};
use std::fs;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "minerva")]
#[command(about = "Execute a query plan against an RDF dataset")]
struct Args {
    /// Plan file in S-expression syntax
    #[arg(short, long)]
    plan: String,

    /// N-Triples file loaded into the default graph
    #[arg(short, long)]
    data: Option<String>,

    /// Named graph as name=file (repeatable)
    #[arg(short, long)]
    named: Vec<String>,

    /// Skip the optimizer pass
    #[arg(long)]
    no_optimize: bool,

    /// Output format: sse or json
    #[arg(short, long, default_value = "sse")]
    output: String,
}

fn run(args: &Args) -> minerva::Result<()> {
    let text = fs::read_to_string(&args.plan)?;
    let mut plan = build_plan(&read_form(&text)?)?;
    if !args.no_optimize {
        plan = plan.optimize();
    }

    let mut dataset = MemoryDataset::new();
    if let Some(path) = &args.data {
        dataset.load(path, None)?;
    }
    for pair in &args.named {
        let Some((name, path)) = pair.split_once('=') else {
            return Err(minerva::Error::Argument(format!(
                "expected name=file, got {:?}",
                pair
            )));
        };
        dataset.load(path, Some(name))?;
    }

    let start = Instant::now();
    let result = plan.execute(&mut dataset, &ExecContext::new())?;
    let elapsed = start.elapsed();

    match result {
        QueryResult::Solutions(solutions) => {
            if args.output == "json" {
                println!("{}", to_json(&solutions)?);
            } else {
                for mapping in &solutions {
                    println!("{}", mapping);
                }
            }
            println!("{} solutions", solutions.len());
        }
        QueryResult::Graph(graph) => {
            if args.output == "json" {
                println!("{}", to_json(&graph)?);
            } else {
                for triple in graph.iter() {
                    println!("{}", triple);
                }
            }
            println!("{} triples", graph.len());
        }
    }
    println!("Executed in {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> minerva::Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| minerva::Error::Parse(format!("json output: {}", err)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run(&Args::parse())?;
    Ok(())
}
