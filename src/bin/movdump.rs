use clap::{ArgAction, Parser};
use movrate::{atom, decode_atom, find_top_level, summarize, AtomSummary};
use std::fs::File;

#[derive(Parser, Debug)]
#[command(version, about = "Print the moov atom tree of a QuickTime/MOV file")]
struct Args {
    /// Movie file to inspect
    file: String,

    /// Emit JSON instead of a text tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut f = File::open(&args.file)?;

    let moov = find_top_level(&mut f, atom::MOOV)?;
    let tree = decode_atom(&moov.data)?;
    let summary = summarize(&tree);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{:>10} moov (container, offset {:#x})",
        moov.data.len(),
        moov.offset
    );
    for s in &summary {
        print_atom(s, 1);
    }
    Ok(())
}

fn print_atom(s: &AtomSummary, depth: usize) {
    let indent = "  ".repeat(depth);
    match &s.children {
        Some(kids) => {
            println!("{indent}{:>10} {}[{}] (container)", s.size, s.typ, s.index);
            for c in kids {
                print_atom(c, depth + 1);
            }
        }
        None => println!("{indent}{:>10} {}[{}]", s.size, s.typ, s.index),
    }
}
