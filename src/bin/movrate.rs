use clap::Parser;
use movrate::{retime_file, DurationPolicy, PatchOutcome, Retime, TrackSelect};

#[derive(Parser, Debug)]
#[command(version, about = "Change the frame rate of a QuickTime/MOV file without re-encoding")]
struct Args {
    /// Movie file to patch in place
    file: String,

    /// Target frame rate in frames per second
    fps: f64,

    /// Track index to patch (repeatable); default is every track
    #[arg(long = "track")]
    tracks: Vec<usize>,

    /// Leave duration fields at their raw values instead of rescaling
    /// them to preserve wall-clock length
    #[arg(long)]
    keep_duration: bool,

    /// Validate and report, but write nothing back
    #[arg(long)]
    dry_run: bool,

    /// Emit the retime report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let retime = Retime::new(args.fps)
        .duration_policy(duration_policy(args.keep_duration))
        .tracks(track_select(&args.tracks));

    let outcome = retime_file(&args.file, &retime, args.dry_run)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        print_human(&outcome);
    }
    Ok(())
}

fn duration_policy(keep: bool) -> DurationPolicy {
    if keep {
        DurationPolicy::Keep
    } else {
        DurationPolicy::Rescale
    }
}

fn track_select(indices: &[usize]) -> TrackSelect {
    if indices.is_empty() {
        TrackSelect::All
    } else {
        TrackSelect::Indices(indices.to_vec())
    }
}

fn print_human(outcome: &PatchOutcome) {
    let r = &outcome.report;
    println!(
        "moov: {} bytes at offset {:#x}",
        outcome.moov_len, outcome.moov_offset
    );
    println!(
        "movie: timescale {} -> {}, duration {} -> {}",
        r.movie.old_timescale, r.movie.new_timescale, r.movie.old_duration, r.movie.new_duration
    );

    for t in &r.tracks {
        print!(
            "track {}: timescale {} -> {}, duration {} -> {}",
            t.track,
            t.media.old_timescale,
            t.media.new_timescale,
            t.media.old_duration,
            t.media.new_duration
        );
        if let (Some(old), Some(new)) = (t.old_sample_duration, t.new_sample_duration) {
            print!(", sample duration {} -> {}", old, new);
            if let Some(n) = t.sample_count {
                print!(" ({} samples)", n);
            }
        }
        println!();
    }

    if outcome.written {
        println!("wrote {} bytes back in place", outcome.moov_len);
    } else {
        println!("dry run: nothing written");
    }
}
