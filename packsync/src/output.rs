use std::time::Duration;

use console::style;
use packsync_core::api::RemoteSample;
use packsync_core::pack::{CoverImage, PackMetadata};
use packsync_core::reconcile::ReconcilePlan;
use packsync_core::sample::{Provenance, SampleRecord};
use packsync_core::snapshot::LoadedPack;
use packsync_core::submit::{SubmitObserver, SubmitReceipt, SubmitState};

pub fn print_metadata(metadata: &PackMetadata) {
    println!("  {} {}", style("Title:").bold(), metadata.title);
    if !metadata.description.is_empty() {
        println!("  {} {}", style("Description:").bold(), metadata.description);
    }
    println!(
        "  {} {}.{:02}",
        style("Price:").bold(),
        metadata.price_cents / 100,
        metadata.price_cents % 100
    );
    if !metadata.genres.is_empty() {
        println!("  {} {}", style("Genres:").bold(), metadata.genres.join(", "));
    }
    if !metadata.tags.is_empty() {
        println!("  {} {}", style("Tags:").bold(), metadata.tags.join(", "));
    }
    match &metadata.cover {
        CoverImage::None => {}
        CoverImage::Remote { url } => println!("  {} {}", style("Cover:").bold(), url),
        CoverImage::Replace { file } => {
            println!("  {} {} (new)", style("Cover:").bold(), file.path().display())
        }
    }
}

pub fn print_pack(loaded: &LoadedPack) {
    println!("{} {}", style("Pack").cyan().bold(), loaded.snapshot.pack_id());
    print_metadata(loaded.snapshot.metadata());
    println!();
    println!("  {} sample(s)", loaded.records.len());
    for record in &loaded.records {
        print_row(record);
    }
}

pub fn print_row(record: &SampleRecord) {
    let origin = match record.provenance() {
        Provenance::NewUpload => style("upload ").green(),
        Provenance::LibraryAddition => style("library").yellow(),
        Provenance::PackOriginal => style("pack   ").dim(),
    };
    let id = record
        .remote_id()
        .map(|id| id.to_string())
        .or_else(|| record.source_file().map(|f| f.file_name().to_string()))
        .unwrap_or_default();
    let metadata = record.metadata();
    let bpm = metadata.bpm.map(|b| format!("{} bpm", b)).unwrap_or_default();
    println!("    {}  {:<24} {:<32} {}", origin, id, metadata.name, bpm);
}

pub fn print_library(samples: &[RemoteSample]) {
    println!("{} {} sample(s)", style("Library").cyan().bold(), samples.len());
    for sample in samples {
        let bpm = sample.metadata.bpm.map(|b| format!("{} bpm", b)).unwrap_or_default();
        println!("    {:<24} {:<32} {}", sample.id.as_str(), sample.metadata.name, bpm);
    }
}

pub fn print_plan(plan: &ReconcilePlan) {
    println!("{}", style("Planned changes").cyan().bold());
    if plan.is_empty() {
        println!("  no sample changes; pack details will be updated");
        return;
    }
    for id in &plan.removals {
        println!("  {} {}", style("unbind").red(), id);
    }
    for id in &plan.library_attach {
        println!("  {} {}", style("attach").yellow(), id);
    }
    for upload in &plan.new_uploads {
        println!("  {} {}", style("upload").green(), upload.file.path().display());
    }
}

pub fn print_receipt(receipt: &SubmitReceipt) {
    let count = receipt
        .pack
        .sample_count
        .map(|n| format!(" ({} samples)", n))
        .unwrap_or_default();
    println!(
        "{} pack {}{}",
        style("Saved").green().bold(),
        receipt.pack.id,
        count
    );
}

/// Reports submission progress on stderr.
pub struct ConsoleObserver;

impl SubmitObserver for ConsoleObserver {
    fn state_changed(&self, state: &SubmitState) {
        match state {
            SubmitState::Unbinding { step, total } => {
                eprintln!("  removing sample {}/{}", step, total)
            }
            SubmitState::Submitting => eprintln!("  sending pack..."),
            _ => {}
        }
    }

    fn progress(&self, percent: u8) {
        eprint!("\r  uploading {:>3}%", percent);
        if percent == 100 {
            eprintln!();
        }
    }

    fn auth_expired(&self, delay: Duration) {
        eprintln!(
            "{} Redirecting to sign-in in {}s...",
            style("Session expired.").red().bold(),
            delay.as_secs()
        );
    }
}
