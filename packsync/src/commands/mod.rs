use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use packsync_core::api::PackApi;
use packsync_core::form::PackForm;
use packsync_core::pack::{CoverImage, PackId};
use packsync_core::preview::PreviewStore;
use packsync_core::sample::{SampleFile, SampleId};
use packsync_core::snapshot::SnapshotLoader;
use packsync_core::submit::{FailureKind, LOGIN_REDIRECT_DELAY, Submission};
use tracing::{info, warn};

use crate::AppContext;
use crate::cli::{CreateArgs, EditArgs, MetadataArgs, ResumeArgs, SampleArgs, ShowArgs};
use crate::output::{self, ConsoleObserver};

// --- Handler Functions ---

pub async fn handle_show(args: ShowArgs, cx: &AppContext) -> Result<()> {
    let loaded = SnapshotLoader::new(&cx.client)
        .load(&PackId::new(args.pack_id))
        .await?;
    output::print_pack(&loaded);
    Ok(())
}

pub async fn handle_library(cx: &AppContext) -> Result<()> {
    let samples = cx.client.fetch_library().await.context("Failed to list library")?;
    output::print_library(&samples);
    Ok(())
}

pub async fn handle_edit(args: EditArgs, cx: &AppContext) -> Result<()> {
    let loaded = SnapshotLoader::new(&cx.client)
        .load(&PackId::new(args.pack_id))
        .await?;
    let mut form = PackForm::for_pack(loaded, cx.previews());

    if let Some(title) = args.title {
        form.set_title(title);
    }
    apply_metadata(&mut form, args.metadata);

    for sample_id in &args.remove {
        let Some(local_id) = form
            .row_for_remote(&SampleId::from(sample_id.as_str()))
            .map(|row| row.local_id().clone())
        else {
            bail!("Sample '{}' is not part of this pack", sample_id);
        };
        form.remove_row(&local_id);
    }

    apply_samples(&mut form, &args.samples, cx).await?;
    finish(form, args.samples, cx).await
}

pub async fn handle_create(args: CreateArgs, cx: &AppContext) -> Result<()> {
    let mut form = PackForm::new(cx.previews());
    form.set_title(args.title);
    apply_metadata(&mut form, args.metadata);

    apply_samples(&mut form, &args.samples, cx).await?;
    finish(form, args.samples, cx).await
}

pub async fn handle_resume(args: ResumeArgs, cx: &AppContext) -> Result<()> {
    let form = PackForm::load_draft(&args.draft, cx.previews())
        .await
        .with_context(|| format!("Failed to restore draft {}", args.draft.display()))?;
    info!(rows = form.len(), "Draft restored");

    let samples = SampleArgs {
        dry_run: args.dry_run,
        ..Default::default()
    };
    finish(form, samples, cx).await
}

// --- Helpers ---

fn apply_metadata(form: &mut PackForm, args: MetadataArgs) {
    if let Some(description) = args.description {
        form.set_description(description);
    }
    if let Some(price_cents) = args.price_cents {
        form.set_price_cents(price_cents);
    }
    if !args.genres.is_empty() {
        form.set_genres(&args.genres);
    }
    if !args.tags.is_empty() {
        form.set_tags(&args.tags);
    }
    if let Some(cover) = args.cover {
        form.set_cover(CoverImage::Replace {
            file: SampleFile::new(cover),
        });
    }
}

async fn apply_samples(form: &mut PackForm, args: &SampleArgs, cx: &AppContext) -> Result<()> {
    if !args.add.is_empty() {
        let mut library: HashMap<SampleId, _> = cx
            .client
            .fetch_library()
            .await
            .context("Failed to list library")?
            .into_iter()
            .map(|sample| (sample.id.clone(), sample))
            .collect();

        let mut picks = Vec::with_capacity(args.add.len());
        for id in &args.add {
            match library.remove(&SampleId::from(id.as_str())) {
                Some(sample) => picks.push(sample),
                None => bail!("Sample '{}' is not in your library", id),
            }
        }
        let report = form.add_library_samples(picks);
        for duplicate in report.duplicates {
            warn!(sample_id = %duplicate, "Sample is already in the pack, skipping");
        }
    }

    for path in &args.upload {
        if !path.is_file() {
            bail!("Not a file: {}", path.display());
        }
    }
    form.add_uploaded_files(args.upload.iter().cloned().map(SampleFile::new));
    Ok(())
}

/// Saves, previews or submits the form, depending on the flags.
async fn finish(mut form: PackForm, args: SampleArgs, cx: &AppContext) -> Result<()> {
    if let Some(path) = args.save_draft {
        form.save_draft(&path)
            .await
            .with_context(|| format!("Failed to save draft {}", path.display()))?;
        println!("Draft saved to {}", path.display());
        return Ok(());
    }

    output::print_plan(&form.plan());
    if args.dry_run {
        return Ok(());
    }

    let mut submission = Submission::with_observer(&cx.client, Arc::new(ConsoleObserver));
    match submission.submit(&mut form).await {
        Ok(receipt) => {
            output::print_receipt(&receipt);
            Ok(())
        }
        Err(failure) => {
            if failure.kind == FailureKind::Authentication {
                tokio::time::sleep(LOGIN_REDIRECT_DELAY).await;
                eprintln!("Sign in at {}", cx.login_url());
            }
            Err(failure.into())
        }
    }
}

impl AppContext {
    fn previews(&self) -> Arc<dyn PreviewStore> {
        self.previews.clone()
    }
}
