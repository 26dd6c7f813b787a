use crate::cache::{CachedResolution, ResumeCache};
use crate::error::Result;
use crate::platform::{Destination, Match, PlaylistTarget, Source, SourceItem};
use backon::{ConstantBuilder, Retryable};
use cliclack::{log, spinner};
use std::collections::HashSet;
use std::time::Duration;

const SEARCH_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const WRITE_DELAY: Duration = Duration::from_secs(2);

/// Batch sizes and sleeps applied to destination requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Items per write request
    pub batch_size: usize,
    /// Pause between two consecutive write batches
    pub write_delay: Duration,
    /// Total attempts per search, including the first one
    pub search_attempts: usize,
    /// Pause between two attempts of the same search
    pub retry_delay: Duration,
}

impl Pacing {
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            write_delay: WRITE_DELAY,
            search_attempts: SEARCH_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub source_playlist_id: String,
    pub target: PlaylistTarget,
    pub pacing: Pacing,
    /// Search and report, but write nothing
    pub dry_run: bool,
    /// Ignore cached search results for this source playlist
    pub fresh: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    /// `None` only in a dry run whose target playlist does not exist yet
    pub playlist_id: Option<String>,
    pub created_playlist: bool,
    pub listed: usize,
    /// Items without a usable search query
    pub skipped: usize,
    pub searched: usize,
    pub matched: usize,
    pub not_found: Vec<String>,
    pub failed_searches: Vec<String>,
    pub from_cache: bool,
    pub already_present: usize,
    /// Matches resolving to an identifier queued earlier in the same run
    pub duplicates: usize,
    /// Identifiers that were (or in a dry run would be) written
    pub queued: Vec<String>,
    pub added: usize,
    /// Batches with at least one item that could not be written
    pub failed_batches: usize,
    pub failed_items: Vec<String>,
}

/// Copy the items of a source playlist into a destination playlist.
///
/// Search failures and failed write batches are logged and counted in the
/// report. Only listing, playlist lookup/creation and cache I/O errors abort
/// the run.
pub async fn migrate<S, D>(
    source: &S,
    destination: &D,
    mut cache: Option<&mut ResumeCache>,
    plan: &MigrationPlan,
) -> Result<Report>
where
    S: Source + ?Sized,
    D: Destination + ?Sized,
{
    let mut report = Report::default();

    let sp = spinner();
    sp.start("Reading source playlist...");
    let items = match source.list_items(&plan.source_playlist_id).await {
        Ok(items) => items,
        Err(e) => {
            sp.error("Failed to read the source playlist");
            return Err(e);
        }
    };
    sp.stop(format!("Found {} items in the source playlist", items.len()));

    report.listed = items.len();
    if items.is_empty() {
        log::warning("The source playlist is empty, nothing to migrate")?;
        return Ok(report);
    }

    let (playlist_id, created) = resolve_playlist(destination, &plan.target, plan.dry_run).await?;
    report.playlist_id = playlist_id.clone();
    report.created_playlist = created;

    let cached = match cache.as_deref() {
        Some(cache) if !plan.fresh => cache.get(&plan.source_playlist_id).cloned(),
        _ => None,
    };

    let resolved = match cached {
        Some(entry) => {
            report.from_cache = true;
            log::info(format!(
                "Using {} search results cached by a previous run",
                entry.ids.len()
            ))?;

            let mut ids = entry.ids;
            if !entry.failed_queries.is_empty() {
                log::info(format!(
                    "Searching again for {} queries that failed last time",
                    entry.failed_queries.len()
                ))?;
                ids.extend(
                    resolve_queries(destination, &entry.failed_queries, &plan.pacing, &mut report)
                        .await?,
                );
            }
            ids
        }
        None => resolve_items(destination, &items, &plan.pacing, &mut report).await?,
    };

    if !plan.dry_run {
        if let Some(cache) = cache.as_deref_mut() {
            cache.insert(
                &plan.source_playlist_id,
                CachedResolution {
                    ids: resolved.clone(),
                    failed_queries: report.failed_searches.clone(),
                },
            )?;
        }
    }

    // A playlist created by this run starts out empty
    let existing: HashSet<String> = match &playlist_id {
        Some(id) if !created && !resolved.is_empty() => destination
            .playlist_item_ids(id)
            .await?
            .into_iter()
            .collect(),
        _ => HashSet::new(),
    };

    report.queued = dedup(resolved, &existing, &mut report);

    if report.already_present > 0 {
        log::info(format!(
            "Skipping {} items already in the playlist",
            report.already_present
        ))?;
    }

    if plan.dry_run {
        log::info(format!("Would add {} items:", report.queued.len()))?;
        for id in &report.queued {
            log::info(format!("  - {}", id))?;
        }
        return Ok(report);
    }

    let playlist_id = playlist_id.ok_or("Destination playlist is missing")?;

    write_batches(destination, &playlist_id, &plan.pacing, &mut report).await?;

    if report.failed_batches == 0 && report.failed_searches.is_empty() {
        if let Some(cache) = cache.as_deref_mut() {
            cache.remove(&plan.source_playlist_id)?;
        }
    } else if cache.is_some() {
        log::warning(
            "Some searches or batches failed; results stay cached, run the command again to retry",
        )?;
    }

    Ok(report)
}

/// Returns the playlist ID and whether this run created it.
async fn resolve_playlist<D>(
    destination: &D,
    target: &PlaylistTarget,
    dry_run: bool,
) -> Result<(Option<String>, bool)>
where
    D: Destination + ?Sized,
{
    match target {
        PlaylistTarget::Existing(id) => Ok((Some(id.clone()), false)),
        PlaylistTarget::Named { name, description } => {
            if let Some(id) = destination.find_playlist(name).await? {
                log::info(format!("Using existing playlist '{}'", name))?;
                return Ok((Some(id), false));
            }

            if dry_run {
                log::info(format!("Would create playlist '{}'", name))?;
                return Ok((None, false));
            }

            let id = destination.create_playlist(name, description).await?;
            log::success(format!("Created playlist '{}'", name))?;

            Ok((Some(id), true))
        }
    }
}

/// Search the destination for every item, in order.
async fn resolve_items<D>(
    destination: &D,
    items: &[SourceItem],
    pacing: &Pacing,
    report: &mut Report,
) -> Result<Vec<String>>
where
    D: Destination + ?Sized,
{
    let mut queries = Vec::new();

    for item in items {
        match item.query() {
            Some(query) => queries.push(query),
            None => {
                report.skipped += 1;
                log::warning(format!("Skipping '{}': no searchable title", item.title()))?;
            }
        }
    }

    resolve_queries(destination, &queries, pacing, report).await
}

async fn resolve_queries<D>(
    destination: &D,
    queries: &[String],
    pacing: &Pacing,
    report: &mut Report,
) -> Result<Vec<String>>
where
    D: Destination + ?Sized,
{
    let mut ids = Vec::new();

    for (index, query) in queries.iter().enumerate() {
        log::step(format!(
            "[{}/{}] Searching for: {}",
            index + 1,
            queries.len(),
            query
        ))?;
        report.searched += 1;

        match search_with_retry(destination, query, pacing).await {
            Ok(Some(hit)) => {
                log::info(format!("Found: {} → {}", query, hit.label))?;
                report.matched += 1;
                ids.push(hit.id);
            }
            Ok(None) => {
                log::warning(format!("Not found: {}", query))?;
                report.not_found.push(query.clone());
            }
            Err(e) => {
                log::error(format!(
                    "Search for '{}' failed after {} attempts: {}",
                    query, pacing.search_attempts, e
                ))?;
                report.failed_searches.push(query.clone());
            }
        }
    }

    Ok(ids)
}

async fn search_with_retry<D>(destination: &D, query: &str, pacing: &Pacing) -> Result<Option<Match>>
where
    D: Destination + ?Sized,
{
    let backoff = ConstantBuilder::default()
        .with_delay(pacing.retry_delay)
        .with_max_times(pacing.search_attempts.saturating_sub(1));

    (|| destination.search(query))
        .retry(backoff)
        .notify(|err, delay: Duration| {
            let _ = log::warning(format!(
                "Search for '{}' failed ({}), retrying in {}s",
                query,
                err,
                delay.as_secs()
            ));
        })
        .await
}

/// Keep identifiers that are neither in the playlist nor queued already.
fn dedup(resolved: Vec<String>, existing: &HashSet<String>, report: &mut Report) -> Vec<String> {
    let mut queued = HashSet::new();
    let mut to_add = Vec::new();

    for id in resolved {
        if existing.contains(&id) {
            report.already_present += 1;
        } else if !queued.insert(id.clone()) {
            report.duplicates += 1;
        } else {
            to_add.push(id);
        }
    }

    to_add
}

async fn write_batches<D>(
    destination: &D,
    playlist_id: &str,
    pacing: &Pacing,
    report: &mut Report,
) -> Result<()>
where
    D: Destination + ?Sized,
{
    let batch_size = pacing.batch_size.max(1);
    let batch_count = report.queued.len().div_ceil(batch_size);

    for (index, batch) in report.queued.chunks(batch_size).enumerate() {
        if index > 0 {
            tokio::time::sleep(pacing.write_delay).await;
        }

        log::step(format!(
            "Adding batch {}/{} ({} items) to the playlist...",
            index + 1,
            batch_count,
            batch.len()
        ))?;

        match destination.add_items(playlist_id, batch).await {
            Ok(rejected) if rejected.is_empty() => report.added += batch.len(),
            Ok(rejected) => {
                report.added += batch.len().saturating_sub(rejected.len());
                report.failed_batches += 1;
                log::warning(format!(
                    "Batch {}: {} of {} items were not added",
                    index + 1,
                    rejected.len(),
                    batch.len()
                ))?;
                report.failed_items.extend(rejected);
            }
            Err(e) => {
                report.failed_items.extend_from_slice(batch);
                report.failed_batches += 1;
                log::error(format!("Failed to add batch {}: {}", index + 1, e))?;
            }
        }
    }

    Ok(())
}
