//! Off-chain search for a mine message that satisfies the collection threshold

use crate::giver::error::GiverError;
use crate::giver::messages::{self, MineParams};
use crate::giver::mining::hash_to_uint;
use crate::tvm::Cell;
use num_bigint::BigUint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// A mine message whose hash exceeds the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub params: MineParams,
    pub body: Arc<Cell>,
    pub hash: BigUint,
}

/// Tries `data1 = start, start + stride, ...` for at most `attempts` values
fn search(
    template: &MineParams,
    complexity: &BigUint,
    start: BigUint,
    stride: u64,
    attempts: u64,
    stop: Option<&AtomicBool>,
    counter: Option<&AtomicU64>,
) -> Result<Option<Solution>, GiverError> {
    let mut params = template.clone();
    params.data1 = start;

    for _ in 0..attempts {
        if stop.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Ok(None);
        }

        let body = messages::mine(&params)?;
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let hash = hash_to_uint(&body.hash());
        if hash > *complexity {
            return Ok(Some(Solution { params, body, hash }));
        }
        params.data1 += stride;
    }

    Ok(None)
}

/// Sequentially searches for a solution, starting from `template.data1`
///
/// When `template.data2` is `None` it keeps following `data1`.
pub fn find_solution(
    template: &MineParams,
    complexity: &BigUint,
    max_attempts: u64,
) -> Result<Option<Solution>, GiverError> {
    search(
        template,
        complexity,
        template.data1.clone(),
        1,
        max_attempts,
        None,
        None,
    )
}

/// Searches on `workers` blocking tasks with interleaved nonces
///
/// Worker `i` tries `data1 = start + i, start + i + workers, ...`. The first
/// solution found stops every other worker. A failing worker stops them too,
/// and its error is returned once all workers have finished.
pub async fn mine_parallel(
    template: MineParams,
    complexity: BigUint,
    workers: usize,
    max_attempts_per_worker: u64,
) -> Result<Option<Solution>, GiverError> {
    let workers = workers.max(1);
    let template = Arc::new(template);
    let complexity = Arc::new(complexity);
    let stop = Arc::new(AtomicBool::new(false));
    let hashed = Arc::new(AtomicU64::new(0));
    let started = Instant::now();

    log::info!(
        "Mining with {} workers against complexity {:x}",
        workers,
        complexity.as_ref()
    );

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let template = template.clone();
            let complexity = complexity.clone();
            let stop = stop.clone();
            let hashed = hashed.clone();
            tokio::task::spawn_blocking(move || {
                let start = &template.data1 + BigUint::from(worker);
                let result = search(
                    &template,
                    &complexity,
                    start,
                    workers as u64,
                    max_attempts_per_worker,
                    Some(&stop),
                    Some(&hashed),
                );
                // A solution or an error ends the whole search
                if !matches!(result, Ok(None)) {
                    stop.store(true, Ordering::Relaxed);
                }
                result
            })
        })
        .collect();

    let mut solution = None;
    let mut failure = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(Some(found))) => {
                solution.get_or_insert(found);
            }
            Ok(Ok(None)) => {}
            Ok(Err(err)) => {
                stop.store(true, Ordering::Relaxed);
                failure.get_or_insert(err);
            }
            Err(err) => {
                stop.store(true, Ordering::Relaxed);
                failure.get_or_insert(GiverError::from(err));
            }
        }
    }
    if let Some(err) = failure {
        log::error!("Mining failed: {}", err);
        return Err(err);
    }

    let elapsed = started.elapsed();
    let total = hashed.load(Ordering::Relaxed);
    match &solution {
        Some(found) => log::info!(
            "Found solution data1={} after {} hashes in {:.2?}",
            found.params.data1,
            total,
            elapsed
        ),
        None => log::warn!("No solution after {} hashes in {:.2?}", total, elapsed),
    }

    Ok(solution)
}
