/*!
 * Concurrent batch dispatch.
 *
 * Batches run through a `buffer_unordered` stream so at most `concurrency`
 * of them are in flight. Results land in a slot per batch position, which
 * restores input order no matter which batch finishes first.
 */

use std::future::Future;

use futures::stream::{self, StreamExt};
use log::{debug, error};

use crate::errors::TranslationError;
use super::document::{Batch, TranslatedUnit};

/// Runs batches concurrently and reassembles their results in order
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    /// Maximum number of batches in flight
    concurrency: usize,
}

impl Dispatcher {
    /// Create a dispatcher; a concurrency of 0 or 1 runs batches one by one
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Effective concurrency
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Translate every batch with `translate_one`, returning the units of
    /// batch 0, then batch 1, and so on.
    ///
    /// The first batch-level error ends the call; batches still in flight
    /// are dropped.
    pub async fn dispatch<'a, F, Fut>(
        &self,
        batches: &'a [Batch],
        translate_one: F,
    ) -> Result<Vec<TranslatedUnit>, TranslationError>
    where
        F: Fn(&'a Batch) -> Fut,
        Fut: Future<Output = Result<Vec<TranslatedUnit>, TranslationError>>,
    {
        if batches.is_empty() {
            return Ok(Vec::new());
        }

        let mut in_flight = stream::iter(batches.iter().enumerate())
            .map(|(position, batch)| {
                let translation = translate_one(batch);
                async move { (position, translation.await) }
            })
            .buffer_unordered(self.concurrency);

        let mut slots: Vec<Option<Vec<TranslatedUnit>>> = (0..batches.len()).map(|_| None).collect();

        while let Some((position, result)) = in_flight.next().await {
            match result {
                Ok(units) => {
                    debug!("Batch {} resolved with {} units", position, units.len());
                    slots[position] = Some(units);
                }
                Err(e) => {
                    error!("Batch {} failed: {}", position, e);
                    return Err(e);
                }
            }
        }

        Ok(slots.into_iter().flatten().flatten().collect())
    }
}

/// Dispatch with a one-off dispatcher
pub async fn dispatch<'a, F, Fut>(
    batches: &'a [Batch],
    concurrency: usize,
    translate_one: F,
) -> Result<Vec<TranslatedUnit>, TranslationError>
where
    F: Fn(&'a Batch) -> Fut,
    Fut: Future<Output = Result<Vec<TranslatedUnit>, TranslationError>>,
{
    Dispatcher::new(concurrency).dispatch(batches, translate_one).await
}
