use tracing::{debug, warn};

use crate::errors::{SearchError, SearchResult};
use crate::results::{FinalResult, KeywordSet, PartialResult};

#[derive(Debug)]
enum Slot {
    Pending,
    Done(PartialResult),
    Failed(SearchError),
}

/// Collects partial results by worker id and merges them in id order.
///
/// Workers may finish in any order; `finish` always yields slice 0's files
/// before slice 1's, and so on, so two runs over the same file list print the
/// same report.
#[derive(Debug)]
pub struct ResultMerger {
    keywords: KeywordSet,
    slots: Vec<Slot>,
}

impl ResultMerger {
    pub fn new(keywords: KeywordSet, workers: usize) -> Self {
        Self {
            keywords,
            slots: (0..workers).map(|_| Slot::Pending).collect(),
        }
    }

    fn pending_slot(&mut self, worker: usize) -> SearchResult<&mut Slot> {
        let workers = self.slots.len();
        match self.slots.get_mut(worker) {
            Some(slot) if matches!(slot, Slot::Pending) => Ok(slot),
            Some(_) => Err(SearchError::worker_failed(
                worker,
                "reported more than once",
            )),
            None => Err(SearchError::worker_failed(
                worker,
                format!("worker id out of range for {} workers", workers),
            )),
        }
    }

    /// Stores the partial result of one worker
    pub fn submit(&mut self, worker: usize, partial: PartialResult) -> SearchResult<()> {
        let slot = self.pending_slot(worker)?;
        debug!(
            "Worker {} submitted {} hits",
            worker,
            partial.hits.iter().map(|h| h.files.len()).sum::<usize>()
        );
        *slot = Slot::Done(partial);
        Ok(())
    }

    /// Records that a worker terminated abnormally
    pub fn fail(&mut self, worker: usize, error: SearchError) -> SearchResult<()> {
        let slot = self.pending_slot(worker)?;
        warn!("{}", error);
        *slot = Slot::Failed(error);
        Ok(())
    }

    /// Number of workers that have reported so far
    pub fn reported(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !matches!(s, Slot::Pending))
            .count()
    }

    /// Concatenates all partials in worker order.
    ///
    /// The first failed or silent worker, by id, fails the whole merge.
    pub fn finish(self) -> SearchResult<FinalResult> {
        let mut result = FinalResult::new(&self.keywords);
        for (worker, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Slot::Done(partial) => result
                    .extend(partial)
                    .map_err(|reason| SearchError::worker_failed(worker, reason))?,
                Slot::Failed(error) => return Err(error),
                Slot::Pending => {
                    return Err(SearchError::worker_failed(worker, "no result received"))
                }
            }
        }
        Ok(result)
    }
}
