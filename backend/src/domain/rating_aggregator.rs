//! Mean-rating maintenance.
//!
//! After a review is written the review path calls
//! [`RatingRecompute::schedule_recompute`]; the job runner later calls
//! [`RatingRecompute::recompute`], which overwrites the stored mean.
//! Concurrent recomputes are last-writer-wins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::booking_service_support::{
    map_event_repository_error, map_review_repository_error,
};
use crate::domain::ports::{
    BackgroundJob, EventRepository, JobDispatchError, JobDispatcher, RatingRecompute,
    ReviewRepository,
};
use crate::domain::{Error, EventId, average_rating};

/// Service implementing [`RatingRecompute`].
#[derive(Clone)]
pub struct RatingAggregator<R, E, J> {
    reviews: Arc<R>,
    events: Arc<E>,
    jobs: Arc<J>,
}

impl<R, E, J> RatingAggregator<R, E, J> {
    /// Wire the aggregator to its ports.
    #[must_use]
    pub const fn new(reviews: Arc<R>, events: Arc<E>, jobs: Arc<J>) -> Self {
        Self {
            reviews,
            events,
            jobs,
        }
    }
}

#[async_trait]
impl<R, E, J> RatingRecompute for RatingAggregator<R, E, J>
where
    R: ReviewRepository,
    E: EventRepository,
    J: JobDispatcher,
{
    async fn recompute(&self, event_id: EventId) -> Result<f64, Error> {
        let ratings = self
            .reviews
            .list_ratings(&event_id)
            .await
            .map_err(map_review_repository_error)?;
        let average = average_rating(&ratings);
        self.events
            .update_average_rating(&event_id, average)
            .await
            .map_err(map_event_repository_error)?;
        info!(%event_id, reviews = ratings.len(), average, "average rating recomputed");
        Ok(average)
    }

    fn schedule_recompute(&self, event_id: EventId) -> Result<(), Error> {
        self.jobs
            .dispatch(BackgroundJob::RecomputeRating { event_id })
            .map_err(|err| match err {
                JobDispatchError::Unavailable { message } => {
                    Error::service_unavailable(format!("job runner unavailable: {message}"))
                }
                JobDispatchError::Rejected { message } => {
                    Error::service_unavailable(format!("job runner rejected recompute: {message}"))
                }
            })
    }
}
