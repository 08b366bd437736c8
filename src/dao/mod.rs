/// Backend-neutral score records.
pub mod models;
/// Score storage backends and the trait they implement.
pub mod score_store;
/// Storage error types shared by every backend.
pub mod storage;
