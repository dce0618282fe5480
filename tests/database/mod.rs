//! PostgreSQL store tests
//!
//! Need `DATABASE_URL`; compiled only with `--features test-services`.

#[cfg(feature = "test-services")]
mod pg_task_store_test;
