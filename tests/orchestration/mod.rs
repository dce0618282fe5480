//! Task service behavior against the in-memory adapters

mod marks_test;
mod properties_test;
mod task_service_test;
