// src/core/mod.rs
//
// The assessment core: pure selection, answer-tracking, grading and
// countdown logic. Nothing in here touches the database or the router.

pub mod answers;
pub mod grader;
pub mod selector;
pub mod timer;
