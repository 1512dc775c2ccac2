// src/models/mod.rs

pub mod assessment;
pub mod question;
pub mod quiz;
pub mod result;
