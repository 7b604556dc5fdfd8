// src/lib.rs

//! Nara Prefecture Bulletin Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod services;
pub mod storage;
pub mod utils;
