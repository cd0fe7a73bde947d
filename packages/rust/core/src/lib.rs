//! Corpus building and reading for parcorpus.
//!
//! This crate walks a raw data tree of two-line example files, aggregates
//! them into an aligned machine/English corpus pair (`build`), and loads
//! such a pair back as tokenised aligned sentences, which an IBM Model 1
//! translator can be trained and evaluated on.

pub mod builder;
pub mod corpus;
pub mod example;
pub mod ibm1;
pub mod reader;
pub mod scan;
