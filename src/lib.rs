//! Analysis of basic block vector (BBV) profiles.
//!
//! A BBV profile describes each fixed-length interval of a program's execution as a frequency
//! distribution over the basic blocks executed in that interval. This crate supports two
//! workflows over a parsed [`bbv::VectorSet`]:
//!
//! * Pairwise dissimilarity between all intervals ([`distance`]), rendered as a heatmap
//!   ([`heatmap`]).
//! * Simpoint selection ([`simpoint`]): intervals are randomly projected into a low dimensional
//!   space ([`projection`]), clustered with k-means ([`kmeans`]), and the interval nearest each
//!   cluster centroid is chosen to represent the cluster, weighted by the cluster's share of all
//!   intervals. Results are written as flat text files ([`output`]).

pub mod bbv;
pub mod dense;
pub mod distance;
mod error;
pub mod heatmap;
pub mod input;
pub mod kmeans;
pub mod output;
pub mod projection;
pub mod simpoint;

pub use error::{Error, Result};
