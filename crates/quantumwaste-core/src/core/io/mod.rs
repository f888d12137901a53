//! Provides persistence for trained model artifacts.
//!
//! Artifacts are `bincode`-encoded values prefixed with a small header naming the artifact
//! kind and its format version, so a scaler file can never be decoded as a forest or an
//! artifact written by an incompatible build silently misread.

pub mod artifact;
