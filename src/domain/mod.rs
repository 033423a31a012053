//! Domain models
//!
//! Plain data describing the EnigmaDuel contract state, independent of
//! how it is fetched.

pub mod duel;
