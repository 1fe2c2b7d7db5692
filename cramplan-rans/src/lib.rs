//! # cramplan-rans
//!
//! From-scratch byte-wise rANS entropy coders for the CRAM compression
//! header planner's compressor probe:
//!
//! - [`rans_core`]: the shared 32-bit-state, byte-renormalized rANS
//!   primitives both orders build on.
//! - [`order0`]: context-independent modeling ([`Rans0`]).
//! - [`order1`]: modeling conditioned on the previous byte ([`Rans1`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod order0;
pub mod order1;
pub mod rans_core;

pub use order0::Rans0;
pub use order1::Rans1;
