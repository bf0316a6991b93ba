//! Projection model: team efficiency blend, player form and the
//! probability engine that prices lines against both.

pub mod form;
pub mod montecarlo;
pub mod projection;

pub use montecarlo::{norm_cdf, prob_over_normal, Simulator};
pub use projection::{project_game, Projection};
