//! Client-side support: prediction of the local avatar and a view of the
//! match built from server messages

pub mod prediction;
pub mod view;

pub use prediction::{Correction, LocalAvatar, Predictor};
pub use view::ClientView;
