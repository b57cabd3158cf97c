//! Vision module - picked-image handling and on-device classification
//!
//! Model inference is delegated to `tract-onnx`; this crate only prepares
//! pixels for it and turns raw scores into ranked observations.

pub mod classifier;
pub mod labels;
pub mod onnx;
pub mod orientation;
pub mod picked;
pub mod preprocess;
pub mod request;

pub use classifier::{rank_scores, softmax, ImageClassifier};
pub use labels::{load_labels, parse_labels};
pub use onnx::{OnnxClassifier, OnnxModelSpec};
pub use orientation::apply_orientation;
pub use picked::PickedImage;
pub use preprocess::{crop_and_scale, to_nchw, CropAndScale};
pub use request::{ClassificationRequest, RequestHandler};
