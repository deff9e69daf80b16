//! MediGenie Core Library
//!
//! Upload validation, the chat session with the hosted model, and the
//! submission flow that turns one image into one rendered outcome.

pub mod chat;
pub mod config;
pub mod error;
pub mod gemini;
pub mod media;
pub mod submission;

pub use chat::{ChatSession, GenerativeModel};
pub use config::Settings;
pub use error::{MediError, MediResult, ServiceError};
pub use gemini::GeminiClient;
pub use media::{ImageFormat, UploadedImage};
pub use submission::{AnalysisResult, Outcome, SubmissionHandler, Upload};
