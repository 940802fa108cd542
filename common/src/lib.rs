//! Survey AI Common Library
//!
//! CLIとバックエンド連携で共有される型・セッション状態・表示ロジック

pub mod types;
pub mod error;
pub mod location;
pub mod loading;
pub mod parser;
pub mod prompts;
pub mod session;
pub mod upload;
pub mod view;

pub use types::{AnalysisResult, Confidences, Coordinates, ImageSource, SelectedImage, UploadResponse, MAX_IMAGES};
pub use error::{Error, Result, SessionError};
pub use location::{PositionError, PositionOptions};
pub use loading::{LoadingState, LoadingTick, LOADING_MESSAGES};
pub use parser::{extract_generated_text, parse_generated_body};
pub use prompts::{build_description_prompt, build_summary_prompt};
pub use session::{ServerStatus, Session, NO_RESULTS_TO_SUMMARIZE};
pub use upload::{build_upload_form, UploadField, UploadForm};
