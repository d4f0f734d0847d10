//! Tools the workers delegate to.
//!
//! - [`path_block`]: pulls the `<FilePath>` block out of free text
//! - [`preprocess`]: uploads a document to the remote preprocessing service
//! - [`confirm`]: asks before a document is uploaded

pub mod confirm;
pub mod path_block;
pub mod preprocess;

pub use confirm::{AcceptAll, Confirmation, Confirmer, PromptConfirmer, process_confirmed};
pub use path_block::{FilePathList, extract_file_paths, format_file_paths};
pub use preprocess::{DocumentPreprocessingClient, PreprocessResult, Preprocessor};
