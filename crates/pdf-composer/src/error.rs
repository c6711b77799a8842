use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Invalid background document: {0}")]
    InvalidBackground(String),

    #[error("Resource name '{name}' is already used in /{category}")]
    DuplicateResource { category: String, name: String },

    #[error("I/O error while writing PDF: {0}")]
    Io(#[from] std::io::Error),
}
