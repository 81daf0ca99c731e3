//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while generating or editing test cases
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Every chunk of a batch produced zero records
    #[error("The AI did not generate any valid test cases.")]
    NoTestCases,

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors raised while turning an uploaded file into text
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Extension not handled by any extractor
    #[error("Unsupported file type. Please upload a PDF, DOCX, XML, Markdown, or TXT file.")]
    Unsupported(String),

    /// PDF could not be loaded or read
    #[error("Error parsing PDF: {0}")]
    Pdf(String),

    /// DOCX could not be read
    #[error("Error parsing DOCX: {0}")]
    Docx(String),

    /// XML was malformed
    #[error("Error parsing XML: {0}")]
    Xml(String),

    /// Text formats that are not valid UTF-8
    #[error("Error decoding text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
