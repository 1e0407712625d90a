use thiserror::Error;

/// Everything that can go wrong between the form and a written document.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// printpdf failures carry no stable error type across versions.
    #[error("Failed to render PDF: {0}")]
    Pdf(String),

    #[error("Failed to decode image: {0}")]
    Image(String),

    #[error("Failed to parse settings: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    SettingsInvalid(String),

    #[error("Failed to serialize settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    #[error("Prompt cancelled: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("An export is already in progress")]
    ExportBusy,

    #[error("Window error: {0}")]
    Gui(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
