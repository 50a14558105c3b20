use gl_thin::gl_helper::GLErrorWrapper;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create window: {0}")]
    WindowCreationFailed(String),
    /// the surface or context went away, or refused to present
    #[error("GL context error: {0}")]
    Context(String),
    #[error("GL error: {0}")]
    Gl(#[from] GLErrorWrapper),
}
