use crate::api::ShaderStage;
use crate::gl_helper::GLErrorWrapper;
use thiserror::Error;

/// Used when the driver reports failure but leaves the info log empty.
pub const EMPTY_INFO_LOG: &str = "(driver provided no info log)";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompileFailed { stage: ShaderStage, log: String },
    #[error("program failed to link:\n{log}")]
    ProgramLinkFailed { log: String },
    #[error(transparent)]
    Gl(#[from] GLErrorWrapper),
}

impl PipelineError {
    pub fn compile_failed(stage: ShaderStage, log: String) -> Self {
        PipelineError::ShaderCompileFailed {
            stage,
            log: non_empty(log),
        }
    }

    pub fn link_failed(log: String) -> Self {
        PipelineError::ProgramLinkFailed {
            log: non_empty(log),
        }
    }

    /// the driver's diagnostic text, if this is a compile or link failure
    pub fn log(&self) -> Option<&str> {
        match self {
            PipelineError::ShaderCompileFailed { log, .. }
            | PipelineError::ProgramLinkFailed { log } => Some(log),
            PipelineError::Gl(_) => None,
        }
    }
}

fn non_empty(log: String) -> String {
    let trimmed = log.trim_end_matches(['\0', '\n', ' ']);
    if trimmed.is_empty() {
        EMPTY_INFO_LOG.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_logs_get_a_placeholder() {
        let e = PipelineError::compile_failed(ShaderStage::Fragment, "\0".to_string());
        assert_eq!(e.log(), Some(EMPTY_INFO_LOG));

        let e = PipelineError::link_failed("error: missing main\n".to_string());
        assert_eq!(e.log(), Some("error: missing main"));
        assert!(e.to_string().starts_with("program failed to link"));
    }
}
