use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

use crate::shader::ShaderStage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compile {stage} shader {path}:\n{log}")]
    ShaderCompile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },

    #[error("failed to link shader program:\n{0}")]
    Link(String),

    #[error("no graphics adapter available")]
    NoAdapter,

    #[error("no queue family supports both graphics and the window surface")]
    NoQueueFamily,

    #[error("no CPU-visible memory type fits the buffer")]
    NoMemoryType,

    #[error("upload of {len} bytes exceeds buffer capacity of {capacity} bytes")]
    UploadOverflow { len: u64, capacity: u64 },

    #[error("{context}: {message}")]
    Gpu {
        context: &'static str,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wraps a backend error, which only promises `Debug`.
    pub fn gpu<E: Debug>(context: &'static str) -> impl FnOnce(E) -> Self {
        move |err| Error::Gpu {
            context,
            message: format!("{:?}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_error_keeps_context() {
        let err = Err::<(), _>("device lost").map_err(Error::gpu("wait for fence"));
        assert_eq!(
            err.unwrap_err().to_string(),
            "wait for fence: \"device lost\""
        );
    }

    #[test]
    fn compile_error_carries_log() {
        let err = Error::ShaderCompile {
            stage: ShaderStage::Fragment,
            path: PathBuf::from("shader.frag"),
            log: "ERROR: 0:3: 'foo' : undeclared identifier".to_owned(),
        };
        let text = err.to_string();
        assert!(text.starts_with("failed to compile fragment shader shader.frag:"));
        assert!(text.contains("undeclared identifier"));
    }
}
