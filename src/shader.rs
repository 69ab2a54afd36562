use gfx_hal::pso;
use std::fmt;
use std::fs::read_to_string;
use std::io::{prelude::*, Cursor};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn file_name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "shader.vert",
            ShaderStage::Fragment => "shader.frag",
        }
    }

    fn glsl_type(self) -> glsl_to_spirv::ShaderType {
        match self {
            ShaderStage::Vertex => glsl_to_spirv::ShaderType::Vertex,
            ShaderStage::Fragment => glsl_to_spirv::ShaderType::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// GLSL text of one stage together with where it came from.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub path: PathBuf,
    pub code: String,
}

impl ShaderSource {
    pub fn load(dir: &Path, stage: ShaderStage) -> Result<Self> {
        let path = dir.join(stage.file_name());
        let code = read_to_string(&path).map_err(|source| Error::ShaderIo {
            path: path.clone(),
            source,
        })?;
        log::debug!("read {} shader from {}", stage, path.display());
        Ok(ShaderSource { stage, path, code })
    }

    /// Compiles to SPIR-V words. The compiler log is kept on failure.
    pub fn compile(&self) -> Result<Vec<u32>> {
        let mut file = glsl_to_spirv::compile(&self.code, self.stage.glsl_type()).map_err(
            |log| Error::ShaderCompile {
                stage: self.stage,
                path: self.path.clone(),
                log,
            },
        )?;

        let mut buf = vec![];
        file.read_to_end(&mut buf).map_err(|source| Error::ShaderIo {
            path: self.path.clone(),
            source,
        })?;
        let spirv = pso::read_spirv(Cursor::new(&buf[..])).map_err(|err| Error::ShaderCompile {
            stage: self.stage,
            path: self.path.clone(),
            log: err.to_string(),
        })?;

        log::info!("compiled {} -> {} words", self.path.display(), spirv.len());
        Ok(spirv)
    }
}

/// SPIR-V for both stages of the program.
pub struct CompiledShaders {
    pub vertex: Vec<u32>,
    pub fragment: Vec<u32>,
}

impl CompiledShaders {
    /// Reads and compiles `shader.vert` and `shader.frag` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let vertex = ShaderSource::load(dir, ShaderStage::Vertex)?.compile()?;
        let fragment = ShaderSource::load(dir, ShaderStage::Fragment)?.compile()?;
        Ok(CompiledShaders { vertex, fragment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled_dir() -> &'static Path {
        Path::new(env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn stages_map_to_fixed_file_names() {
        assert_eq!(ShaderStage::Vertex.file_name(), "shader.vert");
        assert_eq!(ShaderStage::Fragment.file_name(), "shader.frag");
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = bundled_dir().join("no-such-shader-dir");
        match ShaderSource::load(&dir, ShaderStage::Vertex) {
            Err(Error::ShaderIo { path, .. }) => {
                assert_eq!(path, dir.join("shader.vert"));
            }
            other => panic!("expected ShaderIo, got {:?}", other),
        }
    }

    #[test]
    fn bundled_shaders_compile() {
        for &stage in &[ShaderStage::Vertex, ShaderStage::Fragment] {
            let source = ShaderSource::load(bundled_dir(), stage).unwrap();
            let spirv = source.compile().unwrap();
            // SPIR-V magic number
            assert_eq!(spirv[0], 0x0723_0203);
        }
    }

    #[test]
    fn pair_loads_from_directory() {
        let shaders = CompiledShaders::load(bundled_dir()).unwrap();
        assert!(!shaders.vertex.is_empty());
        assert!(!shaders.fragment.is_empty());
    }

    #[test]
    fn broken_source_keeps_compiler_log() {
        let source = ShaderSource {
            stage: ShaderStage::Fragment,
            path: PathBuf::from("broken.frag"),
            code: "#version 450\nvoid main() { undefined_thing = 1.0; }\n".to_owned(),
        };
        match source.compile() {
            Err(Error::ShaderCompile { stage, log, .. }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.trim().is_empty());
            }
            other => panic!("expected ShaderCompile, got {:?}", other),
        }
    }
}
