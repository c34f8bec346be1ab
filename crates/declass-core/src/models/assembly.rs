//! Model file assembly from staged artifacts.
//!
//! The detection model is too large for the staging area's upload limit, so it
//! is stored as ordered parts and concatenated back into one file before the
//! recognizer can load it. Companion files (recognition model, dictionary) are
//! copied beside it unchanged.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::AssemblyError;

/// A place staged model artifacts can be read from.
pub trait ArtifactSource: Send + Sync {
    /// Open the named artifact for reading.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}

/// Artifacts staged as plain files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactSource for DirectorySource {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.root.join(name))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// What to build in the model directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyPlan {
    /// Name of the reassembled artifact.
    pub artifact: String,
    /// Parts of the artifact, in concatenation order.
    pub parts: Vec<String>,
    /// Artifacts copied as-is.
    pub copies: Vec<String>,
}

impl AssemblyPlan {
    pub fn new(artifact: impl Into<String>, parts: Vec<String>) -> Self {
        Self {
            artifact: artifact.into(),
            parts,
            copies: Vec::new(),
        }
    }

    /// Add a companion artifact to copy unchanged.
    pub fn with_copy(mut self, name: impl Into<String>) -> Self {
        self.copies.push(name.into());
        self
    }

    /// Every staged name this plan reads.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .chain(self.copies.iter())
            .map(String::as_str)
    }
}

/// Files produced by a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledModels {
    /// Directory holding the assembled files.
    pub model_dir: PathBuf,
    /// Path of the reassembled artifact.
    pub artifact: PathBuf,
    /// Paths of the copied companions, in plan order.
    pub copies: Vec<PathBuf>,
}

impl AssembledModels {
    /// Path of a file inside the model directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.model_dir.join(name)
    }
}

/// Rebuilds model files once per target directory.
pub struct ModelAssembler {
    source: Box<dyn ArtifactSource>,
    plan: AssemblyPlan,
    assembled: Mutex<HashMap<PathBuf, AssembledModels>>,
}

impl ModelAssembler {
    /// Create an assembler reading from `source` according to `plan`.
    pub fn new(source: impl ArtifactSource + 'static, plan: AssemblyPlan) -> Self {
        Self {
            source: Box::new(source),
            plan,
            assembled: Mutex::new(HashMap::new()),
        }
    }

    pub fn plan(&self) -> &AssemblyPlan {
        &self.plan
    }

    /// Assemble into `model_dir` unless this assembler already did so.
    ///
    /// The cache is keyed by the directory; the lock is held for the whole
    /// build so concurrent first callers wait for a single assembly.
    pub fn ensure(&self, model_dir: &Path) -> Result<AssembledModels, AssemblyError> {
        let mut assembled = self.assembled.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(models) = assembled.get(model_dir) {
            debug!("Models already assembled in {}", model_dir.display());
            return Ok(models.clone());
        }

        let models = self.assemble(model_dir)?;
        assembled.insert(model_dir.to_path_buf(), models.clone());
        Ok(models)
    }

    /// Build the model directory unconditionally.
    pub fn assemble(&self, model_dir: &Path) -> Result<AssembledModels, AssemblyError> {
        if self.plan.parts.is_empty() {
            return Err(AssemblyError::NoParts(self.plan.artifact.clone()));
        }

        info!(
            "Assembling {} from {} parts in {}",
            self.plan.artifact,
            self.plan.parts.len(),
            self.source.location()
        );

        fs::create_dir_all(model_dir).map_err(|source| AssemblyError::Write {
            path: model_dir.to_path_buf(),
            source,
        })?;

        let artifact = model_dir.join(&self.plan.artifact);
        let size = self.write_concatenated(&artifact, &self.plan.parts)?;
        debug!("Wrote {} ({} bytes)", artifact.display(), size);

        let mut copies = Vec::with_capacity(self.plan.copies.len());
        for name in &self.plan.copies {
            let path = model_dir.join(name);
            let size = self.write_concatenated(&path, std::slice::from_ref(name))?;
            debug!("Copied {} ({} bytes)", path.display(), size);
            copies.push(path);
        }

        info!("Models ready in {}", model_dir.display());

        Ok(AssembledModels {
            model_dir: model_dir.to_path_buf(),
            artifact,
            copies,
        })
    }

    /// Stream `names` into `dest` back to back through a `.tmp` sibling.
    fn write_concatenated(&self, dest: &Path, names: &[String]) -> Result<u64, AssemblyError> {
        let temp_path = temp_sibling(dest);
        let write_err = |source| AssemblyError::Write {
            path: temp_path.clone(),
            source,
        };

        let mut out = io::BufWriter::new(File::create(&temp_path).map_err(write_err)?);
        let mut written = 0u64;

        for name in names {
            let mut reader = self.source.open(name).map_err(|source| AssemblyError::Read {
                name: name.clone(),
                source,
            })?;
            written += copy_stream(&mut reader, &mut out, name, &temp_path)?;
        }

        out.flush().map_err(write_err)?;
        drop(out);

        fs::rename(&temp_path, dest).map_err(|source| AssemblyError::Write {
            path: dest.to_path_buf(),
            source,
        })?;

        Ok(written)
    }
}

/// Copy one reader into the output, attributing failures to the right side.
fn copy_stream(
    reader: &mut dyn Read,
    out: &mut impl Write,
    name: &str,
    dest: &Path,
) -> Result<u64, AssemblyError> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(AssemblyError::Read {
                    name: name.to_string(),
                    source,
                })
            }
        };
        out.write_all(&buf[..n]).map_err(|source| AssemblyError::Write {
            path: dest.to_path_buf(),
            source,
        })?;
        total += n as u64;
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Split `input` into `parts` ordered files named `<file>.1`, `<file>.2`, ...
/// in `out_dir`, so each stays under a staging upload limit.
pub fn split_artifact(
    input: &Path,
    parts: usize,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, AssemblyError> {
    if parts == 0 {
        return Err(AssemblyError::InvalidPartCount(parts));
    }

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let read_err = |source| AssemblyError::Read {
        name: input.display().to_string(),
        source,
    };

    let len = fs::metadata(input).map_err(read_err)?.len();
    let chunk = len.div_ceil(parts as u64).max(1);

    fs::create_dir_all(out_dir).map_err(|source| AssemblyError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut reader = io::BufReader::new(File::open(input).map_err(read_err)?);
    let mut written = Vec::with_capacity(parts);

    for index in 1..=parts {
        let path = out_dir.join(format!("{}.{}", name, index));
        let mut out = File::create(&path).map_err(|source| AssemblyError::Write {
            path: path.clone(),
            source,
        })?;
        let mut limited = (&mut reader).take(chunk);
        let size = copy_stream(&mut limited, &mut out, &name, &path)?;
        debug!("Wrote part {} ({} bytes)", path.display(), size);
        written.push(path);
    }

    info!("Split {} into {} parts", input.display(), parts);
    Ok(written)
}
