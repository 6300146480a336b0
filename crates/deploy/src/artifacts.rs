//! Compiled contract blueprints read from a Hardhat artifacts directory.
//!
//! Layout:
//! - `<root>/contracts/Purchase.sol/Purchase.json` holds the ABI and creation bytecode.
//! - `<root>/contracts/Purchase.sol/Purchase.dbg.json` points at the build info.
//! - `<root>/build-info/<id>.json` holds the solc version and standard-json input.

use std::path::{Path, PathBuf};

use alloy_core::{json_abi::JsonAbi, primitives::Bytes};
use anyhow::{Context, Result};
use serde::Deserialize;

/// The compiled template used to construct new contract instances.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    /// Contract name, e.g. `Purchase`.
    pub name: String,
    /// Source unit the contract was compiled from, e.g. `contracts/Purchase.sol`.
    pub source_name: String,
    pub abi: JsonAbi,
    /// Creation bytecode without constructor arguments.
    pub bytecode: Bytes,
    /// Path to the build info this contract was compiled in, if known.
    pub build_info: Option<PathBuf>,
}

impl Blueprint {
    /// `<source>:<name>`, the identifier explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.name)
    }
}

/// Compiler metadata needed to reproduce a build on an explorer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Full solc version, e.g. `0.8.17+commit.8df45f5f`.
    pub solc_long_version: String,
    /// The standard-json compiler input.
    pub input: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: JsonAbi,
    bytecode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// Read-only view of a compilation output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a contract identifier to its blueprint.
    ///
    /// Accepts a bare name (`Purchase`) or a fully qualified one
    /// (`contracts/Purchase.sol:Purchase`). Returns `Ok(None)` if no artifact
    /// matches.
    pub fn find(&self, identifier: &str) -> Result<Option<Blueprint>> {
        let Some(path) = self.locate(identifier)? else {
            return Ok(None);
        };

        tracing::debug!(contract = %identifier, path = %path.display(), "Found artifact");

        self.load_blueprint(&path).map(Some)
    }

    /// Load the build info a blueprint was compiled in.
    pub fn load_build_info(&self, blueprint: &Blueprint) -> Result<BuildInfo> {
        let path = blueprint.build_info.as_ref().with_context(|| {
            format!(
                "No build info recorded for {}, recompile the project",
                blueprint.fully_qualified_name()
            )
        })?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read build info {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse build info {}", path.display()))
    }

    fn locate(&self, identifier: &str) -> Result<Option<PathBuf>> {
        if let Some((source, name)) = identifier.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{name}.json"));
            return Ok((path.is_file() && !is_debug_file(&path)).then_some(path));
        }

        let file_name = format!("{identifier}.json");
        let mut matches = Vec::new();
        collect_artifacts(&self.root.join("contracts"), &file_name, &mut matches)?;

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => {
                let candidates = matches
                    .iter()
                    .filter_map(|p| p.strip_prefix(&self.root).ok())
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                anyhow::bail!(
                    "Contract name `{}` is ambiguous, use a fully qualified name ({})",
                    identifier,
                    candidates
                )
            }
        }
    }

    fn load_blueprint(&self, path: &Path) -> Result<Blueprint> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let artifact: HardhatArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

        let bytecode = decode_bytecode(&artifact.bytecode)
            .with_context(|| format!("Invalid bytecode for {}", artifact.contract_name))?;

        Ok(Blueprint {
            name: artifact.contract_name,
            source_name: artifact.source_name,
            abi: artifact.abi,
            bytecode,
            build_info: build_info_path(path)?,
        })
    }
}

/// Recursively collect `file_name` artifacts under source-unit directories.
fn collect_artifacts(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_artifacts(&path, file_name, out)?;
        } else if path.file_name().is_some_and(|f| f == file_name)
            && !is_debug_file(&path)
            && dir.extension().is_some_and(|ext| ext == "sol")
        {
            out.push(path);
        }
    }

    Ok(())
}

/// `<Name>.dbg.json` files sit next to artifacts but are not artifacts.
fn is_debug_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|f| f.to_str())
        .is_some_and(|f| f.ends_with(".dbg.json"))
}

/// Resolve the build info path from the `.dbg.json` file next to an artifact.
fn build_info_path(artifact_path: &Path) -> Result<Option<PathBuf>> {
    let debug_path = artifact_path.with_extension("dbg.json");
    if !debug_path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&debug_path)
        .with_context(|| format!("Failed to read {}", debug_path.display()))?;
    let debug: DebugFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", debug_path.display()))?;

    let parent = artifact_path
        .parent()
        .context("Artifact path must have a parent directory")?;

    Ok(Some(parent.join(debug.build_info)))
}

fn decode_bytecode(raw: &str) -> Result<Bytes> {
    let raw = raw.strip_prefix("0x").unwrap_or(raw);

    if raw.is_empty() {
        anyhow::bail!("Empty bytecode, the contract is abstract or an interface");
    }

    if raw.contains("__$") {
        anyhow::bail!("Bytecode has unlinked library references, linking is not supported");
    }

    Ok(hex::decode(raw)?.into())
}
