use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::PresetError,
    patch::{library::PresetSource, Preset},
};

/// Presets stored as one pretty-printed JSON file each in a directory.
#[derive(Debug, Clone)]
pub struct JsonPresetStore {
    directory: PathBuf,
}

impl JsonPresetStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File that holds the preset called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let safe_name: String = name
            .replace(' ', "_")
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.directory.join(format!("{safe_name}.json"))
    }

    fn write(&self, preset: &Preset) -> Result<(), PresetError> {
        fs::create_dir_all(&self.directory).map_err(|e| PresetError::io(&self.directory, e))?;

        let path = self.path_for(&preset.name);
        let json = serde_json::to_string_pretty(preset).map_err(PresetError::Serialize)?;
        fs::write(&path, json).map_err(|e| PresetError::io(&path, e))
    }

    fn read(path: &Path) -> Result<Preset, PresetError> {
        let contents = fs::read_to_string(path).map_err(|e| PresetError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|source| PresetError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl PresetSource for JsonPresetStore {
    /// A missing directory is an empty library, not an error.
    fn load_all(&self) -> Result<Vec<Preset>, PresetError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PresetError::io(&self.directory, e)),
        };

        let mut presets = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PresetError::io(&self.directory, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                presets.push(Self::read(&path)?);
            }
        }
        Ok(presets)
    }

    fn insert(&self, preset: &Preset) -> Result<(), PresetError> {
        self.write(preset)
    }

    fn save(&self, preset: &Preset) -> Result<(), PresetError> {
        self.write(preset)
    }

    fn delete(&self, preset: &Preset) -> Result<(), PresetError> {
        let path = self.path_for(&preset.name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PresetError::NotFound(preset.name.clone()))
            }
            Err(e) => Err(PresetError::io(path, e)),
        }
    }
}
