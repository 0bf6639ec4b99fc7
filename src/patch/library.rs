use std::{
    sync::{Arc, Mutex, MutexGuard, OnceLock},
    thread::{self, JoinHandle},
};

use crate::{error::PresetError, patch::Preset};

/// Persistence collaborator for presets (database, files, network...).
pub trait PresetSource: Send + Sync {
    fn load_all(&self) -> Result<Vec<Preset>, PresetError>;

    /// Store a preset that did not exist before.
    fn insert(&self, preset: &Preset) -> Result<(), PresetError>;

    /// Overwrite an existing preset.
    fn save(&self, preset: &Preset) -> Result<(), PresetError>;

    fn delete(&self, preset: &Preset) -> Result<(), PresetError>;
}

struct Loaded {
    presets: Mutex<Vec<Preset>>,
    error: Option<PresetError>,
}

/// Presets shared by every synthesizer in the process.
///
/// Loading happens exactly once. The first caller (usually the background
/// thread from `spawn_load`) runs the load; anyone else asking for presets
/// meanwhile blocks until it completes. A failed load is logged and leaves
/// the library empty so the engine keeps running.
pub struct PresetLibrary {
    source: Box<dyn PresetSource>,
    loaded: OnceLock<Loaded>,
}

impl PresetLibrary {
    pub fn new(source: impl PresetSource + 'static) -> Arc<Self> {
        Arc::new(Self {
            source: Box::new(source),
            loaded: OnceLock::new(),
        })
    }

    /// Load on a background thread and call `on_loaded` with the preset
    /// count, or the load error, when done. Fire and forget: there is no
    /// cancellation.
    pub fn spawn_load<F>(self: &Arc<Self>, on_loaded: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<usize, &PresetError>) + Send + 'static,
    {
        let library = Arc::clone(self);
        thread::spawn(move || {
            log::debug!("preset loader started");
            let loaded = library.load();
            match &loaded.error {
                Some(err) => on_loaded(Err(err)),
                None => on_loaded(Ok(lock(&loaded.presets).len())),
            }
            log::debug!("preset loader finished");
        })
    }

    fn load(&self) -> &Loaded {
        self.loaded.get_or_init(|| match self.source.load_all() {
            Ok(mut presets) => {
                presets.retain(|preset| match preset.validate() {
                    Ok(()) => true,
                    Err(err) => {
                        log::warn!("skipping preset '{}': {err}", preset.name);
                        false
                    }
                });
                presets.sort_by(Preset::cmp_by_name);
                log::info!("loaded {} presets", presets.len());
                Loaded {
                    presets: Mutex::new(presets),
                    error: None,
                }
            }
            Err(err) => {
                log::error!("failed to load presets: {err}");
                Loaded {
                    presets: Mutex::new(Vec::new()),
                    error: Some(err),
                }
            }
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// The error of a failed load, if any.
    pub fn load_error(&self) -> Option<&PresetError> {
        self.loaded.get().and_then(|loaded| loaded.error.as_ref())
    }

    /// All presets sorted by name. Blocks until loading has finished.
    pub fn presets(&self) -> Vec<Preset> {
        lock(&self.load().presets).clone()
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.load().presets)
            .iter()
            .map(|preset| preset.name.clone())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Preset> {
        lock(&self.load().presets)
            .iter()
            .find(|preset| preset.name == name)
            .cloned()
    }

    /// Add a new preset and persist it.
    ///
    /// The preset stays in the in-memory list even if persisting fails.
    pub fn save_as(&self, preset: Preset) -> Result<(), PresetError> {
        preset.validate()?;
        {
            let mut presets = lock(&self.load().presets);
            presets.retain(|existing| existing.name != preset.name);
            presets.push(preset.clone());
            presets.sort_by(Preset::cmp_by_name);
        }
        self.source.insert(&preset).inspect_err(|err| {
            log::error!("failed to insert preset '{}': {err}", preset.name);
        })
    }

    /// Overwrite an existing preset with new settings and persist it.
    pub fn save(&self, preset: &Preset) -> Result<(), PresetError> {
        preset.validate()?;
        {
            let mut presets = lock(&self.load().presets);
            let existing = presets
                .iter_mut()
                .find(|existing| existing.name == preset.name)
                .ok_or_else(|| PresetError::NotFound(preset.name.clone()))?;
            *existing = preset.clone();
        }
        self.source.save(preset).inspect_err(|err| {
            log::error!("failed to save preset '{}': {err}", preset.name);
        })
    }

    pub fn delete(&self, name: &str) -> Result<(), PresetError> {
        let removed = {
            let mut presets = lock(&self.load().presets);
            let index = presets
                .iter()
                .position(|preset| preset.name == name)
                .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
            presets.remove(index)
        };
        self.source.delete(&removed).inspect_err(|err| {
            log::error!("failed to delete preset '{name}': {err}");
        })
    }
}

/// A panic while holding the lock leaves the list itself intact.
fn lock(presets: &Mutex<Vec<Preset>>) -> MutexGuard<'_, Vec<Preset>> {
    presets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Barrier,
    };

    use super::*;

    #[derive(Default)]
    struct MemorySource {
        presets: Mutex<Vec<Preset>>,
        loads: AtomicUsize,
        fail: bool,
    }

    impl MemorySource {
        fn with(names: &[&str]) -> Self {
            Self {
                presets: Mutex::new(names.iter().map(|n| Preset::new(*n)).collect()),
                ..Self::default()
            }
        }
    }

    impl PresetSource for Arc<MemorySource> {
        fn load_all(&self) -> Result<Vec<Preset>, PresetError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PresetError::NotFound("database".to_string()));
            }
            Ok(self.presets.lock().unwrap().clone())
        }

        fn insert(&self, preset: &Preset) -> Result<(), PresetError> {
            self.presets.lock().unwrap().push(preset.clone());
            Ok(())
        }

        fn save(&self, preset: &Preset) -> Result<(), PresetError> {
            let mut presets = self.presets.lock().unwrap();
            if let Some(p) = presets.iter_mut().find(|p| p.name == preset.name) {
                *p = preset.clone();
            }
            Ok(())
        }

        fn delete(&self, preset: &Preset) -> Result<(), PresetError> {
            self.presets.lock().unwrap().retain(|p| p.name != preset.name);
            Ok(())
        }
    }

    #[test]
    fn background_load_reports_count() {
        let library = PresetLibrary::new(Arc::new(MemorySource::with(&["b", "A"])));
        let (tx, rx) = mpsc::channel();
        library
            .spawn_load(move |result| tx.send(result.map_err(|e| e.to_string())).unwrap())
            .join()
            .unwrap();

        assert_eq!(rx.recv().unwrap(), Ok(2));
        assert!(library.is_loaded());
        assert_eq!(library.names(), ["A", "b"]);
    }

    #[test]
    fn concurrent_callers_share_one_load() {
        let source = Arc::new(MemorySource::with(&["x"]));
        let library = PresetLibrary::new(source.clone());
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let library = library.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    library.presets().len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_leaves_empty_library() {
        let source = Arc::new(MemorySource {
            fail: true,
            ..MemorySource::default()
        });
        let library = PresetLibrary::new(source);

        assert!(library.presets().is_empty());
        assert!(matches!(library.load_error(), Some(PresetError::NotFound(_))));
    }

    #[test]
    fn save_as_save_and_delete_reach_the_source() {
        let source = Arc::new(MemorySource::with(&["Init"]));
        let library = PresetLibrary::new(source.clone());

        let mut lead = Preset::new("Lead");
        library.save_as(lead.clone()).unwrap();
        assert_eq!(library.names(), ["Init", "Lead"]);

        lead.oscillators[0].volume = 0.5;
        library.save(&lead).unwrap();
        assert_eq!(library.get("Lead").unwrap().oscillators[0].volume, 0.5);

        library.delete("Init").unwrap();
        assert_eq!(library.names(), ["Lead"]);
        let stored: Vec<_> = source.presets.lock().unwrap().iter().map(|p| p.name.clone()).collect();
        assert_eq!(stored, ["Lead"]);
    }

    #[test]
    fn missing_presets_are_reported() {
        let library = PresetLibrary::new(Arc::new(MemorySource::default()));
        assert!(matches!(library.delete("nope"), Err(PresetError::NotFound(_))));
        assert!(matches!(library.save(&Preset::new("nope")), Err(PresetError::NotFound(_))));
    }
}
