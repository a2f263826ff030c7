//! Background loading of the character asset.
//!
//! The scene starts rendering immediately; the character file is read and
//! validated on a worker thread and handed over once `poll()` sees it.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

use dune_core::animation::{load_character_file, CharacterAsset};

pub struct CharacterLoader {
    path: PathBuf,
    receiver: Option<Receiver<Result<CharacterAsset, String>>>,
}

impl CharacterLoader {
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            let result = load_character_file(&worker_path);
            // Receiver may be gone if the app closed before loading finished.
            let _ = sender.send(result);
        });
        log::info!("Loading character from {}", path.display());

        Self {
            path,
            receiver: Some(receiver),
        }
    }

    /// Yields the load result exactly once. Returns `None` while loading and
    /// after the result has been taken.
    pub fn poll(&mut self) -> Option<Result<CharacterAsset, String>> {
        let receiver = self.receiver.as_ref()?;
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(format!(
                "Character loader for {} stopped without a result",
                self.path.display()
            )),
        };
        self.receiver = None;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "dune_loader_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn wait_for(loader: &mut CharacterLoader) -> Result<CharacterAsset, String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = loader.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "loader timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn loads_valid_file_once() {
        let path = temp_file_path("valid");
        std::fs::write(
            &path,
            r#"{
                "version": "0.1",
                "model_id": "fox",
                "scale": 0.025,
                "clips": [
                    { "name": "Survey", "duration_ms": 3340 },
                    { "name": "Walk", "duration_ms": 700 },
                    { "name": "Run", "duration_ms": 1160 }
                ]
            }"#,
        )
        .expect("write temp character");

        let mut loader = CharacterLoader::spawn(path.clone());
        let asset = wait_for(&mut loader).expect("character should load");
        assert_eq!(asset.model_id, "fox");
        assert_eq!(asset.clips.len(), 3);
        assert!(loader.poll().is_none());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_reports_error() {
        let mut loader = CharacterLoader::spawn(temp_file_path("missing"));
        let err = wait_for(&mut loader).expect_err("missing file must fail");
        assert!(err.contains("Failed to read character file"));
    }
}
