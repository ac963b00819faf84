use std::io;
use std::path::PathBuf;

type CleanupAction = Box<dyn FnOnce() + Send + 'static>;

/// Cleanup actions that run in reverse registration order when the stack is
/// dropped, on success and on every error path alike.
#[derive(Default)]
pub struct CleanupStack {
    actions: Vec<(String, CleanupAction)>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arbitrary action.
    pub fn defer(&mut self, label: impl Into<String>, action: impl FnOnce() + Send + 'static) {
        self.actions.push((label.into(), Box::new(action)));
    }

    /// Register removal of a file. A file that never got created is fine.
    pub fn remove_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let label = format!("remove {}", path.display());
        self.defer(label, move || match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed intermediate file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove intermediate file"
            ),
        });
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every registered action now.
    pub fn run(mut self) {
        self.unwind();
    }

    fn unwind(&mut self) {
        while let Some((label, action)) = self.actions.pop() {
            tracing::trace!(action = %label, "Running cleanup action");
            action();
        }
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        self.unwind();
    }
}

impl std::fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupStack")
            .field(
                "actions",
                &self.actions.iter().map(|(l, _)| l).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_actions_run_in_reverse_order_on_drop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let mut stack = CleanupStack::new();
            for i in 0..3 {
                let log = Arc::clone(&log);
                stack.defer(format!("step {}", i), move || log.lock().unwrap().push(i));
            }
            assert_eq!(stack.len(), 3);
        }
        assert_eq!(*log.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_runs_on_error_path() {
        fn failing(stack: &mut CleanupStack, marker: Arc<Mutex<bool>>) -> Result<(), String> {
            stack.defer("mark", move || *marker.lock().unwrap() = true);
            Err("boom".to_string())
        }

        let marker = Arc::new(Mutex::new(false));
        let mut stack = CleanupStack::new();
        let result = failing(&mut stack, Arc::clone(&marker));
        assert!(result.is_err());
        assert!(!*marker.lock().unwrap());
        drop(stack);
        assert!(*marker.lock().unwrap());
    }

    #[test]
    fn test_remove_file_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.mp4");
        std::fs::write(&present, b"data").unwrap();

        let mut stack = CleanupStack::new();
        stack.remove_file(&present);
        stack.remove_file(dir.path().join("never-created.mp4"));
        stack.run();

        assert!(!present.exists());
    }
}
