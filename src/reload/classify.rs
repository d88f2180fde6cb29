//! File Classification
//!
//! Pure functions deciding what a batch of changes should do to the app and
//! the browsers. No side effects.

use std::path::{Path, PathBuf};

use crate::actor::fs::ChangeBatch;

/// Extensions that make a change restart the app by default.
pub const DEFAULT_CODE_EXTENSIONS: &[&str] = &["py"];

/// Extensions rendered server side; a change needs a full page reload.
pub const DEFAULT_TEMPLATE_EXTENSIONS: &[&str] = &["html", "jinja", "jinja2"];

/// Kind of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Application source, restart the app
    Code,
    /// Server rendered template, reload pages
    Template,
    Other,
}

/// What a batch of changes should trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadAction {
    /// Restart the app, then reload every page once it answers.
    Restart,
    /// Reload every page.
    FullReload,
    /// Reload pages affected by one file.
    AssetReload(PathBuf),
}

/// Extension based classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    code_extensions: Vec<String>,
    template_extensions: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_CODE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_TEMPLATE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Classifier {
    pub fn new(code_extensions: Vec<String>, template_extensions: Vec<String>) -> Self {
        Self {
            code_extensions,
            template_extensions,
        }
    }

    pub fn categorize(&self, path: &Path) -> FileCategory {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if self.code_extensions.iter().any(|c| c == ext) {
            FileCategory::Code
        } else if self.template_extensions.iter().any(|t| t == ext) {
            FileCategory::Template
        } else {
            FileCategory::Other
        }
    }

    /// Dispatch for the app watcher.
    ///
    /// Any code file restarts; several files or any template reload every
    /// page; a single other file is reloaded on its own.
    pub fn app_action(&self, batch: &ChangeBatch) -> ReloadAction {
        let categories: Vec<_> = batch.paths().map(|p| self.categorize(p)).collect();
        if categories.contains(&FileCategory::Code) {
            return ReloadAction::Restart;
        }
        if categories.contains(&FileCategory::Template) {
            return ReloadAction::FullReload;
        }
        match batch.single() {
            Some(path) => ReloadAction::AssetReload(path.to_path_buf()),
            None => ReloadAction::FullReload,
        }
    }

    /// Dispatch for the static directory watcher: never restarts.
    pub fn static_action(batch: &ChangeBatch) -> ReloadAction {
        match batch.single() {
            Some(path) => ReloadAction::AssetReload(path.to_path_buf()),
            None => ReloadAction::FullReload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(
            vec!["py".into()],
            vec!["html".into(), "jinja".into(), "jinja2".into()],
        )
    }

    #[test]
    fn test_categorize() {
        let c = classifier();
        assert_eq!(c.categorize(Path::new("/p/app/main.py")), FileCategory::Code);
        assert_eq!(c.categorize(Path::new("/p/app/tpl/index.jinja2")), FileCategory::Template);
        assert_eq!(c.categorize(Path::new("/p/static/index.html")), FileCategory::Template);
        assert_eq!(c.categorize(Path::new("/p/static/app.css")), FileCategory::Other);
        assert_eq!(c.categorize(Path::new("/p/app/notes.txt")), FileCategory::Other);
    }

    #[test]
    fn test_code_change_in_mixed_batch_restarts() {
        let batch = ChangeBatch::modified(["/p/app/views.py", "/p/static/app.css"]);
        assert_eq!(classifier().app_action(&batch), ReloadAction::Restart);
    }

    #[test]
    fn test_templates_full_reload_without_restart() {
        let batch = ChangeBatch::modified(["/p/app/tpl/a.jinja", "/p/app/tpl/b.jinja"]);
        assert_eq!(classifier().app_action(&batch), ReloadAction::FullReload);

        let single = ChangeBatch::modified(["/p/app/tpl/a.jinja"]);
        assert_eq!(classifier().app_action(&single), ReloadAction::FullReload);
    }

    #[test]
    fn test_single_other_file_reloads_that_file() {
        let batch = ChangeBatch::modified(["/p/static/app.css"]);
        assert_eq!(
            classifier().app_action(&batch),
            ReloadAction::AssetReload(PathBuf::from("/p/static/app.css"))
        );
    }

    #[test]
    fn test_several_other_files_full_reload() {
        let batch = ChangeBatch::modified(["/p/static/a.css", "/p/static/b.css"]);
        assert_eq!(classifier().app_action(&batch), ReloadAction::FullReload);
    }

    #[test]
    fn test_static_action() {
        let single = ChangeBatch::modified(["/p/static/main.py"]);
        assert_eq!(
            Classifier::static_action(&single),
            ReloadAction::AssetReload(PathBuf::from("/p/static/main.py"))
        );
        let many = ChangeBatch::modified(["/p/static/a.css", "/p/static/b.css"]);
        assert_eq!(Classifier::static_action(&many), ReloadAction::FullReload);
    }
}
