//! History persistence on top of a [`KeyValueStore`].
//!
//! Every mutating operation is a read-modify-write of one key, serialized
//! through an in-process lock and persisted before it returns. Two processes
//! sharing the same storage directory can still race; that is accepted.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, SidechatError};
use crate::storage::KeyValueStore;
use crate::types::{ChatEntry, Project};

/// Maximum entries kept in the global history.
pub const GLOBAL_HISTORY_CAP: usize = 100;

/// Number of recent project entries rendered by `context_for`.
pub const CONTEXT_WINDOW: usize = 5;

const GLOBAL_KEY: &str = "chatHistory";
const PROJECTS_KEY: &str = "projects";

// ─────────────────────────────────────────────
// HistoryStore
// ─────────────────────────────────────────────

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    global_cap: usize,
    context_window: usize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// History store with the default cap and context window.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limits(store, GLOBAL_HISTORY_CAP, CONTEXT_WINDOW)
    }

    pub fn with_limits(store: Arc<dyn KeyValueStore>, global_cap: usize, context_window: usize) -> Self {
        Self {
            store,
            global_cap,
            context_window,
            write_lock: Mutex::new(()),
        }
    }

    pub fn global_cap(&self) -> usize {
        self.global_cap
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    // ────────────── Global history ──────────────

    /// Append to the global log, evicting the oldest entries past the cap.
    pub async fn append_global(&self, entry: ChatEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut history = self.load_global().await?;
        history.push(entry);
        if history.len() > self.global_cap {
            let excess = history.len() - self.global_cap;
            history.drain(..excess);
        }
        self.save(GLOBAL_KEY, &history).await?;
        debug!(entries = history.len(), "global history saved");
        Ok(())
    }

    /// The global log, oldest first.
    pub async fn global_history(&self) -> Result<Vec<ChatEntry>> {
        self.load_global().await
    }

    pub async fn clear_global(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.save(GLOBAL_KEY, &Vec::<ChatEntry>::new()).await?;
        info!("global history cleared");
        Ok(())
    }

    /// The global log as pretty-printed JSON.
    pub async fn export_global(&self) -> Result<String> {
        let history = self.load_global().await?;
        serde_json::to_string_pretty(&history).map_err(SidechatError::storage)
    }

    /// Replace the global log with an exported JSON array.
    ///
    /// Only the most recent `global_cap` entries are kept. Returns how many
    /// entries were stored.
    pub async fn import_global(&self, json: &str) -> Result<usize> {
        let raw: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| SidechatError::validation(format!("invalid history JSON: {}", e)))?;
        if !raw.is_array() {
            return Err(SidechatError::validation("invalid history format: expected an array"));
        }
        let mut history: Vec<ChatEntry> = serde_json::from_value(raw)
            .map_err(|e| SidechatError::validation(format!("invalid history entry: {}", e)))?;

        if history.len() > self.global_cap {
            let excess = history.len() - self.global_cap;
            history.drain(..excess);
        }

        let _guard = self.write_lock.lock().await;
        self.save(GLOBAL_KEY, &history).await?;
        info!(entries = history.len(), "global history imported");
        Ok(history.len())
    }

    /// Entries whose prompt or response contains `query` (case-insensitive).
    pub async fn search_global(&self, query: &str) -> Result<Vec<ChatEntry>> {
        let needle = query.to_lowercase();
        Ok(self
            .load_global()
            .await?
            .into_iter()
            .filter(|entry| entry.matches(&needle))
            .collect())
    }

    // ────────────── Projects ──────────────

    /// Create an empty project and return its id.
    pub async fn create_project(&self, name: &str) -> Result<String> {
        let name = validate_name(name)?;
        let _guard = self.write_lock.lock().await;
        let mut projects = self.load_projects().await?;

        let id = next_project_id(&projects);
        projects.push(Project::new(id.clone(), name));
        self.save(PROJECTS_KEY, &projects).await?;

        info!(project = %id, name = name, "project created");
        Ok(id)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.load_projects().await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.load_projects()
            .await?
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| SidechatError::ProjectNotFound(project_id.to_string()))
    }

    /// Append to a project's history. Project histories are not capped.
    pub async fn append_to_project(&self, project_id: &str, entry: ChatEntry) -> Result<()> {
        self.update_project(project_id, |project| {
            project.chat_history.push(entry);
        })
        .await?;
        debug!(project = project_id, "project history updated");
        Ok(())
    }

    /// Render the last `context_window` entries as a prompt prefix.
    ///
    /// Empty when the project has no history.
    pub async fn context_for(&self, project_id: &str) -> Result<String> {
        let project = self.get_project(project_id).await?;
        Ok(render_context(&project.chat_history, self.context_window))
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut projects = self.load_projects().await?;
        let before = projects.len();
        projects.retain(|p| p.id != project_id);
        if projects.len() == before {
            return Err(SidechatError::ProjectNotFound(project_id.to_string()));
        }
        self.save(PROJECTS_KEY, &projects).await?;
        info!(project = project_id, "project deleted");
        Ok(())
    }

    pub async fn rename_project(&self, project_id: &str, new_name: &str) -> Result<()> {
        let new_name = validate_name(new_name)?.to_string();
        self.update_project(project_id, |project| {
            project.name = new_name;
        })
        .await?;
        info!(project = project_id, "project renamed");
        Ok(())
    }

    pub async fn clear_project_history(&self, project_id: &str) -> Result<()> {
        self.update_project(project_id, |project| {
            project.chat_history.clear();
        })
        .await?;
        info!(project = project_id, "project history cleared");
        Ok(())
    }

    /// A full copy of the project, suitable for serializing.
    pub async fn export_project(&self, project_id: &str) -> Result<Project> {
        self.get_project(project_id).await
    }

    /// Store an exported project under a fresh id and return that id.
    pub async fn import_project(&self, mut project: Project) -> Result<String> {
        validate_name(&project.name)?;
        let _guard = self.write_lock.lock().await;
        let mut projects = self.load_projects().await?;

        project.id = next_project_id(&projects);
        let id = project.id.clone();
        projects.push(project);
        self.save(PROJECTS_KEY, &projects).await?;

        info!(project = %id, "project imported");
        Ok(id)
    }

    // ────────────── Internals ──────────────

    async fn update_project<F>(&self, project_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Project),
    {
        let _guard = self.write_lock.lock().await;
        let mut projects = self.load_projects().await?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| SidechatError::ProjectNotFound(project_id.to_string()))?;
        apply(project);
        project.touch();
        self.save(PROJECTS_KEY, &projects).await
    }

    async fn load_global(&self) -> Result<Vec<ChatEntry>> {
        self.load_list(GLOBAL_KEY).await
    }

    async fn load_projects(&self) -> Result<Vec<Project>> {
        self.load_list(PROJECTS_KEY).await
    }

    async fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.store.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| SidechatError::storage(format!("invalid data under '{}': {}", key, e))),
            None => Ok(Vec::new()),
        }
    }

    async fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let value = serde_json::to_value(items).map_err(SidechatError::storage)?;
        self.store.set(key, value).await
    }
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

/// Render the last `window` entries as alternating `User:` / `Assistant:` lines.
pub fn render_context(entries: &[ChatEntry], window: usize) -> String {
    let start = entries.len().saturating_sub(window);
    entries[start..]
        .iter()
        .map(|e| format!("User: {}\nAssistant: {}", e.prompt, e.response))
        .collect::<Vec<_>>()
        .join("\n")
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SidechatError::validation("project name cannot be empty"));
    }
    Ok(trimmed)
}

/// `proj-<unix millis>`, bumped until it doesn't clash with an existing id.
fn next_project_id(projects: &[Project]) -> String {
    let taken: HashSet<&str> = projects.iter().map(|p| p.id.as_str()).collect();
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let candidate = format!("proj-{}", millis);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        millis += 1;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};
    use tempfile::tempdir;

    fn make_store() -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryStore::new()))
    }

    fn entry(prompt: &str, response: &str) -> ChatEntry {
        ChatEntry::new(prompt, response, "openai", "gpt-3.5-turbo")
    }

    // ── Global history ──

    #[tokio::test]
    async fn test_append_global() {
        let store = make_store();
        store.append_global(entry("Q1", "A1")).await.unwrap();
        store.append_global(entry("Q2", "A2")).await.unwrap();

        let history = store.global_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].prompt, "Q1");
        assert_eq!(history[1].prompt, "Q2");
    }

    #[tokio::test]
    async fn test_global_cap_evicts_oldest() {
        let store = make_store();
        for i in 1..=101 {
            store
                .append_global(entry(&format!("Q{}", i), &format!("A{}", i)))
                .await
                .unwrap();
        }

        let history = store.global_history().await.unwrap();
        assert_eq!(history.len(), 100);
        assert_eq!(history.first().unwrap().prompt, "Q2");
        assert_eq!(history.last().unwrap().prompt, "Q101");
    }

    #[tokio::test]
    async fn test_clear_global() {
        let store = make_store();
        store.append_global(entry("Q", "A")).await.unwrap();
        store.clear_global().await.unwrap();
        assert!(store.global_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_import_global() {
        let source = make_store();
        source.append_global(entry("Q1", "A1")).await.unwrap();
        source.append_global(entry("Q2", "A2")).await.unwrap();
        let json = source.export_global().await.unwrap();

        let target = make_store();
        assert_eq!(target.import_global(&json).await.unwrap(), 2);
        assert_eq!(
            target.global_history().await.unwrap(),
            source.global_history().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_import_global_rejects_non_array() {
        let store = make_store();
        let err = store.import_global(r#"{"prompt": "x"}"#).await.unwrap_err();
        assert_eq!(err.kind(), "validation");

        let err = store.import_global("garbage").await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn test_import_global_applies_cap() {
        let store = HistoryStore::with_limits(Arc::new(MemoryStore::new()), 2, CONTEXT_WINDOW);
        let entries = vec![entry("Q1", "A1"), entry("Q2", "A2"), entry("Q3", "A3")];
        let json = serde_json::to_string(&entries).unwrap();

        assert_eq!(store.import_global(&json).await.unwrap(), 2);
        let history = store.global_history().await.unwrap();
        assert_eq!(history[0].prompt, "Q2");
    }

    #[tokio::test]
    async fn test_search_global() {
        let store = make_store();
        store.append_global(entry("Tell me about Rust", "Systems language")).await.unwrap();
        store.append_global(entry("Weather?", "Sunny")).await.unwrap();

        let hits = store.search_global("RUST").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].response, "Systems language");

        let hits = store.search_global("sunny").await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    // ── Projects ──

    #[tokio::test]
    async fn test_create_project_empty_context() {
        let store = make_store();
        let id = store.create_project("Foo").await.unwrap();
        assert!(id.starts_with("proj-"));
        assert_eq!(store.context_for(&id).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_create_project_blank_name() {
        let store = make_store();
        let err = store.create_project("   ").await.unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(store.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_project_ids_unique() {
        let store = make_store();
        let a = store.create_project("A").await.unwrap();
        let b = store.create_project("B").await.unwrap();
        let c = store.create_project("C").await.unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_context_chronological_order() {
        let store = make_store();
        let id = store.create_project("Foo").await.unwrap();
        store.append_to_project(&id, entry("Q1", "A1")).await.unwrap();
        store.append_to_project(&id, entry("Q2", "A2")).await.unwrap();

        let context = store.context_for(&id).await.unwrap();
        assert_eq!(context, "User: Q1\nAssistant: A1\nUser: Q2\nAssistant: A2");
    }

    #[tokio::test]
    async fn test_context_window_keeps_most_recent() {
        let store = make_store();
        let id = store.create_project("Long").await.unwrap();
        for i in 1..=7 {
            store
                .append_to_project(&id, entry(&format!("Q{}", i), &format!("A{}", i)))
                .await
                .unwrap();
        }

        let context = store.context_for(&id).await.unwrap();
        assert!(!context.contains("Q2"));
        assert!(context.starts_with("User: Q3"));
        assert!(context.ends_with("Assistant: A7"));

        // Project history itself is not capped
        assert_eq!(store.get_project(&id).await.unwrap().chat_history.len(), 7);
    }

    #[tokio::test]
    async fn test_append_unknown_project() {
        let store = make_store();
        let err = store.append_to_project("proj-missing", entry("Q", "A")).await.unwrap_err();
        assert!(matches!(err, SidechatError::ProjectNotFound(ref id) if id == "proj-missing"));
    }

    #[tokio::test]
    async fn test_append_updates_timestamp() {
        let store = make_store();
        let id = store.create_project("Foo").await.unwrap();
        let before = store.get_project(&id).await.unwrap().updated_at;
        store.append_to_project(&id, entry("Q", "A")).await.unwrap();
        let after = store.get_project(&id).await.unwrap().updated_at;
        assert!(after >= before);
    }

    #[tokio::test]
    async fn test_delete_unknown_leaves_projects_untouched() {
        let store = make_store();
        let id = store.create_project("Keep").await.unwrap();
        let before = store.list_projects().await.unwrap();

        let err = store.delete_project("proj-unknown").await.unwrap_err();
        assert_eq!(err.kind(), "project_not_found");
        assert_eq!(store.list_projects().await.unwrap(), before);
        assert!(store.get_project(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_project() {
        let store = make_store();
        let id = store.create_project("Gone").await.unwrap();
        store.delete_project(&id).await.unwrap();
        assert!(store.list_projects().await.unwrap().is_empty());
        assert_eq!(store.context_for(&id).await.unwrap_err().kind(), "project_not_found");
    }

    #[tokio::test]
    async fn test_rename_project() {
        let store = make_store();
        let id = store.create_project("Old").await.unwrap();
        store.rename_project(&id, "  New  ").await.unwrap();
        assert_eq!(store.get_project(&id).await.unwrap().name, "New");

        let err = store.rename_project("proj-x", "Name").await.unwrap_err();
        assert_eq!(err.kind(), "project_not_found");
    }

    #[tokio::test]
    async fn test_clear_project_history() {
        let store = make_store();
        let id = store.create_project("Foo").await.unwrap();
        store.append_to_project(&id, entry("Q", "A")).await.unwrap();
        store.clear_project_history(&id).await.unwrap();

        let project = store.get_project(&id).await.unwrap();
        assert!(project.chat_history.is_empty());
        assert_eq!(project.name, "Foo");
    }

    #[tokio::test]
    async fn test_export_import_project_round_trip() {
        let store = make_store();
        let id = store.create_project("Research").await.unwrap();
        store.append_to_project(&id, entry("Q1", "A1")).await.unwrap();

        let exported = store.export_project(&id).await.unwrap();
        let json = serde_json::to_string(&exported).unwrap();
        let reconstructed: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(reconstructed, exported);

        let new_id = store.import_project(reconstructed).await.unwrap();
        assert_ne!(new_id, id);

        let imported = store.get_project(&new_id).await.unwrap();
        assert_eq!(imported.name, exported.name);
        assert_eq!(imported.chat_history, exported.chat_history);
        assert_eq!(imported.created_at, exported.created_at);
        assert_eq!(imported.updated_at, exported.updated_at);
    }

    #[tokio::test]
    async fn test_export_unknown_project() {
        let store = make_store();
        assert_eq!(
            store.export_project("nope").await.unwrap_err().kind(),
            "project_not_found"
        );
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let dir = tempdir().unwrap();
        let id = {
            let store = HistoryStore::new(Arc::new(JsonFileStore::open(dir.path()).unwrap()));
            store.append_global(entry("Q", "A")).await.unwrap();
            let id = store.create_project("Disk").await.unwrap();
            store.append_to_project(&id, entry("PQ", "PA")).await.unwrap();
            id
        };

        let store = HistoryStore::new(Arc::new(JsonFileStore::open(dir.path()).unwrap()));
        assert_eq!(store.global_history().await.unwrap().len(), 1);
        assert_eq!(
            store.context_for(&id).await.unwrap(),
            "User: PQ\nAssistant: PA"
        );
    }

    #[test]
    fn test_render_context_empty() {
        assert_eq!(render_context(&[], 5), "");
    }

    #[test]
    fn test_next_project_id_skips_taken() {
        let millis = Utc::now().timestamp_millis();
        let taken: Vec<Project> = (0..3)
            .map(|i| Project::new(format!("proj-{}", millis + i), "x"))
            .collect();
        let id = next_project_id(&taken);
        assert!(!taken.iter().any(|p| p.id == id));
    }
}
