//! Editing sessions
//!
//! An [`EditSession`] owns one working copy of a stored workflow and its
//! undo history. Every mutation goes through [`EditSession::apply`], which
//! records a snapshot only when the graph actually changed.

use workflow_graph::{GraphError, UndoStack, WorkflowGraph};

use crate::error::Result;
use crate::service::{SaveOutcome, WorkflowService};
use crate::store::WorkflowId;

/// A working copy of one workflow with undo/redo
pub struct EditSession {
    service: WorkflowService,
    id: WorkflowId,
    graph: WorkflowGraph,
    history: UndoStack,
}

impl EditSession {
    /// Load a workflow and start its history at the stored state
    pub async fn open(service: WorkflowService, id: impl Into<WorkflowId>) -> Result<Self> {
        let id = id.into();
        let graph = service.load(&id).await?;
        let mut history = UndoStack::new(service.config().history_depth);
        history.reset(&graph)?;
        log::debug!("Opened edit session for '{}' at v{}", id, graph.version());

        Ok(Self {
            service,
            id,
            graph,
            history,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Run a mutation against the working copy
    ///
    /// A failed mutation leaves the working copy and history untouched.
    pub fn apply<T>(
        &mut self,
        edit: impl FnOnce(&mut WorkflowGraph) -> std::result::Result<T, GraphError>,
    ) -> Result<T> {
        let mut draft = self.graph.clone();
        let value = edit(&mut draft)?;
        self.history.push(&draft)?;
        self.graph = draft;
        Ok(value)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one edit; returns false when there is nothing to undo
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo() {
            Some(restored) => {
                self.restore(restored?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Step forward one edit; returns false when there is nothing to redo
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo() {
            Some(restored) => {
                self.restore(restored?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Validate and save the working copy
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        self.service.save(&self.id, &mut self.graph).await
    }

    /// Replace the working copy with the stored graph
    ///
    /// This is the recovery path after a version conflict. Local edits and
    /// history are discarded.
    pub async fn reload(&mut self) -> Result<()> {
        let graph = self.service.load(&self.id).await?;
        self.history.reset(&graph)?;
        log::info!(
            "Reloaded workflow '{}' at v{}, local history discarded",
            self.id,
            graph.version()
        );
        self.graph = graph;
        Ok(())
    }

    /// Adopt a snapshot's content but keep the version saves are based on
    fn restore(&mut self, mut graph: WorkflowGraph) {
        graph.set_committed_version(self.graph.version());
        self.graph = graph;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::error::WorkflowServiceError;
    use serde_json::json;
    use workflow_graph::{NodeRegistry, NodeType, WorkflowBuilder};

    async fn setup() -> (WorkflowService, WorkflowId) {
        let service = WorkflowService::from_config(ServiceConfig::default());
        let graph = WorkflowBuilder::new()
            .add_node("start", NodeType::ManualTrigger, (0.0, 0.0))
            .build();
        let id = service.create(&graph).await.unwrap();
        (service, id)
    }

    #[tokio::test]
    async fn test_apply_undo_redo() {
        let (service, id) = setup().await;
        let mut session = EditSession::open(service, id).await.unwrap();
        assert!(!session.can_undo());

        let registry = NodeRegistry::builtin();
        let node = session
            .apply(|g| g.create_node(registry, NodeType::Click, (200.0, 0.0)))
            .unwrap();
        session.apply(|g| g.connect("start", &node, None)).unwrap();
        assert_eq!(session.graph().edges().len(), 1);

        assert!(session.undo().unwrap());
        assert!(session.graph().edges().is_empty());
        assert!(session.undo().unwrap());
        assert_eq!(session.graph().nodes().len(), 1);
        assert!(!session.undo().unwrap());

        assert!(session.redo().unwrap());
        assert!(session.graph().node(&node).is_some());
        assert!(session.can_redo());
    }

    #[tokio::test]
    async fn test_failed_edit_changes_nothing() {
        let (service, id) = setup().await;
        let mut session = EditSession::open(service, id).await.unwrap();

        let err = session.apply(|g| g.connect("start", "ghost", None)).unwrap_err();
        assert!(matches!(err, WorkflowServiceError::Graph(_)));
        assert!(session.graph().edges().is_empty());
        assert!(!session.can_undo());
    }

    #[tokio::test]
    async fn test_noop_edit_records_nothing() {
        let (service, id) = setup().await;
        let mut session = EditSession::open(service, id).await.unwrap();
        session.apply(|g| Ok(g.nodes().len())).unwrap();
        assert!(!session.can_undo());
    }

    #[tokio::test]
    async fn test_undo_after_save_keeps_saved_version() {
        let (service, id) = setup().await;
        let mut session = EditSession::open(service.clone(), id.clone()).await.unwrap();

        session
            .apply(|g| Ok(g.set_variable("env", json!("prod"))))
            .unwrap();
        assert_eq!(session.save().await.unwrap().version, 1);

        assert!(session.undo().unwrap());
        assert!(session.graph().variables().is_empty());
        assert_eq!(session.graph().version(), 1);
        assert_eq!(session.save().await.unwrap().version, 2);
        assert!(service.load(&id).await.unwrap().variables().is_empty());
    }

    #[tokio::test]
    async fn test_noop_edit_after_save_records_nothing() {
        let (service, id) = setup().await;
        let mut session = EditSession::open(service, id).await.unwrap();

        session.apply(|g| Ok(g.set_variable("a", json!(1)))).unwrap();
        session.save().await.unwrap();
        session.apply(|g| Ok(g.nodes().len())).unwrap();

        assert!(session.undo().unwrap());
        assert!(session.graph().variables().is_empty());
        assert!(!session.can_undo());
    }

    #[tokio::test]
    async fn test_reload_recovers_from_conflict() {
        let (service, id) = setup().await;
        let mut mine = EditSession::open(service.clone(), id.clone()).await.unwrap();
        let mut theirs = EditSession::open(service, id).await.unwrap();

        theirs
            .apply(|g| Ok(g.set_variable("owner", json!("theirs"))))
            .unwrap();
        theirs.save().await.unwrap();

        mine.apply(|g| Ok(g.set_variable("owner", json!("mine"))))
            .unwrap();
        let err = mine.save().await.unwrap_err();
        assert!(err.is_retryable());

        mine.reload().await.unwrap();
        assert!(!mine.can_undo());
        assert_eq!(mine.graph().variables()["owner"], "theirs");

        mine.apply(|g| Ok(g.set_variable("owner", json!("mine"))))
            .unwrap();
        assert_eq!(mine.save().await.unwrap().version, 2);
    }
}
