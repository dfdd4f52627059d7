// Integration tests for the interview workflow runtime
// These drive the public handle against scripted collaborators with a paused clock

#[cfg(test)]
mod workflow_integration_tests {
    use clearprd_lib::collaborator::{PrdService, ServiceError};
    use clearprd_lib::events::{
        EventBroadcaster, Notification, NotificationLevel, WorkflowEvent, EVENT_NOTIFICATION,
    };
    use clearprd_lib::parsers::RenderNode;
    use clearprd_lib::prd_workflow::{ValidationError, WorkflowError, WorkflowHandle};
    use clearprd_lib::{ClearPrdConfig, Question, QuestionOption, WorkflowPhase, WorkflowRuntime};
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use tokio::sync::broadcast;

    /// Collaborator that replays queued responses and records its calls
    #[derive(Clone, Default)]
    struct ScriptedService {
        analyses: Arc<Mutex<VecDeque<Result<Vec<Question>, ServiceError>>>>,
        generations: Arc<Mutex<VecDeque<Result<String, ServiceError>>>>,
        generation_calls: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    impl ScriptedService {
        fn analysis(self, result: Result<Vec<Question>, ServiceError>) -> Self {
            self.analyses.lock().unwrap().push_back(result);
            self
        }

        fn generation(self, result: Result<String, ServiceError>) -> Self {
            self.generations.lock().unwrap().push_back(result);
            self
        }
    }

    impl PrdService for ScriptedService {
        async fn analyze_idea(&self, _idea: String) -> Result<Vec<Question>, ServiceError> {
            self.analyses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::service("no scripted analysis")))
        }

        async fn generate_document(
            &self,
            _idea: String,
            answers: HashMap<String, String>,
        ) -> Result<String, ServiceError> {
            self.generation_calls.lock().unwrap().push(answers);
            self.generations
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::service("no scripted generation")))
        }
    }

    fn question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            category: "features".to_string(),
            prompt: format!("Question {}?", id),
            options: vec![
                QuestionOption::new("yes", "Yes"),
                QuestionOption::new("no", "No"),
            ],
        }
    }

    fn start(
        service: ScriptedService,
    ) -> (
        WorkflowHandle,
        ScriptedService,
        broadcast::Receiver<WorkflowEvent>,
        tokio::task::JoinHandle<()>,
    ) {
        let events = Arc::new(EventBroadcaster::new());
        let rx = events.subscribe();
        let (runtime, handle) =
            WorkflowRuntime::new(&ClearPrdConfig::default(), service.clone(), events).unwrap();
        let task = tokio::spawn(runtime.run());
        (handle, service, rx, task)
    }

    fn error_messages(rx: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if event.event != EVENT_NOTIFICATION {
                continue;
            }
            if let Some(n) = event.payload_as::<Notification>() {
                if n.level == NotificationLevel::Error {
                    out.push(n.message);
                }
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_todo_app_happy_path() {
        let service = ScriptedService::default()
            .analysis(Ok(vec![question("q1"), question("q2")]))
            .generation(Ok("# Todo App PRD\n\n## Features\n- Tasks".to_string()));
        let (handle, service, _rx, task) = start(service);

        handle.submit_idea("a todo app").await.unwrap();
        let snapshot = handle.wait_for_phase(WorkflowPhase::Questioning).await.unwrap();
        assert_eq!(snapshot.questions.len(), 2);
        assert_eq!(snapshot.answers.len(), 0);
        assert!(!snapshot.can_generate);

        handle.select_answer("q1", "yes").await.unwrap();
        handle.select_answer("q2", "no").await.unwrap();
        assert!(handle.snapshot().can_generate);
        handle.submit_answers().await.unwrap();

        let snapshot = handle.wait_for_phase(WorkflowPhase::Result).await.unwrap();
        assert_eq!(
            snapshot.document_nodes.first(),
            Some(&RenderNode::Heading {
                level: 1,
                text: "Todo App PRD".to_string()
            })
        );

        let calls = service.generation_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("q2").map(String::as_str), Some("no"));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_idea_never_reaches_collaborator() {
        let (handle, _service, mut rx, task) = start(ScriptedService::default());

        let err = handle.submit_idea("   ").await.unwrap_err();
        assert_eq!(err, WorkflowError::Validation(ValidationError::EmptyIdea));
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.phase, WorkflowPhase::Idea);
        assert!(!snapshot.is_busy());
        assert_eq!(error_messages(&mut rx).len(), 1);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_error_detail_is_shown_verbatim() {
        let service = ScriptedService::default().analysis(Err(ServiceError::from_response(
            500,
            r#"{"detail": "LLM API key not configured"}"#,
        )));
        let (handle, _service, mut rx, task) = start(service);

        handle.submit_idea("a todo app").await.unwrap();
        let snapshot = handle.wait_idle().await.unwrap();
        assert_eq!(snapshot.phase, WorkflowPhase::Idea);
        assert!(snapshot.questions.is_empty());
        assert_eq!(error_messages(&mut rx), vec!["LLM API key not configured"]);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_failure_keeps_answers_and_restarts_countdown() {
        let service = ScriptedService::default()
            .analysis(Ok(vec![question("q1"), question("q2"), question("q3")]))
            .generation(Err(ServiceError::network("connection reset")))
            .generation(Ok("# Recovered PRD".to_string()));
        let (handle, _service, mut rx, task) = start(service);

        handle.submit_idea("a todo app").await.unwrap();
        handle.wait_for_phase(WorkflowPhase::Questioning).await.unwrap();

        handle.select_answer("q1", "yes").await.unwrap();
        handle.select_answer("q2", "yes").await.unwrap();
        let err = handle.submit_answers().await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation(ValidationError::IncompleteAnswers { answered: 2, total: 3 })
        ));

        handle.select_answer("q3", "no").await.unwrap();

        // Let some of the budget run down first
        let mut watch = handle.watch();
        watch
            .wait_for(|s| s.countdown_remaining < 58)
            .await
            .unwrap();

        handle.submit_answers().await.unwrap();
        let snapshot = handle.wait_idle().await.unwrap();
        assert_eq!(snapshot.phase, WorkflowPhase::Questioning);
        assert_eq!(snapshot.answers.len(), 3);
        assert_eq!(snapshot.answers.get("q3"), Some("no"));
        assert_eq!(snapshot.countdown_remaining, 60);
        assert!(snapshot.document.is_none());
        assert!(error_messages(&mut rx).contains(&"connection reset".to_string()));

        handle.submit_answers().await.unwrap();
        let snapshot = handle.wait_for_phase(WorkflowPhase::Result).await.unwrap();
        assert_eq!(snapshot.document.as_deref(), Some("# Recovered PRD"));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_after_result() {
        let service = ScriptedService::default()
            .analysis(Ok(vec![question("q1")]))
            .generation(Ok("# First".to_string()))
            .analysis(Ok(vec![question("n1"), question("n2")]));
        let (handle, _service, _rx, task) = start(service);

        handle.submit_idea("first idea").await.unwrap();
        handle.wait_for_phase(WorkflowPhase::Questioning).await.unwrap();
        handle.select_answer("q1", "yes").await.unwrap();
        handle.submit_answers().await.unwrap();
        let first = handle.wait_for_phase(WorkflowPhase::Result).await.unwrap();

        handle.reset().await.unwrap();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.phase, WorkflowPhase::Idea);
        assert_eq!(snapshot.idea, "");
        assert!(snapshot.document.is_none());
        assert_ne!(snapshot.session_id, first.session_id);

        handle.submit_idea("second idea").await.unwrap();
        let snapshot = handle.wait_for_phase(WorkflowPhase::Questioning).await.unwrap();
        assert_eq!(snapshot.questions.len(), 2);
        assert!(snapshot.answers.is_empty());

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
