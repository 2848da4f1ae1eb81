// Retrieval-augmented generation tests

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::LlmSettings;
    use crate::llm::mock::MockLLMProvider;
    use crate::llm::{AsyncOpenAIProvider, CompletionOptions, LLMError, LLMProvider};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn memory_store() -> Arc<SnippetStore> {
        Arc::new(SnippetStore::in_memory(Arc::new(HashedEmbedder::default()), TextSplitter::default()))
    }

    /// Hashed vectors recorded under another embedder's id
    struct RelabeledEmbedder {
        id: String,
        inner: HashedEmbedder,
    }

    #[async_trait::async_trait]
    impl Embedder for RelabeledEmbedder {
        fn id(&self) -> String {
            self.id.clone()
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LLMError> {
            self.inner.embed(texts).await
        }
    }

    fn unconfigured_embedder() -> Arc<dyn Embedder> {
        let provider: Arc<dyn LLMProvider> =
            Arc::new(AsyncOpenAIProvider::new(LlmSettings::default()));
        Arc::new(ProviderEmbedder::new(provider, "text-embedding-3-small"))
    }

    fn manager_with(provider: Arc<dyn LLMProvider>, store: Arc<SnippetStore>) -> RagManager {
        RagManager::new(provider, store, 4, CompletionOptions::default())
    }

    #[tokio::test]
    async fn test_empty_requirement_never_calls_provider() {
        let provider = Arc::new(MockLLMProvider::new());
        let store = memory_store();
        let manager = manager_with(provider.clone(), store.clone());

        for requirement in ["", "   ", "\n\t"] {
            let result = manager.generate_code(requirement).await;
            assert!(matches!(result, Err(RagError::EmptyRequirement)));
        }

        assert_eq!(provider.call_count(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_credential_is_configuration_error() {
        let store = memory_store();
        let provider: Arc<dyn LLMProvider> =
            Arc::new(AsyncOpenAIProvider::new(LlmSettings::default()));
        let manager = manager_with(provider, store.clone());

        let err = manager.generate_code("write a function that adds two numbers").await.unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err:?}");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_credential_is_configuration_error() {
        let settings = LlmSettings { api_key: Some("sk-abc def".to_string()), ..Default::default() };
        let provider: Arc<dyn LLMProvider> = Arc::new(AsyncOpenAIProvider::new(settings));
        let manager = manager_with(provider, memory_store());

        let err = manager.generate_code("sort a list").await.unwrap_err();
        assert!(matches!(err, RagError::Configuration(LLMError::ConfigurationError { .. })));
    }

    #[tokio::test]
    async fn test_generation_stores_exactly_one_snippet() {
        let provider = Arc::new(MockLLMProvider::new());
        let code = "def add(a, b):\n    return a + b\n";
        provider.push_text(code);

        let store = memory_store();
        store
            .add("def multiply(a, b):\n    return a * b", SnippetMetadata::new(SnippetOrigin::Manual))
            .await
            .unwrap();

        let manager = manager_with(provider.clone(), store.clone());
        let generation = manager.generate_code("  add two numbers in python  ").await.unwrap();

        assert_eq!(generation.code, code);
        assert_eq!(generation.context.len(), 1);
        assert_eq!(store.len().await, 2);

        let snippets = store.snippets().await;
        let stored = snippets.last().unwrap();
        assert_eq!(Some(stored.id), generation.stored);
        assert_eq!(stored.text, code);
        assert_eq!(
            stored.metadata.origin,
            SnippetOrigin::Generated { requirement: "add two numbers in python".to_string() }
        );
        assert_eq!(stored.metadata.language.as_deref(), Some("Python"));
    }

    #[tokio::test]
    async fn test_context_reaches_the_prompt() {
        let provider = Arc::new(MockLLMProvider::new());
        let store = memory_store();
        store
            .add("def load_config(path):\n    return toml.load(path)", SnippetMetadata::new(SnippetOrigin::Manual))
            .await
            .unwrap();

        let manager = manager_with(provider.clone(), store);
        manager.generate_code("load the config file").await.unwrap();

        let messages = provider.last_messages().unwrap();
        let user = &messages.last().unwrap().content;
        assert!(user.contains("def load_config(path)"));
        assert!(user.contains("Question: load the config file"));
    }

    #[tokio::test]
    async fn test_failed_generation_adds_nothing() {
        let provider = Arc::new(MockLLMProvider::new());
        provider.push_error(LLMError::rate_limit("slow down"));
        provider.push_text("   \n");

        let store = memory_store();
        let manager = manager_with(provider.clone(), store.clone());

        let err = manager.generate_code("parse json").await.unwrap_err();
        assert!(matches!(err, RagError::Generation(LLMError::RateLimitExceeded { .. })));

        let err = manager.generate_code("parse json").await.unwrap_err();
        assert!(matches!(err, RagError::EmptyResponse));

        assert_eq!(provider.call_count(), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_code() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = Arc::new(
            SnippetStore::open(
                data_dir.join("snippets.json"),
                Arc::new(HashedEmbedder::default()),
                TextSplitter::default(),
            )
            .await
            .unwrap(),
        );
        // A plain file where the data directory should be makes every write fail
        std::fs::write(&data_dir, "not a directory").unwrap();

        let provider = Arc::new(MockLLMProvider::new());
        provider.push_text("print('hello')");
        let manager = manager_with(provider, store.clone());

        let generation = manager.generate_code("print hello").await.unwrap();
        assert_eq!(generation.code, "print('hello')");
        assert_eq!(generation.stored, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_identical_queries_are_stable() {
        let store = memory_store();
        for text in [
            "def read_file(path): return open(path).read()",
            "def write_file(path, data): open(path, 'w').write(data)",
            "def read_file(path): return open(path).read()",
            "class Cache: pass",
        ] {
            store.add(text, SnippetMetadata::new(SnippetOrigin::Manual)).await.unwrap();
        }

        let manager = manager_with(Arc::new(MockLLMProvider::new()), store);
        let ids = |results: Vec<ScoredSnippet>| {
            results.into_iter().map(|s| s.snippet.id).collect::<Vec<_>>()
        };

        let first = ids(manager.search_similar_code("read a file", 3).await.unwrap());
        let second = ids(manager.search_similar_code("read a file", 3).await.unwrap());
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_review_does_not_write_back() {
        let provider = Arc::new(MockLLMProvider::new());
        provider.push_text("Uses os.system with user input; prefer subprocess.run.");
        let store = memory_store();
        let manager = manager_with(provider.clone(), store.clone());

        let review = manager.review_code("import os\nos.system(input())").await.unwrap();
        assert!(review.review.contains("subprocess.run"));
        assert_eq!(review.model, "mock-model");
        assert!(store.is_empty().await);

        assert!(matches!(manager.review_code("  ").await, Err(RagError::EmptyInput)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_add_code_and_search() {
        let manager = manager_with(Arc::new(MockLLMProvider::new()), memory_store());

        let id = manager
            .add_code("def fib(n): return n if n < 2 else fib(n-1) + fib(n-2)", SnippetMetadata::new(SnippetOrigin::Manual))
            .await
            .unwrap();

        let results = manager.search_similar_code("fib", 5).await.unwrap();
        assert_eq!(results[0].snippet.id, id);
        assert!(matches!(
            manager.add_code("", SnippetMetadata::new(SnippetOrigin::Manual)).await,
            Err(RagError::EmptyInput)
        ));
        assert!(matches!(manager.search_similar_code(" ", 5).await, Err(RagError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_index_paths_picks_python_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("pkg")).unwrap();
        std::fs::create_dir_all(root.join("__pycache__")).unwrap();
        std::fs::create_dir_all(root.join(".venv")).unwrap();
        std::fs::write(root.join("app.py"), "def main(): pass\n").unwrap();
        std::fs::write(root.join("pkg").join("util.py"), "def helper(): return 1\n").unwrap();
        std::fs::write(root.join("empty.py"), "\n").unwrap();
        std::fs::write(root.join("notes.txt"), "not code").unwrap();
        std::fs::write(root.join("__pycache__").join("app.py"), "cached").unwrap();
        std::fs::write(root.join(".venv").join("site.py"), "vendored").unwrap();

        let store = memory_store();
        let manager = manager_with(Arc::new(MockLLMProvider::new()), store.clone());
        let report = manager.index_paths(&[root.to_path_buf()]).await.unwrap();

        assert_eq!(report.added, vec![root.join("app.py"), root.join("pkg").join("util.py")]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, root.join("empty.py"));

        let snippets = store.snippets().await;
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].metadata.origin, SnippetOrigin::Indexed { path: root.join("app.py") });
        assert_eq!(snippets[0].metadata.language.as_deref(), Some("Python"));

        let missing = manager.index_paths(&[PathBuf::from("/definitely/not/here")]).await;
        assert!(matches!(missing, Err(RagError::Io { .. })));
    }

    #[tokio::test]
    async fn test_provider_embedder_without_credential_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");

        let seeded = SnippetStore::open(
            &path,
            Arc::new(RelabeledEmbedder {
                id: unconfigured_embedder().id(),
                inner: HashedEmbedder::default(),
            }),
            TextSplitter::default(),
        )
        .await
        .unwrap();
        seeded
            .add("def add(a, b):\n    return a + b", SnippetMetadata::new(SnippetOrigin::Manual))
            .await
            .unwrap();

        let store = Arc::new(
            SnippetStore::open(&path, unconfigured_embedder(), TextSplitter::default())
                .await
                .unwrap(),
        );
        let provider = Arc::new(MockLLMProvider::new());
        let manager = manager_with(provider.clone(), store.clone());

        let err = manager.generate_code("write a function").await.unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err:?}");
        assert_eq!(provider.call_count(), 0);
        assert_eq!(store.len().await, 1);

        let err = manager.search_similar_code("add numbers", 3).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_reembedding_without_credential_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");

        let seeded = SnippetStore::open(&path, Arc::new(HashedEmbedder::default()), TextSplitter::default())
            .await
            .unwrap();
        seeded.add("print('hello')", SnippetMetadata::new(SnippetOrigin::Manual)).await.unwrap();

        let err = SnippetStore::open(&path, unconfigured_embedder(), TextSplitter::default())
            .await
            .err()
            .unwrap();
        assert!(err.is_configuration(), "unexpected error: {err:?}");
    }
}
