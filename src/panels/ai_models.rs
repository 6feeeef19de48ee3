//! Provider keys and per-agent model assignment.
//!
//! Providers and agent assignments load together but fall back independently:
//! a failed or empty list keeps whatever is currently shown. Ollama is local,
//! so it is always configured and always selectable.

use std::collections::BTreeMap;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use log::{debug, info, warn};

use crate::api::ApiResult;
use crate::catalog;
use crate::model::{AgentModelConfig, LlmProvider, TestOutcome};
use crate::sync::{InFlight, Job, LoadState, Refresh, SharedApi, mutate_then_refresh};
use crate::toast::{ToastChannel, ToastKind};

#[derive(Debug)]
pub struct ModelsSnapshot {
    pub providers: ApiResult<Vec<LlmProvider>>,
    pub agents: ApiResult<Vec<AgentModelConfig>>,
}

#[derive(Debug)]
pub enum AiModelsEvent {
    Loaded(ModelsSnapshot),
    KeySaved {
        provider: String,
        result: ApiResult<((), ModelsSnapshot)>,
    },
    KeyDeleted {
        provider: String,
        result: ApiResult<((), ModelsSnapshot)>,
    },
    Tested {
        provider: String,
        result: ApiResult<(TestOutcome, ModelsSnapshot)>,
    },
    Assigned {
        agent_id: String,
        provider: String,
        model: String,
        result: ApiResult<((), ModelsSnapshot)>,
    },
    Reset {
        agent_id: String,
        result: ApiResult<((), ModelsSnapshot)>,
    },
}

pub fn default_providers() -> Vec<LlmProvider> {
    catalog::PROVIDERS
        .iter()
        .map(|spec| LlmProvider::builtin(spec.key))
        .collect()
}

pub fn default_agents() -> Vec<AgentModelConfig> {
    catalog::AGENTS
        .iter()
        .map(|spec| AgentModelConfig::default_for(spec.key))
        .collect()
}

#[derive(Debug)]
pub struct AiModelsPanel {
    providers: Vec<LlmProvider>,
    agents: Vec<AgentModelConfig>,
    key_inputs: BTreeMap<String, String>,
    /// Agent id to the (provider, model) it is being moved to.
    pending: BTreeMap<String, (String, String)>,
    saving_key: InFlight,
    deleting_key: InFlight,
    testing: InFlight,
    saving_agent: InFlight,
    state: LoadState,
}

impl AiModelsPanel {
    pub fn new() -> Self {
        Self {
            providers: default_providers(),
            agents: default_agents(),
            key_inputs: BTreeMap::new(),
            pending: BTreeMap::new(),
            saving_key: InFlight::default(),
            deleting_key: InFlight::default(),
            testing: InFlight::default(),
            saving_agent: InFlight::default(),
            state: LoadState::Idle,
        }
    }

    pub fn providers(&self) -> &[LlmProvider] {
        &self.providers
    }

    pub fn agents(&self) -> &[AgentModelConfig] {
        &self.agents
    }

    pub fn provider(&self, provider: &str) -> Option<&LlmProvider> {
        self.providers.iter().find(|prov| prov.provider == provider)
    }

    pub fn agent(&self, agent_id: &str) -> Option<&AgentModelConfig> {
        self.agents.iter().find(|agent| agent.agent_id == agent_id)
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn load(&mut self, api: SharedApi) -> Job<AiModelsEvent> {
        self.state = LoadState::Loading;
        Self::fetch(api).map(AiModelsEvent::Loaded).boxed()
    }

    /// Models selectable for `provider`: the backend's list when the provider
    /// has been loaded, the built-in catalog otherwise.
    pub fn models_for(&self, provider: &str) -> Vec<&str> {
        match self.provider(provider) {
            Some(prov) => prov.models.iter().map(String::as_str).collect(),
            None => catalog::default_models(provider).to_vec(),
        }
    }

    /// Providers an agent may be assigned to. Ollama is always first.
    pub fn configured_providers(&self) -> Vec<&str> {
        let mut configured = vec![catalog::OLLAMA];
        configured.extend(
            self.providers
                .iter()
                .filter(|prov| prov.is_configured && !prov.is_local())
                .map(|prov| prov.provider.as_str()),
        );
        configured
    }

    /// The pair shown for an agent; a pending assignment wins over the cache.
    pub fn assignment(&self, agent_id: &str) -> Option<(&str, &str)> {
        if let Some((provider, model)) = self.pending.get(agent_id) {
            return Some((provider.as_str(), model.as_str()));
        }
        self.agent(agent_id)
            .map(|agent| (agent.provider.as_str(), agent.model.as_str()))
    }

    pub fn is_pending(&self, agent_id: &str) -> bool {
        self.pending.contains_key(agent_id)
    }

    pub fn key_input(&self, provider: &str) -> &str {
        self.key_inputs.get(provider).map(String::as_str).unwrap_or("")
    }

    pub fn set_key_input(&mut self, provider: &str, key: impl Into<String>) {
        self.key_inputs.insert(provider.to_string(), key.into());
    }

    pub fn is_saving_key(&self, provider: &str) -> bool {
        self.saving_key.contains(provider)
    }

    pub fn is_testing(&self, provider: &str) -> bool {
        self.testing.contains(provider)
    }

    pub fn is_saving_agent(&self, agent_id: &str) -> bool {
        self.saving_agent.contains(agent_id)
    }

    pub fn can_test(&self, provider: &str) -> bool {
        provider == catalog::OLLAMA || self.provider(provider).is_some_and(|p| p.is_configured)
    }

    pub fn can_delete_key(&self, provider: &str) -> bool {
        provider != catalog::OLLAMA && self.provider(provider).is_some_and(|p| p.is_configured)
    }

    pub fn save_key(
        &mut self,
        api: SharedApi,
        provider: &str,
        toasts: &mut ToastChannel,
    ) -> Option<Job<AiModelsEvent>> {
        if provider == catalog::OLLAMA {
            return None;
        }
        let key = self.key_input(provider).to_string();
        if key.trim().is_empty() {
            toasts.error("Please enter an API key");
            return None;
        }
        if !self.saving_key.begin(provider) {
            return None;
        }
        let provider = provider.to_string();
        Some(
            async move {
                let call = api.save_llm_provider_key(&provider, &key);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                AiModelsEvent::KeySaved { provider, result }
            }
            .boxed(),
        )
    }

    pub fn delete_key(&mut self, api: SharedApi, provider: &str) -> Option<Job<AiModelsEvent>> {
        if !self.can_delete_key(provider) || !self.deleting_key.begin(provider) {
            return None;
        }
        let provider = provider.to_string();
        Some(
            async move {
                let call = api.delete_llm_provider_key(&provider);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                AiModelsEvent::KeyDeleted { provider, result }
            }
            .boxed(),
        )
    }

    pub fn test_provider(&mut self, api: SharedApi, provider: &str) -> Option<Job<AiModelsEvent>> {
        if !self.can_test(provider) || !self.testing.begin(provider) {
            return None;
        }
        let provider = provider.to_string();
        Some(
            async move {
                let call = api.test_llm_provider(&provider);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                AiModelsEvent::Tested { provider, result }
            }
            .boxed(),
        )
    }

    /// Moves an agent to `provider` and that provider's first model in one call.
    pub fn select_provider(
        &mut self,
        api: SharedApi,
        agent_id: &str,
        provider: &str,
        toasts: &mut ToastChannel,
    ) -> Option<Job<AiModelsEvent>> {
        if !self.configured_providers().contains(&provider) {
            debug!("{} is not selectable for {}", provider, agent_id);
            return None;
        }
        if self
            .assignment(agent_id)
            .is_some_and(|(current, _)| current == provider)
        {
            return None;
        }
        let Some(model) = self.models_for(provider).first().map(|m| m.to_string()) else {
            toasts.error(format!(
                "No models available for {}",
                catalog::provider_label(provider)
            ));
            return None;
        };
        self.assign(api, agent_id, provider.to_string(), model)
    }

    /// Keeps the agent's provider and switches its model.
    pub fn select_model(
        &mut self,
        api: SharedApi,
        agent_id: &str,
        model: &str,
    ) -> Option<Job<AiModelsEvent>> {
        let (provider, _) = self.assignment(agent_id)?;
        let provider = provider.to_string();
        if !self.models_for(&provider).contains(&model) {
            debug!("{} is not offered by {}", model, provider);
            return None;
        }
        self.assign(api, agent_id, provider, model.to_string())
    }

    /// The configured provider `delta` places away from the agent's current one.
    pub fn provider_after(&self, agent_id: &str, delta: isize) -> Option<String> {
        let (current, _) = self.assignment(agent_id)?;
        let options = self.configured_providers();
        cycle(&options, current, delta).map(str::to_string)
    }

    pub fn model_after(&self, agent_id: &str, delta: isize) -> Option<String> {
        let (provider, current) = self.assignment(agent_id)?;
        let options = self.models_for(provider);
        cycle(&options, current, delta).map(str::to_string)
    }

    fn assign(
        &mut self,
        api: SharedApi,
        agent_id: &str,
        provider: String,
        model: String,
    ) -> Option<Job<AiModelsEvent>> {
        if !self.saving_agent.begin(agent_id) {
            return None;
        }
        self.pending
            .insert(agent_id.to_string(), (provider.clone(), model.clone()));
        let agent_id = agent_id.to_string();
        Some(
            async move {
                let call = api.assign_agent_model(&agent_id, &provider, &model);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                AiModelsEvent::Assigned {
                    agent_id,
                    provider,
                    model,
                    result,
                }
            }
            .boxed(),
        )
    }

    /// Only custom assignments can be reset.
    pub fn reset_agent(&mut self, api: SharedApi, agent_id: &str) -> Option<Job<AiModelsEvent>> {
        if !self.agent(agent_id).is_some_and(|agent| agent.is_custom) {
            return None;
        }
        if !self.saving_agent.begin(agent_id) {
            return None;
        }
        let agent_id = agent_id.to_string();
        Some(
            async move {
                let call = api.reset_agent_model(&agent_id);
                let result = mutate_then_refresh::<Self, _, _>(api.clone(), call).await;
                AiModelsEvent::Reset { agent_id, result }
            }
            .boxed(),
        )
    }

    pub fn handle(&mut self, event: AiModelsEvent, toasts: &mut ToastChannel) {
        match event {
            AiModelsEvent::Loaded(snapshot) => self.replace(snapshot),
            AiModelsEvent::KeySaved { provider, result } => {
                self.saving_key.finish(&provider);
                match result {
                    Ok(((), snapshot)) => {
                        info!("{} api key saved", provider);
                        self.key_inputs.remove(&provider);
                        self.replace(snapshot);
                        toasts.success(format!(
                            "{} API key saved",
                            catalog::provider_label(&provider)
                        ));
                    }
                    Err(err) => {
                        warn!("failed to save {} key: {}", provider, err);
                        toasts.error(format!("Failed to save {provider} key"));
                    }
                }
            }
            AiModelsEvent::KeyDeleted { provider, result } => {
                self.deleting_key.finish(&provider);
                match result {
                    Ok(((), snapshot)) => {
                        info!("{} api key removed", provider);
                        self.replace(snapshot);
                        toasts.success(format!(
                            "{} key removed",
                            catalog::provider_label(&provider)
                        ));
                    }
                    Err(err) => {
                        warn!("failed to remove {} key: {}", provider, err);
                        toasts.error(format!("Failed to remove {provider} key"));
                    }
                }
            }
            AiModelsEvent::Tested { provider, result } => {
                self.testing.finish(&provider);
                match result {
                    Ok((outcome, snapshot)) => {
                        let kind = if outcome.is_connected() {
                            ToastKind::Success
                        } else {
                            ToastKind::Error
                        };
                        toasts.show(outcome.message, kind);
                        self.replace(snapshot);
                    }
                    Err(err) => {
                        warn!("{} provider test failed: {}", provider, err);
                        toasts.error(format!("Test failed for {provider}"));
                    }
                }
            }
            AiModelsEvent::Assigned {
                agent_id,
                provider,
                model,
                result,
            } => {
                self.saving_agent.finish(&agent_id);
                self.pending.remove(&agent_id);
                match result {
                    Ok(((), snapshot)) => {
                        info!("{} assigned to {}/{}", agent_id, provider, model);
                        self.replace(snapshot);
                        toasts.success(format!(
                            "{} → {} / {}",
                            catalog::agent_label(&agent_id),
                            catalog::provider_label(&provider),
                            model
                        ));
                    }
                    Err(err) => {
                        warn!("failed to assign {} to {}/{}: {}", agent_id, provider, model, err);
                        toasts.error(err.message_or("Failed to assign model"));
                    }
                }
            }
            AiModelsEvent::Reset { agent_id, result } => {
                self.saving_agent.finish(&agent_id);
                match result {
                    Ok(((), snapshot)) => {
                        info!("{} reset to default model", agent_id);
                        self.replace(snapshot);
                        toasts.success(format!(
                            "{} reset to default (Ollama)",
                            catalog::agent_label(&agent_id)
                        ));
                    }
                    Err(err) => {
                        warn!("failed to reset {}: {}", agent_id, err);
                        toasts.error("Failed to reset agent");
                    }
                }
            }
        }
    }
}

impl Default for AiModelsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn cycle<'a>(options: &[&'a str], current: &str, delta: isize) -> Option<&'a str> {
    if options.is_empty() {
        return None;
    }
    let len = options.len() as isize;
    let index = options
        .iter()
        .position(|option| *option == current)
        .map(|index| index as isize)
        .unwrap_or(if delta > 0 { -1 } else { 0 });
    let next = (index + delta).rem_euclid(len) as usize;
    options.get(next).copied()
}

impl Refresh for AiModelsPanel {
    type Snapshot = ModelsSnapshot;

    fn fetch(api: SharedApi) -> BoxFuture<'static, Self::Snapshot> {
        async move {
            let (providers, agents) =
                future::join(api.list_llm_providers(), api.list_agent_model_configs()).await;
            ModelsSnapshot { providers, agents }
        }
        .boxed()
    }

    fn replace(&mut self, snapshot: Self::Snapshot) {
        let mut loaded = false;
        match snapshot.providers {
            Ok(providers) if !providers.is_empty() => {
                self.providers = providers;
                loaded = true;
            }
            Ok(_) => debug!("provider list empty, keeping current"),
            Err(err) => warn!("llm providers unavailable: {}", err),
        }
        match snapshot.agents {
            Ok(agents) if !agents.is_empty() => {
                self.agents = agents;
                loaded = true;
            }
            Ok(_) => debug!("agent list empty, keeping current"),
            Err(err) => warn!("agent model configs unavailable: {}", err),
        }
        self.state = if loaded {
            LoadState::Ready
        } else {
            self.state.after_failure()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, InMemorySettingsApi};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn offline() -> (Arc<InMemorySettingsApi>, SharedApi) {
        let backend = Arc::new(InMemorySettingsApi::new());
        let api: SharedApi = backend.clone();
        (backend, api)
    }

    async fn loaded(api: SharedApi) -> AiModelsPanel {
        let mut panel = AiModelsPanel::new();
        let mut toasts = ToastChannel::default();
        let event = panel.load(api).await;
        panel.handle(event, &mut toasts);
        panel
    }

    async fn configure(panel: &mut AiModelsPanel, api: SharedApi, provider: &str) {
        let mut toasts = ToastChannel::default();
        panel.set_key_input(provider, "sk-test-key-123");
        let job = panel.save_key(api, provider, &mut toasts).unwrap();
        panel.handle(job.await, &mut toasts);
    }

    #[test]
    fn defaults_put_every_agent_on_local_model() {
        let panel = AiModelsPanel::new();
        assert_eq!(panel.configured_providers(), vec!["ollama"]);
        for agent in panel.agents() {
            assert_eq!((agent.provider.as_str(), agent.model.as_str()), ("ollama", "llama3"));
            assert!(!agent.is_custom);
        }
    }

    #[test]
    fn configured_providers_exclude_unconfigured_but_keep_ollama() {
        let mut panel = AiModelsPanel::new();
        let mut openai = LlmProvider::builtin("openai");
        openai.is_configured = true;
        let mut ollama = LlmProvider::builtin("ollama");
        ollama.is_configured = false;
        panel.replace(ModelsSnapshot {
            providers: Ok(vec![ollama, openai, LlmProvider::builtin("groq")]),
            agents: Ok(Vec::new()),
        });

        let configured = panel.configured_providers();
        assert_eq!(configured, vec!["ollama", "openai"]);
        for provider in configured {
            let prov = panel.provider(provider).unwrap();
            assert!(prov.is_configured || prov.is_local());
        }
    }

    #[test]
    fn models_fall_back_to_catalog_for_unknown_providers() {
        let mut panel = AiModelsPanel::new();
        let mut custom = LlmProvider::builtin("openai");
        custom.models = vec!["gpt-4o-mini".to_string()];
        panel.replace(ModelsSnapshot {
            providers: Ok(vec![custom]),
            agents: Err(ApiError::Rejected(String::from("down"))),
        });

        assert_eq!(panel.models_for("openai"), vec!["gpt-4o-mini"]);
        assert_eq!(panel.models_for("groq").first(), Some(&"llama-3.3-70b-versatile"));
        assert!(panel.models_for("mistral-cloud").is_empty());
        assert_eq!(panel.agents().len(), 5);
    }

    #[tokio::test]
    async fn independent_fallbacks_when_backend_is_down() {
        let (backend, api) = offline();
        backend.set_unavailable(true);
        let panel = loaded(api).await;

        assert_eq!(panel.providers().len(), 5);
        assert_eq!(panel.agents().len(), 5);
        assert_eq!(panel.state(), LoadState::Fallback);
        assert_eq!(
            backend.calls(),
            vec!["list_llm_providers", "list_agent_model_configs"]
        );
    }

    #[tokio::test]
    async fn selecting_openai_assigns_its_first_model() {
        let (backend, api) = offline();
        let mut panel = loaded(api.clone()).await;
        configure(&mut panel, api.clone(), "openai").await;
        backend.clear_calls();
        let mut toasts = ToastChannel::default();

        let job = panel
            .select_provider(api.clone(), "content_creator", "openai", &mut toasts)
            .unwrap();
        assert_eq!(panel.assignment("content_creator"), Some(("openai", "gpt-4o")));
        assert!(panel.is_saving_agent("content_creator"));
        panel.handle(job.await, &mut toasts);

        assert_eq!(
            backend.calls()[0],
            "assign_agent_model:content_creator:openai:gpt-4o"
        );
        let agent = panel.agent("content_creator").unwrap();
        assert_eq!(agent.model, panel.models_for("openai")[0]);
        assert!(agent.is_custom);
        assert!(!panel.is_pending("content_creator"));
        assert_eq!(
            toasts.current().unwrap().message,
            "Content Creator → OpenAI / gpt-4o"
        );
    }

    #[tokio::test]
    async fn unconfigured_provider_is_not_selectable() {
        let (backend, api) = offline();
        let mut panel = loaded(api.clone()).await;
        backend.clear_calls();
        let mut toasts = ToastChannel::default();

        assert!(
            panel
                .select_provider(api, "review_agent", "anthropic", &mut toasts)
                .is_none()
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn reselecting_current_provider_keeps_custom_model() {
        let (backend, api) = offline();
        let mut panel = loaded(api.clone()).await;
        let mut toasts = ToastChannel::default();
        let job = panel.select_model(api.clone(), "review_agent", "mistral").unwrap();
        panel.handle(job.await, &mut toasts);
        backend.clear_calls();

        let next = panel.provider_after("review_agent", 1);
        assert_eq!(next.as_deref(), Some("ollama"));
        assert!(
            panel
                .select_provider(api.clone(), "review_agent", "ollama", &mut toasts)
                .is_none()
        );
        assert!(
            panel
                .select_provider(api, "content_creator", "ollama", &mut toasts)
                .is_none()
        );

        assert!(backend.calls().is_empty());
        let review = panel.agent("review_agent").unwrap();
        assert_eq!((review.provider.as_str(), review.model.as_str()), ("ollama", "mistral"));
        assert!(!panel.agent("content_creator").unwrap().is_custom);
    }

    #[tokio::test]
    async fn provider_without_models_is_refused() {
        let (backend, api) = offline();
        let mut panel = AiModelsPanel::new();
        let mut groq = LlmProvider::builtin("groq");
        groq.is_configured = true;
        groq.models.clear();
        panel.replace(ModelsSnapshot {
            providers: Ok(vec![LlmProvider::builtin("ollama"), groq]),
            agents: Ok(default_agents()),
        });
        let mut toasts = ToastChannel::default();

        assert!(panel.select_provider(api, "review_agent", "groq", &mut toasts).is_none());
        assert_eq!(toasts.current().unwrap().message, "No models available for Groq");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_assignment_keeps_previous_pair() {
        let (backend, api) = offline();
        let mut panel = loaded(api.clone()).await;
        let mut toasts = ToastChannel::default();

        let job = panel.select_model(api.clone(), "engagement_bot", "mistral").unwrap();
        backend.set_unavailable(true);
        panel.handle(job.await, &mut toasts);

        assert_eq!(panel.assignment("engagement_bot"), Some(("ollama", "llama3")));
        assert_eq!(toasts.current().unwrap().kind, ToastKind::Error);
        assert!(!panel.is_saving_agent("engagement_bot"));
    }

    #[tokio::test]
    async fn reset_returns_to_default_pair() {
        let (_backend, api) = offline();
        let mut panel = loaded(api.clone()).await;
        let mut toasts = ToastChannel::default();
        assert!(panel.reset_agent(api.clone(), "analytics_agent").is_none());

        let job = panel.select_model(api.clone(), "analytics_agent", "phi3").unwrap();
        panel.handle(job.await, &mut toasts);
        assert!(panel.agent("analytics_agent").unwrap().is_custom);

        let job = panel.reset_agent(api, "analytics_agent").unwrap();
        panel.handle(job.await, &mut toasts);
        let agent = panel.agent("analytics_agent").unwrap();
        assert_eq!(agent, &AgentModelConfig::default_for("analytics_agent"));
        assert_eq!(
            toasts.current().unwrap().message,
            "Analytics Agent reset to default (Ollama)"
        );
    }

    #[tokio::test]
    async fn key_lifecycle_reloads_provider_list() {
        let (_backend, api) = offline();
        let mut panel = loaded(api.clone()).await;
        let mut toasts = ToastChannel::default();

        assert!(panel.save_key(api.clone(), "gemini", &mut toasts).is_none());
        assert_eq!(toasts.current().unwrap().message, "Please enter an API key");
        assert!(!panel.can_test("gemini"));

        configure(&mut panel, api.clone(), "gemini").await;
        assert_eq!(panel.key_input("gemini"), "");
        assert_eq!(
            panel.provider("gemini"),
            api.list_llm_providers()
                .await
                .unwrap()
                .iter()
                .find(|p| p.provider == "gemini")
        );
        assert!(panel.can_delete_key("gemini"));

        let job = panel.test_provider(api.clone(), "gemini").unwrap();
        panel.handle(job.await, &mut toasts);
        assert_eq!(panel.provider("gemini").unwrap().test_status.as_deref(), Some("connected"));
        assert_eq!(toasts.current().unwrap().kind, ToastKind::Success);

        let job = panel.delete_key(api, "gemini").unwrap();
        panel.handle(job.await, &mut toasts);
        assert!(!panel.provider("gemini").unwrap().is_configured);
        assert_eq!(toasts.current().unwrap().message, "Google Gemini key removed");
    }

    #[test]
    fn ollama_is_tested_but_never_keyed() {
        let panel = AiModelsPanel::new();
        assert!(panel.can_test("ollama"));
        assert!(!panel.can_delete_key("ollama"));
    }

    #[test]
    fn cycling_wraps_through_options() {
        let panel = AiModelsPanel::new();
        assert_eq!(panel.model_after("review_agent", 1).as_deref(), Some("llama3.1"));
        assert_eq!(panel.model_after("review_agent", -1).as_deref(), Some("deepseek-r1"));
        assert_eq!(panel.provider_after("review_agent", 1).as_deref(), Some("ollama"));
    }
}
