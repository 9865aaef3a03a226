//! Backend Router
//!
//! Maps language tags to registered backends and walks fallback chains.
//!
//! # Architecture
//!
//! ```text
//!   backends:        DashMap<name, Arc<ResilientBackend>>
//!   by_language:     DashMap<canonical tag, [backend name]>
//!   fallback_chains: DashMap<canonical tag, [canonical tag]>
//!
//!   candidates("pt-BR"):
//!     backends listing pt-BR (best quality score first)
//!       → chain: pt-PT → es-ES → en-US
//!       → registered tags with the same primary subtag, most similar first
//! ```
//!
//! A backend appears at most once in a candidate list, under the first
//! language it was reached through, so a backend that just failed is not
//! retried under a sibling tag.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::backends::{BackendContext, builtin_constructors};
use crate::config::PhonemizerConfig;
use crate::core::language::DEFAULT_FALLBACK_CHAINS;
use crate::core::{BackendCapabilities, PhonemizerBackend, Script, canonicalize, language_info};
use crate::core::{primary_subtag, similarity};
use crate::dictionary::PronunciationDictionary;
use crate::errors::PhonemizerResult;
use crate::resilience::{CircuitBreakerConfig, ResilientBackend};

/// Minimum similarity for an implicit fallback to a sibling tag
const SIBLING_SIMILARITY: f32 = 0.8;

/// What the router can offer for one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageCapabilities {
    pub language: String,
    /// Backends that list the language natively, best first
    pub supported_backends: Vec<String>,
    pub preferred_backend: String,
    pub supports_stress: bool,
    pub supports_tone: bool,
    pub script: Script,
    pub quality_score: f32,
}

/// A backend to try, and the language to ask it for
#[derive(Clone)]
pub struct Candidate {
    pub language: String,
    pub backend: Arc<ResilientBackend>,
}

/// Quality of `capabilities` for `language`
///
/// Base 0.5, +0.3 when the backend lists the language, +0.1 for IPA output,
/// +0.1 for stress on English; capped at 1.0.
pub fn quality_score(capabilities: &BackendCapabilities, native: bool, language: &str) -> f32 {
    let mut score = 0.5;
    if native {
        score += 0.3;
    }
    if capabilities.supports_ipa {
        score += 0.1;
    }
    if capabilities.supports_stress && primary_subtag(language) == "en" {
        score += 0.1;
    }
    f32::min(score, 1.0)
}

/// Language → backend registry with fallback chains
pub struct BackendRouter {
    backends: DashMap<String, Arc<ResilientBackend>>,
    by_language: DashMap<String, Vec<String>>,
    fallback_chains: DashMap<String, Vec<String>>,
}

impl Default for BackendRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRouter {
    /// Empty router with the default fallback chains installed
    pub fn new() -> Self {
        let router = Self {
            backends: DashMap::new(),
            by_language: DashMap::new(),
            fallback_chains: DashMap::new(),
        };
        for (language, chain) in DEFAULT_FALLBACK_CHAINS {
            router.set_fallback_chain(language, chain.iter().copied());
        }
        router
    }

    /// Router with every built-in backend instantiated and initialized
    ///
    /// Backends that are not thread-safe get `config.pool_size` instances.
    /// A backend that fails to initialize is logged and left out.
    pub async fn with_builtin_backends(
        config: &PhonemizerConfig,
        dictionary: Arc<PronunciationDictionary>,
    ) -> PhonemizerResult<Self> {
        let router = Self::new();
        let ctx = BackendContext { config, dictionary };
        let circuit = config.circuit_config();

        for constructor in builtin_constructors() {
            match Self::build_backend(&ctx, constructor.create, circuit.clone()).await {
                Ok(backend) => {
                    router.register(backend);
                }
                Err(e) => {
                    tracing::error!(
                        backend = constructor.name,
                        error = %e,
                        "Failed to initialize built-in backend"
                    );
                }
            }
        }

        for (language, chain) in &config.fallback_chains {
            router.set_fallback_chain(language, chain.iter().map(String::as_str));
        }
        Ok(router)
    }

    async fn build_backend(
        ctx: &BackendContext<'_>,
        create: crate::backends::BackendFactory,
        circuit: CircuitBreakerConfig,
    ) -> PhonemizerResult<ResilientBackend> {
        let data_path = ctx.config.data_path.as_deref();

        let mut first = create(ctx)?;
        let loaded = first.initialize(data_path).await?;
        let count = if first.capabilities().is_thread_safe {
            1
        } else {
            ctx.config.pool_size
        };

        let mut instances: Vec<Box<dyn PhonemizerBackend>> = Vec::with_capacity(count);
        instances.push(first);
        while instances.len() < count {
            let mut instance = create(ctx)?;
            instance.initialize(data_path).await?;
            instances.push(instance);
        }

        tracing::info!(
            backend = %instances[0].name(),
            instances = count,
            external_data = loaded,
            "Registered backend"
        );
        ResilientBackend::new(instances, circuit)
    }

    /// Add a backend, replacing any registration with the same name
    pub fn register(&self, backend: ResilientBackend) -> Arc<ResilientBackend> {
        let name = backend.name().to_string();
        self.unregister(&name);

        let backend = Arc::new(backend);
        for language in backend.supported_languages() {
            self.by_language
                .entry(canonicalize(language))
                .or_default()
                .push(name.clone());
        }
        self.backends.insert(name.clone(), backend.clone());
        tracing::debug!(
            backend = %name,
            languages = ?backend.supported_languages(),
            "Backend added to router"
        );
        backend
    }

    /// Remove a backend by name
    pub fn unregister(&self, name: &str) -> Option<Arc<ResilientBackend>> {
        let (_, removed) = self.backends.remove(name)?;
        for language in removed.supported_languages() {
            let key = canonicalize(language);
            let now_empty = match self.by_language.get_mut(&key) {
                Some(mut names) => {
                    names.retain(|n| n != name);
                    names.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.by_language.remove(&key);
            }
        }
        Some(removed)
    }

    /// Backend registered under `name`
    pub fn backend(&self, name: &str) -> Option<Arc<ResilientBackend>> {
        self.backends.get(name).map(|b| b.value().clone())
    }

    /// Names of all registered backends, sorted
    pub fn backend_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Backends listing `language` natively, highest quality first
    pub fn backends_for(&self, language: &str) -> Vec<Arc<ResilientBackend>> {
        let language = canonicalize(language);
        let Some(names) = self.by_language.get(&language).map(|n| n.value().clone()) else {
            return Vec::new();
        };
        let mut backends: Vec<Arc<ResilientBackend>> =
            names.iter().filter_map(|n| self.backend(n)).collect();
        backends.sort_by(|a, b| {
            let sa = quality_score(&a.capabilities(), true, &language);
            let sb = quality_score(&b.capabilities(), true, &language);
            sb.total_cmp(&sa).then_with(|| a.name().cmp(b.name()))
        });
        backends
    }

    /// Replace the fallback chain for `language`
    pub fn set_fallback_chain<'a, I>(&self, language: &str, chain: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let language = canonicalize(language);
        let chain: Vec<String> = chain
            .into_iter()
            .map(canonicalize)
            .filter(|l| *l != language)
            .collect();
        if chain.is_empty() {
            self.fallback_chains.remove(&language);
        } else {
            self.fallback_chains.insert(language, chain);
        }
    }

    pub fn fallback_chain(&self, language: &str) -> Vec<String> {
        self.fallback_chains
            .get(&canonicalize(language))
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }

    /// Ordered backends to try for `language`
    pub fn candidates(&self, language: &str) -> Vec<Candidate> {
        let language = canonicalize(language);

        let mut languages = vec![language.clone()];
        languages.extend(self.fallback_chain(&language));

        let mut siblings: Vec<(String, f32)> = self
            .by_language
            .iter()
            .map(|e| e.key().clone())
            .filter(|l| !languages.contains(l))
            .map(|l| {
                let score = similarity(&language, &l);
                (l, score)
            })
            .filter(|(_, score)| *score >= SIBLING_SIMILARITY)
            .collect();
        siblings.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        languages.extend(siblings.into_iter().map(|(l, _)| l));

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for candidate_language in languages {
            for backend in self.backends_for(&candidate_language) {
                if seen.insert(backend.name().to_string()) {
                    candidates.push(Candidate {
                        language: candidate_language.clone(),
                        backend,
                    });
                }
            }
        }
        candidates
    }

    /// First backend able to serve `language`, directly or through its chain
    pub fn get_backend(&self, language: &str) -> Option<Arc<ResilientBackend>> {
        self.resolve(language).map(|c| c.backend)
    }

    /// Like [`BackendRouter::get_backend`], also naming the language used
    pub fn resolve(&self, language: &str) -> Option<Candidate> {
        self.candidates(language).into_iter().next()
    }

    /// Every language some backend lists natively, sorted
    pub fn supported_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.by_language.iter().map(|e| e.key().clone()).collect();
        languages.sort();
        languages
    }

    pub fn supports_language(&self, language: &str) -> bool {
        self.by_language.contains_key(&canonicalize(language))
    }

    /// Capabilities on offer for `language`, or `None` if no backend lists it
    pub fn language_capabilities(&self, language: &str) -> Option<LanguageCapabilities> {
        let language = canonicalize(language);
        let backends = self.backends_for(&language);
        let preferred = backends.first()?;

        let script = language_info(&language)
            .map(|info| info.script)
            .unwrap_or(Script::Latin);
        Some(LanguageCapabilities {
            supported_backends: backends.iter().map(|b| b.name().to_string()).collect(),
            preferred_backend: preferred.name().to_string(),
            supports_stress: backends.iter().any(|b| b.capabilities().supports_stress),
            supports_tone: backends.iter().any(|b| b.capabilities().supports_tone),
            script,
            quality_score: quality_score(&preferred.capabilities(), true, &language),
            language,
        })
    }

    /// Total estimated memory of all registered backends
    pub fn memory_usage(&self) -> usize {
        self.backends.iter().map(|e| e.value().memory_usage()).sum()
    }
}
