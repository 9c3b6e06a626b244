use std::collections::HashMap;
use std::sync::Arc;

use super::analyzer::{Analyzer, AnalyzerConfig, AnalyzerRef};
use crate::config::AnalysisSettings;
use crate::error::{AnalyzerComponent, TermdexError};
use crate::Result;

const BUILTIN_ANALYZERS: &[&str] = &["standard", "simple", "whitespace", "keyword", "stop", "english"];

fn builtin_config(name: &str) -> Option<AnalyzerConfig> {
    match name {
        "standard" => Some(AnalyzerConfig::standard()),
        "simple" => Some(AnalyzerConfig::simple()),
        "whitespace" => Some(AnalyzerConfig::whitespace()),
        "keyword" => Some(AnalyzerConfig::keyword()),
        "stop" => Some(AnalyzerConfig::stop()),
        "english" => Some(AnalyzerConfig::english()),
        _ => None,
    }
}

/// Named analyzers available to one index
///
/// Holds the built-in analyzers plus every analyzer declared in the index
/// settings. Custom definitions shadow built-ins of the same name.
#[derive(Debug)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<Analyzer>>,
    settings: AnalysisSettings,
}

impl AnalyzerRegistry {
    /// Compile every analyzer; fails on the first unknown component
    pub fn new(settings: &AnalysisSettings) -> Result<Self> {
        let mut analyzers = HashMap::new();

        for name in BUILTIN_ANALYZERS {
            if let Some(config) = builtin_config(name) {
                let analyzer = Analyzer::build(&config, &AnalysisSettings::default())?;
                analyzers.insert(name.to_string(), Arc::new(analyzer));
            }
        }
        for (name, config) in &settings.analyzers {
            analyzers.insert(name.clone(), Arc::new(Analyzer::build(config, settings)?));
        }

        Ok(Self {
            analyzers,
            settings: settings.clone(),
        })
    }

    /// Look up an analyzer by name
    pub fn get(&self, name: &str) -> Result<Arc<Analyzer>> {
        self.analyzers
            .get(name)
            .cloned()
            .ok_or_else(|| TermdexError::unknown_component(AnalyzerComponent::Analyzer, name))
    }

    /// Resolve a mapping's analyzer reference
    pub fn resolve(&self, analyzer: &AnalyzerRef) -> Result<Arc<Analyzer>> {
        match analyzer {
            AnalyzerRef::Named(name) => self.get(name),
            AnalyzerRef::Inline(config) => Ok(Arc::new(Analyzer::build(config, &self.settings)?)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.analyzers.contains_key(name)
    }

    /// Registered analyzer names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.analyzers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        let analyzers = BUILTIN_ANALYZERS
            .iter()
            .filter_map(|name| {
                let config = builtin_config(name)?;
                let analyzer = Analyzer::build(&config, &AnalysisSettings::default()).ok()?;
                Some((name.to_string(), Arc::new(analyzer)))
            })
            .collect();
        Self {
            analyzers,
            settings: AnalysisSettings::default(),
        }
    }
}
