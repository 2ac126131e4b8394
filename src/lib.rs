//! crossplane-gen
//!
//! Generates Crossplane CompositeResourceDefinitions from Kubernetes
//! CustomResourceDefinitions. CRDs come from manifests on disk or from Rust
//! types deriving `kube::CustomResource`, see [`crossplane_crd::TypeCollector`].

pub mod cli;
pub mod config;
pub mod generator;

pub use config::{OptionError, OptionsRegistry};
pub use generator::XrdGenerator;

use anyhow::{Context, Result};
use crossplane_crd::{load_roots, KindRegistry, Package};
use crossplane_gen_plugin::{
    GenerationContext, Generator, OutputRule, OutputToDirectory,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use config::{OptionTarget, ParsedArguments};

/// Log filter used when `RUST_LOG` is not set. Warnings from every crate stay
/// visible, so a schema dropped during conversion is always reported.
pub const DEFAULT_LOG_FILTER: &str = "warn,crossplane_gen=info,crossplane_crd=info";

/// Base directory of the per-generator default output
pub const DEFAULT_OUTPUT_BASE: &str = "config";

/// Every generator the command line knows about
pub fn all_generators() -> Vec<Box<dyn Generator>> {
    vec![Box::new(XrdGenerator::new())]
}

/// Registry with all generators, output rules and common options
pub fn default_registry() -> Result<OptionsRegistry, OptionError> {
    let mut registry = OptionsRegistry::new();
    for generator in all_generators() {
        registry.register_generator(generator)?;
    }
    registry.register_output_rules()?;
    registry.register_common_options()?;
    Ok(registry)
}

/// Output rules of a run
#[derive(Debug, Clone, Default)]
pub struct OutputRules {
    /// Rule for generators without a specific one
    pub default: Option<Arc<dyn OutputRule>>,

    /// Rules set with `output:<generator>:<rule>`
    pub by_generator: HashMap<String, Arc<dyn OutputRule>>,
}

impl OutputRules {
    /// Rule used for a generator. Without any default rule every generator
    /// writes to its own directory below [`DEFAULT_OUTPUT_BASE`].
    pub fn for_generator(&self, name: &str) -> Arc<dyn OutputRule> {
        if let Some(rule) = self.by_generator.get(name) {
            return rule.clone();
        }

        match &self.default {
            Some(rule) => rule.clone(),
            None => Arc::new(OutputToDirectory(Path::new(DEFAULT_OUTPUT_BASE).join(name))),
        }
    }
}

/// A configured run: which generators, which sources, where output goes
#[derive(Debug, Default)]
pub struct Runtime {
    /// Enabled generators, in the order they were first named
    pub generators: Vec<Box<dyn Generator>>,

    /// Source roots given with `paths=`
    pub paths: Vec<String>,

    /// Packages supplied directly, e.g. from a `TypeCollector`
    pub packages: Vec<Package>,

    pub output_rules: OutputRules,
}

impl Runtime {
    /// Build a runtime from command line option tokens.
    ///
    /// Naming a generator more than once merges its fields, later values win.
    pub fn from_options<S: AsRef<str>>(
        registry: &OptionsRegistry,
        tokens: &[S],
    ) -> Result<Self, OptionError> {
        let mut runtime = Runtime::default();

        for token in tokens {
            let token = token.as_ref();
            let (definition, arguments) = registry.parse(token)?;

            match &definition.target {
                OptionTarget::Generator(name) => {
                    let generator = runtime.enable_generator(registry, name, token)?;
                    if let ParsedArguments::Fields(fields) = arguments {
                        for (field, value) in fields {
                            generator.set_option(field, value).map_err(|source| {
                                OptionError::Field {
                                    option: name.clone(),
                                    field: field.to_string(),
                                    source,
                                }
                            })?;
                        }
                    }
                }
                OptionTarget::Paths => {
                    if let ParsedArguments::Value(value) = arguments {
                        let paths = value.into_string_list().map_err(|source| {
                            OptionError::Field {
                                option: definition.name.clone(),
                                field: String::new(),
                                source,
                            }
                        })?;
                        runtime.paths.extend(paths);
                    }
                }
                OptionTarget::Output { generator, rule } => {
                    let rule = rule.build(&definition.name, arguments)?;
                    match generator {
                        Some(name) => {
                            runtime.output_rules.by_generator.insert(name.clone(), rule);
                        }
                        None => runtime.output_rules.default = Some(rule),
                    }
                }
            }

            debug!("Parsed option {}", token);
        }

        Ok(runtime)
    }

    fn enable_generator(
        &mut self,
        registry: &OptionsRegistry,
        name: &str,
        token: &str,
    ) -> Result<&mut Box<dyn Generator>, OptionError> {
        let index = match self.generators.iter().position(|g| g.name() == name) {
            Some(index) => index,
            None => {
                let prototype = registry
                    .generator(name)
                    .ok_or_else(|| OptionError::UnknownOption(token.to_string()))?;
                self.generators.push(prototype.clone_box());
                self.generators.len() - 1
            }
        };
        Ok(&mut self.generators[index])
    }

    /// Add packages that are not loaded from `paths`
    pub fn with_packages(mut self, packages: Vec<Package>) -> Self {
        self.packages.extend(packages);
        self
    }

    /// Load the sources once, then run every generator in turn.
    ///
    /// Loading failures are returned as errors. Generator failures are
    /// printed on stderr and reported through the returned flag, so one
    /// failing generator does not stop the others.
    pub async fn run(&self) -> Result<bool> {
        let mut kinds = KindRegistry::new();
        for generator in &self.generators {
            generator.register_kinds(&mut kinds);
        }

        let mut roots = if self.paths.is_empty() {
            Vec::new()
        } else {
            load_roots(&self.paths, &kinds).context("Failed to load source roots")?
        };
        roots.extend(self.packages.iter().cloned());
        info!("Loaded {} package(s)", roots.len());

        let mut had_errors = false;
        for generator in &self.generators {
            let context = GenerationContext::new(
                roots.clone(),
                self.output_rules.for_generator(generator.name()),
            );

            info!("Running generator {}", generator.name());
            if let Err(e) = generator.generate(&context).await {
                error!("Generator {} failed: {:#}", generator.name(), e);
                eprintln!("{:#}", e);
                had_errors = true;
            }
        }

        Ok(had_errors)
    }
}
