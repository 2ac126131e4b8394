//! Registry of option tokens accepted on the command line

use std::path::PathBuf;
use std::sync::Arc;

use crossplane_gen_plugin::{
    FieldKind, Generator, OptionField, OutputArtifacts, OutputRule, OutputToDirectory,
    OutputToNothing, OutputToStdout,
};

use super::parse::{parse_arguments, OptionError, ParsedArguments};

/// What an option token configures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionTarget {
    /// Enable a generator and set its fields
    Generator(String),

    /// Output rule for one generator, or the default rule when `generator` is `None`
    Output {
        generator: Option<String>,
        rule: OutputRuleKind,
    },

    /// Source roots to load
    Paths,
}

/// Shape of the arguments an option takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionArguments {
    /// Bare name only
    None,

    /// A single `=value`
    Anonymous(FieldKind),

    /// `:field=value,...`
    Named(Vec<OptionField>),
}

/// A registered option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDefinition {
    pub name: String,
    pub target: OptionTarget,
    pub arguments: OptionArguments,
    pub help: String,
}

/// Known output rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRuleKind {
    Dir,
    None,
    Stdout,
    Artifacts,
}

const ARTIFACTS_FIELDS: &[OptionField] = &[OptionField {
    name: "config",
    kind: FieldKind::String,
    help: "directory for configuration artifacts (default \"config\")",
}];

impl OutputRuleKind {
    pub const ALL: [OutputRuleKind; 4] = [
        OutputRuleKind::Dir,
        OutputRuleKind::None,
        OutputRuleKind::Stdout,
        OutputRuleKind::Artifacts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputRuleKind::Dir => "dir",
            OutputRuleKind::None => "none",
            OutputRuleKind::Stdout => "stdout",
            OutputRuleKind::Artifacts => "artifacts",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            OutputRuleKind::Dir => "outputs each artifact to the given directory",
            OutputRuleKind::None => "skips outputting anything",
            OutputRuleKind::Stdout => "outputs everything to standard out",
            OutputRuleKind::Artifacts => "outputs artifacts below a config directory",
        }
    }

    pub fn arguments(&self) -> OptionArguments {
        match self {
            OutputRuleKind::Dir => OptionArguments::Anonymous(FieldKind::String),
            OutputRuleKind::None | OutputRuleKind::Stdout => OptionArguments::None,
            OutputRuleKind::Artifacts => OptionArguments::Named(ARTIFACTS_FIELDS.to_vec()),
        }
    }

    /// Instantiate the rule from parsed token arguments
    pub fn build(
        &self,
        option: &str,
        arguments: ParsedArguments,
    ) -> Result<Arc<dyn OutputRule>, OptionError> {
        let rule: Arc<dyn OutputRule> = match (self, arguments) {
            (OutputRuleKind::Dir, ParsedArguments::Value(value)) => {
                let path = value.into_string().map_err(|source| OptionError::Field {
                    option: option.to_string(),
                    field: String::new(),
                    source,
                })?;
                Arc::new(OutputToDirectory(PathBuf::from(path)))
            }
            (OutputRuleKind::None, _) => Arc::new(OutputToNothing),
            (OutputRuleKind::Stdout, _) => Arc::new(OutputToStdout),
            (OutputRuleKind::Artifacts, ParsedArguments::Fields(fields)) => {
                let mut artifacts = OutputArtifacts::default();
                for (field, value) in fields {
                    let config = value.into_string().map_err(|source| OptionError::Field {
                        option: option.to_string(),
                        field: field.to_string(),
                        source,
                    })?;
                    artifacts.config = PathBuf::from(config);
                }
                Arc::new(artifacts)
            }
            _ => {
                return Err(OptionError::MissingValue {
                    option: option.to_string(),
                })
            }
        };

        Ok(rule)
    }
}

/// All options the command line understands, plus generator prototypes
#[derive(Debug, Default)]
pub struct OptionsRegistry {
    definitions: Vec<OptionDefinition>,
    generators: Vec<Box<dyn Generator>>,
}

impl OptionsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single option, rejecting duplicate names
    pub fn register(&mut self, definition: OptionDefinition) -> Result<(), OptionError> {
        if self.definitions.iter().any(|d| d.name == definition.name) {
            return Err(OptionError::Duplicate(definition.name));
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Register a generator along with its per-generator output rules
    pub fn register_generator(&mut self, generator: Box<dyn Generator>) -> Result<(), OptionError> {
        let name = generator.name().to_string();

        self.register(OptionDefinition {
            name: name.clone(),
            target: OptionTarget::Generator(name.clone()),
            arguments: OptionArguments::Named(generator.option_fields()),
            help: generator.help().to_string(),
        })?;

        for rule in OutputRuleKind::ALL {
            self.register(OptionDefinition {
                name: format!("output:{}:{}", name, rule.name()),
                target: OptionTarget::Output {
                    generator: Some(name.clone()),
                    rule,
                },
                arguments: rule.arguments(),
                help: rule.help().to_string(),
            })?;
        }

        self.generators.push(generator);
        Ok(())
    }

    /// Register the default output rules, `output:<rule>`
    pub fn register_output_rules(&mut self) -> Result<(), OptionError> {
        for rule in OutputRuleKind::ALL {
            self.register(OptionDefinition {
                name: format!("output:{}", rule.name()),
                target: OptionTarget::Output {
                    generator: None,
                    rule,
                },
                arguments: rule.arguments(),
                help: rule.help().to_string(),
            })?;
        }
        Ok(())
    }

    /// Register options shared by every run, currently `paths`
    pub fn register_common_options(&mut self) -> Result<(), OptionError> {
        self.register(OptionDefinition {
            name: "paths".to_string(),
            target: OptionTarget::Paths,
            arguments: OptionArguments::Anonymous(FieldKind::StringList),
            help: "source roots to load, e.g. ./apis/... or {a,b}".to_string(),
        })
    }

    pub fn definitions(&self) -> &[OptionDefinition] {
        &self.definitions
    }

    /// Prototype of a registered generator
    pub fn generator(&self, name: &str) -> Option<&dyn Generator> {
        self.generators
            .iter()
            .find(|generator| generator.name() == name)
            .map(|generator| generator.as_ref())
    }

    /// Find the definition whose name is the longest prefix of `token`,
    /// followed by the end of the token, `:` or `=`
    pub fn lookup<'t>(&self, token: &'t str) -> Option<(&OptionDefinition, &'t str)> {
        self.definitions
            .iter()
            .filter_map(|definition| {
                let rest = token.strip_prefix(definition.name.as_str())?;
                match rest.chars().next() {
                    None | Some(':') | Some('=') => Some((definition, rest)),
                    Some(_) => None,
                }
            })
            .max_by_key(|(definition, _)| definition.name.len())
    }

    /// Parse one token into its definition and arguments
    pub fn parse(&self, token: &str) -> Result<(&OptionDefinition, ParsedArguments), OptionError> {
        let (definition, rest) = self
            .lookup(token)
            .ok_or_else(|| OptionError::UnknownOption(token.to_string()))?;
        let arguments = parse_arguments(definition, rest)?;
        Ok((definition, arguments))
    }
}
