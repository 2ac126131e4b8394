//! Detailed option help

use std::fmt::Write;

use crate::config::{OptionArguments, OptionsRegistry};

/// Render every registered option, its arguments and help text
pub fn detailed_help(registry: &OptionsRegistry) -> String {
    let mut out = String::new();

    for definition in registry.definitions() {
        let usage = match &definition.arguments {
            OptionArguments::None => definition.name.clone(),
            OptionArguments::Anonymous(kind) => format!("{}=<{}>", definition.name, kind),
            OptionArguments::Named(fields) if fields.is_empty() => definition.name.clone(),
            OptionArguments::Named(_) => format!("{}[:<field>=<value>,...]", definition.name),
        };
        let _ = writeln!(out, "{}", usage);
        let _ = writeln!(out, "    {}", definition.help);

        if let OptionArguments::Named(fields) = &definition.arguments {
            for field in fields {
                let _ = writeln!(out, "    {:<28} {:<9} {}", field.name, field.kind, field.help);
            }
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_generator_fields() {
        let registry = crate::default_registry().unwrap();

        let help = detailed_help(&registry);

        assert!(help.contains("xrd[:<field>=<value>,...]\n"));
        assert!(help.contains("maxDescLen"));
        assert!(help.contains("paths=<[]string>\n"));
        assert!(help.contains("output:xrd:stdout\n"));
    }
}
