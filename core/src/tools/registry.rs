//! Tool registry for managing available tools

use crate::tools::{Tool, ToolExecutor};
use std::collections::BTreeMap;

/// Registry for managing tool creation and registration
pub struct ToolRegistry {
    factories: BTreeMap<String, Box<dyn ToolFactory>>,
}

/// Factory trait for creating tools
pub trait ToolFactory: Send + Sync {
    /// Create a new instance of the tool
    fn create(&self) -> Box<dyn Tool>;

    /// Get the name of the tool this factory creates
    fn tool_name(&self) -> &str;

    /// Get the description of the tool this factory creates
    fn tool_description(&self) -> &str;
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a tool factory
    pub fn register_factory(&mut self, factory: Box<dyn ToolFactory>) {
        self.factories
            .insert(factory.tool_name().to_string(), factory);
    }

    /// Create a tool by name
    pub fn create_tool(&self, name: &str) -> Option<Box<dyn Tool>> {
        self.factories.get(name).map(|factory| factory.create())
    }

    /// List all available tool names
    pub fn list_tools(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Get tool information
    pub fn get_tool_info(&self, name: &str) -> Option<(&str, &str)> {
        self.factories
            .get(name)
            .map(|factory| (factory.tool_name(), factory.tool_description()))
    }

    /// Create a tool executor with the specified tools.
    ///
    /// Unknown names are skipped with a warning.
    pub fn create_executor(&self, tool_names: &[String]) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for name in tool_names {
            match self.create_tool(name) {
                Some(tool) => executor.register_tool(tool),
                None => tracing::warn!(tool = %name, "Unknown tool requested, skipping"),
            }
        }

        executor
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        let mut registry = Self::new();

        // Register built-in tools
        registry.register_factory(Box::new(crate::tools::builtin::HttpRequestToolFactory));

        registry
    }
}

/// Macro to help implement tool factories
#[macro_export]
macro_rules! impl_tool_factory {
    ($factory:ident, $tool:ident, $name:expr, $description:expr) => {
        pub struct $factory;

        impl $crate::tools::ToolFactory for $factory {
            fn create(&self) -> Box<dyn $crate::tools::Tool> {
                Box::new($tool::new())
            }

            fn tool_name(&self) -> &str {
                $name
            }

            fn tool_description(&self) -> &str {
                $description
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::tools::registry::ToolRegistry;

    #[test]
    fn test_default_registry_has_http_request() {
        let registry = ToolRegistry::default();
        assert_eq!(registry.list_tools(), vec!["http_request"]);
    }

    #[test]
    fn test_tool_creation_matches_factory() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let tool = registry.create_tool(tool_name).unwrap();
            assert_eq!(tool.name(), tool_name);
            assert!(!tool.description().is_empty());

            let schema = tool.parameters_schema();
            assert_eq!(schema["type"], "object");
            assert!(schema["properties"].as_object().is_some_and(|p| !p.is_empty()));

            let (name, description) = registry.get_tool_info(tool_name).unwrap();
            assert_eq!(name, tool_name);
            assert!(!description.is_empty());
        }
    }

    #[test]
    fn test_executor_skips_unknown_tools() {
        let registry = ToolRegistry::default();
        let executor =
            registry.create_executor(&["http_request".to_string(), "bash".to_string()]);
        assert_eq!(executor.list_tools(), vec!["http_request"]);
    }
}
