use carrot_llm::ToolDefinition;

/// One tool as advertised by a tool server
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema of the tool input
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    /// Function-calling shape sent to the model
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::function(&self.name, self.description.clone(), self.input_schema.clone())
    }
}

impl From<rmcp::model::Tool> for ToolDescriptor {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
            description: tool.description.map(|d| d.into_owned()),
            name: tool.name.into_owned(),
        }
    }
}
