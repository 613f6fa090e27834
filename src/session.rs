use crate::dashboard::{dashboard_from_payload, DashboardAnalysis};
use crate::error::{Error, Result};
use crate::ingest::DataFile;
use crate::invoker::{AiInvoker, InvokeRequest, RequestKind};
use crate::model::ChartSpec;
use crate::normalize::normalize_payload;
use crate::prompt::{compose_chart, compose_dashboard, compose_question};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// One conversation with the AI service.
///
/// Every request method takes `&mut self`, so a session has at most one
/// request in flight. Prompts are validated before anything is sent.
pub struct Session {
    invoker: Box<dyn AiInvoker>,
    history: Vec<Message>,
    file: Option<DataFile>,
    dataset_id: Option<String>,
}

impl Session {
    pub fn new(invoker: Box<dyn AiInvoker>) -> Self {
        Self {
            invoker,
            history: Vec::new(),
            file: None,
            dataset_id: None,
        }
    }

    pub fn with_dataset(mut self, dataset_id: Option<String>) -> Self {
        self.dataset_id = dataset_id;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn attached_file(&self) -> Option<&DataFile> {
        self.file.as_ref()
    }

    /// Attach a file, replacing any previous one
    pub fn attach_file(&mut self, file: DataFile) {
        if let Some(previous) = &self.file {
            debug!(previous = %previous.name, next = %file.name, "replacing attached file");
        }
        self.file = Some(file);
    }

    pub fn detach_file(&mut self) -> Option<DataFile> {
        self.file.take()
    }

    fn request(&self, prompt: String, kind: RequestKind) -> InvokeRequest {
        InvokeRequest::new(prompt, kind).with_dataset(self.dataset_id.clone())
    }

    /// Ask a question, with the attached file as context.
    /// On failure the history keeps the question but no answer.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let prompt = compose_question(question, self.file.as_ref())?;

        self.history.push(Message {
            role: Role::User,
            content: question.trim().to_string(),
        });

        let reply = self.invoker.invoke(&self.request(prompt, RequestKind::General)).await?;
        let answer = reply_text(&reply)?;

        self.history.push(Message {
            role: Role::Assistant,
            content: answer.clone(),
        });
        Ok(answer)
    }

    /// Request a chart; whatever comes back is normalized into a spec
    pub async fn generate_chart(&mut self, description: &str) -> Result<ChartSpec> {
        let prompt = compose_chart(description, self.file.as_ref())?;
        let reply = self.invoker.invoke(&self.request(prompt, RequestKind::Chart)).await?;

        let spec = normalize_payload(&reply);
        info!(chart_type = %spec.chart_type(), rows = spec.rows().len(), "chart generated");
        Ok(spec)
    }

    /// Design a dashboard over the attached file
    pub async fn generate_dashboard(&mut self) -> Result<DashboardAnalysis> {
        let file = self.file.as_ref().ok_or(Error::NoData)?;
        let table = file.table();
        if table.is_empty() {
            return Err(Error::NoData);
        }

        let prompt = compose_dashboard(&file.name, &table);
        let request = self.request(prompt, RequestKind::Dashboard);
        let reply = self.invoker.invoke(&request).await?;

        let config = dashboard_from_payload(&reply, &file.name, &table);
        info!(name = %config.name, widgets = config.widgets.len(), "dashboard generated");
        Ok(DashboardAnalysis::new(config, &table))
    }
}

fn reply_text(reply: &Value) -> Result<String> {
    match reply {
        Value::String(text) => Ok(text.clone()),
        _ => reply
            .get("response")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| Error::InvalidResponse("reply has no response text".to_string())),
    }
}
